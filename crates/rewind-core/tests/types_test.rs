//! Tests for identifiers, schema helpers and counters.

use rewind_core::traits::{Cancellable, CancellationToken};
use rewind_core::types::*;

#[test]
fn test_opid_format_and_parse() {
    let mut gen = OpIdGenerator::new(42);
    let first = gen.next_at(1_700_000_000);
    let second = gen.next_at(1_700_000_000);

    assert_eq!(first.to_string(), "1700000000_42_00000001");
    assert_eq!(second.to_string(), "1700000000_42_00000002");
    assert!(first < second);
    assert_eq!(OpId::parse(&second.to_string()), Some(second));
}

#[test]
fn test_opid_none_is_reserved() {
    let none = OpId::none(1_700_000_000, 7);
    assert!(none.is_none());
    assert!(none.to_string().ends_with("_00000000"));

    let mut gen = OpIdGenerator::new(7);
    assert!(!gen.next_at(1).is_none());
}

#[test]
fn test_opid_parse_rejects_garbage() {
    assert_eq!(OpId::parse("abc"), None);
    assert_eq!(OpId::parse("1_2_3"), None);
}

#[test]
fn test_backup_location_naming() {
    let source = SourceIdent::new("127.0.0.1", 3306);
    let table = TableIdent::new("test_inc", "t1");
    let loc = BackupLocation::for_table(&source, &table);
    assert_eq!(loc.database, "127_0_0_1_3306_test_inc");
    assert_eq!(loc.table, "t1");
}

#[test]
fn test_table_name_resolution() {
    let unqualified = TableName::new("t1");
    assert_eq!(
        unqualified.resolve(Some("db")),
        Some(TableIdent::new("db", "t1"))
    );
    assert_eq!(unqualified.resolve(None), None);

    let qualified = TableName::qualified("other", "t2");
    assert_eq!(
        qualified.resolve(Some("db")),
        Some(TableIdent::new("other", "t2"))
    );
}

#[test]
fn test_quote_ident_doubles_backticks() {
    assert_eq!(quote_ident("a`b"), "`a``b`");
    assert_eq!(TableIdent::new("db", "t 1").quoted(), "`db`.`t 1`");
}

#[test]
fn test_row_key_prefers_primary_then_not_null_unique() {
    let with_pk = TableSchema::new("db", "t")
        .with_column(ColumnDef::new("id", "int(11)").not_null())
        .with_column(ColumnDef::new("c1", "int(11)"))
        .with_index(IndexDef::primary(["id"]));
    assert_eq!(with_pk.row_key_columns(), Some(vec![0]));

    let nullable_unique = TableSchema::new("db", "t")
        .with_column(ColumnDef::new("id", "int(11)"))
        .with_index(IndexDef::new("uq", IndexKind::Unique, ["id"]));
    assert_eq!(nullable_unique.row_key_columns(), None);

    let unique = TableSchema::new("db", "t")
        .with_column(ColumnDef::new("a", "int(11)"))
        .with_column(ColumnDef::new("b", "int(11)").not_null())
        .with_index(IndexDef::new("uq", IndexKind::Unique, ["b"]));
    assert_eq!(unique.row_key_columns(), Some(vec![1]));
}

#[test]
fn test_statistics_counter_order() {
    let names: Vec<&str> = StatCategory::ALL.iter().map(|c| c.column_name()).collect();
    assert_eq!(
        names,
        vec![
            "usedb",
            "deleting",
            "inserting",
            "updating",
            "selecting",
            "altertable",
            "renaming",
            "createindex",
            "dropindex",
            "addcolumn",
            "dropcolumn",
            "changecolumn",
            "alteroption",
            "alterconvert",
            "createtable",
            "droptable",
            "createdb",
            "truncating",
        ]
    );

    let mut counters = StatisticsCounters::new();
    counters.increment(StatCategory::Insert);
    counters.increment(StatCategory::Insert);
    counters.increment(StatCategory::Truncate);
    assert_eq!(counters.get(StatCategory::Insert), 2);
    assert_eq!(counters.total(), 3);
}

#[test]
fn test_row_image_null_bitmap() {
    let row = RowImage::with_unknowns(vec![Some(Value::Int(1)), Some(Value::Null), None]);
    assert!(row.is_null(1));
    assert!(!row.is_null(2));
    assert!(!row.is_known(2));
    assert_eq!(row.null_count(), 1);
}

#[test]
fn test_statement_kind_names_round_trip() {
    for kind in [
        StatementKind::Insert,
        StatementKind::AlterTable,
        StatementKind::Truncate,
    ] {
        assert_eq!(StatementKind::from_name(kind.name()), Some(kind));
    }
}

#[test]
fn test_cancellation_token_shared() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());
    token.cancel();
    assert!(clone.is_cancelled());
}

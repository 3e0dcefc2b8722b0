//! Statement classification: kind, statistics categories, reversibility.

use rewind_core::types::{AlterSpec, SkipReason, StatCategory, Statement, StatementKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: StatementKind,
    /// Counters bumped by this statement, in increment order.
    pub categories: Vec<StatCategory>,
    /// Whether the statement gets a rollback block at all.
    pub reversible: bool,
}

impl Classification {
    /// Why a non-reversible statement is skipped.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        if self.reversible {
            return None;
        }
        Some(match self.kind {
            StatementKind::CreateDatabase | StatementKind::DropDatabase | StatementKind::Truncate => {
                SkipReason::Irreversible
            }
            _ => SkipReason::NotApplicable,
        })
    }
}

pub fn classify(stmt: &Statement) -> Classification {
    let (kind, categories, reversible) = match stmt {
        Statement::UseDatabase { .. } => (StatementKind::UseDatabase, vec![StatCategory::UseDb], false),
        Statement::Select => (StatementKind::Select, vec![StatCategory::Select], false),
        Statement::Insert(_) => (StatementKind::Insert, vec![StatCategory::Insert], true),
        Statement::Update(_) => (StatementKind::Update, vec![StatCategory::Update], true),
        Statement::Delete(_) => (StatementKind::Delete, vec![StatCategory::Delete], true),
        Statement::CreateTable(_) => (StatementKind::CreateTable, vec![StatCategory::CreateTable], true),
        Statement::AlterTable(alter) => {
            let mut categories = vec![StatCategory::AlterTable];
            categories.extend(alter.specs.iter().filter_map(spec_category));
            (StatementKind::AlterTable, categories, true)
        }
        Statement::DropTable(_) => (StatementKind::DropTable, vec![StatCategory::DropTable], true),
        Statement::RenameTable(_) => (StatementKind::RenameTable, vec![StatCategory::Rename], true),
        Statement::CreateIndex(_) => (StatementKind::CreateIndex, vec![StatCategory::CreateIndex], true),
        Statement::DropIndex(_) => (StatementKind::DropIndex, vec![StatCategory::DropIndex], true),
        Statement::CreateDatabase { .. } => {
            (StatementKind::CreateDatabase, vec![StatCategory::CreateDb], false)
        }
        Statement::DropDatabase { .. } => (StatementKind::DropDatabase, Vec::new(), false),
        Statement::Truncate { .. } => (StatementKind::Truncate, vec![StatCategory::Truncate], false),
        Statement::Other => (StatementKind::Other, Vec::new(), false),
    };
    Classification {
        kind,
        categories,
        reversible,
    }
}

fn spec_category(spec: &AlterSpec) -> Option<StatCategory> {
    Some(match spec {
        AlterSpec::AddColumns(_) => StatCategory::AddColumn,
        AlterSpec::DropColumn(_) => StatCategory::DropColumn,
        AlterSpec::ModifyColumn { .. } | AlterSpec::ChangeColumn { .. } => StatCategory::ChangeColumn,
        AlterSpec::AlterColumnDefault { .. } => return None,
        AlterSpec::AddIndex(_) => StatCategory::CreateIndex,
        AlterSpec::DropIndex(_) | AlterSpec::DropPrimaryKey => StatCategory::DropIndex,
        AlterSpec::RenameTo(_) => StatCategory::Rename,
        AlterSpec::Options(_) => StatCategory::AlterOption,
        AlterSpec::ConvertCharset { .. } => StatCategory::AlterConvert,
    })
}

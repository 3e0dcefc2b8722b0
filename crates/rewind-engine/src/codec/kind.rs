//! Column type classification from the declared type text.

/// Codec-relevant class of a declared column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    Integer { unsigned: bool },
    Decimal { scale: u32 },
    Float,
    Double,
    Bit,
    Text,
    Binary,
    Enum(Vec<String>),
    Set(Vec<String>),
    Json,
    Date,
    Time,
    DateTime,
    Timestamp,
    Year,
    /// Spatial and unknown types. Carries the base type name.
    Unsupported(String),
}

impl ColumnKind {
    /// Classify a declared type such as `int(11) unsigned`, `decimal(10,2)`
    /// or `enum('a','b')`.
    pub fn parse(declared: &str) -> Self {
        let declared = declared.trim();
        let lower = declared.to_ascii_lowercase();
        let base_end = lower
            .find(|c: char| c == '(' || c.is_whitespace())
            .unwrap_or(lower.len());
        let base = &lower[..base_end];
        let args = paren_args(declared);

        match base {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "serial" => {
                Self::Integer {
                    unsigned: lower.contains("unsigned") || base == "serial",
                }
            }
            "bool" | "boolean" => Self::Integer { unsigned: false },
            "decimal" | "numeric" | "dec" | "fixed" => {
                let scale = args
                    .and_then(|a| a.split(',').nth(1).map(|s| s.trim().to_string()))
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0);
                Self::Decimal { scale }
            }
            "float" => match args.and_then(|a| a.split(',').next()?.trim().parse::<u32>().ok()) {
                // FLOAT(p) with p > 24 is stored as DOUBLE.
                Some(p) if p > 24 && !args.is_some_and(|a| a.contains(',')) => Self::Double,
                _ => Self::Float,
            },
            "double" | "real" => Self::Double,
            "bit" => Self::Bit,
            "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "nchar"
            | "nvarchar" | "national" => Self::Text,
            "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
                Self::Binary
            }
            "enum" => Self::Enum(args.map(parse_members).unwrap_or_default()),
            "set" => Self::Set(args.map(parse_members).unwrap_or_default()),
            "json" => Self::Json,
            "date" => Self::Date,
            "time" => Self::Time,
            "datetime" => Self::DateTime,
            "timestamp" => Self::Timestamp,
            "year" => Self::Year,
            other => Self::Unsupported(other.to_string()),
        }
    }
}

/// Text between the first `(` and its matching `)`, quote-aware.
fn paren_args(declared: &str) -> Option<&str> {
    let start = declared.find('(')?;
    let mut in_quote = false;
    let mut escaped = false;
    for (i, c) in declared[start + 1..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quote => escaped = true,
            '\'' => in_quote = !in_quote,
            ')' if !in_quote => return Some(&declared[start + 1..start + 1 + i]),
            _ => {}
        }
    }
    None
}

/// Parse `'a','b''c'` into member names.
fn parse_members(args: &str) -> Vec<String> {
    let mut members = Vec::new();
    let mut chars = args.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\'' {
            continue;
        }
        let mut member = String::new();
        while let Some(c) = chars.next() {
            match c {
                '\'' if chars.peek() == Some(&'\'') => {
                    chars.next();
                    member.push('\'');
                }
                '\'' => break,
                '\\' => {
                    if let Some(next) = chars.next() {
                        member.push(next);
                    }
                }
                other => member.push(other),
            }
        }
        members.push(member);
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integer_variants() {
        assert_eq!(ColumnKind::parse("int(11)"), ColumnKind::Integer { unsigned: false });
        assert_eq!(
            ColumnKind::parse("bigint(20) unsigned"),
            ColumnKind::Integer { unsigned: true }
        );
        assert_eq!(ColumnKind::parse("TINYINT"), ColumnKind::Integer { unsigned: false });
    }

    #[test]
    fn parses_decimal_scale() {
        assert_eq!(ColumnKind::parse("decimal(10,2)"), ColumnKind::Decimal { scale: 2 });
        assert_eq!(ColumnKind::parse("decimal"), ColumnKind::Decimal { scale: 0 });
    }

    #[test]
    fn float_precision_promotes_to_double() {
        assert_eq!(ColumnKind::parse("float"), ColumnKind::Float);
        assert_eq!(ColumnKind::parse("float(30)"), ColumnKind::Double);
        assert_eq!(ColumnKind::parse("float(7,3)"), ColumnKind::Float);
    }

    #[test]
    fn parses_enum_members_with_quotes() {
        assert_eq!(
            ColumnKind::parse("enum('type1','it''s','a,b')"),
            ColumnKind::Enum(vec!["type1".into(), "it's".into(), "a,b".into()])
        );
        assert_eq!(
            ColumnKind::parse("set('x','y')"),
            ColumnKind::Set(vec!["x".into(), "y".into()])
        );
    }

    #[test]
    fn spatial_is_unsupported() {
        assert_eq!(
            ColumnKind::parse("geometry"),
            ColumnKind::Unsupported("geometry".into())
        );
        assert_eq!(
            ColumnKind::parse("polygon"),
            ColumnKind::Unsupported("polygon".into())
        );
    }
}

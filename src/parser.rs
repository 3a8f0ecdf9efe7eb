//! Lightweight SQL inspection used to name query spans.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading statement keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlOperation {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    Truncate,
    Begin,
    Commit,
    Rollback,
    Set,
    Other,
}

// Checked in order; `WITH` starts a CTE that is almost always a read.
const KEYWORDS: &[(&str, SqlOperation)] = &[
    ("SELECT", SqlOperation::Select),
    ("WITH", SqlOperation::Select),
    ("INSERT", SqlOperation::Insert),
    ("UPDATE", SqlOperation::Update),
    ("DELETE", SqlOperation::Delete),
    ("CREATE", SqlOperation::Create),
    ("DROP", SqlOperation::Drop),
    ("ALTER", SqlOperation::Alter),
    ("TRUNCATE", SqlOperation::Truncate),
    ("BEGIN", SqlOperation::Begin),
    ("START", SqlOperation::Begin),
    ("COMMIT", SqlOperation::Commit),
    ("ROLLBACK", SqlOperation::Rollback),
    ("SET", SqlOperation::Set),
];

impl SqlOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlOperation::Select => "SELECT",
            SqlOperation::Insert => "INSERT",
            SqlOperation::Update => "UPDATE",
            SqlOperation::Delete => "DELETE",
            SqlOperation::Create => "CREATE",
            SqlOperation::Drop => "DROP",
            SqlOperation::Alter => "ALTER",
            SqlOperation::Truncate => "TRUNCATE",
            SqlOperation::Begin => "BEGIN",
            SqlOperation::Commit => "COMMIT",
            SqlOperation::Rollback => "ROLLBACK",
            SqlOperation::Set => "SET",
            SqlOperation::Other => "QUERY",
        }
    }

    /// Pattern capturing the primary table for operations that name one.
    fn table_pattern(&self) -> Option<&'static Regex> {
        let index = match self {
            SqlOperation::Select => 0,
            SqlOperation::Insert => 1,
            SqlOperation::Update => 2,
            SqlOperation::Delete => 3,
            SqlOperation::Create => 4,
            SqlOperation::Drop => 5,
            SqlOperation::Alter => 6,
            SqlOperation::Truncate => 7,
            _ => return None,
        };
        TABLE_PATTERNS.get(index)
    }
}

impl std::fmt::Display for SqlOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Optional quoting with backticks, double quotes or brackets around the table name.
const QUOTED_NAME: &str = r#"[`"\[]?(\w+)[`"\]]?"#;

static TABLE_PATTERNS: Lazy<[Regex; 8]> = Lazy::new(|| {
    [
        r"\bFROM\s+",
        r"\bINSERT\s+INTO\s+",
        r"\bUPDATE\s+",
        r"\bDELETE\s+FROM\s+",
        r"\bCREATE\s+(?:TEMP(?:ORARY)?\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?",
        r"\bDROP\s+TABLE\s+(?:IF\s+EXISTS\s+)?",
        r"\bALTER\s+TABLE\s+",
        r"\bTRUNCATE\s+(?:TABLE\s+)?",
    ]
    .map(|prefix| {
        Regex::new(&format!("(?i){prefix}{QUOTED_NAME}")).expect("valid table pattern")
    })
});

/// Classify a statement by its leading keyword.
pub fn parse_operation(sql: &str) -> SqlOperation {
    let head: String = sql
        .trim_start()
        .chars()
        .take(10)
        .collect::<String>()
        .to_ascii_uppercase();

    KEYWORDS
        .iter()
        .find(|(keyword, _)| head.starts_with(keyword))
        .map(|(_, operation)| *operation)
        .unwrap_or(SqlOperation::Other)
}

/// Extract the lower-cased primary table name, if one can be found.
pub fn extract_table(sql: &str) -> Option<String> {
    parse_operation(sql)
        .table_pattern()?
        .captures(sql)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Operation and table of a statement, used for span names.
#[derive(Debug)]
pub struct ParsedSql {
    pub operation: SqlOperation,
    pub table: Option<String>,
}

impl ParsedSql {
    pub fn parse(sql: &str) -> Self {
        Self {
            operation: parse_operation(sql),
            table: extract_table(sql),
        }
    }

    /// `"{OPERATION} {table}"`, or just the operation when no table was found.
    pub fn span_name(&self) -> String {
        match &self.table {
            Some(table) => format!("{} {}", self.operation, table),
            None => self.operation.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reads() {
        assert_eq!(parse_operation("SELECT * FROM users"), SqlOperation::Select);
        assert_eq!(parse_operation("  select id from orders"), SqlOperation::Select);
        assert_eq!(
            parse_operation("WITH cte AS (SELECT 1) SELECT * FROM cte"),
            SqlOperation::Select
        );
    }

    #[test]
    fn test_parse_writes() {
        assert_eq!(
            parse_operation("INSERT INTO users (name) VALUES ('test')"),
            SqlOperation::Insert
        );
        assert_eq!(
            parse_operation("update users SET name = 'test' WHERE id = 1"),
            SqlOperation::Update
        );
        assert_eq!(
            parse_operation("DELETE FROM users WHERE id = 1"),
            SqlOperation::Delete
        );
        assert_eq!(parse_operation("VACUUM"), SqlOperation::Other);
    }

    #[test]
    fn test_transaction_control() {
        assert_eq!(parse_operation("BEGIN"), SqlOperation::Begin);
        assert_eq!(parse_operation("START TRANSACTION"), SqlOperation::Begin);
        assert_eq!(parse_operation("COMMIT"), SqlOperation::Commit);
        assert_eq!(parse_operation("ROLLBACK"), SqlOperation::Rollback);
        assert_eq!(parse_operation("SET search_path TO app"), SqlOperation::Set);
    }

    #[test]
    fn test_extract_table() {
        assert_eq!(
            extract_table(r#"SELECT * FROM "Users" WHERE id = 1"#),
            Some("users".to_string())
        );
        assert_eq!(
            extract_table("INSERT INTO `grades` (student_id, score) VALUES ($1, $2)"),
            Some("grades".to_string())
        );
        assert_eq!(
            extract_table("UPDATE students SET name = $1 WHERE id = $2"),
            Some("students".to_string())
        );
        assert_eq!(
            extract_table("CREATE TABLE IF NOT EXISTS [audit] (id int)"),
            Some("audit".to_string())
        );
        assert_eq!(extract_table("TRUNCATE sessions"), Some("sessions".to_string()));
        assert_eq!(extract_table("COMMIT"), None);
    }

    #[test]
    fn test_every_table_pattern_compiles() {
        assert_eq!(TABLE_PATTERNS.len(), 8);
        assert_eq!(
            extract_table("DROP TABLE IF EXISTS legacy"),
            Some("legacy".to_string())
        );
        assert_eq!(
            extract_table("ALTER TABLE accounts ADD COLUMN note text"),
            Some("accounts".to_string())
        );
    }

    #[test]
    fn test_span_name() {
        assert_eq!(
            ParsedSql::parse("DELETE FROM assignments WHERE id = $1").span_name(),
            "DELETE assignments"
        );
        assert_eq!(ParsedSql::parse("BEGIN").span_name(), "BEGIN");
    }
}

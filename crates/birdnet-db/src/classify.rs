/// Which `Counters` bucket a statement's duration belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationClass {
    Read,
    Write,
}

/// Classify a SQL statement by its leading keyword.
///
/// `SELECT` and row-iteration statements are reads; `INSERT`/`UPDATE`/
/// `DELETE` and raw exec statements are writes. Anything else (PRAGMA,
/// BEGIN/COMMIT, DDL) is treated as a write since it mutates connection or
/// database state and is never the hot read path the distinction exists to
/// protect.
#[must_use]
pub fn classify(sql: &str) -> OperationClass {
    let trimmed = sql.trim_start();
    let keyword: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase();

    match keyword.as_str() {
        "SELECT" | "WITH" | "EXPLAIN" => OperationClass::Read,
        _ => OperationClass::Write,
    }
}

//! Builds parameterized INSERT, SELECT, UPDATE, DELETE for a table whose
//! primary key is the `id` column. Identifiers come from entity definitions
//! only; values are always bound as parameters.

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

const PK: &str = "id";

/// `"id", "col_a", "col_b", ...` in declaration order.
fn column_list(columns: &[&str]) -> String {
    std::iter::once(PK)
        .chain(columns.iter().copied())
        .map(quoted)
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(from: usize, count: usize) -> String {
    (from..from + count)
        .map(|n| format!("${}", n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT every row ordered by primary key.
pub fn select_all(table: &str, columns: &[&str]) -> String {
    format!(
        "SELECT {} FROM {} ORDER BY {}",
        column_list(columns),
        quoted(table),
        quoted(PK)
    )
}

/// SELECT by primary key. Caller binds the id as `$1`.
pub fn select_by_id(table: &str, columns: &[&str]) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = $1",
        column_list(columns),
        quoted(table),
        quoted(PK)
    )
}

/// INSERT returning the stored row. With `with_id` the id is bound first,
/// otherwise the column default assigns it.
pub fn insert(table: &str, columns: &[&str], with_id: bool) -> String {
    let mut cols: Vec<String> = Vec::with_capacity(columns.len() + 1);
    if with_id {
        cols.push(quoted(PK));
    }
    cols.extend(columns.iter().copied().map(quoted));
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(table),
        cols.join(", "),
        placeholders(1, cols.len()),
        column_list(columns)
    )
}

/// UPDATE every column by id. Columns bind as `$1..$n`, the id as `$n+1`.
pub fn update(table: &str, columns: &[&str]) -> String {
    let sets = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ${}", quoted(c), i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        quoted(table),
        sets,
        quoted(PK),
        columns.len() + 1,
        column_list(columns)
    )
}

/// DELETE by id.
pub fn delete(table: &str) -> String {
    format!("DELETE FROM {} WHERE {} = $1", quoted(table), quoted(PK))
}

/// Move the serial sequence past the highest stored id so default-assigned
/// ids never collide with rows inserted with explicit ids.
pub fn sync_id_sequence(table: &str) -> String {
    format!(
        "SELECT setval(pg_get_serial_sequence('{}', '{}'), COALESCE(MAX({}), 0) + 1, false) FROM {}",
        table.replace('\'', "''"),
        PK,
        quoted(PK),
        quoted(table)
    )
}

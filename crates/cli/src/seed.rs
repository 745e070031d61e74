//! `sentinel seed`: demo `employees` databases with known differences.

use std::path::Path;

use sentinel_recon::{Row, Value};

pub const TABLE: &str = "employees";

const DDL: &str = "id INTEGER PRIMARY KEY, name TEXT, department TEXT, salary INTEGER";

fn employee(id: i64, name: &str, department: &str, salary: i64) -> Row {
    [
        ("id", Value::Integer(id)),
        ("name", Value::from(name)),
        ("department", Value::from(department)),
        ("salary", Value::Integer(salary)),
    ]
    .into_iter()
    .collect()
}

pub fn source_rows() -> Vec<Row> {
    vec![
        employee(1, "Alice", "Engineering", 50000),
        employee(2, "Bob", "Engineering", 60000),
        employee(3, "Charlie", "HR", 55000),
        employee(4, "Diana", "Finance", 70000),
        employee(5, "Eve", "Engineering", 65000),
    ]
}

/// Salary of 1 changed, department of 3 changed, 4 dropped, 6 added.
pub fn target_rows() -> Vec<Row> {
    vec![
        employee(1, "Alice", "Engineering", 55000),
        employee(2, "Bob", "Engineering", 60000),
        employee(3, "Charlie", "Marketing", 55000),
        employee(5, "Eve", "Engineering", 65000),
        employee(6, "Frank", "Finance", 72000),
    ]
}

/// Write `source.db` and `target.db` into `dir`, replacing existing tables.
pub fn write_demo(dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("cannot create {}: {e}", dir.display()))?;

    for (file, rows) in [("source.db", source_rows()), ("target.db", target_rows())] {
        let path = dir.join(file);
        sentinel_io::sqlite::write_table(&path, TABLE, DDL, &rows)
            .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
        log::debug!("seeded {} with {} row(s)", path.display(), rows.len());
    }

    Ok(())
}

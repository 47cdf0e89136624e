// Read-only access to SQLite source databases

use std::path::Path;

use bbb_frame::{Column, ColumnData, Frame};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::IoError;

/// Open an existing database read-only. A missing file is an error rather
/// than a new empty database.
pub fn open(path: &Path) -> Result<Connection, IoError> {
    if !path.is_file() {
        return Err(IoError::file(path, "database file not found"));
    }
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| IoError::file(path, e))
}

/// Return all table names, sorted.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>, IoError> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Return the column names of `table`, in declaration order.
pub fn list_fields(conn: &Connection, table: &str) -> Result<Vec<String>, IoError> {
    let stmt = conn.prepare(&format!("SELECT * FROM {} LIMIT 1", quote_ident(table)))?;
    Ok(stmt.column_names().into_iter().map(String::from).collect())
}

/// Fail unless `table` exists and has every field in `fields`.
pub fn require_table(conn: &Connection, table: &str, fields: &[&str]) -> Result<(), IoError> {
    if !list_tables(conn)?.iter().any(|t| t == table) {
        return Err(IoError::MissingTable(table.to_string()));
    }
    let present = list_fields(conn, table)?;
    for field in fields {
        if !present.iter().any(|p| p == field) {
            return Err(IoError::MissingField {
                table: table.to_string(),
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

/// Column accumulator; the dtype follows the storage classes seen.
#[derive(Default)]
struct Accum {
    ints: Vec<Option<i64>>,
    reals: Vec<Option<f64>>,
    texts: Vec<Option<String>>,
    saw_real: bool,
    saw_text: bool,
}

impl Accum {
    fn push(&mut self, value: ValueRef<'_>) {
        match value {
            ValueRef::Null => {
                self.ints.push(None);
                self.reals.push(None);
                self.texts.push(None);
            }
            ValueRef::Integer(n) => {
                self.ints.push(Some(n));
                self.reals.push(Some(n as f64));
                self.texts.push(Some(n.to_string()));
            }
            ValueRef::Real(x) => {
                self.saw_real = true;
                self.ints.push(None);
                self.reals.push(Some(x));
                self.texts.push(Some(x.to_string()));
            }
            ValueRef::Text(t) | ValueRef::Blob(t) => {
                self.saw_text = true;
                self.ints.push(None);
                self.reals.push(None);
                self.texts.push(Some(String::from_utf8_lossy(t).into_owned()));
            }
        }
    }

    fn finish(self) -> ColumnData {
        if self.saw_text {
            ColumnData::Str(self.texts)
        } else if self.saw_real {
            ColumnData::Float64(self.reals)
        } else {
            ColumnData::Int64(self.ints)
        }
    }
}

/// Read a whole table into a frame, in rowid order.
///
/// Column dtypes come from the values: integers only → `Int64`,
/// any real → `Float64`, any text → `Str`.
pub fn read_table(conn: &Connection, table: &str) -> Result<Frame, IoError> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(table)))?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut accums: Vec<Accum> = names.iter().map(|_| Accum::default()).collect();

    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        for (i, acc) in accums.iter_mut().enumerate() {
            acc.push(row.get_ref(i)?);
        }
    }

    let columns = names
        .into_iter()
        .zip(accums)
        .map(|(name, acc)| Column::new(name, acc.finish()))
        .collect();
    let frame = Frame::new(columns)?;
    debug!(table, rows = frame.nrows(), "read table");
    Ok(frame)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbb_frame::DType;
    use tempfile::tempdir;

    fn fixture(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("bbb.sqlite");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE buyer (acctnum INTEGER, buyer TEXT, training INTEGER);
             INSERT INTO buyer VALUES (10001, 'yes', 1), (10002, 'no', 0);
             CREATE TABLE purchase (acctnum INTEGER, date INTEGER, purchase TEXT, price REAL);
             INSERT INTO purchase VALUES (10001, 14000, 'child', 12.0), (10001, 14100, 'cook', 20.5);",
        )
        .unwrap();
        path
    }

    #[test]
    fn lists_tables_and_fields() {
        let dir = tempdir().unwrap();
        let conn = open(&fixture(dir.path())).unwrap();
        assert_eq!(list_tables(&conn).unwrap(), vec!["buyer", "purchase"]);
        assert_eq!(
            list_fields(&conn, "purchase").unwrap(),
            vec!["acctnum", "date", "purchase", "price"]
        );
    }

    #[test]
    fn require_table_reports_missing_pieces() {
        let dir = tempdir().unwrap();
        let conn = open(&fixture(dir.path())).unwrap();
        require_table(&conn, "buyer", &["acctnum", "buyer"]).unwrap();

        let err = require_table(&conn, "orders", &[]).unwrap_err();
        assert!(matches!(err, IoError::MissingTable(ref t) if t == "orders"));

        let err = require_table(&conn, "buyer", &["gender"]).unwrap_err();
        assert_eq!(err.to_string(), "table 'buyer' has no field 'gender'");
    }

    #[test]
    fn read_table_infers_dtypes() {
        let dir = tempdir().unwrap();
        let conn = open(&fixture(dir.path())).unwrap();
        let frame = read_table(&conn, "purchase").unwrap();
        assert_eq!(
            frame.dtypes(),
            vec![
                ("acctnum", DType::Int64),
                ("date", DType::Int64),
                ("purchase", DType::Str),
                ("price", DType::Float64),
            ]
        );
        assert_eq!(frame.nrows(), 2);
    }

    #[test]
    fn open_missing_database_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.sqlite");
        assert!(open(&path).is_err());
        assert!(!path.exists(), "open must not create a database");
    }
}

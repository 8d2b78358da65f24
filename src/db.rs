use crate::FormfillError;
use rusqlite::{Connection, OpenFlags, params};
use std::path::Path;

/// Tables and columns the backfill reads or writes. The schema itself belongs
/// to the application; it is checked here, never created or migrated.
const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("fund", &["fund_id", "title_json"]),
    ("round", &["round_id", "fund_id"]),
    ("section", &["section_id", "round_id"]),
    (
        "form",
        &[
            "form_id",
            "section_id",
            "name_in_apply_json",
            "runner_publish_name",
            "form_json",
        ],
    ),
];

/// Per-connection PRAGMAs only; nothing persisted in the database file.
fn apply_pragmas(conn: &Connection) -> Result<(), FormfillError> {
    // A second run waits this long for the write lock before failing.
    conn.pragma_update(None, "busy_timeout", 5000)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

fn verify_schema(conn: &Connection) -> Result<(), FormfillError> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    for (table, columns) in REQUIRED_COLUMNS {
        let present: Vec<String> = stmt
            .query_map(params![table], |r| r.get(0))?
            .collect::<Result<_, _>>()?;
        if present.is_empty() {
            return Err(FormfillError::Config(format!("missing table: {table}")));
        }
        let missing: Vec<&str> = columns
            .iter()
            .copied()
            .filter(|c| !present.iter().any(|p| p == c))
            .collect();
        if !missing.is_empty() {
            return Err(FormfillError::Config(format!(
                "table {table} is missing columns: {}",
                missing.join(", ")
            )));
        }
    }
    Ok(())
}

/// Open an existing application database for the backfill.
/// A missing file is an error; it is never created.
pub fn open_db(db_path: &Path) -> Result<Connection, FormfillError> {
    if !db_path.exists() {
        return Err(FormfillError::Config(format!(
            "database not found: {}",
            db_path.display()
        )));
    }

    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    apply_pragmas(&conn)?;
    verify_schema(&conn)?;

    Ok(conn)
}

/// Fixture: lay down the schema with migrations, then open it the way a run does.
#[cfg(test)]
pub(crate) fn create_test_db(db_path: &Path) -> Connection {
    let mut conn = Connection::open(db_path).unwrap();
    crate::schema::MIGRATIONS.to_latest(&mut conn).unwrap();
    drop(conn);
    open_db(db_path).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN_SCHEMA: &str = "
CREATE TABLE fund (fund_id TEXT PRIMARY KEY, title_json TEXT);
CREATE TABLE round (round_id TEXT PRIMARY KEY, fund_id TEXT);
CREATE TABLE section (section_id TEXT PRIMARY KEY, round_id TEXT);
CREATE TABLE form (
    form_id TEXT PRIMARY KEY,
    section_id TEXT,
    name_in_apply_json TEXT,
    runner_publish_name TEXT,
    form_json TEXT,
    created_at INTEGER
);
";

    #[test]
    fn opens_schema_it_did_not_create() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("app.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute_batch(PLAIN_SCHEMA).unwrap();
            conn.execute(
                "INSERT INTO form (form_id, name_in_apply_json) VALUES ('f1', '{\"en\":\"A\"}')",
                [],
            )
            .unwrap();
        }

        let conn = open_db(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM form WHERE form_json IS NULL", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
        // No migration bookkeeping written into the application database.
        let version: i64 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap();
        assert_eq!(version, 0);
    }

    #[test]
    fn missing_file_is_not_created() {
        let dir = tempfile::TempDir::new().unwrap();
        let typo = dir.path().join("typo").join("ap.db");

        let err = open_db(&typo).err().unwrap();
        assert!(matches!(err, FormfillError::Config(_)), "{err}");
        assert!(!typo.exists());
        assert!(!dir.path().join("typo").exists());
    }

    #[test]
    fn missing_table_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("app.db");
        Connection::open(&db_path)
            .unwrap()
            .execute_batch("CREATE TABLE form (form_id TEXT PRIMARY KEY, form_json TEXT);")
            .unwrap();

        let err = open_db(&db_path).err().unwrap();
        assert!(err.to_string().contains("missing table: fund"), "{err}");
    }

    #[test]
    fn missing_column_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("app.db");
        Connection::open(&db_path)
            .unwrap()
            .execute_batch(&PLAIN_SCHEMA.replace("runner_publish_name TEXT,", ""))
            .unwrap();

        let err = open_db(&db_path).err().unwrap();
        assert!(matches!(err, FormfillError::Config(_)), "{err}");
        assert!(err.to_string().contains("runner_publish_name"), "{err}");
    }

    #[test]
    fn journal_mode_left_alone() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("app.db");
        Connection::open(&db_path)
            .unwrap()
            .execute_batch(PLAIN_SCHEMA)
            .unwrap();

        drop(open_db(&db_path).unwrap());

        let conn = Connection::open(&db_path).unwrap();
        let mode: String = conn
            .pragma_query_value(None, "journal_mode", |r| r.get(0))
            .unwrap();
        assert_eq!(mode, "delete");
    }

    #[test]
    fn pragmas_applied() {
        let dir = tempfile::TempDir::new().unwrap();
        let conn = create_test_db(&dir.path().join("forms.db"));
        let fk: i64 = conn
            .pragma_query_value(None, "foreign_keys", |r| r.get(0))
            .unwrap();
        assert_eq!(fk, 1);
        let timeout: i64 = conn
            .pragma_query_value(None, "busy_timeout", |r| r.get(0))
            .unwrap();
        assert_eq!(timeout, 5000);
    }
}

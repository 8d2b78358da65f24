pub mod builder;
pub mod cli;
pub mod config;
pub mod db;
pub mod form;
pub mod populate;
pub mod schema;
pub mod session;

#[derive(Debug)]
pub enum FormfillError {
    Database(rusqlite::Error),
    Io(std::io::Error),
    Json(serde_json::Error),
    Config(String),
    /// The final flush/commit was rejected; every staged write was rolled back.
    Commit(rusqlite::Error),
}

impl std::fmt::Display for FormfillError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormfillError::Database(e) => write!(f, "database: {e}"),
            FormfillError::Io(e) => write!(f, "io: {e}"),
            FormfillError::Json(e) => write!(f, "json: {e}"),
            FormfillError::Config(msg) => write!(f, "config: {msg}"),
            FormfillError::Commit(e) => write!(f, "commit: {e}"),
        }
    }
}

impl std::error::Error for FormfillError {}

impl From<rusqlite::Error> for FormfillError {
    fn from(e: rusqlite::Error) -> Self {
        FormfillError::Database(e)
    }
}

impl From<std::io::Error> for FormfillError {
    fn from(e: std::io::Error) -> Self {
        FormfillError::Io(e)
    }
}

impl From<serde_json::Error> for FormfillError {
    fn from(e: serde_json::Error) -> Self {
        FormfillError::Json(e)
    }
}

impl From<rusqlite_migration::Error> for FormfillError {
    fn from(e: rusqlite_migration::Error) -> Self {
        match e {
            rusqlite_migration::Error::RusqliteError { query: _, err } => {
                FormfillError::Database(err)
            }
            other => FormfillError::Config(format!("migration: {other}")),
        }
    }
}

pub fn schema_migrations() -> &'static rusqlite_migration::Migrations<'static> {
    &schema::MIGRATIONS
}

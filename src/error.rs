use std::path::PathBuf;

use thiserror::Error;

use crate::parser::ParseError;
use crate::types::Table;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read feed {}: {source}", path.display())]
    ReadFeed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("failed to load {table} table: {source}")]
    Transaction {
        table: Table,
        #[source]
        source: rusqlite::Error,
    },

    #[error("import cancelled while loading {table} table: deadline exceeded")]
    Cancelled { table: Table },

    #[error("schema step '{step}' failed: {source}")]
    Schema {
        step: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn transaction(table: Table) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Transaction { table, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

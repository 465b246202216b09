//! Turning raw feed bytes into [`Feed`] records.

mod gtfs;

pub use gtfs::GtfsZipParser;

use thiserror::Error;

use crate::feed::Feed;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid feed archive: {0}")]
    Archive(#[source] gtfs_structures::Error),

    #[error("feed archive is missing required file {file}")]
    MissingFile { file: &'static str },

    #[error("malformed {file}: {source}")]
    Table {
        file: &'static str,
        #[source]
        source: gtfs_structures::Error,
    },

    #[error("invalid {field} '{value}' in {file}")]
    InvalidValue {
        file: &'static str,
        field: &'static str,
        value: String,
    },
}

/// Parses a complete feed from its raw bytes.
///
/// Implementations must not touch the store; a parse failure happens before
/// any row is written.
pub trait FeedParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<Feed, ParseError>;
}

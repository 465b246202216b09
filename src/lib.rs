//! # Feedvault
//!
//! Imports static GTFS transit feeds into a SQLite store with an R*Tree index
//! over stop locations. Usable both as a standalone binary and as a library.
//!
//! An import is skipped when the archive's SHA-256 fingerprint and its source
//! label both match the last successful import. Otherwise the feed is parsed
//! and loaded table by table, each table in its own transaction.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! feedvault = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use feedvault::import::Importer;
//! use feedvault::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/feedvault.db")?;
//! store.initialize()?;
//!
//! let report = Importer::new(&store).import_from_file("gtfs.zip")?;
//! println!("{:?} in {:?}", report.outcome, report.elapsed);
//!
//! for stop in store.list_stops()? {
//!     println!("{} {}", stop.id, stop.lat);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod import;
pub mod parser;
pub mod store;
pub mod types;

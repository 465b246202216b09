//! Conditional import of a feed into the store.
//!
//! [`Importer`] runs [`HashGate`] first. When the gate says proceed, the feed
//! is parsed and handed to the [`Loader`], and the import metadata is updated
//! once every table has committed.

mod gate;
mod loader;
mod report;

pub use gate::{Decision, HashGate, fingerprint};
pub use loader::{Loader, TableHook};
pub use report::{ImportOptions, ImportOutcome, ImportReport};

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::parser::{FeedParser, GtfsZipParser};
use crate::store::{SqliteStore, Store};
use crate::types::{ImportMetadata, Table};

pub struct Importer<'a> {
    store: &'a SqliteStore,
    parser: Box<dyn FeedParser>,
    options: ImportOptions,
    on_table_loaded: Option<Box<dyn Fn(Table, usize) + 'a>>,
}

impl<'a> Importer<'a> {
    /// An importer reading GTFS zip archives.
    pub fn new(store: &'a SqliteStore) -> Self {
        Self {
            store,
            parser: Box::new(GtfsZipParser),
            options: ImportOptions::default(),
            on_table_loaded: None,
        }
    }

    #[must_use]
    pub fn with_parser<P: FeedParser + 'static>(mut self, parser: P) -> Self {
        self.parser = Box::new(parser);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs `hook` after each table of a load commits.
    #[must_use]
    pub fn on_table_loaded<F: Fn(Table, usize) + 'a>(mut self, hook: F) -> Self {
        self.on_table_loaded = Some(Box::new(hook));
        self
    }

    /// Imports `bytes` unless they were already imported under `source`.
    ///
    /// Metadata only changes after a complete load. A failed load keeps
    /// the rows of every table committed before the failing one.
    pub fn import_from_bytes(&self, bytes: &[u8], source: &str) -> Result<ImportReport> {
        let started = Instant::now();
        let deadline = self.options.timeout.map(|timeout| started + timeout);

        let fingerprint = match HashGate::new(self.store).decide(bytes, source)? {
            Decision::Skip { fingerprint } => {
                info!("Feed from {source} unchanged ({}), skipping import", short(&fingerprint));
                return Ok(ImportReport::skipped(fingerprint, started.elapsed()));
            }
            Decision::Proceed { fingerprint } => fingerprint,
        };

        info!("Importing feed from {source} ({})", short(&fingerprint));

        let feed = self.parser.parse(bytes)?;
        for warning in &feed.warnings {
            warn!("{warning}");
        }

        let counts = Loader::new(self.store)
            .with_deadline(deadline)
            .on_table_loaded(self.on_table_loaded.as_deref())
            .load(&feed)?;

        self.store.set_import_metadata(&ImportMetadata {
            fingerprint: fingerprint.clone(),
            import_time: Utc::now(),
            source: source.to_string(),
        })?;

        let elapsed = started.elapsed();
        info!(
            agencies = counts.get(Table::Agency),
            routes = counts.get(Table::Route),
            stops = counts.get(Table::Stop),
            trips = counts.get(Table::Trip),
            stop_times = counts.get(Table::StopTime),
            shape_points = counts.get(Table::Shape),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Imported feed from {source}"
        );

        Ok(ImportReport {
            outcome: ImportOutcome::Imported,
            fingerprint,
            elapsed,
            counts,
            warnings: feed.warnings,
        })
    }

    /// Reads `path` and imports it with the path as source label.
    pub fn import_from_file<P: AsRef<Path>>(&self, path: P) -> Result<ImportReport> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| Error::ReadFeed {
            path: path.to_path_buf(),
            source,
        })?;
        self.import_from_bytes(&bytes, &path.display().to_string())
    }
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

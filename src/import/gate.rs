use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Result;
use crate::store::Store;

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Whether an import has to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed { fingerprint: String },
    Skip { fingerprint: String },
}

impl Decision {
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        match self {
            Decision::Proceed { fingerprint } | Decision::Skip { fingerprint } => fingerprint,
        }
    }

    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Decision::Skip { .. })
    }
}

/// Compares a feed's fingerprint and source label with the last successful
/// import.
pub struct HashGate<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> HashGate<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Skips only when both the fingerprint and the source match what is
    /// stored. Reads the metadata row and nothing else.
    pub fn decide(&self, bytes: &[u8], source: &str) -> Result<Decision> {
        let fingerprint = fingerprint(bytes);

        let decision = match self.store.get_import_metadata()? {
            Some(stored) if stored.fingerprint == fingerprint && stored.source == source => {
                Decision::Skip { fingerprint }
            }
            Some(stored) => {
                debug!(
                    fingerprint_changed = stored.fingerprint != fingerprint,
                    source_changed = stored.source != source,
                    "Feed differs from last import"
                );
                Decision::Proceed { fingerprint }
            }
            None => Decision::Proceed { fingerprint },
        };

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;
    use crate::store::SqliteStore;
    use crate::types::ImportMetadata;

    fn store_with(temp: &TempDir, bytes: &[u8], source: &str) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("gate.db")).unwrap();
        store.initialize().unwrap();
        store
            .set_import_metadata(&ImportMetadata {
                fingerprint: fingerprint(bytes),
                import_time: Utc::now(),
                source: source.to_string(),
            })
            .unwrap();
        store
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        assert_eq!(
            fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_proceeds_without_prior_import() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("gate.db")).unwrap();
        store.initialize().unwrap();

        let decision = HashGate::new(&store).decide(b"feed", "s1").unwrap();
        assert!(!decision.is_skip());
        assert_eq!(decision.fingerprint(), fingerprint(b"feed"));
    }

    #[test]
    fn test_skips_when_bytes_and_source_match() {
        let temp = TempDir::new().unwrap();
        let store = store_with(&temp, b"feed", "s1");

        let decision = HashGate::new(&store).decide(b"feed", "s1").unwrap();
        assert!(decision.is_skip());
    }

    #[test]
    fn test_proceeds_when_either_field_differs() {
        let temp = TempDir::new().unwrap();
        let store = store_with(&temp, b"feed", "s1");
        let gate = HashGate::new(&store);

        assert!(!gate.decide(b"feed!", "s1").unwrap().is_skip());
        assert!(!gate.decide(b"feed", "s2").unwrap().is_skip());
        assert!(!gate.decide(b"other", "s2").unwrap().is_skip());
    }
}

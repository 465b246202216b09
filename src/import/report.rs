use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::config::ImportConfig;
use crate::feed::ParseWarning;
use crate::types::TableCounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    /// Fingerprint and source matched the last import. Nothing was written.
    Skipped,
    Imported,
}

/// Result of one import call.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub outcome: ImportOutcome,
    pub fingerprint: String,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// Distinct rows written per table. Empty when skipped.
    pub counts: TableCounts,
    pub warnings: Vec<ParseWarning>,
}

impl ImportReport {
    pub(crate) fn skipped(fingerprint: String, elapsed: Duration) -> Self {
        Self {
            outcome: ImportOutcome::Skipped,
            fingerprint,
            elapsed,
            counts: TableCounts::default(),
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.outcome == ImportOutcome::Skipped
    }
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Time budget for one import call, measured from its start.
    pub timeout: Option<Duration>,
}

impl From<&ImportConfig> for ImportOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            timeout: config.timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Table;

    #[test]
    fn test_report_serializes_for_cli_output() {
        let mut counts = TableCounts::default();
        counts.insert(Table::Stop, 2);
        let report = ImportReport {
            outcome: ImportOutcome::Imported,
            fingerprint: "ab12".to_string(),
            elapsed: Duration::from_millis(1500),
            counts,
            warnings: vec![ParseWarning::new("shapes.txt", "file not present")],
        };

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "imported");
        assert_eq!(json["elapsed_ms"], 1500);
        assert_eq!(json["counts"]["stop"], 2);
        assert_eq!(json["warnings"][0]["file"], "shapes.txt");
    }

    #[test]
    fn test_options_follow_config_timeout() {
        let config = ImportConfig {
            timeout_secs: Some(30),
        };
        assert_eq!(
            ImportOptions::from(&config).timeout,
            Some(Duration::from_secs(30))
        );
        assert_eq!(ImportOptions::default().timeout, None);
    }
}

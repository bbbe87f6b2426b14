//! Revision entries

use crate::error::IndexError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tm_core::results::lookup;
use tm_core::{MetricNotFound, MetricValue, OperatorOutput, Revision, RunResult};

/// Leading byte of every stored entry
const ENTRY_FORMAT_V1: u8 = 1;

/// Every metric value measured at one revision
///
/// Created once at build time and never edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionEntry {
    pub revision: Revision,
    /// operator -> file -> metrics
    pub operators: BTreeMap<String, OperatorOutput>,
    /// Operators that were requested but failed for this revision
    pub unavailable: BTreeSet<String>,
}

impl RevisionEntry {
    /// Build an entry from a merged run; unavailable operators are recorded by name only
    pub fn new(revision: Revision, run: RunResult) -> Self {
        let (operators, unavailable) = run.into_parts();
        Self {
            revision,
            operators,
            unavailable,
        }
    }

    pub fn key(&self) -> &str {
        &self.revision.key
    }

    /// Look up a value; `object` selects a function/class within the file
    pub fn get(
        &self,
        operator: &str,
        file: &str,
        object: Option<&str>,
        metric: &str,
    ) -> Result<&MetricValue, MetricNotFound> {
        let output = self
            .operators
            .get(operator)
            .ok_or_else(|| MetricNotFound::OperatorNotRun {
                operator: operator.to_string(),
            })?;
        lookup(output, operator, file, object, metric)
    }

    /// Files measured by an operator, in path order
    pub fn files(&self, operator: &str) -> Vec<&str> {
        self.operators
            .get(operator)
            .map(|output| output.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Encode for storage: format byte followed by bincode
    pub fn serialize(&self) -> Result<Vec<u8>, IndexError> {
        let mut bytes = vec![ENTRY_FORMAT_V1];
        bincode::serialize_into(&mut bytes, self)
            .map_err(|e| IndexError::Corrupt(format!("failed to encode {}: {}", self.key(), e)))?;
        Ok(bytes)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, IndexError> {
        match bytes.split_first() {
            Some((&ENTRY_FORMAT_V1, body)) => bincode::deserialize(body)
                .map_err(|e| IndexError::Corrupt(format!("failed to decode entry: {}", e))),
            Some((version, _)) => Err(IndexError::Corrupt(format!(
                "unsupported entry format {}",
                version
            ))),
            None => Err(IndexError::Corrupt("empty entry".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tm_core::{FileMetrics, MetricMap, OperatorOutcome};

    pub(crate) fn revision(key: &str) -> Revision {
        Revision {
            key: key.to_string(),
            author_name: "Ada".into(),
            author_email: "ada@example.com".into(),
            message: format!("commit {}", key),
            timestamp: 1_700_000_000,
            archiver: "git".into(),
        }
    }

    fn run_with_rank() -> RunResult {
        let mut total = MetricMap::new();
        total.insert("mi".into(), MetricValue::Numeric(71.5));
        total.insert("rank".into(), MetricValue::Text("A".into()));
        let mut output = OperatorOutput::new();
        output.insert("app.py".into(), FileMetrics::with_total(total));

        let mut run = RunResult::new();
        run.insert("maintainability", OperatorOutcome::Completed(output));
        run.insert(
            "raw",
            OperatorOutcome::Unavailable {
                reason: "unreadable".into(),
            },
        );
        run
    }

    #[test]
    fn test_entry_from_run() {
        let entry = RevisionEntry::new(revision("abc"), run_with_rank());
        assert!(entry.unavailable.contains("raw"));
        assert_eq!(entry.files("maintainability"), vec!["app.py"]);
        assert_eq!(
            entry.get("maintainability", "app.py", None, "rank"),
            Ok(&MetricValue::Text("A".into()))
        );
        assert!(matches!(
            entry.get("raw", "app.py", None, "loc"),
            Err(MetricNotFound::OperatorNotRun { .. })
        ));
    }

    #[test]
    fn test_encoding_preserves_value_kinds() {
        let entry = RevisionEntry::new(revision("abc"), run_with_rank());
        let decoded = RevisionEntry::deserialize(&entry.serialize().unwrap()).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(matches!(
            RevisionEntry::deserialize(&[9, 0, 0]),
            Err(IndexError::Corrupt(_))
        ));
        assert!(matches!(RevisionEntry::deserialize(&[]), Err(IndexError::Corrupt(_))));
    }
}

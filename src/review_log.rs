// 📜 Review Log - append-only JSON array of classified reviews
//
// Not a true log: every append reads the whole file, extends it in memory and
// writes the whole file back (temp file + rename). Records are never edited.
// A missing or unparsable file reads as empty.

use crate::entities::{Place, ReviewRecord};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// How logged reviews are re-attached to places on reload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewMatch {
    /// Record's `entity_id` equals the place id
    #[default]
    ById,

    /// Place name (trimmed, lowercased) is a substring of the logged name.
    /// Matches older logs without ids, but also attaches reviews of any
    /// place whose name merely contains this one's.
    NameSubstring,
}

impl ReviewMatch {
    pub fn matches(&self, place: &Place, record: &ReviewRecord) -> bool {
        match self {
            ReviewMatch::ById => record.entity_id.as_deref() == Some(place.id.as_str()),
            ReviewMatch::NameSubstring => {
                let query = place.name.trim().to_lowercase();
                record.entity_name.trim().to_lowercase().contains(&query)
            }
        }
    }
}

pub struct ReviewLog {
    path: PathBuf,
    // Serializes read-modify-write cycles
    writer: Mutex<()>,
}

impl ReviewLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ReviewLog {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every readable record in the log; empty when the file is missing or
    /// not a JSON array. Records that fail to parse are skipped.
    pub fn load(&self) -> Vec<ReviewRecord> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Review log {} does not exist yet", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read review log {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(values) => values
                .into_iter()
                .enumerate()
                .filter_map(|(i, value)| match serde_json::from_value::<ReviewRecord>(value) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("Skipping bad record #{} in review log {}: {}", i, self.path.display(), e);
                        None
                    }
                })
                .collect(),
            Err(e) => {
                warn!(
                    "Review log {} is not a valid record array, treating as empty: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Append `records` and rewrite the whole file.
    /// Nothing is written when `records` is empty. Returns the new log length.
    pub fn append(&self, records: &[ReviewRecord]) -> Result<usize> {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());

        if records.is_empty() {
            return Ok(self.load().len());
        }

        let mut all = self.load();
        all.extend_from_slice(records);
        self.write_all(&all)?;

        debug!(
            "Appended {} reviews to {} ({} total)",
            records.len(),
            self.path.display(),
            all.len()
        );
        Ok(all.len())
    }

    fn write_all(&self, records: &[ReviewRecord]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, records)?;
        tmp.write_all(b"\n")?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Records belonging to `place` under `mode`, in log order
    pub fn reviews_for(&self, place: &Place, mode: ReviewMatch) -> Vec<ReviewRecord> {
        filter_reviews(&self.load(), place, mode)
    }
}

pub fn filter_reviews(records: &[ReviewRecord], place: &Place, mode: ReviewMatch) -> Vec<ReviewRecord> {
    records
        .iter()
        .filter(|r| mode.matches(place, r))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: Option<&str>, name: &str, emotion: &str) -> ReviewRecord {
        ReviewRecord {
            entity_id: id.map(|s| s.to_string()),
            entity_name: name.to_string(),
            author: "Ana".to_string(),
            text: format!("review of {}", name),
            emotion: emotion.to_string(),
            confidence: 0.8,
            run_id: None,
            classified_at: None,
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = ReviewLog::new(dir.path().join("reviews.json"));
        assert!(log.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty_and_append_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.json");
        std::fs::write(&path, "{not json").unwrap();

        let log = ReviewLog::new(&path);
        assert!(log.load().is_empty());

        let total = log.append(&[record(Some("X1"), "Bulgakov Cafe", "joy")]).unwrap();
        assert_eq!(total, 1);
        assert_eq!(log.load().len(), 1);
    }

    #[test]
    fn test_bad_record_does_not_hide_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.json");
        let log = ReviewLog::new(&path);
        log.append(&[
            record(Some("X1"), "Bulgakov Cafe", "joy"),
            record(Some("X2"), "Roata", "anger"),
        ])
        .unwrap();

        // A null confidence, as written for a NaN score
        let mut values: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        values[1]["confidence"] = serde_json::Value::Null;
        std::fs::write(&path, serde_json::to_string(&values).unwrap()).unwrap();

        let loaded = log.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].entity_name, "Bulgakov Cafe");

        let total = log.append(&[record(Some("X3"), "Samsara", "neutral")]).unwrap();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_append_extends_and_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = ReviewLog::new(dir.path().join("nested").join("reviews.json"));

        log.append(&[record(Some("X1"), "Bulgakov Cafe", "joy")]).unwrap();
        log.append(&[
            record(Some("X2"), "Roata", "anger"),
            record(Some("X1"), "Bulgakov Cafe", "sadness"),
        ])
        .unwrap();

        let all = log.load();
        let emotions: Vec<&str> = all.iter().map(|r| r.emotion.as_str()).collect();
        assert_eq!(emotions, vec!["joy", "anger", "sadness"]);
    }

    #[test]
    fn test_empty_append_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.json");
        let log = ReviewLog::new(&path);

        assert_eq!(log.append(&[]).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_match_by_id_ignores_similar_names() {
        let records = vec![
            record(Some("X1"), "Bulgakov", "joy"),
            record(Some("X9"), "Bulgakov Cafe & Bar", "anger"),
        ];
        let place = Place::new("X1", "Bulgakov");

        let by_id = filter_reviews(&records, &place, ReviewMatch::ById);
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].emotion, "joy");

        // Substring matching leaks the other place's review
        let by_name = filter_reviews(&records, &place, ReviewMatch::NameSubstring);
        assert_eq!(by_name.len(), 2);
    }

    #[test]
    fn test_match_by_id_skips_legacy_records() {
        let records = vec![record(None, "Bulgakov", "joy")];
        let place = Place::new("X1", "Bulgakov");

        assert!(filter_reviews(&records, &place, ReviewMatch::ById).is_empty());
        assert_eq!(filter_reviews(&records, &place, ReviewMatch::NameSubstring).len(), 1);
    }
}

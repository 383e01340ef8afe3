// 👥 Headcount Joiner - employee counts from an external business registry
//
// The lookup is best effort: every requested name gets a row back, holding
// either a headcount or an error string. The merge is a left join on exact,
// case-sensitive name equality; anything unmatched or unparsable is absent.

use crate::error::Result;
use crate::snapshot::SnapshotRow;
use crate::store::EntityStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One lookup result, parallel to the requested names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadcountRow {
    #[serde(rename = "Name")]
    pub name: String,

    /// Headcount as scraped, or an error string
    #[serde(rename = "Employees")]
    pub raw: String,
}

impl HeadcountRow {
    pub fn new(name: impl Into<String>, raw: impl Into<String>) -> Self {
        HeadcountRow {
            name: name.into(),
            raw: raw.into(),
        }
    }

    pub fn headcount(&self) -> Option<u32> {
        parse_headcount(&self.raw)
    }
}

pub trait HeadcountLookup {
    fn lookup(&self, names: &[String]) -> Vec<HeadcountRow>;
}

/// Digits with optional thousands separators ("1,200", "1.200", "1 200").
/// Anything else, including error strings, ranges and fractions, is `None`.
pub fn parse_headcount(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // "12.0" is how a float column round-trips through some exporters
    let raw = raw.strip_suffix(".0").unwrap_or(raw);

    // Separators only count as thousands grouping: "12.5" is not 125
    let groups: Vec<&str> = raw.split([',', '.', ' ', '\u{a0}']).collect();
    if groups.iter().any(|g| g.is_empty() || !g.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    if groups.len() > 1 && (groups[0].len() > 3 || groups[1..].iter().any(|g| g.len() != 3)) {
        return None;
    }
    groups.concat().parse().ok()
}

fn first_match_index(lookups: &[HeadcountRow]) -> HashMap<&str, Option<u32>> {
    let mut by_name = HashMap::new();
    for row in lookups {
        by_name.entry(row.name.as_str()).or_insert_with(|| row.headcount());
    }
    by_name
}

/// Left join snapshot rows with lookup results. Returns rows with a headcount.
pub fn merge_headcounts(rows: &mut [SnapshotRow], lookups: &[HeadcountRow]) -> usize {
    let by_name = first_match_index(lookups);

    let mut matched = 0;
    for row in rows.iter_mut() {
        row.employees = by_name.get(row.name.as_str()).copied().flatten();
        if row.employees.is_some() {
            matched += 1;
        }
    }

    info!("Merged headcounts: {}/{} rows matched", matched, rows.len());
    matched
}

/// Same join applied directly to the places in a store
pub fn apply_to_store(store: &mut EntityStore, lookups: &[HeadcountRow]) -> usize {
    let by_name = first_match_index(lookups);

    let mut matched = 0;
    for place in store.iter_mut() {
        place.employee_count = by_name.get(place.name.as_str()).copied().flatten();
        if place.employee_count.is_some() {
            matched += 1;
        }
    }
    matched
}

// ============================================================================
// CSV SOURCE
// ============================================================================

/// Headcounts scraped earlier and saved as `Name,Employees`
pub struct CsvHeadcountSource {
    path: PathBuf,
}

impl CsvHeadcountSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvHeadcountSource { path: path.into() }
    }

    /// Every row in the file; empty when the file is missing or unreadable
    pub fn read_all(&self) -> Vec<HeadcountRow> {
        read_headcounts(&self.path)
    }
}

impl HeadcountLookup for CsvHeadcountSource {
    fn lookup(&self, names: &[String]) -> Vec<HeadcountRow> {
        let by_name: HashMap<String, String> = self
            .read_all()
            .into_iter()
            .rev() // first row wins after collect
            .map(|r| (r.name, r.raw))
            .collect();

        names
            .iter()
            .map(|name| match by_name.get(name) {
                Some(raw) => HeadcountRow::new(name.clone(), raw.clone()),
                None => HeadcountRow::new(name.clone(), "Error: not found"),
            })
            .collect()
    }
}

pub fn read_headcounts(path: &Path) -> Vec<HeadcountRow> {
    let mut rdr = match csv::Reader::from_path(path) {
        Ok(rdr) => rdr,
        Err(e) => {
            warn!("Headcount file {} unavailable: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut rows = Vec::new();
    for result in rdr.deserialize::<HeadcountRow>() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => warn!("Skipping bad headcount row in {}: {}", path.display(), e),
        }
    }
    rows
}

pub fn write_headcounts(path: &Path, rows: &[HeadcountRow]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Place;

    fn snapshot_row(name: &str) -> SnapshotRow {
        SnapshotRow {
            name: name.to_string(),
            address: "N/A".to_string(),
            rating: None,
            id: format!("id-{}", name),
            reviews: String::new(),
            distance: None,
            employees: None,
        }
    }

    #[test]
    fn test_parse_headcount() {
        assert_eq!(parse_headcount("12"), Some(12));
        assert_eq!(parse_headcount(" 1,200 "), Some(1200));
        assert_eq!(parse_headcount("1.200"), Some(1200));
        assert_eq!(parse_headcount("35.0"), Some(35));
        assert_eq!(parse_headcount("1,200.0"), Some(1200));
        assert_eq!(parse_headcount("12.5"), None);
        assert_eq!(parse_headcount("1,2"), None);
        assert_eq!(parse_headcount("1.2345"), None);
        assert_eq!(parse_headcount("Error: timeout"), None);
        assert_eq!(parse_headcount("10-49"), None);
        assert_eq!(parse_headcount(""), None);
    }

    #[test]
    fn test_merge_is_exact_case_sensitive_left_join() {
        let mut rows = vec![
            snapshot_row("Bulgakov Cafe"),
            snapshot_row("bulgakov cafe"),
            snapshot_row("Roata"),
            snapshot_row("Samsara"),
        ];
        let lookups = vec![
            HeadcountRow::new("Bulgakov Cafe", "14"),
            HeadcountRow::new("Roata", "Error: captcha"),
            HeadcountRow::new("Bulgakov Cafe", "99"),
        ];

        let matched = merge_headcounts(&mut rows, &lookups);

        assert_eq!(matched, 1);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].employees, Some(14));
        assert_eq!(rows[1].employees, None);
        assert_eq!(rows[2].employees, None);
        assert_eq!(rows[3].employees, None);
    }

    #[test]
    fn test_apply_to_store() {
        let mut store: EntityStore = vec![Place::new("A", "Roata"), Place::new("B", "Samsara")]
            .into_iter()
            .collect();

        let matched = apply_to_store(&mut store, &[HeadcountRow::new("Samsara", "8")]);

        assert_eq!(matched, 1);
        assert_eq!(store.get("A").unwrap().employee_count, None);
        assert_eq!(store.get("B").unwrap().employee_count, Some(8));
    }

    #[test]
    fn test_csv_source_roundtrip_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("employee_data.csv");
        write_headcounts(
            &path,
            &[HeadcountRow::new("Roata", "23"), HeadcountRow::new("Samsara", "n/a")],
        )
        .unwrap();

        let source = CsvHeadcountSource::new(&path);
        let names = vec!["Samsara".to_string(), "Roata".to_string(), "Marty".to_string()];
        let rows = source.lookup(&names);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].headcount(), None);
        assert_eq!(rows[1].headcount(), Some(23));
        assert_eq!(rows[2].name, "Marty");
        assert!(rows[2].raw.starts_with("Error"));
    }

    #[test]
    fn test_missing_csv_source_yields_errors_not_panics() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvHeadcountSource::new(dir.path().join("absent.csv"));

        let rows = source.lookup(&["Roata".to_string()]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].headcount(), None);
    }
}

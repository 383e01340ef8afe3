// 💾 Snapshot - EntityStore <-> flat CSV table
//
// Columns are addressed by header name, so their order in the file does not
// matter. Numeric cells are parsed leniently: empty or garbage becomes absent.
// Reviews are not stored in the table (only a text summary); on load they are
// re-attached from the review log.

use crate::entities::Place;
use crate::entities::ReviewRecord;
use crate::error::Result;
use crate::headcount::parse_headcount;
use crate::review_log::{filter_reviews, ReviewLog, ReviewMatch};
use crate::sentiment::truncate_chars;
use crate::store::{EntityStore, InsertOutcome};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tracing::{error, info, warn};

/// Separator between reviews in the summary column
pub const REVIEW_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Address", default)]
    pub address: String,

    #[serde(rename = "Rating", default, deserialize_with = "lenient_f64")]
    pub rating: Option<f64>,

    #[serde(rename = "Place ID")]
    pub id: String,

    /// "author: text" per review, joined by "; "
    #[serde(rename = "Reviews", default)]
    pub reviews: String,

    #[serde(rename = "Distance from Center", default, deserialize_with = "lenient_f64")]
    pub distance: Option<f64>,

    #[serde(rename = "Employees", default, deserialize_with = "lenient_headcount")]
    pub employees: Option<u32>,
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite()))
}

fn lenient_headcount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_headcount))
}

/// "author: text" summary of the attached reviews, each text capped at `cap` chars
pub fn review_summary(reviews: &[ReviewRecord], cap: usize) -> String {
    reviews
        .iter()
        .map(|r| format!("{}: {}", r.author, truncate_chars(&r.text, cap)))
        .collect::<Vec<_>>()
        .join(REVIEW_SEPARATOR)
}

// ============================================================================
// EXPORT
// ============================================================================

/// One row per place, in store order
pub fn export(store: &EntityStore, review_cap: usize) -> Vec<SnapshotRow> {
    store
        .iter()
        .map(|place| SnapshotRow {
            name: place.name.clone(),
            address: place.address.clone(),
            rating: place.rating,
            id: place.id.clone(),
            reviews: review_summary(&place.reviews, review_cap),
            distance: place.distance_from_center,
            employees: place.employee_count,
        })
        .collect()
}

pub fn write_snapshot(path: &Path, rows: &[SnapshotRow]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

// ============================================================================
// LOAD
// ============================================================================

pub fn read_snapshot(path: &Path) -> Result<Vec<SnapshotRow>> {
    let mut rdr = csv::Reader::from_path(path)?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

/// Rebuild a store from rows, attaching matching records from `reviews`
pub fn load(rows: Vec<SnapshotRow>, reviews: &[ReviewRecord], mode: ReviewMatch) -> EntityStore {
    let mut store = EntityStore::new();

    for row in rows {
        if row.id.trim().is_empty() || row.name.trim().is_empty() {
            warn!("Skipping snapshot row without id or name: {:?}", row.name);
            continue;
        }

        let address = if row.address.trim().is_empty() {
            crate::entities::place::MISSING_ADDRESS.to_string()
        } else {
            row.address
        };

        let mut place = Place::new(row.id, row.name)
            .with_address(address)
            .with_rating(row.rating)
            .with_distance(row.distance);
        place.employee_count = row.employees;
        place.reviews = filter_reviews(reviews, &place, mode);

        if store.insert(place) == InsertOutcome::Duplicate {
            warn!("Duplicate place id in snapshot, keeping the first row");
        }
    }

    store
}

/// Load a snapshot file and re-attach reviews from `log`.
/// Any read or parse failure is logged and yields an empty store.
pub fn load_snapshot_file(path: &Path, log: &ReviewLog, mode: ReviewMatch) -> EntityStore {
    match read_snapshot(path) {
        Ok(rows) => {
            let store = load(rows, &log.load(), mode);
            info!("Loaded {} places from {}", store.len(), path.display());
            store
        }
        Err(e) => {
            error!("Error loading snapshot {}: {}", path.display(), e);
            EntityStore::new()
        }
    }
}

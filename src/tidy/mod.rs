//! Wide-to-long reshaping of the crop-yield table.
//!
//! The yields table arrives wide (one column per crop); the fitter wants it
//! long (one row per entity/year/crop). This is a pure transform: before
//! filtering, the output has exactly `rows × crop columns` entries, in row
//! order then crop-column order, so downstream results are reproducible.
//!
//! Filters applied while reshaping:
//! - crop label must be in the target subset
//! - entity must be in the cohort allow-list
//! - the yield cell must be present (non-missing values are already known to
//!   be finite from ingest)

use std::collections::HashSet;

use crate::domain::Observation;
use crate::io::ingest::{YieldTable, YIELD_COLUMN_SUFFIX};

/// Crop label for a wide column: the column name with the fixed
/// quantity suffix stripped. `wheat_tonnes_per_hectare` → `wheat`.
pub fn crop_label(column: &str) -> &str {
    column.strip_suffix(YIELD_COLUMN_SUFFIX).unwrap_or(column)
}

/// Reshape the wide table into tidy observations, filtered to the crop
/// subset and the cohort.
pub fn reshape_long(table: &YieldTable, crops: &[String], cohort: &[String]) -> Vec<Observation> {
    let targets: HashSet<&str> = crops.iter().map(String::as_str).collect();
    let allowed: HashSet<&str> = cohort.iter().map(String::as_str).collect();

    let labels: Vec<&str> = table.crop_columns.iter().map(|c| crop_label(c)).collect();

    let mut out = Vec::new();
    for row in &table.rows {
        if !allowed.contains(row.entity.as_str()) {
            continue;
        }
        for (label, value) in labels.iter().zip(&row.values) {
            if !targets.contains(label) {
                continue;
            }
            let Some(yield_) = *value else { continue };
            out.push(Observation {
                entity: row.entity.clone(),
                year: row.year,
                crop: label.to_string(),
                yield_,
            });
        }
    }

    out
}

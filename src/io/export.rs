//! Export adjusted slope records to CSV and JSON.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts; the JSON document additionally carries enough metadata (tool,
//! crop subset, cohort) to be read on its own.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{SlopeRecord, TrendsFile};
use crate::error::AppError;

/// Render the record CSV (header + one row per record, in record order).
pub fn render_trends_csv(records: &[SlopeRecord]) -> String {
    let mut out = String::new();
    out.push_str("entity,crop,estimate,std_error,t_value,p_value_adj\n");
    for r in records {
        out.push_str(&format!(
            "{},{},{:.10},{:.10},{:.6},{:.10}\n",
            r.entity, r.crop, r.estimate, r.std_error, r.t_value, r.p_value
        ));
    }
    out
}

/// Write the record CSV to a file.
pub fn write_trends_csv(path: &Path, records: &[SlopeRecord]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::configuration(format!(
            "Failed to create export CSV '{}': {e}",
            path.display()
        ))
    })?;
    file.write_all(render_trends_csv(records).as_bytes())
        .map_err(|e| AppError::configuration(format!("Failed to write export CSV: {e}")))?;
    Ok(())
}

/// Write the JSON export document.
pub fn write_trends_json(
    path: &Path,
    records: &[SlopeRecord],
    crops: &[String],
    cohort: &[String],
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::configuration(format!(
            "Failed to create export JSON '{}': {e}",
            path.display()
        ))
    })?;

    let doc = TrendsFile {
        tool: "yt".to_string(),
        crops: crops.to_vec(),
        cohort: cohort.to_vec(),
        records: records.to_vec(),
    };

    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::configuration(format!("Failed to write export JSON: {e}")))?;

    Ok(())
}

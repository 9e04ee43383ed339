//! Debug bundle writer for inspecting a run offline.
//!
//! The bundle is a single markdown file under `debug/` capturing the run
//! configuration, the selected cohort, per-group observation counts, and
//! every skipped group with its reason.

use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::app::pipeline::RunOutput;
use crate::domain::PipelineConfig;
use crate::error::AppError;
use crate::fit::group_observations;

pub fn write_debug_bundle(run: &RunOutput, config: &PipelineConfig) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("debug");
    create_dir_all(&dir)
        .map_err(|e| AppError::configuration(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("yt_debug_{ts}.md"));

    let mut file = File::create(&path)
        .map_err(|e| AppError::configuration(format!("Failed to create debug file: {e}")))?;

    let mut out = String::new();
    out.push_str("# yt debug bundle\n");
    out.push_str(&format!("- generated: {}\n", Local::now().to_rfc3339()));
    out.push_str(&format!("- yields source: {}\n", config.yields_source));
    out.push_str(&format!("- land-use source: {}\n", config.land_use_source));
    out.push_str(&format!("- crops: {}\n", config.crops.join(", ")));
    out.push_str(&format!("- top_n: {}\n", config.top_n));

    out.push_str(&format!("\n## Cohort ({})\n", run.cohort.len()));
    for (rank, entity) in run.cohort.iter().enumerate() {
        out.push_str(&format!("{}. {entity}\n", rank + 1));
    }

    out.push_str("\n## Groups\n");
    for (key, members) in group_observations(&run.observations) {
        let year_min = members.iter().map(|o| o.year).min().unwrap_or(0);
        let year_max = members.iter().map(|o| o.year).max().unwrap_or(0);
        out.push_str(&format!(
            "- {key}: n={} years={year_min}..{year_max}\n",
            members.len()
        ));
    }

    out.push_str(&format!("\n## Skipped ({})\n", run.skipped.len()));
    for s in &run.skipped {
        out.push_str(&format!("- {}: {}\n", s.key, s.reason));
    }

    file.write_all(out.as_bytes())
        .map_err(|e| AppError::configuration(format!("Failed to write debug bundle: {e}")))?;

    Ok(path)
}

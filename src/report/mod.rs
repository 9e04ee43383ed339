//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{PipelineConfig, SkippedGroup, SlopeRecord};
use crate::io::ingest::{LandUseTable, YieldTable};

/// Format the full run summary (dataset stats + cohort + fit counts).
pub fn format_run_summary(
    yields: &YieldTable,
    land_use: &LandUseTable,
    cohort: &[String],
    n_observations: usize,
    records: &[SlopeRecord],
    skipped: &[SkippedGroup],
    config: &PipelineConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== yt - Crop Yield Trend Screen (OWID-based) ===\n");
    out.push_str(&format!(
        "Yields: {} rows read, {} used, {} row errors\n",
        yields.rows_read,
        yields.rows.len(),
        yields.row_errors.len()
    ));
    out.push_str(&format!(
        "Land use: {} rows read, {} used, {} row errors\n",
        land_use.rows_read,
        land_use.rows.len(),
        land_use.row_errors.len()
    ));
    out.push_str(&format!(
        "Crops: {} | Cohort: {} of top {} requested\n",
        config.crops.join(", "),
        cohort.len(),
        config.top_n
    ));
    out.push_str(&format!(
        "Observations: {n_observations} | Groups fit: {} | skipped: {}\n",
        records.len(),
        skipped.len()
    ));

    if !skipped.is_empty() {
        out.push('\n');
        out.push_str(&format_skipped(skipped));
    }

    out
}

/// Format the trend table, sorted by adjusted p-value ascending (ties keep
/// record order). A `*` marks records below the conventional 0.05 threshold.
pub fn format_trends_table(records: &[SlopeRecord]) -> String {
    let mut sorted: Vec<&SlopeRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        a.p_value
            .partial_cmp(&b.p_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out = String::new();
    out.push_str("Yield trends (slope of tonnes/hectare per year, BH-adjusted p):\n");
    out.push_str(&format!(
        "{:<4}{:<28}{:<10}{:>12}{:>12}{:>10}{:>14}\n",
        "", "entity", "crop", "estimate", "std_error", "t", "p_adj"
    ));
    for r in sorted {
        let marker = if r.p_value < 0.05 { "*" } else { " " };
        out.push_str(&format!(
            "{marker:<4}{:<28}{:<10}{:>12.5}{:>12.5}{:>10.2}{:>14.3e}\n",
            truncate(&r.entity, 27),
            truncate(&r.crop, 9),
            r.estimate,
            r.std_error,
            r.t_value,
            r.p_value
        ));
    }
    out
}

/// Format the skipped-group report (always shown when non-empty; skips must
/// never be silent).
pub fn format_skipped(skipped: &[SkippedGroup]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Skipped groups ({}):\n", skipped.len()));
    for s in skipped {
        out.push_str(&format!("  - {}: {}\n", s.key, s.reason));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GroupKey, SkipReason};

    fn record(entity: &str, crop: &str, p: f64) -> SlopeRecord {
        SlopeRecord {
            entity: entity.to_string(),
            crop: crop.to_string(),
            estimate: 0.02,
            std_error: 0.005,
            t_value: 4.0,
            p_value: p,
        }
    }

    #[test]
    fn trend_table_sorts_by_adjusted_p() {
        let records = vec![
            record("Brazil", "rice", 0.2),
            record("India", "wheat", 0.001),
        ];
        let table = format_trends_table(&records);

        let india = table.find("India").unwrap();
        let brazil = table.find("Brazil").unwrap();
        assert!(india < brazil);
    }

    #[test]
    fn significant_records_are_starred() {
        let table = format_trends_table(&[record("India", "wheat", 0.001)]);
        let row = table.lines().nth(2).unwrap();
        assert!(row.starts_with('*'));
    }

    #[test]
    fn skipped_report_names_group_and_reason() {
        let skipped = vec![SkippedGroup {
            key: GroupKey {
                entity: "India".to_string(),
                crop: "barley".to_string(),
            },
            reason: SkipReason::InsufficientData {
                n_obs: 1,
                distinct_years: 1,
            },
        }];
        let out = format_skipped(&skipped);
        assert!(out.contains("India/barley"));
        assert!(out.contains("insufficient data"));
    }
}

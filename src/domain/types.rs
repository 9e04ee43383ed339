//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where a tabular dataset comes from.
///
/// Both inputs are delimited text with a header row; they can be fetched over
/// HTTPS or read from disk (useful for offline runs and tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    Url(String),
    Path(PathBuf),
}

impl TableSource {
    /// Interpret a CLI argument as a URL or a local path.
    ///
    /// Anything starting with `http://` or `https://` is a URL; everything
    /// else is treated as a filesystem path.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            TableSource::Url(raw.to_string())
        } else {
            TableSource::Path(PathBuf::from(raw))
        }
    }
}

impl std::fmt::Display for TableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableSource::Url(url) => write!(f, "{url}"),
            TableSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One tidy observation: a single crop's yield for one entity in one year.
///
/// Produced by the reshaper and immutable afterwards; the fundamental unit
/// consumed by the grouped fitter.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub entity: String,
    pub year: i32,
    pub crop: String,
    /// Yield in tonnes per hectare.
    pub yield_: f64,
}

/// The key a regression group is formed over.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub entity: String,
    pub crop: String,
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.entity, self.crop)
    }
}

/// Full output of a single per-group regression.
///
/// Owned by its group, read once to extract the year-term `SlopeRecord`, and
/// then discarded; nothing downstream mutates it.
#[derive(Debug, Clone)]
pub struct TrendFit {
    pub intercept: f64,
    pub slope: f64,
    pub slope_se: f64,
    pub t_value: f64,
    /// Two-sided p-value against slope = 0.
    pub p_value: f64,
    /// Residual degrees of freedom (n - 2).
    pub df: usize,
    pub n_obs: usize,
}

/// One row of the pipeline's final output: the year coefficient of one group.
///
/// `p_value` holds the raw two-sided p-value until the whole batch exists;
/// the corrector then overwrites it with the adjusted value, in place, exactly
/// once. No other field changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlopeRecord {
    pub entity: String,
    pub crop: String,
    /// Slope estimate (tonnes per hectare per year).
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

/// Why a group produced no `SlopeRecord`.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Too few observations or too few distinct years to regress and test.
    InsufficientData { n_obs: usize, distinct_years: usize },
    /// The fit produced a non-finite coefficient or the solver rejected the
    /// design matrix.
    Degenerate { detail: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InsufficientData {
                n_obs,
                distinct_years,
            } => write!(
                f,
                "insufficient data: n={n_obs}, distinct years={distinct_years}"
            ),
            SkipReason::Degenerate { detail } => write!(f, "degenerate fit: {detail}"),
        }
    }
}

/// A group that was skipped rather than fit, with its reason.
///
/// Skips are recoverable at group granularity: they are collected and
/// reported, never escalated to a pipeline failure.
#[derive(Debug, Clone)]
pub struct SkippedGroup {
    pub key: GroupKey,
    pub reason: SkipReason,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub yields_source: TableSource,
    pub land_use_source: TableSource,

    /// Cohort size: how many entities to keep, ranked by population.
    pub top_n: usize,
    /// Crop subset of interest (labels after suffix stripping).
    pub crops: Vec<String>,

    pub plot: bool,
    pub plot_dir: PathBuf,

    pub export_results: Option<PathBuf>,
    pub export_json: Option<PathBuf>,

    pub debug_bundle: bool,
}

/// The JSON export schema: adjusted records plus enough metadata to read the
/// file on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendsFile {
    pub tool: String,
    pub crops: Vec<String>,
    pub cohort: Vec<String>,
    pub records: Vec<SlopeRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_source_parse_distinguishes_urls_from_paths() {
        assert_eq!(
            TableSource::parse("https://example.org/a.csv"),
            TableSource::Url("https://example.org/a.csv".to_string())
        );
        assert_eq!(
            TableSource::parse("data/a.csv"),
            TableSource::Path(PathBuf::from("data/a.csv"))
        );
    }

    #[test]
    fn skip_reason_display_names_the_group_shape() {
        let reason = SkipReason::InsufficientData {
            n_obs: 1,
            distinct_years: 1,
        };
        assert_eq!(reason.to_string(), "insufficient data: n=1, distinct years=1");
    }
}

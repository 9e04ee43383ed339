//! Shared pipeline logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch -> ingest -> cohort -> reshape -> grouped fit -> BH adjustment
//!
//! The subcommands then focus on presentation (summary vs. table-only) and
//! side outputs (plots, exports, debug bundle).

use crate::cohort::select_top_entities;
use crate::data::OwidClient;
use crate::domain::{Observation, PipelineConfig, SkippedGroup, SlopeRecord};
use crate::error::AppError;
use crate::fit::fit_groups;
use crate::io::ingest::{ingest_land_use, ingest_yields, LandUseTable, YieldTable};
use crate::stats::adjust_records_in_place;
use crate::tidy::reshape_long;

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub yields: YieldTable,
    pub land_use: LandUseTable,
    /// Entity allow-list, in descending rank order.
    pub cohort: Vec<String>,
    pub observations: Vec<Observation>,
    /// One record per fitted group, in group order, p-values BH-adjusted.
    pub records: Vec<SlopeRecord>,
    pub skipped: Vec<SkippedGroup>,
}

/// Execute the full pipeline, fetching both tables from their sources.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let client = OwidClient::new()?;
    let yields_csv = client.load_csv(&config.yields_source)?;
    let land_use_csv = client.load_csv(&config.land_use_source)?;

    let yields = ingest_yields(yields_csv.as_bytes())?;
    let land_use = ingest_land_use(land_use_csv.as_bytes())?;

    run_with_tables(config, yields, land_use)
}

/// Execute the pipeline on pre-parsed tables.
///
/// This is the seam tests use (no network), and what a refit on cached data
/// would go through.
pub fn run_with_tables(
    config: &PipelineConfig,
    yields: YieldTable,
    land_use: LandUseTable,
) -> Result<RunOutput, AppError> {
    let cohort = select_top_entities(&land_use.rows, config.top_n)?;

    let observations = reshape_long(&yields, &config.crops, &cohort);
    if observations.is_empty() {
        return Err(AppError::no_data(
            "No observations remain after reshaping/filtering (check crops and cohort).",
        ));
    }

    let mut outcome = fit_groups(&observations);
    if outcome.records.is_empty() {
        return Err(AppError::no_data(
            "Every group was skipped; nothing to adjust.",
        ));
    }

    // The adjustment couples all groups: it must see the complete batch, so
    // it runs only after the parallel fan-out has fully finished.
    adjust_records_in_place(&mut outcome.records)?;

    Ok(RunOutput {
        yields,
        land_use,
        cohort,
        observations,
        records: outcome.records,
        skipped: outcome.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TableSource;
    use std::path::PathBuf;

    fn config() -> PipelineConfig {
        PipelineConfig {
            yields_source: TableSource::Path(PathBuf::from("unused")),
            land_use_source: TableSource::Path(PathBuf::from("unused")),
            top_n: 3,
            crops: vec!["wheat".to_string(), "barley".to_string()],
            plot: false,
            plot_dir: PathBuf::from("plots"),
            export_results: None,
            export_json: None,
            debug_bundle: false,
        }
    }

    fn tables() -> (YieldTable, LandUseTable) {
        // Three entities with a perfect wheat trend 3.0 -> 5.0 over
        // 2018-2020, plus a single-year barley group for entity A.
        let yields_csv = "\
Entity,Code,Year,Wheat (tonnes per hectare),Barley (tonnes per hectare)
A,AAA,2018,3.0,2.0
A,AAA,2019,4.0,
A,AAA,2020,5.0,
B,BBB,2018,3.0,
B,BBB,2019,4.0,
B,BBB,2020,5.0,
C,CCC,2018,3.0,
C,CCC,2019,4.0,
C,CCC,2020,5.0,
World,OWID_WRL,2018,9.9,9.9
";
        let land_use_csv = "\
Entity,Code,Year,Total population (Gapminder)
A,AAA,2019,300
B,BBB,2019,200
C,CCC,2019,100
World,OWID_WRL,2019,7000
Asia,,2019,4000
";
        (
            ingest_yields(yields_csv.as_bytes()).unwrap(),
            ingest_land_use(land_use_csv.as_bytes()).unwrap(),
        )
    }

    #[test]
    fn end_to_end_perfect_trend_and_tied_adjustment() {
        let (yields, land_use) = tables();
        let run = run_with_tables(&config(), yields, land_use).unwrap();

        assert_eq!(run.cohort, vec!["A", "B", "C"]);
        assert_eq!(run.records.len(), 3);

        for record in &run.records {
            assert_eq!(record.crop, "wheat");
            assert!((record.estimate - 1.0).abs() < 1e-9);
        }

        // All three raw p-values are identical, so every rank ties and the
        // BH adjustment is a no-op: all adjusted values equal the raw one.
        let p0 = run.records[0].p_value;
        for record in &run.records {
            assert!((record.p_value - p0).abs() < 1e-12);
            assert!((0.0..=1.0).contains(&record.p_value));
        }
    }

    #[test]
    fn end_to_end_single_year_group_is_skipped_not_fatal() {
        let (yields, land_use) = tables();
        let run = run_with_tables(&config(), yields, land_use).unwrap();

        assert_eq!(run.skipped.len(), 1);
        assert_eq!(run.skipped[0].key.to_string(), "A/barley");
        assert!(run
            .records
            .iter()
            .all(|r| !(r.entity == "A" && r.crop == "barley")));
    }

    #[test]
    fn aggregates_never_reach_the_fitter() {
        let (yields, land_use) = tables();
        let run = run_with_tables(&config(), yields, land_use).unwrap();

        assert!(run.observations.iter().all(|o| o.entity != "World"));
    }

    #[test]
    fn empty_reshape_is_a_no_data_error() {
        let (yields, land_use) = tables();
        let mut config = config();
        config.crops = vec!["rice".to_string()];

        let err = run_with_tables(&config, yields, land_use).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}

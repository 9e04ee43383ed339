//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the pipeline (fetch, cohort, reshape, fit, adjust)
//! - prints reports
//! - writes plots, exports, and the optional debug bundle

use clap::Parser;

use crate::cli::{Command, RunArgs};
use crate::data::{DEFAULT_LAND_USE_URL, DEFAULT_YIELDS_URL};
use crate::domain::{PipelineConfig, TableSource};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `yt` binary.
pub fn run() -> Result<(), AppError> {
    // We want bare `yt` and `yt --top 10` to behave like `yt run ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the convenient default.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args, OutputMode::Full),
        Command::Trends(args) => handle_run(args, OutputMode::TableOnly),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    TableOnly,
}

fn handle_run(args: RunArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args);
    let run = pipeline::run_pipeline(&config)?;

    if mode == OutputMode::Full {
        println!(
            "{}",
            crate::report::format_run_summary(
                &run.yields,
                &run.land_use,
                &run.cohort,
                run.observations.len(),
                &run.records,
                &run.skipped,
                &config,
            )
        );
    }

    println!("{}", crate::report::format_trends_table(&run.records));

    // Skips must be reported even in table-only mode; stderr keeps stdout
    // clean for scripting.
    if mode == OutputMode::TableOnly && !run.skipped.is_empty() {
        eprintln!("{}", crate::report::format_skipped(&run.skipped));
    }

    if mode == OutputMode::Full && config.plot {
        std::fs::create_dir_all(&config.plot_dir).map_err(|e| {
            AppError::configuration(format!(
                "Failed to create plot dir '{}': {e}",
                config.plot_dir.display()
            ))
        })?;

        let yields_path = config.plot_dir.join("yields.svg");
        let volcano_path = config.plot_dir.join("volcano.svg");
        crate::plot::render_yield_panels(
            &yields_path,
            &run.observations,
            &run.cohort,
            &config.crops,
        )?;
        crate::plot::render_volcano(&volcano_path, &run.records, &config.crops)?;
        println!(
            "Wrote {} and {}",
            yields_path.display(),
            volcano_path.display()
        );
    }

    if let Some(path) = &config.export_results {
        crate::io::export::write_trends_csv(path, &run.records)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::export::write_trends_json(path, &run.records, &config.crops, &run.cohort)?;
    }
    if config.debug_bundle {
        let path = crate::debug::write_debug_bundle(&run, &config)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

pub fn pipeline_config_from_args(args: &RunArgs) -> PipelineConfig {
    PipelineConfig {
        yields_source: args
            .yields
            .as_deref()
            .map(TableSource::parse)
            .unwrap_or_else(|| TableSource::Url(DEFAULT_YIELDS_URL.to_string())),
        land_use_source: args
            .land_use
            .as_deref()
            .map(TableSource::parse)
            .unwrap_or_else(|| TableSource::Url(DEFAULT_LAND_USE_URL.to_string())),
        top_n: args.top,
        crops: args.crops.clone(),
        plot: !args.no_plot,
        plot_dir: args.plot_dir.clone(),
        export_results: args.export.clone(),
        export_json: args.export_json.clone(),
        debug_bundle: args.debug_bundle,
    }
}

/// Rewrite argv so `yt` defaults to `yt run`.
///
/// Rules:
/// - `yt`                      -> `yt run`
/// - `yt --top 10 ...`         -> `yt run --top 10 ...`
/// - `yt --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "trends");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "run flags".
    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

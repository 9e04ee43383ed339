//! CSV ingest and normalization.
//!
//! This module turns the two raw Our World in Data exports into typed tables
//! that are safe to feed downstream.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors, exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (row order in = row order out)
//! - **Separation of concerns**: no cohort or reshaping logic here
//!
//! Both ingest functions are reader-based so tests (and cached files) can
//! bypass the network entirely.

use std::collections::HashMap;
use std::io::Read;

use csv::StringRecord;

use crate::error::AppError;

/// Crop-quantity columns are recognized by this suffix after normalization,
/// e.g. `Wheat (tonnes per hectare)` → `wheat_tonnes_per_hectare`.
pub const YIELD_COLUMN_SUFFIX: &str = "_tonnes_per_hectare";

/// Normalized column name of the cohort ranking attribute.
pub const RANKING_COLUMN: &str = "total_population_gapminder";

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub entity: Option<String>,
    pub message: String,
}

/// One wide row of the crop-yield table: one value slot per crop column.
#[derive(Debug, Clone)]
pub struct YieldRow {
    pub entity: String,
    pub code: Option<String>,
    pub year: i32,
    /// Aligned with `YieldTable::crop_columns`; `None` where the cell is
    /// empty or unparsable.
    pub values: Vec<Option<f64>>,
}

/// The ingested wide crop-yield table.
#[derive(Debug, Clone)]
pub struct YieldTable {
    /// Normalized crop column names, in header order (suffix still attached).
    pub crop_columns: Vec<String>,
    pub rows: Vec<YieldRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// One row of the land-use table; only the fields the pipeline consumes.
#[derive(Debug, Clone)]
pub struct LandUseRow {
    pub entity: String,
    pub code: Option<String>,
    pub year: i32,
    pub population: Option<f64>,
}

/// The ingested land-use/population table.
#[derive(Debug, Clone)]
pub struct LandUseTable {
    pub rows: Vec<LandUseRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Parse the wide crop-yield CSV.
pub fn ingest_yields(input: impl Read) -> Result<YieldTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = clean_headers(&mut reader)?;
    let header_map = build_header_map(&headers);

    require_column(&header_map, "entity")?;
    require_column(&header_map, "year")?;

    let crop_columns: Vec<String> = headers
        .iter()
        .filter(|name| name.ends_with(YIELD_COLUMN_SUFFIX))
        .cloned()
        .collect();
    if crop_columns.is_empty() {
        return Err(AppError::configuration(format!(
            "No `*{YIELD_COLUMN_SUFFIX}` columns found in the yields table."
        )));
    }
    let crop_indices: Vec<usize> = crop_columns
        .iter()
        .map(|name| header_map[name.as_str()])
        .collect();

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header row, and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    entity: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_yield_row(&record, &header_map, &crop_indices) {
            Ok(row) => rows.push(row),
            Err((entity, message)) => row_errors.push(RowError {
                line,
                entity,
                message,
            }),
        }
    }

    if rows.is_empty() {
        return Err(AppError::no_data(
            "No valid rows remain in the yields table after validation.",
        ));
    }

    Ok(YieldTable {
        crop_columns,
        rows,
        row_errors,
        rows_read,
    })
}

/// Parse the land-use/population CSV.
pub fn ingest_land_use(input: impl Read) -> Result<LandUseTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = clean_headers(&mut reader)?;
    let header_map = build_header_map(&headers);

    require_column(&header_map, "entity")?;
    require_column(&header_map, "year")?;
    require_column(&header_map, RANKING_COLUMN)?;

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    entity: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_land_use_row(&record, &header_map) {
            Ok(row) => rows.push(row),
            Err((entity, message)) => row_errors.push(RowError {
                line,
                entity,
                message,
            }),
        }
    }

    if rows.is_empty() {
        return Err(AppError::no_data(
            "No valid rows remain in the land-use table after validation.",
        ));
    }

    Ok(LandUseTable {
        rows,
        row_errors,
        rows_read,
    })
}

fn clean_headers<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<String>, AppError> {
    let headers = reader
        .headers()
        .map_err(|e| AppError::data_source(format!("Failed to read CSV headers: {e}")))?;
    Ok(headers.iter().map(clean_name).collect())
}

/// Normalize a header to a snake_case identifier.
///
/// `Wheat (tonnes per hectare)` → `wheat_tonnes_per_hectare`. Excel and other
/// tools sometimes emit UTF-8 CSVs with a BOM prefix on the first header; if
/// we don't strip it, schema validation will incorrectly report missing
/// columns.
pub fn clean_name(name: &str) -> String {
    let name = name.trim().trim_start_matches('\u{feff}');

    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

fn build_header_map(headers: &[String]) -> HashMap<&str, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect()
}

fn require_column(header_map: &HashMap<&str, usize>, name: &str) -> Result<(), AppError> {
    if header_map.contains_key(name) {
        Ok(())
    } else {
        Err(AppError::configuration(format!(
            "Missing required column: `{name}`"
        )))
    }
}

type RowResult<T> = Result<T, (Option<String>, String)>;

fn parse_yield_row(
    record: &StringRecord,
    header_map: &HashMap<&str, usize>,
    crop_indices: &[usize],
) -> RowResult<YieldRow> {
    let entity = get_required(record, header_map, "entity")?;
    let year_raw = get_required(record, header_map, "year")
        .map_err(|(_, m)| (Some(entity.to_string()), m))?;
    let year = parse_year(year_raw).map_err(|m| (Some(entity.to_string()), m))?;

    let code = get_optional(record, header_map, "code").map(str::to_string);

    let values = crop_indices
        .iter()
        .map(|&idx| parse_opt_f64(record.get(idx)))
        .collect();

    Ok(YieldRow {
        entity: entity.to_string(),
        code,
        year,
        values,
    })
}

fn parse_land_use_row(
    record: &StringRecord,
    header_map: &HashMap<&str, usize>,
) -> RowResult<LandUseRow> {
    let entity = get_required(record, header_map, "entity")?;
    let year_raw = get_required(record, header_map, "year")
        .map_err(|(_, m)| (Some(entity.to_string()), m))?;
    let year = parse_year(year_raw).map_err(|m| (Some(entity.to_string()), m))?;

    let code = get_optional(record, header_map, "code").map(str::to_string);
    let population = parse_opt_f64(get_optional(record, header_map, RANKING_COLUMN));

    Ok(LandUseRow {
        entity: entity.to_string(),
        code,
        year,
        population,
    })
}

fn parse_year(s: &str) -> Result<i32, String> {
    s.parse::<i32>()
        .map_err(|_| format!("Invalid year '{s}'. Expected an integer."))
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<&str, usize>,
    name: &str,
) -> Result<&'a str, (Option<String>, String)> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| (None, format!("Missing required column: `{name}`")))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| (None, format!("Missing required value: `{name}`")))
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<&str, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let v = s?.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

//! Our World in Data dataset retrieval.
//!
//! Both inputs are plain CSV exports. They can be fetched over HTTPS or read
//! from local files; either way the loader hands raw CSV text to ingest and
//! does nothing else. The fetch is an idempotent read with no state to
//! reconcile, so transient request failures are retried a fixed number of
//! times before surfacing as a data-source error.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::domain::TableSource;
use crate::error::AppError;

/// Default source of the wide crop-yield table.
pub const DEFAULT_YIELDS_URL: &str = "https://raw.githubusercontent.com/rfordatascience/tidytuesday/master/data/2020/2020-09-01/key_crop_yields.csv";

/// Default source of the land-use/population table.
pub const DEFAULT_LAND_USE_URL: &str = "https://raw.githubusercontent.com/rfordatascience/tidytuesday/master/data/2020/2020-09-01/land_use_vs_yield_change_in_cereal_production.csv";

/// Attempts per URL (1 initial + retries on transient failure).
const FETCH_ATTEMPTS: usize = 3;

pub struct OwidClient {
    client: Client,
}

impl OwidClient {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AppError::data_source(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Load a table's raw CSV text from a URL or a local path.
    pub fn load_csv(&self, source: &TableSource) -> Result<String, AppError> {
        match source {
            TableSource::Path(path) => std::fs::read_to_string(path).map_err(|e| {
                AppError::data_source(format!("Failed to read CSV '{}': {e}", path.display()))
            }),
            TableSource::Url(url) => self.fetch_csv(url),
        }
    }

    fn fetch_csv(&self, url: &str) -> Result<String, AppError> {
        let mut last_error = String::new();

        for _attempt in 0..FETCH_ATTEMPTS {
            match self.client.get(url).send() {
                Ok(resp) => {
                    // A definitive HTTP status is not transient; retrying a
                    // 404 would only mask a wrong URL.
                    if !resp.status().is_success() {
                        return Err(AppError::data_source(format!(
                            "Request for {url} failed with status {}.",
                            resp.status()
                        )));
                    }
                    match resp.text() {
                        Ok(body) => return Ok(body),
                        Err(e) => last_error = format!("Failed to read body from {url}: {e}"),
                    }
                }
                Err(e) => last_error = format!("Request for {url} failed: {e}"),
            }
        }

        Err(AppError::data_source(format!(
            "{last_error} (after {FETCH_ATTEMPTS} attempts)"
        )))
    }
}

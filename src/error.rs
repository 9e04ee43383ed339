//! Pipeline-fatal error type.
//!
//! Group-level problems (a country/crop pair too thin to regress, a degenerate
//! fit) are *values* carried through the pipeline and reported, not errors;
//! see `domain::SkippedGroup`. This type is reserved for failures that abort
//! the whole run: a dataset that cannot be fetched or parsed, or invalid
//! configuration.

/// What category of failure aborted the run.
///
/// The category determines the process exit code:
/// - `Configuration` → 2 (bad parameters, missing/odd schema)
/// - `NoData` → 3 (nothing usable left after validation/filtering)
/// - `DataSource` → 4 (fetch or parse failure upstream)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DataSource,
    Configuration,
    NoData,
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn data_source(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataSource, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoData, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        match self.kind {
            ErrorKind::Configuration => 2,
            ErrorKind::NoData => 3,
            ErrorKind::DataSource => 4,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_kind() {
        assert_eq!(AppError::configuration("n must be > 0").exit_code(), 2);
        assert_eq!(AppError::no_data("no rows").exit_code(), 3);
        assert_eq!(AppError::data_source("404").exit_code(), 4);
    }
}

use thiserror::Error;

/// Failures the dashboard core reports with a typed cause.
///
/// Loading code wraps these in `anyhow` with extra context (file path, row),
/// so the variants only carry what identifies the problem itself.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("required column '{column}' is missing from the dataset")]
    MissingColumn { column: &'static str },

    #[error("column '{column}' has type {found}, expected {expected}")]
    WrongColumnType {
        column: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("row {row}: column '{column}' holds '{value}', expected {expected}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("unknown sex filter '{0}' (expected todos, masculino or feminino)")]
    InvalidFilter(String),

    #[error("invalid geographic boundaries: {0}")]
    InvalidBoundaries(String),
}

use thiserror::Error;

/// Failures that stop a cleaning run.
///
/// Cell-level problems never surface here; they degrade to a missing value or
/// a fallback instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CleanError {
    #[error("Required column '{column}' not found after header normalization")]
    MissingColumn { column: String },
    #[error("Channel alias '{variant}' already maps to '{existing}', cannot remap to '{requested}'")]
    ConflictingAlias {
        variant: String,
        existing: String,
        requested: String,
    },
    #[error("Column '{column}' has {actual} cell(s) but the table has {expected} row(s)")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },
}

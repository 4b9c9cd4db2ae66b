use std::path::PathBuf;

use thiserror::Error;

use crate::data::model::Attribute;

// ---------------------------------------------------------------------------
// Load errors – fatal, the dataset cannot be used without them resolved
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("dataset source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("malformed table: {0}")]
    Malformed(String),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: listing has no url")]
    MissingUrl { row: usize },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing pipeline declaration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error("invalid value for {name}: '{value}'")]
    InvalidEnv { name: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Filter issues – recovered locally, reported alongside the outcome
// ---------------------------------------------------------------------------

/// Diagnostics raised while evaluating the filter pipeline.
///
/// None of these abort evaluation; they are collected on the outcome so the
/// UI can surface them while staying responsive.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterIssue {
    #[error("no listings remain after {}", stage_label(.after))]
    EmptyFilterResult { after: Option<Attribute> },

    #[error("'{value}' is not an available choice for {attribute}")]
    InvalidFilterValue { attribute: Attribute, value: String },

    #[error("selection for {attribute} does not match its filter kind; ignored")]
    SelectionMismatch { attribute: Attribute },
}

fn stage_label(after: &Option<Attribute>) -> String {
    match after {
        Some(attr) => format!("filtering on {attr}"),
        None => "loading (dataset is empty)".to_string(),
    }
}

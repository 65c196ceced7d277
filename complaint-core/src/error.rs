//! # Error Types
//!
//! Extraction over complaint text never fails: extractors return `Option`
//! or tag sets. Errors only exist at the edges where files, tables and
//! external collaborators are involved.

use std::path::PathBuf;

use thiserror::Error;

/// A single gazetteer source could not be used.
///
/// The loader logs these and moves on to the next source; they never
/// escape [`crate::gazetteer::Gazetteer::load`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("bad glob pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("{path} has no usable stop entries")]
    Empty { path: PathBuf },
}

/// Batch table I/O failures.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("table has no `{0}` column")]
    MissingColumn(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure reported by a geocoder collaborator.
///
/// The place resolver treats every variant as "no geocode result".
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder unavailable: {0}")]
    Unavailable(String),
    #[error("geocoder failed: {0}")]
    Failed(String),
}

/// Rejections and collaborator failures of the analysis layer.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("empty text")]
    EmptyText,
    #[error("text too long: {len} characters (max {max})")]
    TooLong { len: usize, max: usize },
    #[error("classifier `{name}` failed: {message}")]
    Classifier { name: String, message: String },
}

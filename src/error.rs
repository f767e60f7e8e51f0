//! Error types for zone creation, persistence and export.

use thiserror::Error;

/// Errors raised by zone operations.
///
/// Creation errors are fatal to the single zone being built; nothing partial
/// is ever returned. Outcomes that are expected during play (no gate, no spawn
/// table, nothing left to explore) are not errors and never show up here.
#[derive(Error, Debug)]
pub enum ZoneError {
    /// A static layout row does not match the first row's width.
    #[error("malformed layout: row {row} has width {found}, expected {expected}")]
    MalformedLayout {
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },

    /// A static layout with no rows or an empty first row.
    #[error("layout is empty")]
    EmptyLayout,

    #[error("invalid zone dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// Generated zone names a generator nobody registered.
    #[error("unknown generator: {0}")]
    UnknownGenerator(String),

    #[error("zone {0} is generated but has no generator config")]
    MissingGeneratorConfig(String),

    #[error("unknown zone: {0}")]
    UnknownZone(String),

    #[error("unknown content instance: {0}")]
    UnknownInstance(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for zone operations.
pub type ZoneResult<T> = Result<T, ZoneError>;

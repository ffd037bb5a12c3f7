use std::path::PathBuf;

use bund_core::{geometry::GeometryError, raster::RasterError};

#[derive(thiserror::Error, Debug)]
pub enum BundError {
    #[error("Invalid input: {0}")]
    InvalidUserInput(String),
    #[error("Required capability is not available: {0}")]
    MissingCapability(String),
    #[error("Missing {kind}: '{path}'")]
    MissingInput { kind: String, path: PathBuf },
    #[error("Unknown design mode: '{0}'")]
    UnknownDesignMode(String),
    #[error("Field '{field}' not found on '{path}'")]
    MissingField { field: String, path: PathBuf },
    #[error("Field '{field}' must be numeric (found {found})")]
    WrongFieldType { field: String, found: String },
    #[error("Required parameter is missing for {mode} mode: {parameter}")]
    MissingParameter { mode: String, parameter: String },
    #[error("Invalid or empty geometry: {0}")]
    InvalidGeometry(String),
    #[error("Raster operation failed: {source}")]
    RasterError {
        #[from]
        source: RasterError,
    },
    #[error("Geometry operation failed: {source}")]
    GeometryError {
        #[from]
        source: GeometryError,
    },
    #[error("Processing mask is still active while merging into the global rasters")]
    StaleMask,
    #[error("Footprint derivation failed: {0}")]
    FootprintError(String),
    #[error("Error writing to csv: {0}")]
    CsvWriteError(String),
    #[error("Error reading from '{path}': {message}")]
    ReadError { path: PathBuf, message: String },
    #[error("Error writing to '{path}': {message}")]
    WriteError { path: PathBuf, message: String },
    #[error("{0}")]
    InternalError(String),
}

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    #[error("invalid grid definition: {0}")]
    InvalidGrid(String),
    #[error("raster has {found} cells but its grid expects {expected}")]
    ShapeMismatch { expected: usize, found: usize },
    #[error("raster grids are not aligned: {0}")]
    Misaligned(String),
    #[error("invalid raster operation parameter: {0}")]
    InvalidParameter(String),
    #[error("failure reading raster from '{path}': {message}")]
    Read { path: PathBuf, message: String },
    #[error("failed to parse raster '{path}' at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("failure writing raster to '{path}': {message}")]
    Write { path: PathBuf, message: String },
}

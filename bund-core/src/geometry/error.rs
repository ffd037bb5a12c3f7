#[derive(thiserror::Error, Debug)]
pub enum GeometryError {
    #[error("invalid or empty geometry: {0}")]
    InvalidGeometry(String),
    #[error("invalid geometry operation parameter: {0}")]
    InvalidParameter(String),
    #[error("unable to interpolate {distance} along a line of length {length}")]
    Interpolation { distance: f64, length: f64 },
}

mod corridor;
mod error;
mod polygonize;
mod sampling;

pub use corridor::{distance_to_points, Corridor};
pub use error::GeometryError;
pub use polygonize::polygonize_cells;
pub use sampling::{line_ends, planar_length, sample_along, LineSample};

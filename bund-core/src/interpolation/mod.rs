mod point_interpolator;

pub use point_interpolator::{InterpolatorConfig, PointInterpolator};

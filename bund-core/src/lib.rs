pub mod geometry;
pub mod interpolation;
pub mod raster;

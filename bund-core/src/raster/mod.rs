mod ascii_grid;
mod env;
mod error;
mod focal;
mod grid_spec;
mod raster_data;
mod statistics;

pub use ascii_grid::{read_ascii_grid, write_ascii_grid};
pub use env::{Mask, MaskGuard, ProcessingEnv};
pub use error::RasterError;
pub use focal::{focal_mean, radius_in_cells, FocalCoverage};
pub use grid_spec::GridSpec;
pub use raster_data::Raster;
pub use statistics::RasterStatistics;

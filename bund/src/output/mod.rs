//! writers for the products of a run. every path is derived from [`OutputNames`].

mod footprint_sink;
mod output_names;
mod raster_sink;
mod solid;
mod summary;
mod volumes_table;

pub use footprint_sink::write_footprints;
pub use output_names::OutputNames;
pub use raster_sink::{fill_gaps, write_raster, write_statistics};
pub use solid::{write_obj, SolidMesh};
pub use summary::{RunSource, RunStats, RunSummary};
pub use volumes_table::{write_volumes_csv, write_volumes_json};

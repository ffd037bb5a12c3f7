mod centreline_feature;
mod merge_by_id;
mod reader;
mod writer;

pub use centreline_feature::Centreline;
pub use merge_by_id::{dissolve_parts, merge_by_id, stitch_parts};
pub use reader::read_centrelines;
pub use writer::write_centrelines;

//! per-feature bund design: crest profile, design surface, accumulation into the
//! merged rasters and volume totals.

mod accumulator;
mod crest;
mod footprint;
mod record;
mod surface;
mod volume;

pub use accumulator::{CellReducer, FeatureAccumulator, MaxWins, MergedRaster};
pub use crest::{CrestPolicy, CrestProfileBuilder};
pub use footprint::{
    derive_footprint, Footprint, FootprintCollection, FootprintEntry, FootprintMetrics,
};
pub use record::VolumeRecord;
pub use surface::{
    design_elevation, raw_design, CellInputs, DesignSurfaceSynthesizer, FeatureSurface,
    SurfaceRule,
};
pub use volume::{TotalsSource, VolumeAggregator};

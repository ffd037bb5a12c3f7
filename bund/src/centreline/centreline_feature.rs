use bund_core::geometry::planar_length;
use geo::MultiLineString;

/// a bund centreline as read from the input collection.
#[derive(Clone, Debug)]
pub struct Centreline {
    /// 1-based position of the feature in the processed collection
    pub source_id: i64,
    /// value of the id property, as text
    pub id: String,
    /// a plain line is stored as a one-part multi-line
    pub geometry: MultiLineString<f64>,
    /// design height or height above ground, depending on the design mode
    pub attribute: Option<f64>,
}

impl Centreline {
    /// planar length in map units.
    pub fn length(&self) -> f64 {
        planar_length(&self.geometry)
    }
}

use geo::{BoundingRect, Coord, MultiLineString, Rect};
use itertools::Itertools;
use rstar::{primitives::Line, RTree};

use super::GeometryError;

/// a planar buffer around a (multi-part) line with flat ends and round joins, the
/// shape produced by a full-sided, flat-ended, dissolved line buffer. membership and
/// euclidean distance are evaluated analytically instead of through a rasterized
/// polygon, so they are exact at any cell size.
///
/// the region is the union of
/// - a rectangle of half width `half_width` around every segment, not extending
///   past the segment's ends, and
/// - a disc of radius `half_width` at every interior vertex of every part.
///
/// segments and joints are held in R-trees so a distance query only visits the
/// pieces near the query point.
#[derive(Clone, Debug)]
pub struct Corridor {
    segments: RTree<Line<[f64; 2]>>,
    joints: RTree<[f64; 2]>,
    ends: Vec<Coord<f64>>,
    half_width: f64,
    bounds: Rect<f64>,
}

impl Corridor {
    pub fn new(lines: &MultiLineString<f64>, half_width: f64) -> Result<Corridor, GeometryError> {
        if !half_width.is_finite() || half_width < 0.0 {
            return Err(GeometryError::InvalidParameter(format!(
                "buffer distance must be a non-negative number, found {half_width}"
            )));
        }
        let mut segments = Vec::new();
        let mut joints = Vec::new();
        for part in lines.iter() {
            let coords = &part.0;
            segments.extend(
                coords
                    .iter()
                    .tuple_windows()
                    .filter(|(a, b)| a != b)
                    .map(|(a, b)| Line::new([a.x, a.y], [b.x, b.y])),
            );
            if coords.len() > 2 {
                joints.extend(coords[1..coords.len() - 1].iter().map(|c| [c.x, c.y]));
            }
        }
        if segments.is_empty() {
            return Err(GeometryError::InvalidGeometry(String::from(
                "line has no segment of non-zero length",
            )));
        }
        let line_bounds = lines.bounding_rect().ok_or_else(|| {
            GeometryError::InvalidGeometry(String::from("line has no bounding rectangle"))
        })?;
        let bounds = Rect::new(
            Coord {
                x: line_bounds.min().x - half_width,
                y: line_bounds.min().y - half_width,
            },
            Coord {
                x: line_bounds.max().x + half_width,
                y: line_bounds.max().y + half_width,
            },
        );
        Ok(Corridor {
            segments: RTree::bulk_load(segments),
            joints: RTree::bulk_load(joints),
            ends: super::line_ends(lines),
            half_width,
            bounds,
        })
    }

    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    /// rectangle enclosing the whole corridor.
    pub fn bounds(&self) -> &Rect<f64> {
        &self.bounds
    }

    /// start and end point of every part of the line.
    pub fn ends(&self) -> &[Coord<f64>] {
        &self.ends
    }

    /// euclidean distance from a point to the corridor, zero inside.
    pub fn distance(&self, p: Coord<f64>) -> f64 {
        let r = self.half_width;
        let query = [p.x, p.y];
        let mut best = self
            .joints
            .nearest_neighbor(&query)
            .map_or(f64::INFINITY, |j| (euclid(p, coord(j)) - r).max(0.0));
        // segments arrive nearest first, and a band is never closer than its
        // segment distance less the half width
        for (segment, d2) in self.segments.nearest_neighbor_iter_with_distance_2(&query) {
            if best <= 0.0 || (d2.sqrt() - r).max(0.0) >= best {
                break;
            }
            let to_band = distance_to_band(p, coord(&segment.from), coord(&segment.to), r);
            best = best.min(to_band);
        }
        best
    }

    pub fn contains(&self, p: Coord<f64>) -> bool {
        self.distance(p) <= 0.0
    }
}

/// distance to the nearest of a set of points, infinite for an empty set.
pub fn distance_to_points(points: &[Coord<f64>], p: Coord<f64>) -> f64 {
    points
        .iter()
        .map(|q| euclid(p, *q))
        .fold(f64::INFINITY, f64::min)
}

fn coord(p: &[f64; 2]) -> Coord<f64> {
    Coord { x: p[0], y: p[1] }
}

#[inline]
fn euclid(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// distance from `p` to the flat-ended rectangle of half width `r` around segment ab.
fn distance_to_band(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>, r: f64) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len = dx.hypot(dy);
    let (ux, uy) = (dx / len, dy / len);
    let (px, py) = (p.x - a.x, p.y - a.y);
    let along = px * ux + py * uy;
    let across = (px * uy - py * ux).abs();
    let outside_along = (-along).max(along - len).max(0.0);
    let outside_across = (across - r).max(0.0);
    outside_along.hypot(outside_across)
}

use geo::{Coord, LineString, MultiLineString};
use indexmap::IndexMap;
use itertools::Itertools;

use super::Centreline;

/// endpoints closer than this are treated as shared when stitching parts.
const STITCH_TOLERANCE: f64 = 1e-9;

/// segments whose end points lie within this distance of a line are collinear with it.
const COLLINEAR_TOLERANCE: f64 = 1e-6;

/// dissolves centrelines sharing an id into one feature per id, in first-seen order.
///
/// the parts of a group are reduced to the union of their segments, so overlapping
/// stretches are kept once. the union is then stitched into continuous lines and
/// disjoint pieces stay separate parts of the same multi-line. the carried attribute
/// is the maximum of the defined values of the group. source ids are renumbered 1..n.
pub fn merge_by_id(centrelines: &[Centreline]) -> Vec<Centreline> {
    let mut groups: IndexMap<&str, Vec<&Centreline>> = IndexMap::new();
    for c in centrelines {
        groups.entry(c.id.as_str()).or_default().push(c);
    }
    groups
        .into_iter()
        .enumerate()
        .map(|(n, (id, members))| {
            let parts = members
                .iter()
                .flat_map(|c| c.geometry.0.iter().cloned())
                .collect_vec();
            let attribute = members
                .iter()
                .filter_map(|c| c.attribute)
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
            if members.len() > 1 {
                log::debug!("merged {} centrelines with id '{id}'", members.len());
            }
            Centreline {
                source_id: n as i64 + 1,
                id: id.to_string(),
                geometry: stitch_parts(dissolve_parts(&parts)),
                attribute,
            }
        })
        .collect()
}

/// the union of the segments of `parts` as two-point lines. collinear segments that
/// overlap or touch become a single segment running along the first one seen.
pub fn dissolve_parts(parts: &[LineString<f64>]) -> Vec<LineString<f64>> {
    let mut carriers: Vec<Carrier> = Vec::new();
    let segments = parts
        .iter()
        .flat_map(|p| p.0.iter().copied().tuple_windows::<(Coord<f64>, Coord<f64>)>());
    for (a, b) in segments {
        if (b.x - a.x).hypot(b.y - a.y) <= STITCH_TOLERANCE {
            continue;
        }
        match carriers.iter_mut().find(|c| c.holds(a, b)) {
            Some(carrier) => carrier.push(a, b),
            None => {
                let mut carrier = Carrier::new(a, b);
                carrier.push(a, b);
                carriers.push(carrier);
            }
        }
    }
    carriers.into_iter().flat_map(Carrier::dissolve).collect()
}

/// an interval along a carrier line, with the points it was measured from.
#[derive(Clone, Copy, Debug)]
struct Span {
    start: f64,
    end: f64,
    from: Coord<f64>,
    to: Coord<f64>,
}

/// the collinear segments of a group, measured along the direction of the first.
struct Carrier {
    origin: Coord<f64>,
    direction: Coord<f64>,
    spans: Vec<Span>,
}

impl Carrier {
    fn new(a: Coord<f64>, b: Coord<f64>) -> Carrier {
        let length = (b.x - a.x).hypot(b.y - a.y);
        Carrier {
            origin: a,
            direction: Coord {
                x: (b.x - a.x) / length,
                y: (b.y - a.y) / length,
            },
            spans: Vec::new(),
        }
    }

    fn along(&self, p: Coord<f64>) -> f64 {
        (p.x - self.origin.x) * self.direction.x + (p.y - self.origin.y) * self.direction.y
    }

    fn offset(&self, p: Coord<f64>) -> f64 {
        ((p.x - self.origin.x) * self.direction.y - (p.y - self.origin.y) * self.direction.x).abs()
    }

    fn holds(&self, a: Coord<f64>, b: Coord<f64>) -> bool {
        self.offset(a) <= COLLINEAR_TOLERANCE && self.offset(b) <= COLLINEAR_TOLERANCE
    }

    fn push(&mut self, a: Coord<f64>, b: Coord<f64>) {
        let (ta, tb) = (self.along(a), self.along(b));
        let span = if ta <= tb {
            Span {
                start: ta,
                end: tb,
                from: a,
                to: b,
            }
        } else {
            Span {
                start: tb,
                end: ta,
                from: b,
                to: a,
            }
        };
        self.spans.push(span);
    }

    fn dissolve(mut self) -> Vec<LineString<f64>> {
        self.spans.sort_by(|a, b| a.start.total_cmp(&b.start));
        let mut merged: Vec<Span> = Vec::with_capacity(self.spans.len());
        for span in self.spans {
            match merged.last_mut() {
                Some(last) if span.start <= last.end + STITCH_TOLERANCE => {
                    if span.end > last.end {
                        last.end = span.end;
                        last.to = span.to;
                    }
                }
                _ => merged.push(span),
            }
        }
        merged
            .into_iter()
            .map(|s| LineString::new(vec![s.from, s.to]))
            .collect()
    }
}

/// joins line parts that share an end point, reversing parts where needed.
pub fn stitch_parts(parts: Vec<LineString<f64>>) -> MultiLineString<f64> {
    let mut pool: Vec<Vec<Coord<f64>>> = parts
        .into_iter()
        .map(|p| p.0)
        .filter(|coords| !coords.is_empty())
        .collect();
    let mut stitched: Vec<LineString<f64>> = Vec::new();
    while !pool.is_empty() {
        let mut current = pool.remove(0);
        loop {
            let found = pool
                .iter()
                .position(|other| join(&current, other).is_some());
            let Some(idx) = found else {
                break;
            };
            let other = pool.remove(idx);
            if let Some(joined) = join(&current, &other) {
                current = joined;
            }
        }
        stitched.push(LineString::new(current));
    }
    MultiLineString::new(stitched)
}

fn touches(a: Coord<f64>, b: Coord<f64>) -> bool {
    (a.x - b.x).abs() <= STITCH_TOLERANCE && (a.y - b.y).abs() <= STITCH_TOLERANCE
}

/// the two parts joined into one, None when they share no end point. a closed part
/// is never extended.
fn join(a: &[Coord<f64>], b: &[Coord<f64>]) -> Option<Vec<Coord<f64>>> {
    let (a0, a1) = (*a.first()?, *a.last()?);
    let (b0, b1) = (*b.first()?, *b.last()?);
    if touches(a0, a1) || touches(b0, b1) {
        return None;
    }
    let reversed = |s: &[Coord<f64>]| s.iter().rev().copied().collect::<Vec<_>>();
    if touches(a1, b0) {
        Some([a, &b[1..]].concat())
    } else if touches(a1, b1) {
        Some([a.to_vec(), reversed(b)[1..].to_vec()].concat())
    } else if touches(a0, b1) {
        Some([b, &a[1..]].concat())
    } else if touches(a0, b0) {
        Some([reversed(b), a[1..].to_vec()].concat())
    } else {
        None
    }
}

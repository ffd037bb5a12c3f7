use geo::{Coord, Euclidean, InterpolatableLine, Length, LineString, MultiLineString};

use super::GeometryError;

/// a point generated along a line, tagged with its chainage (distance measured
/// along the line from the start of the first part).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSample {
    pub point: Coord<f64>,
    pub chainage: f64,
}

/// planar length of all parts of a line.
pub fn planar_length(lines: &MultiLineString<f64>) -> f64 {
    lines.iter().map(|part| Euclidean.length(part)).sum()
}

/// first and last coordinate of every non-empty part.
pub fn line_ends(lines: &MultiLineString<f64>) -> Vec<Coord<f64>> {
    lines
        .iter()
        .filter_map(|part| Some([*part.0.first()?, *part.0.last()?]))
        .flatten()
        .collect()
}

/// places points every `step` map units along each part of a line, always including
/// both end points of each part. chainage accumulates across parts in order.
pub fn sample_along(
    lines: &MultiLineString<f64>,
    step: f64,
) -> Result<Vec<LineSample>, GeometryError> {
    if !step.is_finite() || step <= 0.0 {
        return Err(GeometryError::InvalidParameter(format!(
            "sampling step must be a positive number, found {step}"
        )));
    }
    let mut samples = Vec::new();
    let mut offset = 0.0;
    for part in lines.iter() {
        let length = Euclidean.length(part);
        samples.extend(sample_part(part, length, step, offset)?);
        offset += length;
    }
    if samples.is_empty() {
        return Err(GeometryError::InvalidGeometry(String::from(
            "cannot sample points along an empty line",
        )));
    }
    Ok(samples)
}

fn sample_part(
    part: &LineString<f64>,
    length: f64,
    step: f64,
    offset: f64,
) -> Result<Vec<LineSample>, GeometryError> {
    let (first, last) = match (part.0.first(), part.0.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return Ok(vec![]),
    };
    if length <= 0.0 {
        return Ok(vec![LineSample {
            point: first,
            chainage: offset,
        }]);
    }
    let n_strides = (length / step).ceil() as usize;
    let mut samples = Vec::with_capacity(n_strides + 1);
    for idx in 0..n_strides {
        let distance = step * idx as f64;
        let point = part
            .point_at_ratio_from_start(&Euclidean, distance / length)
            .ok_or(GeometryError::Interpolation { distance, length })?;
        samples.push(LineSample {
            point: point.0,
            chainage: offset + distance,
        });
    }
    samples.push(LineSample {
        point: last,
        chainage: offset + length,
    });
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn test_samples_include_end_points() {
        let lines = MultiLineString::new(vec![line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]]);
        let samples = sample_along(&lines, 4.0).expect("valid");
        let chainages: Vec<f64> = samples.iter().map(|s| s.chainage).collect();
        assert_eq!(chainages, vec![0.0, 4.0, 8.0, 10.0]);
        assert!((samples[1].point.x - 4.0).abs() < 1e-9);
        assert_eq!(samples[3].point, Coord { x: 10.0, y: 0.0 });
    }

    #[test]
    fn test_exact_multiple_has_no_duplicate_end() {
        let lines = MultiLineString::new(vec![line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 4.0)]]);
        let samples = sample_along(&lines, 2.0).expect("valid");
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[2].chainage, 4.0);
    }

    #[test]
    fn test_chainage_accumulates_across_parts() {
        let lines = MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 0.0)],
            line_string![(x: 0.0, y: 5.0), (x: 0.0, y: 7.0)],
        ]);
        let samples = sample_along(&lines, 2.0).expect("valid");
        let chainages: Vec<f64> = samples.iter().map(|s| s.chainage).collect();
        assert_eq!(chainages, vec![0.0, 2.0, 3.0, 3.0, 5.0]);
        assert!((planar_length(&lines) - 5.0).abs() < 1e-12);
        assert_eq!(line_ends(&lines).len(), 4);
    }

    #[test]
    fn test_invalid_step() {
        let lines = MultiLineString::new(vec![line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]]);
        assert!(sample_along(&lines, 0.0).is_err());
        assert!(sample_along(&MultiLineString::new(vec![]), 1.0).is_err());
    }
}

use geo::{unary_union, Coord, MultiPolygon, Polygon, Rect};

use crate::raster::Raster;

/// converts the cells of a raster that satisfy a predicate into one dissolved
/// (multi)polygon following cell edges. consecutive cells in a row are first merged
/// into runs, then the runs are unioned.
pub fn polygonize_cells<F>(raster: &Raster, predicate: F) -> MultiPolygon<f64>
where
    F: Fn(f64) -> bool,
{
    let spec = raster.spec();
    let mut runs: Vec<Polygon<f64>> = Vec::new();
    for row in 0..spec.rows {
        let mut start: Option<usize> = None;
        for col in 0..=spec.cols {
            let selected = col < spec.cols && predicate(raster.value(row, col));
            match (selected, start) {
                (true, None) => start = Some(col),
                (false, Some(c0)) => {
                    runs.push(run_polygon(raster, row, c0, col));
                    start = None;
                }
                _ => {}
            }
        }
    }
    if runs.is_empty() {
        return MultiPolygon::new(vec![]);
    }
    unary_union(&runs)
}

fn run_polygon(raster: &Raster, row: usize, col_start: usize, col_end: usize) -> Polygon<f64> {
    let spec = raster.spec();
    let (upper_left, _) = spec.cell_bounds(row, col_start);
    let (_, lower_right) = spec.cell_bounds(row, col_end - 1);
    Rect::new(
        Coord {
            x: upper_left.x,
            y: lower_right.y,
        },
        Coord {
            x: lower_right.x,
            y: upper_left.y,
        },
    )
    .to_polygon()
}

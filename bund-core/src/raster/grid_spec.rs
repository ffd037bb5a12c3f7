use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

use super::RasterError;

/// tolerance, in cells, when deciding if two grids share the same snap lattice.
const ALIGNMENT_TOLERANCE: f64 = 1e-6;

/// georeferencing of a north-up raster with square cells. the origin is the
/// upper-left corner of the upper-left cell, rows run from north to south.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GridSpec {
    pub xmin: f64,
    pub ymax: f64,
    pub cell_size: f64,
    pub rows: usize,
    pub cols: usize,
}

impl GridSpec {
    pub fn new(
        xmin: f64,
        ymax: f64,
        cell_size: f64,
        rows: usize,
        cols: usize,
    ) -> Result<GridSpec, RasterError> {
        if !xmin.is_finite() || !ymax.is_finite() {
            return Err(RasterError::InvalidGrid(format!(
                "origin ({xmin}, {ymax}) must be finite"
            )));
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(RasterError::InvalidGrid(format!(
                "cell size must be a positive number, found {cell_size}"
            )));
        }
        if rows == 0 || cols == 0 {
            return Err(RasterError::InvalidGrid(format!(
                "grid must have at least one row and column, found {rows}x{cols}"
            )));
        }
        Ok(GridSpec {
            xmin,
            ymax,
            cell_size,
            rows,
            cols,
        })
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn xmax(&self) -> f64 {
        self.xmin + self.cols as f64 * self.cell_size
    }

    pub fn ymin(&self) -> f64 {
        self.ymax - self.rows as f64 * self.cell_size
    }

    pub fn cell_area(&self) -> f64 {
        self.cell_size * self.cell_size
    }

    pub fn extent(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.xmin,
                y: self.ymin(),
            },
            Coord {
                x: self.xmax(),
                y: self.ymax,
            },
        )
    }

    /// row-major index of a cell.
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    #[inline]
    pub fn cell_center(&self, row: usize, col: usize) -> Coord<f64> {
        Coord {
            x: self.xmin + (col as f64 + 0.5) * self.cell_size,
            y: self.ymax - (row as f64 + 0.5) * self.cell_size,
        }
    }

    /// corner coordinates of a cell as (upper-left, lower-right).
    pub fn cell_bounds(&self, row: usize, col: usize) -> (Coord<f64>, Coord<f64>) {
        let x0 = self.xmin + col as f64 * self.cell_size;
        let y0 = self.ymax - row as f64 * self.cell_size;
        (
            Coord { x: x0, y: y0 },
            Coord {
                x: x0 + self.cell_size,
                y: y0 - self.cell_size,
            },
        )
    }

    /// finds the (row, col) of the cell containing a location, if it is on the grid.
    pub fn cell_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let col = ((x - self.xmin) / self.cell_size).floor();
        let row = ((self.ymax - y) / self.cell_size).floor();
        if col < 0.0 || row < 0.0 || col >= self.cols as f64 || row >= self.rows as f64 {
            None
        } else {
            Some((row as usize, col as usize))
        }
    }

    /// snaps a rectangle outward onto this grid's lattice and clips it to the grid
    /// extent. the result shares this grid's cell size and alignment. returns None
    /// when the rectangle does not overlap the grid.
    pub fn window(&self, rect: &Rect<f64>) -> Option<GridSpec> {
        let cs = self.cell_size;
        let col0 = ((rect.min().x - self.xmin) / cs).floor().max(0.0);
        let col1 = ((rect.max().x - self.xmin) / cs).ceil().min(self.cols as f64);
        let row0 = ((self.ymax - rect.max().y) / cs).floor().max(0.0);
        let row1 = ((self.ymax - rect.min().y) / cs).ceil().min(self.rows as f64);
        if col1 <= col0 || row1 <= row0 {
            return None;
        }
        let (col0, row0) = (col0 as usize, row0 as usize);
        Some(GridSpec {
            xmin: self.xmin + col0 as f64 * cs,
            ymax: self.ymax - row0 as f64 * cs,
            cell_size: cs,
            rows: row1 as usize - row0,
            cols: col1 as usize - col0,
        })
    }

    /// row and column offset of this grid inside a parent grid. fails when the
    /// grids do not share cell size and lattice, or when this grid spills outside
    /// of the parent.
    pub fn offset_in(&self, parent: &GridSpec) -> Result<(usize, usize), RasterError> {
        if (self.cell_size - parent.cell_size).abs() > ALIGNMENT_TOLERANCE * parent.cell_size {
            return Err(RasterError::Misaligned(format!(
                "cell size {} does not match parent cell size {}",
                self.cell_size, parent.cell_size
            )));
        }
        let col_off = (self.xmin - parent.xmin) / parent.cell_size;
        let row_off = (parent.ymax - self.ymax) / parent.cell_size;
        let snapped =
            |v: f64| (v - v.round()).abs() <= ALIGNMENT_TOLERANCE && v.round() >= 0.0;
        if !snapped(col_off) || !snapped(row_off) {
            return Err(RasterError::Misaligned(format!(
                "origin ({}, {}) is not on the parent lattice (offset {col_off}, {row_off} cells)",
                self.xmin, self.ymax
            )));
        }
        let (row_off, col_off) = (row_off.round() as usize, col_off.round() as usize);
        if row_off + self.rows > parent.rows || col_off + self.cols > parent.cols {
            return Err(RasterError::Misaligned(format!(
                "{}x{} grid at offset ({row_off}, {col_off}) exceeds parent {}x{}",
                self.rows, self.cols, parent.rows, parent.cols
            )));
        }
        Ok((row_off, col_off))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridSpec {
        GridSpec::new(0.0, 100.0, 1.0, 100, 100).expect("test invariant failed: valid grid")
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        assert!(GridSpec::new(0.0, 0.0, 0.0, 1, 1).is_err());
        assert!(GridSpec::new(0.0, 0.0, f64::NAN, 1, 1).is_err());
        assert!(GridSpec::new(0.0, 0.0, 1.0, 0, 1).is_err());
    }

    #[test]
    fn test_cell_center_and_lookup() {
        let g = grid();
        let c = g.cell_center(0, 0);
        assert_eq!((c.x, c.y), (0.5, 99.5));
        assert_eq!(g.cell_of(0.5, 99.5), Some((0, 0)));
        assert_eq!(g.cell_of(99.9, 0.1), Some((99, 99)));
        assert_eq!(g.cell_of(-0.1, 50.0), None);
        assert_eq!(g.cell_of(50.0, 100.1), None);
    }

    #[test]
    fn test_window_snaps_and_clips() {
        let g = grid();
        let rect = Rect::new(Coord { x: 10.2, y: 20.7 }, Coord { x: 15.5, y: 130.0 });
        let w = g.window(&rect).expect("test invariant failed: window overlaps");
        assert_eq!(w.xmin, 10.0);
        assert_eq!(w.ymax, 100.0);
        assert_eq!(w.cols, 6);
        assert_eq!(w.rows, 80);
        assert_eq!(w.offset_in(&g).expect("aligned"), (0, 10));
    }

    #[test]
    fn test_window_outside_grid() {
        let g = grid();
        let rect = Rect::new(Coord { x: 200.0, y: 200.0 }, Coord { x: 210.0, y: 210.0 });
        assert!(g.window(&rect).is_none());
    }

    #[test]
    fn test_offset_rejects_misaligned() {
        let g = grid();
        let shifted = GridSpec::new(0.5, 100.0, 1.0, 10, 10).expect("valid");
        assert!(shifted.offset_in(&g).is_err());
        let too_big = GridSpec::new(95.0, 100.0, 1.0, 10, 10).expect("valid");
        assert!(too_big.offset_in(&g).is_err());
    }
}

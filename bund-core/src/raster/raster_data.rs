use geo::Coord;
use rayon::prelude::*;

use super::{GridSpec, RasterError, RasterStatistics};

/// a single-band floating point raster. "no data" cells hold NaN.
#[derive(Clone, Debug)]
pub struct Raster {
    spec: GridSpec,
    data: Vec<f64>,
}

impl Raster {
    /// creates a raster where every cell holds the same value.
    pub fn filled(spec: GridSpec, value: f64) -> Raster {
        Raster {
            spec,
            data: vec![value; spec.len()],
        }
    }

    /// creates a raster with no defined cells.
    pub fn empty(spec: GridSpec) -> Raster {
        Raster::filled(spec, f64::NAN)
    }

    pub fn from_vec(spec: GridSpec, data: Vec<f64>) -> Result<Raster, RasterError> {
        if data.len() != spec.len() {
            return Err(RasterError::ShapeMismatch {
                expected: spec.len(),
                found: data.len(),
            });
        }
        Ok(Raster { spec, data })
    }

    /// builds a raster by evaluating a function at every cell. the function receives
    /// the (row, col) and the cell centre. rows are evaluated in parallel.
    pub fn from_fn<F>(spec: GridSpec, op: F) -> Raster
    where
        F: Fn(usize, usize, Coord<f64>) -> f64 + Sync,
    {
        let mut data = vec![f64::NAN; spec.len()];
        data.par_chunks_mut(spec.cols)
            .enumerate()
            .for_each(|(row, chunk)| {
                for (col, cell) in chunk.iter_mut().enumerate() {
                    *cell = op(row, col, spec.cell_center(row, col));
                }
            });
        Raster { spec, data }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// value of a cell, None when the cell is off the grid or holds no data.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.spec.rows || col >= self.spec.cols {
            return None;
        }
        let v = self.data[self.spec.index(row, col)];
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    /// raw cell value, NaN for no data.
    #[inline]
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.data[self.spec.index(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        if row < self.spec.rows && col < self.spec.cols {
            let idx = self.spec.index(row, col);
            self.data[idx] = value;
        }
    }

    /// applies a cell-wise function, the function sees NaN for no data.
    pub fn map<F>(&self, op: F) -> Raster
    where
        F: Fn(f64) -> f64 + Sync,
    {
        let data = self.data.par_iter().map(|v| op(*v)).collect();
        Raster {
            spec: self.spec,
            data,
        }
    }

    /// combines two rasters on the same grid cell by cell.
    pub fn zip_with<F>(&self, other: &Raster, op: F) -> Result<Raster, RasterError>
    where
        F: Fn(f64, f64) -> f64 + Sync,
    {
        if self.spec != other.spec {
            return Err(RasterError::Misaligned(format!(
                "cannot combine {:?} with {:?}",
                self.spec, other.spec
            )));
        }
        let data = self
            .data
            .par_iter()
            .zip(other.data.par_iter())
            .map(|(a, b)| op(*a, *b))
            .collect();
        Ok(Raster {
            spec: self.spec,
            data,
        })
    }

    /// copies the cells of an aligned sub-grid out of this raster.
    pub fn extract_window(&self, window: &GridSpec) -> Result<Raster, RasterError> {
        let (row_off, col_off) = window.offset_in(&self.spec)?;
        let mut data = Vec::with_capacity(window.len());
        for row in 0..window.rows {
            let start = self.spec.index(row + row_off, col_off);
            data.extend_from_slice(&self.data[start..start + window.cols]);
        }
        Raster::from_vec(*window, data)
    }

    /// visits every cell of an aligned sub-raster together with the matching cell of
    /// this raster, allowing this raster to be updated in place.
    pub fn update_from<F>(&mut self, other: &Raster, mut op: F) -> Result<(), RasterError>
    where
        F: FnMut(&mut f64, f64),
    {
        let (row_off, col_off) = other.spec.offset_in(&self.spec)?;
        for row in 0..other.spec.rows {
            for col in 0..other.spec.cols {
                let idx = self.spec.index(row + row_off, col + col_off);
                op(&mut self.data[idx], other.value(row, col));
            }
        }
        Ok(())
    }

    /// bilinear sample between the four nearest cell centres. when any of them holds
    /// no data, falls back to the value of the containing cell.
    pub fn sample_bilinear(&self, x: f64, y: f64) -> Option<f64> {
        let (row, col) = self.spec.cell_of(x, y)?;
        let fx = ((x - self.spec.xmin) / self.spec.cell_size - 0.5)
            .clamp(0.0, (self.spec.cols - 1) as f64);
        let fy = ((self.spec.ymax - y) / self.spec.cell_size - 0.5)
            .clamp(0.0, (self.spec.rows - 1) as f64);
        let (c0, r0) = (fx.floor() as usize, fy.floor() as usize);
        let (c1, r1) = (
            (c0 + 1).min(self.spec.cols - 1),
            (r0 + 1).min(self.spec.rows - 1),
        );
        let (tx, ty) = (fx - c0 as f64, fy - r0 as f64);
        let corners = [
            self.value(r0, c0),
            self.value(r0, c1),
            self.value(r1, c0),
            self.value(r1, c1),
        ];
        if corners.iter().any(|v| v.is_nan()) {
            return self.get(row, col);
        }
        let top = corners[0] * (1.0 - tx) + corners[1] * tx;
        let bottom = corners[2] * (1.0 - tx) + corners[3] * tx;
        Some(top * (1.0 - ty) + bottom * ty)
    }

    /// number of cells holding data.
    pub fn defined_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// summary statistics over the defined cells, None when no cell is defined.
    pub fn statistics(&self) -> Option<RasterStatistics> {
        RasterStatistics::from_values(self.data.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(rows: usize, cols: usize) -> GridSpec {
        GridSpec::new(0.0, rows as f64, 1.0, rows, cols).expect("test invariant failed: grid")
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        let result = Raster::from_vec(spec(2, 2), vec![1.0; 3]);
        assert!(matches!(
            result,
            Err(RasterError::ShapeMismatch {
                expected: 4,
                found: 3
            })
        ));
    }

    #[test]
    fn test_get_treats_nan_as_no_data() {
        let r = Raster::from_vec(spec(1, 2), vec![f64::NAN, 2.0]).expect("valid");
        assert_eq!(r.get(0, 0), None);
        assert_eq!(r.get(0, 1), Some(2.0));
        assert_eq!(r.get(5, 5), None);
        assert_eq!(r.defined_count(), 1);
    }

    #[test]
    fn test_extract_and_update_window() {
        let g = spec(4, 4);
        let r = Raster::from_fn(g, |row, col, _| (row * 4 + col) as f64);
        let w = GridSpec::new(1.0, 3.0, 1.0, 2, 2).expect("valid");
        let sub = r.extract_window(&w).expect("aligned");
        assert_eq!(sub.data(), &[5.0, 6.0, 9.0, 10.0]);

        let mut target = Raster::empty(g);
        target
            .update_from(&sub, |cur, v| *cur = v)
            .expect("aligned");
        assert_eq!(target.get(1, 1), Some(5.0));
        assert_eq!(target.get(2, 2), Some(10.0));
        assert_eq!(target.get(0, 0), None);
    }

    #[test]
    fn test_bilinear_on_plane() {
        // z = x on a 1m grid: cell centres hold col + 0.5
        let g = spec(3, 3);
        let r = Raster::from_fn(g, |_, _, c| c.x);
        let v = r.sample_bilinear(1.25, 1.5).expect("on grid");
        assert!((v - 1.25).abs() < 1e-12);
        assert_eq!(r.sample_bilinear(-1.0, 1.0), None);
    }

    #[test]
    fn test_bilinear_falls_back_near_no_data() {
        let g = spec(2, 2);
        let r = Raster::from_vec(g, vec![1.0, f64::NAN, 3.0, 4.0]).expect("valid");
        assert_eq!(r.sample_bilinear(0.9, 1.1), Some(1.0));
        assert_eq!(r.sample_bilinear(1.5, 1.5), None);
    }
}

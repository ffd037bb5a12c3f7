use rayon::prelude::*;

use super::{Raster, RasterError};

/// which cells receive a focal result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocalCoverage {
    /// any cell with at least one defined neighbour (the neighbourhood may grow the
    /// defined area by up to the radius).
    AnyNeighbour,
    /// only cells that were defined in the input.
    PreserveDefined,
}

/// converts a smoothing radius in map units to a whole number of cells, at least one.
pub fn radius_in_cells(radius: f64, cell_size: f64) -> Result<usize, RasterError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(RasterError::InvalidParameter(format!(
            "focal radius must be a positive number, found {radius}"
        )));
    }
    let cells = (radius / cell_size.max(0.0001)).round();
    Ok(cells.max(1.0) as usize)
}

/// circular neighbourhood mean that ignores no-data cells.
pub fn focal_mean(
    raster: &Raster,
    radius_cells: usize,
    coverage: FocalCoverage,
) -> Result<Raster, RasterError> {
    if radius_cells == 0 {
        return Err(RasterError::InvalidParameter(String::from(
            "focal radius must be at least one cell",
        )));
    }
    let spec = *raster.spec();
    let r = radius_cells as isize;
    if radius_cells > spec.rows.max(spec.cols) {
        return Err(RasterError::InvalidParameter(format!(
            "focal radius of {radius_cells} cells exceeds the {}x{} raster",
            spec.rows, spec.cols
        )));
    }
    let kernel: Vec<(isize, isize)> = (-r..=r)
        .flat_map(|dr| (-r..=r).map(move |dc| (dr, dc)))
        .filter(|(dr, dc)| dr * dr + dc * dc <= r * r)
        .collect();

    let mut data = vec![f64::NAN; spec.len()];
    data.par_chunks_mut(spec.cols)
        .enumerate()
        .for_each(|(row, chunk)| {
            for (col, out) in chunk.iter_mut().enumerate() {
                if coverage == FocalCoverage::PreserveDefined && raster.get(row, col).is_none() {
                    continue;
                }
                let mut sum = 0.0;
                let mut n = 0usize;
                for (dr, dc) in kernel.iter() {
                    let (nr, nc) = (row as isize + dr, col as isize + dc);
                    if nr < 0 || nc < 0 {
                        continue;
                    }
                    if let Some(v) = raster.get(nr as usize, nc as usize) {
                        sum += v;
                        n += 1;
                    }
                }
                if n > 0 {
                    *out = sum / n as f64;
                }
            }
        });
    Raster::from_vec(spec, data)
}

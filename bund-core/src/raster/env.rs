use geo::{Coord, Rect};
use rayon::prelude::*;

use super::{GridSpec, Raster, RasterError};

/// the processing environment shared by every raster operation of a run: the snap
/// grid (cell size, alignment and extent) inherited from the terrain, plus the
/// processing mask while one is active.
///
/// a mask can only be activated through [`ProcessingEnv::apply_mask`], which hands
/// out a [`MaskGuard`] holding a mutable borrow of the environment. code that needs
/// the unmasked environment (merging into the global rasters) cannot run until the
/// guard is gone, and dropping the guard always clears the mask.
#[derive(Debug)]
pub struct ProcessingEnv {
    grid: GridSpec,
    active_window: Option<GridSpec>,
}

/// cells of a window that participate in the current operation.
#[derive(Clone, Debug)]
pub struct Mask {
    window: GridSpec,
    cells: Vec<bool>,
}

pub struct MaskGuard<'a> {
    env: &'a mut ProcessingEnv,
    mask: Mask,
}

impl ProcessingEnv {
    pub fn new(grid: GridSpec) -> ProcessingEnv {
        ProcessingEnv {
            grid,
            active_window: None,
        }
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// window of the active mask, if any. always None outside of a [`MaskGuard`].
    pub fn active_window(&self) -> Option<&GridSpec> {
        self.active_window.as_ref()
    }

    pub fn is_masked(&self) -> bool {
        self.active_window.is_some()
    }

    /// restricts processing to the mask until the returned guard is dropped.
    pub fn apply_mask(&mut self, mask: Mask) -> MaskGuard<'_> {
        self.active_window = Some(mask.window);
        log::debug!(
            "processing mask applied: {}x{} window with {} cells inside",
            mask.window.rows,
            mask.window.cols,
            mask.inside_count()
        );
        MaskGuard { env: self, mask }
    }
}

impl Mask {
    /// builds a mask over the part of `grid` covered by `bounds`, marking the cells
    /// whose centre satisfies `inside`. returns None when the bounds miss the grid
    /// or no cell centre is inside.
    pub fn from_fn<F>(grid: &GridSpec, bounds: &Rect<f64>, inside: F) -> Option<Mask>
    where
        F: Fn(Coord<f64>) -> bool + Sync,
    {
        let window = grid.window(bounds)?;
        let cells: Vec<bool> = (0..window.len())
            .into_par_iter()
            .map(|idx| inside(window.cell_center(idx / window.cols, idx % window.cols)))
            .collect();
        if !cells.iter().any(|c| *c) {
            return None;
        }
        Some(Mask { window, cells })
    }

    pub fn window(&self) -> &GridSpec {
        &self.window
    }

    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.window.rows && col < self.window.cols && self.cells[self.window.index(row, col)]
    }

    pub fn inside_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }
}

impl MaskGuard<'_> {
    /// the snap grid of the run.
    pub fn grid(&self) -> &GridSpec {
        &self.env.grid
    }

    /// the grid every masked output is written on.
    pub fn window(&self) -> &GridSpec {
        &self.mask.window
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// clears the cells of a window raster that fall outside of the mask.
    pub fn restrict(&self, mut raster: Raster) -> Result<Raster, RasterError> {
        if raster.spec() != self.window() {
            return Err(RasterError::Misaligned(format!(
                "masked output must be on the mask window {:?}, found {:?}",
                self.window(),
                raster.spec()
            )));
        }
        let window = *self.window();
        for row in 0..window.rows {
            for col in 0..window.cols {
                if !self.mask.contains(row, col) {
                    raster.set(row, col, f64::NAN);
                }
            }
        }
        Ok(raster)
    }

    /// reads a full-extent raster through the mask.
    pub fn extract(&self, raster: &Raster) -> Result<Raster, RasterError> {
        let window = raster.extract_window(self.window())?;
        self.restrict(window)
    }
}

impl Drop for MaskGuard<'_> {
    fn drop(&mut self) {
        self.env.active_window = None;
        log::debug!("processing mask cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridSpec {
        GridSpec::new(0.0, 10.0, 1.0, 10, 10).expect("test invariant failed: grid")
    }

    fn square_mask(grid: &GridSpec) -> Mask {
        let bounds = Rect::new(Coord { x: 2.0, y: 2.0 }, Coord { x: 6.0, y: 6.0 });
        Mask::from_fn(grid, &bounds, |c| c.x < 4.0).expect("test invariant failed: mask")
    }

    #[test]
    fn test_guard_clears_mask_on_drop() {
        let g = grid();
        let mut env = ProcessingEnv::new(g);
        {
            let guard = env.apply_mask(square_mask(&g));
            assert_eq!(guard.window().cols, 4);
        }
        assert!(!env.is_masked());
        assert!(env.active_window().is_none());
    }

    #[test]
    fn test_guard_clears_mask_on_early_return() {
        fn fails_inside(env: &mut ProcessingEnv, mask: Mask) -> Result<(), String> {
            let _guard = env.apply_mask(mask);
            Err(String::from("feature failed"))
        }
        let g = grid();
        let mut env = ProcessingEnv::new(g);
        assert!(fails_inside(&mut env, square_mask(&g)).is_err());
        assert!(!env.is_masked());
    }

    #[test]
    fn test_extract_applies_mask() {
        let g = grid();
        let mut env = ProcessingEnv::new(g);
        let terrain = Raster::filled(g, 5.0);
        let guard = env.apply_mask(square_mask(&g));
        let masked = guard.extract(&terrain).expect("aligned");
        assert_eq!(masked.spec().cols, 4);
        assert_eq!(masked.get(0, 0), Some(5.0));
        assert_eq!(masked.get(0, 3), None);
        assert_eq!(masked.defined_count(), 8);
    }

    #[test]
    fn test_empty_mask_is_none() {
        let g = grid();
        let bounds = Rect::new(Coord { x: 2.0, y: 2.0 }, Coord { x: 6.0, y: 6.0 });
        assert!(Mask::from_fn(&g, &bounds, |_| false).is_none());
    }
}

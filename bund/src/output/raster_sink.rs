use std::path::Path;

use bund_core::raster::{write_ascii_grid, Raster};

use super::OutputNames;
use crate::{util::fs::write_json, BundError};

/// the merged surface with the terrain filling every cell no bund defines.
pub fn fill_gaps(surface: &Raster, terrain: &Raster) -> Result<Raster, BundError> {
    Ok(surface.zip_with(terrain, |s, t| if s.is_nan() { t } else { s })?)
}

/// writes a raster as an ESRI ASCII grid followed by its statistics sidecar. a
/// failed sidecar is logged and does not fail the write.
pub fn write_raster(raster: &Raster, path: &Path) -> Result<(), BundError> {
    write_ascii_grid(raster, path)?;
    log::info!("wrote raster '{}'", path.display());
    if let Err(e) = write_statistics(raster, path) {
        log::warn!("statistics for '{}' not written: {e}", path.display());
    }
    Ok(())
}

/// writes min/max/mean/count of the defined cells to `<name>.stats.json`.
pub fn write_statistics(raster: &Raster, raster_path: &Path) -> Result<(), BundError> {
    let stats = raster.statistics();
    write_json(&stats, &OutputNames::statistics_sidecar(raster_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bund_core::raster::{read_ascii_grid, GridSpec, RasterStatistics};

    #[test]
    fn test_gap_filled_surface_with_sidecar() {
        let spec = GridSpec::new(0.0, 1.0, 1.0, 1, 3).expect("test invariant failed: grid");
        let surface = Raster::from_vec(spec, vec![f64::NAN, 9.0, f64::NAN])
            .expect("test invariant failed: surface");
        let terrain = Raster::from_vec(spec, vec![5.0, 5.0, f64::NAN])
            .expect("test invariant failed: terrain");
        let filled = fill_gaps(&surface, &terrain).expect("aligned");
        assert_eq!(filled.get(0, 0), Some(5.0));
        assert_eq!(filled.get(0, 1), Some(9.0));
        assert_eq!(filled.get(0, 2), None);

        let dir = std::env::temp_dir().join(format!("bund-raster-sink-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("test invariant failed: temp dir");
        let path = dir.join("surface.asc");
        write_raster(&filled, &path).expect("should write");
        let read = read_ascii_grid(&path).expect("should read back");
        assert_eq!(read.get(0, 1), Some(9.0));
        let sidecar = std::fs::read_to_string(dir.join("surface.stats.json"))
            .expect("sidecar should exist");
        let stats: RasterStatistics = serde_json::from_str(&sidecar).expect("valid stats");
        assert_eq!(stats.count, 2);
        assert_eq!(stats.max, 9.0);
        let _ = std::fs::remove_dir_all(dir);
    }
}

use std::path::{Path, PathBuf};

/// names of every output of a run: `<base>_<product><suffix>.<ext>` in the output
/// directory, where base is the file stem of the centreline input.
#[derive(Clone, Debug)]
pub struct OutputNames {
    directory: PathBuf,
    base: String,
    suffix: String,
}

impl OutputNames {
    pub fn new(directory: &Path, centrelines: &Path, suffix: &str) -> OutputNames {
        let base = centrelines
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| String::from("centrelines"));
        OutputNames {
            directory: directory.to_path_buf(),
            base,
            suffix: suffix.to_string(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn product(&self, product: &str, extension: &str) -> PathBuf {
        self.directory.join(format!(
            "{}_{product}{}.{extension}",
            self.base, self.suffix
        ))
    }

    pub fn surface(&self) -> PathBuf {
        self.product("BundSurface", "asc")
    }

    pub fn fill(&self) -> PathBuf {
        self.product("BundFill", "asc")
    }

    pub fn footprint(&self) -> PathBuf {
        self.product("BundFootprint", "geojson")
    }

    pub fn multipatch(&self) -> PathBuf {
        self.product("BundMultipatch", "obj")
    }

    pub fn volumes_csv(&self) -> PathBuf {
        self.product("BundVolumes", "csv")
    }

    pub fn volumes_json(&self) -> PathBuf {
        self.product("BundVolumes", "json")
    }

    pub fn summary(&self) -> PathBuf {
        self.product("BundSummary", "json")
    }

    /// the dissolved centrelines never carry the datum suffix.
    pub fn merged_centrelines(&self) -> PathBuf {
        self.directory
            .join(format!("{}_Centrelines_MergedByID.geojson", self.base))
    }

    pub fn per_feature_directory(&self) -> PathBuf {
        self.directory.join("per_feature")
    }

    pub fn per_feature_surface(&self, source_id: i64) -> PathBuf {
        self.per_feature_directory().join(format!(
            "{}_BundSurface_{source_id}{}.asc",
            self.base, self.suffix
        ))
    }

    /// `<name>.stats.json` next to a raster.
    pub fn statistics_sidecar(raster_path: &Path) -> PathBuf {
        raster_path.with_extension("stats.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_with_suffix() {
        let names = OutputNames::new(Path::new("out"), Path::new("data/bunds.geojson"), "_AHD");
        assert_eq!(names.surface(), Path::new("out/bunds_BundSurface_AHD.asc"));
        assert_eq!(names.volumes_csv(), Path::new("out/bunds_BundVolumes_AHD.csv"));
        assert_eq!(
            names.merged_centrelines(),
            Path::new("out/bunds_Centrelines_MergedByID.geojson")
        );
        assert_eq!(
            names.per_feature_surface(3),
            Path::new("out/per_feature/bunds_BundSurface_3_AHD.asc")
        );
        assert_eq!(
            OutputNames::statistics_sidecar(&names.fill()),
            Path::new("out/bunds_BundFill_AHD.stats.json")
        );
    }

    #[test]
    fn test_names_without_suffix() {
        let names = OutputNames::new(Path::new("out"), Path::new("lines.geojson"), "");
        assert_eq!(names.footprint(), Path::new("out/lines_BundFootprint.geojson"));
    }
}

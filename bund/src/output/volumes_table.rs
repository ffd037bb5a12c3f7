use std::path::Path;

use kdam::tqdm;

use crate::{design::VolumeRecord, util::fs::write_json, BundError};

/// writes the volumes table as CSV, one row per feature followed by the totals row.
/// values that do not apply are left blank.
pub fn write_volumes_csv(rows: &[VolumeRecord], path: &Path) -> Result<(), BundError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| BundError::CsvWriteError(format!("Failed to create {}: {e}", path.display())))?;
    let bar_iter = tqdm!(rows.iter(), total = rows.len(), desc = "write volumes");
    for row in bar_iter {
        writer.serialize(row).map_err(|e| {
            BundError::CsvWriteError(format!("Failed to write to {}: {e}", path.display()))
        })?;
    }
    eprintln!();
    writer
        .flush()
        .map_err(|e| BundError::CsvWriteError(format!("Failed to flush {}: {e}", path.display())))?;
    Ok(())
}

/// writes the volumes table as a JSON array of rows.
pub fn write_volumes_json(rows: &[VolumeRecord], path: &Path) -> Result<(), BundError> {
    write_json(rows, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{DesignConfig, DesignParameters, SmoothingConfig},
        design::FootprintMetrics,
    };

    #[test]
    fn test_csv_schema_and_blank_totals() {
        let design = DesignConfig {
            mode: String::from("HagValue"),
            height_field: None,
            start_height: None,
            end_height: None,
            hag_field: None,
            hag_value: Some(1.5),
            crest_width: 2.0,
            maintain_crest: true,
            batter: 5.0,
            taper: 0.0,
            strip_depth: 0.0,
            extra_buffer: 20.0,
            datum: String::from("NAVD88"),
            name_suffix: false,
            merge_by_id: false,
        };
        let params = DesignParameters::new(&design, &SmoothingConfig::default())
            .expect("test invariant failed: parameters");
        let metrics = FootprintMetrics {
            area_m2: 10.0,
            volume_m3: 5.0,
            strip_m3: 0.0,
        };
        let rows = vec![VolumeRecord::totals(&params, &metrics)];

        let dir = std::env::temp_dir().join(format!("bund-volumes-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("test invariant failed: temp dir");
        let path = dir.join("volumes.csv");
        write_volumes_csv(&rows, &path).expect("should write");
        let text = std::fs::read_to_string(&path).expect("test invariant failed: read back");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(
                "sourceId,centrelineId,length_m,mode,hag_m,crestField_m,startH_m,endH_m,\
                 crestWidth_m,batterHperV,endTaper_m,maintainCrest,stripDepth_m,fillArea_m2,\
                 fillVolume_m3,stripVolume_m3,vertDatum"
            )
        );
        assert_eq!(
            lines.next(),
            Some("-1,__TOTAL__,,HagValue,1.5,,,,2.0,5.0,0.0,true,0.0,10.0,5.0,0.0,NAVD88")
        );

        let json_path = dir.join("volumes.json");
        write_volumes_json(&rows, &json_path).expect("should write json");
        let json = std::fs::read_to_string(&json_path).expect("test invariant failed: read back");
        let parsed: Vec<VolumeRecord> = serde_json::from_str(&json).expect("valid json");
        assert_eq!(parsed, rows);
        let _ = std::fs::remove_dir_all(dir);
    }
}

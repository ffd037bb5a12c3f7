use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use super::{GridSpec, Raster, RasterError};

const DEFAULT_NODATA: f64 = -9999.0;

/// reads an ESRI ASCII grid (`.asc`). both corner and centre registered headers are
/// accepted; cells matching `NODATA_value` become NaN.
pub fn read_ascii_grid(path: &Path) -> Result<Raster, RasterError> {
    let file = File::open(path).map_err(|e| RasterError::Read {
        path: path.to_owned(),
        message: e.to_string(),
    })?;
    let reader = BufReader::new(file);

    let mut ncols: Option<usize> = None;
    let mut nrows: Option<usize> = None;
    let mut xll: Option<(f64, bool)> = None;
    let mut yll: Option<(f64, bool)> = None;
    let mut cell_size: Option<f64> = None;
    let mut nodata: Option<f64> = None;
    let mut values: Vec<f64> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| RasterError::Read {
            path: path.to_owned(),
            message: e.to_string(),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parse_err = |message: String| RasterError::Parse {
            path: path.to_owned(),
            line: line_no,
            message,
        };
        let first = trimmed.split_whitespace().next().unwrap_or_default();
        if first.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            let mut parts = trimmed.split_whitespace();
            let key = parts.next().unwrap_or_default().to_ascii_lowercase();
            let raw = parts
                .next()
                .ok_or_else(|| parse_err(format!("header '{key}' has no value")))?;
            let number = raw
                .parse::<f64>()
                .map_err(|e| parse_err(format!("header '{key}' value '{raw}': {e}")))?;
            match key.as_str() {
                "ncols" => ncols = Some(number as usize),
                "nrows" => nrows = Some(number as usize),
                "xllcorner" => xll = Some((number, false)),
                "xllcenter" => xll = Some((number, true)),
                "yllcorner" => yll = Some((number, false)),
                "yllcenter" => yll = Some((number, true)),
                "cellsize" => cell_size = Some(number),
                "nodata_value" => nodata = Some(number),
                other => return Err(parse_err(format!("unknown header '{other}'"))),
            }
            continue;
        }
        for token in trimmed.split_whitespace() {
            let v = token
                .parse::<f64>()
                .map_err(|e| parse_err(format!("cell value '{token}': {e}")))?;
            let is_nodata = nodata.is_some_and(|nd| (v - nd).abs() < 1e-10);
            values.push(if is_nodata { f64::NAN } else { v });
        }
    }

    let missing = |name: &str| RasterError::Read {
        path: path.to_owned(),
        message: format!("missing header '{name}'"),
    };
    let cols = ncols.ok_or_else(|| missing("ncols"))?;
    let rows = nrows.ok_or_else(|| missing("nrows"))?;
    let cs = cell_size.ok_or_else(|| missing("cellsize"))?;
    let (x, x_centre) = xll.ok_or_else(|| missing("xllcorner"))?;
    let (y, y_centre) = yll.ok_or_else(|| missing("yllcorner"))?;
    let xmin = if x_centre { x - cs / 2.0 } else { x };
    let ymin = if y_centre { y - cs / 2.0 } else { y };
    let spec = GridSpec::new(xmin, ymin + rows as f64 * cs, cs, rows, cols)?;
    log::debug!(
        "read {}x{} grid with cell size {cs} from '{}'",
        rows,
        cols,
        path.display()
    );
    Raster::from_vec(spec, values)
}

/// writes a raster as an ESRI ASCII grid with corner registration.
pub fn write_ascii_grid(raster: &Raster, path: &Path) -> Result<(), RasterError> {
    let write_err = |e: std::io::Error| RasterError::Write {
        path: path.to_owned(),
        message: e.to_string(),
    };
    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    let spec = raster.spec();
    writeln!(writer, "ncols {}", spec.cols).map_err(write_err)?;
    writeln!(writer, "nrows {}", spec.rows).map_err(write_err)?;
    writeln!(writer, "xllcorner {}", spec.xmin).map_err(write_err)?;
    writeln!(writer, "yllcorner {}", spec.ymin()).map_err(write_err)?;
    writeln!(writer, "cellsize {}", spec.cell_size).map_err(write_err)?;
    writeln!(writer, "NODATA_value {DEFAULT_NODATA}").map_err(write_err)?;
    for row in raster.data().chunks(spec.cols) {
        let line = row
            .iter()
            .map(|v| {
                if v.is_nan() {
                    DEFAULT_NODATA.to_string()
                } else {
                    v.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{line}").map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bund-core-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("test invariant failed: temp dir");
        dir
    }

    #[test]
    fn test_read_centre_registered_grid() {
        let dir = test_dir("ascii-centre");
        let path = dir.join("dem.asc");
        std::fs::write(
            &path,
            "ncols 3\nnrows 2\nxllcenter 0.5\nyllcenter 0.5\ncellsize 1\nNODATA_value -9999\n1 2 3\n4 -9999 6\n",
        )
        .expect("test invariant failed: write");
        let r = read_ascii_grid(&path).expect("valid grid");
        assert_eq!(r.spec().xmin, 0.0);
        assert_eq!(r.spec().ymax, 2.0);
        assert_eq!(r.get(0, 2), Some(3.0));
        assert_eq!(r.get(1, 1), None);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_write_then_read_preserves_no_data() {
        let dir = test_dir("ascii-write");
        let path = dir.join("out.asc");
        let spec = GridSpec::new(10.0, 20.0, 2.0, 2, 2).expect("valid");
        let raster = Raster::from_vec(spec, vec![1.5, f64::NAN, -2.0, 4.25]).expect("valid");
        write_ascii_grid(&raster, &path).expect("write succeeds");
        let back = read_ascii_grid(&path).expect("read succeeds");
        assert_eq!(back.spec(), raster.spec());
        assert_eq!(back.get(0, 0), Some(1.5));
        assert_eq!(back.get(0, 1), None);
        assert_eq!(back.get(1, 1), Some(4.25));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_wrong_value_count_fails() {
        let dir = test_dir("ascii-short");
        let path = dir.join("short.asc");
        std::fs::write(
            &path,
            "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3\n",
        )
        .expect("test invariant failed: write");
        assert!(matches!(
            read_ascii_grid(&path),
            Err(RasterError::ShapeMismatch { .. })
        ));
        let _ = std::fs::remove_dir_all(dir);
    }
}

use std::path::Path;

use serde::Serialize;

use crate::BundError;

/// helper function to "mkdir -p path" - make all directories along a path
pub fn create_dirs<P>(path: P) -> Result<(), BundError>
where
    P: AsRef<Path>,
{
    let dirspath = path.as_ref();
    if !dirspath.is_dir() {
        std::fs::create_dir_all(dirspath).map_err(|e| BundError::WriteError {
            path: dirspath.to_path_buf(),
            message: format!("error building output directory: {e}"),
        })
    } else {
        Ok(())
    }
}

/// writes a value as pretty-printed JSON.
pub fn write_json<T>(value: &T, path: &Path) -> Result<(), BundError>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string_pretty(value).map_err(|e| BundError::WriteError {
        path: path.to_path_buf(),
        message: format!("failure serializing to JSON: {e}"),
    })?;
    std::fs::write(path, json).map_err(|e| BundError::WriteError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// fails with [`BundError::MissingInput`] when `path` does not exist.
pub fn require_exists(path: &Path, kind: &str) -> Result<(), BundError> {
    if path.exists() {
        Ok(())
    } else {
        Err(BundError::MissingInput {
            kind: kind.to_string(),
            path: path.to_path_buf(),
        })
    }
}

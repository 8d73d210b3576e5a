//! Output target preparation: the directory must exist (or be creatable) and is
//! recorded as an absolute path.

use super::keys;
use crate::error::DdlError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputTarget {
    dir: PathBuf,
    create_filename: String,
    drop_filename: String,
}

impl OutputTarget {
    /// Create the output directory if needed and resolve it to an absolute path.
    ///
    /// Empty filenames fall back to the conventional defaults.
    pub fn prepare(
        dir: &Path,
        create_filename: &str,
        drop_filename: &str,
    ) -> Result<Self, DdlError> {
        if dir.as_os_str().is_empty() {
            return Err(DdlError::Configuration(
                "No output directory specified".to_string(),
            ));
        }
        if dir.exists() && !dir.is_dir() {
            return Err(DdlError::Configuration(format!(
                "Cannot create output directory {:?}: a file with that name exists",
                dir
            )));
        }
        std::fs::create_dir_all(dir).map_err(|e| {
            DdlError::Configuration(format!("Cannot create output directory {:?}: {}", dir, e))
        })?;
        let absolute = dunce::canonicalize(dir).map_err(|e| {
            DdlError::Configuration(format!("Cannot resolve output directory {:?}: {}", dir, e))
        })?;
        debug!(output_dir = %absolute.display(), "Output directory ready");

        Ok(Self {
            dir: absolute,
            create_filename: non_empty_or(create_filename, keys::DEFAULT_CREATE_FILENAME),
            drop_filename: non_empty_or(drop_filename, keys::DEFAULT_DROP_FILENAME),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn create_filename(&self) -> &str {
        &self.create_filename
    }

    pub fn drop_filename(&self) -> &str {
        &self.drop_filename
    }

    pub fn create_script_path(&self) -> PathBuf {
        self.dir.join(&self.create_filename)
    }

    pub fn drop_script_path(&self) -> PathBuf {
        self.dir.join(&self.drop_filename)
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

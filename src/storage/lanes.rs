//! Lane enumeration.
//!
//! A lane is nothing more than a directory under the board root; there is no
//! separate metadata record. Enumeration order is filesystem-defined; the
//! sort-order collaborator, not this layer, decides display order.

use crate::storage::filename::MD_EXTENSION;
use crate::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Read access to lane directories and their task files.
#[derive(Debug, Clone)]
pub struct LaneStore {
    /// Board root holding one directory per lane.
    root: PathBuf,
}

impl LaneStore {
    /// Creates a store over the given board root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the board root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of a lane directory.
    #[must_use]
    pub fn lane_path(&self, lane: &str) -> PathBuf {
        self.root.join(lane)
    }

    /// Lists lane names, creating the board root first if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the board root cannot be created or read.
    pub fn list_lanes(&self) -> Result<Vec<String>> {
        fs::create_dir_all(&self.root).map_err(|e| Error::OperationFailed {
            operation: "create_board_root".to_string(),
            cause: e.to_string(),
        })?;

        let entries = fs::read_dir(&self.root).map_err(|e| Error::OperationFailed {
            operation: "read_board_root".to_string(),
            cause: e.to_string(),
        })?;

        let mut lanes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::OperationFailed {
                operation: "read_board_root".to_string(),
                cause: e.to_string(),
            })?;
            let is_dir = entry
                .file_type()
                .map_err(|e| Error::OperationFailed {
                    operation: "stat_lane_dir".to_string(),
                    cause: e.to_string(),
                })?
                .is_dir();
            if is_dir {
                lanes.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(lanes)
    }

    /// Lists markdown filenames in a lane.
    ///
    /// A missing lane directory yields an empty list, keeping read paths
    /// lenient.
    ///
    /// # Errors
    ///
    /// Returns an error if the lane directory exists but cannot be read.
    pub fn list_lane_files(&self, lane: &str) -> Result<Vec<String>> {
        let dir = self.lane_path(lane);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::OperationFailed {
                    operation: "read_lane_dir".to_string(),
                    cause: format!("{}: {e}", dir.display()),
                });
            },
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::OperationFailed {
                operation: "read_lane_dir".to_string(),
                cause: e.to_string(),
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(MD_EXTENSION) {
                files.push(name);
            }
        }
        Ok(files)
    }
}

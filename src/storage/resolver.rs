//! Task resolution: id → file path.
//!
//! Filenames carry no lane information, so resolving an id without a lane
//! hint means scanning lanes in enumeration order. If an id is duplicated
//! across lanes (a data-integrity violation this system does not actively
//! prevent), the first lane in enumeration order wins silently.

use crate::models::TaskId;
use crate::storage::filename;
use crate::storage::lanes::LaneStore;
use crate::{Error, Result};
use std::path::PathBuf;

/// A resolved task location.
#[derive(Debug, Clone)]
pub struct ResolvedTask {
    /// The lane holding the task file.
    pub lane: String,
    /// The filename within the lane.
    pub filename: String,
    /// Full path of the task file.
    pub path: PathBuf,
}

/// Locates task files by id.
#[derive(Debug, Clone)]
pub struct TaskResolver {
    store: LaneStore,
}

impl TaskResolver {
    /// Creates a resolver over the given lane store.
    #[must_use]
    pub const fn new(store: LaneStore) -> Self {
        Self { store }
    }

    /// Resolves a task's location by id.
    ///
    /// With a lane hint, only that lane is scanned. Without one, lanes are
    /// scanned in [`LaneStore::list_lanes`] order and the first match wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no scanned lane contains a file whose
    /// decoded id equals `id`.
    pub fn resolve(&self, id: &TaskId, lane_hint: Option<&str>) -> Result<ResolvedTask> {
        let lanes = match lane_hint {
            Some(lane) => vec![lane.to_string()],
            None => self.store.list_lanes()?,
        };

        for lane in lanes {
            if let Some(found) = self.scan_lane(&lane, id)? {
                return Ok(found);
            }
        }

        Err(Error::NotFound(format!("task {id}")))
    }

    /// Scans one lane for a file whose decoded id matches.
    fn scan_lane(&self, lane: &str, id: &TaskId) -> Result<Option<ResolvedTask>> {
        for name in self.store.list_lane_files(lane)? {
            if filename::decode(&name).id() == id {
                return Ok(Some(ResolvedTask {
                    lane: lane.to_string(),
                    path: self.store.lane_path(lane).join(&name),
                    filename: name,
                }));
            }
        }
        Ok(None)
    }
}

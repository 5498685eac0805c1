//! Task repository: CRUD, move, and rename operations over the board.
//!
//! Every mutation here is a sequence of independent filesystem calls, not a
//! transaction. Mutating operations are serialized per task id through an
//! in-process lock registry; reads are unsynchronized and may observe a task
//! mid-write or mid-move, which callers accept as eventual consistency.
//! Lane moves are staged: write at the destination, confirm, then remove the
//! source, so the ownership policy is reapplied at the destination.

use crate::config::{BoardConfig, Ownership};
use crate::models::{Task, TaskId, TaskUpdate};
use crate::storage::lanes::LaneStore;
use crate::storage::resolver::{ResolvedTask, TaskResolver};
use crate::storage::{filename, tags};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// A lane record returned by lane operations.
#[derive(Debug, Clone, Serialize)]
pub struct Lane {
    /// Lane name, which is also the directory name.
    pub name: String,
    /// Full path of the lane directory.
    pub path: PathBuf,
}

/// Repository of board tasks, built on the lane store and resolver.
pub struct TaskRepository {
    store: LaneStore,
    resolver: TaskResolver,
    ownership: Option<Ownership>,
    /// Per-task-id exclusive sections for mutating operations.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TaskRepository {
    /// Creates a repository for the configured board root.
    #[must_use]
    pub fn new(config: &BoardConfig) -> Self {
        let store = LaneStore::new(&config.board_root);
        Self {
            resolver: TaskResolver::new(store.clone()),
            store,
            ownership: config.ownership,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the underlying lane store.
    #[must_use]
    pub const fn store(&self) -> &LaneStore {
        &self.store
    }

    /// Returns the lock guarding mutations on one task id.
    ///
    /// Entries nobody else holds are pruned on each acquisition, so the
    /// registry tracks in-flight mutations rather than every id ever seen.
    fn task_lock(&self, id: &TaskId) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(id.as_str().to_string()).or_default().clone()
    }

    /// Applies the configured ownership policy to a created path.
    ///
    /// A no-op when unconfigured, and on non-Unix targets.
    fn apply_ownership(&self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        if let Some(own) = self.ownership {
            std::os::unix::fs::chown(path, Some(own.uid), Some(own.gid)).map_err(|e| {
                Error::OperationFailed {
                    operation: "apply_ownership".to_string(),
                    cause: format!("{}: {e}", path.display()),
                }
            })?;
        }
        #[cfg(not(unix))]
        let _ = path;
        Ok(())
    }

    /// Ensures a lane directory exists, applying the ownership policy.
    fn ensure_lane_dir(&self, lane: &str) -> Result<PathBuf> {
        let dir = self.store.lane_path(lane);
        fs::create_dir_all(&dir).map_err(|e| Error::OperationFailed {
            operation: "create_lane_dir".to_string(),
            cause: format!("{lane}: {e}"),
        })?;
        self.apply_ownership(&dir)?;
        Ok(dir)
    }

    /// Reads a resolved location into a full task record.
    fn read_task(&self, loc: &ResolvedTask) -> Result<Task> {
        let content = fs::read_to_string(&loc.path).map_err(|e| Error::OperationFailed {
            operation: "read_task_file".to_string(),
            cause: format!("{}: {e}", loc.path.display()),
        })?;
        let decoded = filename::decode(&loc.filename);
        Ok(Task {
            id: decoded.id().clone(),
            lane: loc.lane.clone(),
            title: decoded.title().to_string(),
            tags: tags::extract(&content),
            content,
            path: loc.path.clone(),
        })
    }

    /// Creates a task in a lane, creating the lane on demand.
    ///
    /// Generates a fresh id, encodes the canonical filename, and writes the
    /// content verbatim; the title lives only in the filename, never as a
    /// rendered heading in the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the lane directory or task file cannot be
    /// created.
    pub fn create_task(&self, lane: &str, title: &str, content: &str) -> Result<Task> {
        let id = TaskId::generate();
        let lock = self.task_lock(&id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let dir = self.ensure_lane_dir(lane)?;
        let name = filename::encode(title, &id);
        let path = dir.join(&name);

        fs::write(&path, content).map_err(|e| Error::OperationFailed {
            operation: "write_task_file".to_string(),
            cause: format!("task {id} in {lane}: {e}"),
        })?;
        self.apply_ownership(&path)?;

        tracing::debug!(task_id = %id, lane, "Created task");
        Ok(Task {
            id,
            lane: lane.to_string(),
            title: filename::decode(&name).title().to_string(),
            content: content.to_string(),
            tags: tags::extract(content),
            path,
        })
    }

    /// Reads a task by id, deriving its tags.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no lane contains the id.
    pub fn get_task(&self, id: &TaskId, lane_hint: Option<&str>) -> Result<Task> {
        let loc = self.resolver.resolve(id, lane_hint)?;
        self.read_task(&loc)
    }

    /// Applies a partial update: in-place content rewrite and/or lane move.
    ///
    /// With neither field set this is an existence-confirming no-op that
    /// returns the current record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the id cannot be resolved, or an
    /// I/O error from the write or rename.
    pub fn update_task(&self, id: &TaskId, update: TaskUpdate) -> Result<Task> {
        let lock = self.task_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut loc = self.resolver.resolve(id, update.lane.as_deref())?;

        if let Some(content) = &update.content {
            fs::write(&loc.path, content).map_err(|e| Error::OperationFailed {
                operation: "write_task_file".to_string(),
                cause: format!("task {id}: {e}"),
            })?;
            self.apply_ownership(&loc.path)?;
        }

        if let Some(new_lane) = &update.new_lane {
            if new_lane != &loc.lane {
                let dest_dir = self.ensure_lane_dir(new_lane)?;
                let dest = dest_dir.join(&loc.filename);
                fs::rename(&loc.path, &dest).map_err(|e| Error::OperationFailed {
                    operation: "move_task_file".to_string(),
                    cause: format!("task {id} to {new_lane}: {e}"),
                })?;
                tracing::debug!(task_id = %id, from = loc.lane, to = new_lane, "Moved task");
                loc.lane.clone_from(new_lane);
                loc.path = dest;
            }
        }

        self.read_task(&loc)
    }

    /// Renames a task by recomputing its canonical filename.
    ///
    /// The id is preserved and the content untouched; only the filename
    /// changes, within the same lane.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the id is not in `lane`, or an I/O
    /// error from the rename.
    pub fn update_task_title(&self, id: &TaskId, new_title: &str, lane: &str) -> Result<Task> {
        let lock = self.task_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let loc = self.resolver.resolve(id, Some(lane))?;
        let new_name = filename::encode(new_title, id);
        let new_path = self.store.lane_path(lane).join(&new_name);

        fs::rename(&loc.path, &new_path).map_err(|e| Error::OperationFailed {
            operation: "rename_task_file".to_string(),
            cause: format!("task {id}: {e}"),
        })?;

        self.read_task(&ResolvedTask {
            lane: lane.to_string(),
            filename: new_name,
            path: new_path,
        })
    }

    /// Deletes a task file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the id cannot be resolved.
    pub fn delete_task(&self, id: &TaskId, lane_hint: Option<&str>) -> Result<()> {
        let lock = self.task_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let loc = self.resolver.resolve(id, lane_hint)?;
        fs::remove_file(&loc.path).map_err(|e| Error::OperationFailed {
            operation: "delete_task_file".to_string(),
            cause: format!("task {id}: {e}"),
        })?;
        tracing::debug!(task_id = %id, lane = loc.lane, "Deleted task");
        Ok(())
    }

    /// Creates a lane, generating a random name when none is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create_lane(&self, name: Option<&str>) -> Result<Lane> {
        let name = name.map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string);
        let path = self.ensure_lane_dir(&name)?;
        tracing::debug!(lane = name, "Created lane");
        Ok(Lane { name, path })
    }

    /// Recursively removes a lane and every task inside it. Irreversible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the lane directory is absent.
    pub fn delete_lane(&self, name: &str) -> Result<()> {
        let dir = self.store.lane_path(name);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::debug!(lane = name, "Deleted lane");
                Ok(())
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::NotFound(format!("lane {name}")))
            },
            Err(e) => Err(Error::OperationFailed {
                operation: "delete_lane_dir".to_string(),
                cause: format!("{name}: {e}"),
            }),
        }
    }

    /// Renames a lane directory. Task ids are unaffected since filenames
    /// carry no lane information.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the old lane is absent, or an I/O
    /// error from the rename.
    pub fn rename_lane(&self, old_name: &str, new_name: &str) -> Result<Lane> {
        let old_dir = self.store.lane_path(old_name);
        if !old_dir.is_dir() {
            return Err(Error::NotFound(format!("lane {old_name}")));
        }
        let new_dir = self.store.lane_path(new_name);
        fs::rename(&old_dir, &new_dir).map_err(|e| Error::OperationFailed {
            operation: "rename_lane_dir".to_string(),
            cause: format!("{old_name} -> {new_name}: {e}"),
        })?;
        Ok(Lane {
            name: new_name.to_string(),
            path: new_dir,
        })
    }

    /// Moves a task between lanes as a staged two-phase copy.
    ///
    /// Resolution is strict within `from_lane`, with no blind search. The
    /// file is written at the destination first, confirmed, and only then
    /// removed from the source; a crash in between leaves the task duplicated
    /// rather than lost, recoverable by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the id is not in `from_lane`, or an
    /// I/O error from any step.
    pub fn move_task(&self, id: &TaskId, from_lane: &str, to_lane: &str) -> Result<Task> {
        let lock = self.task_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let loc = self.resolver.resolve(id, Some(from_lane))?;
        let bytes = fs::read(&loc.path).map_err(|e| Error::OperationFailed {
            operation: "read_task_file".to_string(),
            cause: format!("task {id}: {e}"),
        })?;

        let dest_dir = self.ensure_lane_dir(to_lane)?;
        let dest = dest_dir.join(&loc.filename);
        fs::write(&dest, &bytes).map_err(|e| Error::OperationFailed {
            operation: "stage_task_file".to_string(),
            cause: format!("task {id} in {to_lane}: {e}"),
        })?;
        self.apply_ownership(&dest)?;

        // Confirm the staged copy before dropping the source.
        let staged_len = fs::metadata(&dest)
            .map_err(|e| Error::OperationFailed {
                operation: "confirm_task_file".to_string(),
                cause: format!("task {id} in {to_lane}: {e}"),
            })?
            .len();
        if staged_len != bytes.len() as u64 {
            return Err(Error::OperationFailed {
                operation: "confirm_task_file".to_string(),
                cause: format!("task {id}: staged {staged_len} of {} bytes", bytes.len()),
            });
        }

        fs::remove_file(&loc.path).map_err(|e| Error::OperationFailed {
            operation: "remove_moved_task_file".to_string(),
            cause: format!("task {id} in {from_lane}: {e}"),
        })?;

        tracing::debug!(task_id = %id, from = from_lane, to = to_lane, "Moved task");
        self.read_task(&ResolvedTask {
            lane: to_lane.to_string(),
            filename: loc.filename,
            path: dest,
        })
    }

    /// Lists every task across every lane.
    ///
    /// # Errors
    ///
    /// Returns an error if a lane or task file cannot be read.
    pub fn get_cards(&self) -> Result<Vec<Task>> {
        let mut cards = Vec::new();
        for lane in self.store.list_lanes()? {
            cards.extend(self.get_lane_tasks(&lane)?);
        }
        Ok(cards)
    }

    /// Lists the tasks in one lane; a missing lane yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing lane or task file cannot be read.
    pub fn get_lane_tasks(&self, lane: &str) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        for name in self.store.list_lane_files(lane)? {
            let loc = ResolvedTask {
                lane: lane.to_string(),
                path: self.store.lane_path(lane).join(&name),
                filename: name,
            };
            tasks.push(self.read_task(&loc)?);
        }
        Ok(tasks)
    }

    /// Reports ids that exist in more than one lane.
    ///
    /// Duplicate ids are an integrity violation outside this system's
    /// control; resolution tie-breaks on enumeration order rather than
    /// preventing the state, so this probe is how callers detect it.
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be enumerated.
    pub fn find_duplicate_ids(&self) -> Result<Vec<(TaskId, Vec<String>)>> {
        let mut seen: HashMap<TaskId, Vec<String>> = HashMap::new();
        for lane in self.store.list_lanes()? {
            for name in self.store.list_lane_files(&lane)? {
                seen.entry(filename::decode(&name).id().clone())
                    .or_default()
                    .push(lane.clone());
            }
        }
        let mut duplicates: Vec<_> = seen
            .into_iter()
            .filter(|(_, lanes)| lanes.len() > 1)
            .collect();
        duplicates.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        Ok(duplicates)
    }
}

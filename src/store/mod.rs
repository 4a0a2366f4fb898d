//! Durable project/session document.
//!
//! One JSON file holds `{projects, sessions}`. Every mutation is a full
//! read-modify-write that goes through [`DurableStore::modify`], which
//! serializes writers inside this process (mutex) and across processes
//! (advisory lock on a sidecar file).

mod document;

pub use document::{generate_id, Document, Project, Session, SessionKind, SessionStatus};

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::Mutex;
use thiserror::Error;

/// Errors that can occur when persisting the document.
///
/// Reading never fails: a missing or corrupt document is replaced by the
/// empty default.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create store directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write store document '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to lock store document '{path}': {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize store document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Project index out of range: from={from}, to={to}, len={len}")]
    IndexOutOfRange { from: usize, to: usize, len: usize },
}

pub struct DurableStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl DurableStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the default document location.
    ///
    /// Uses `<data_dir>/ptydeck/workspace.json` via `dirs::data_dir()`,
    /// falling back to the current directory.
    pub fn default_path() -> PathBuf {
        let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        data_dir.join("ptydeck").join("workspace.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted document.
    ///
    /// - Missing file: the empty default is persisted and returned.
    /// - Unreadable or malformed file: the empty default is returned and the
    ///   file is left as is.
    pub fn load(&self) -> Document {
        if !self.path.exists() {
            let doc = Document::default();
            if let Err(err) = self.save(&doc) {
                tracing::warn!(path = %self.path.display(), error = %err, "Failed to create store document");
            }
            return doc;
        }
        self.read_or_default()
    }

    fn read_or_default(&self) -> Document {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "Store document unreadable, starting fresh");
                return Document::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "Store document corrupt, starting fresh");
                Document::default()
            }
        }
    }

    /// Persist the full document, replacing prior content.
    ///
    /// Writes a sibling temp file and renames it over the document.
    pub fn save(&self, doc: &Document) -> Result<(), StoreError> {
        let dir = self.ensure_dir()?;
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = dir.join(format!("{}.tmp", self.file_name()));
        fs::write(&tmp, json).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Apply one mutation as a locked read-modify-write.
    ///
    /// The closure returns `None` when it changed nothing; the document is
    /// then not written back.
    pub fn modify<T>(&self, f: impl FnOnce(&mut Document) -> Option<T>) -> Result<Option<T>, StoreError> {
        let _guard = self.write_lock.lock();
        let _file_lock = self.lock_file()?;
        let mut doc = self.load();
        match f(&mut doc) {
            Some(value) => {
                self.save(&doc)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub fn projects(&self) -> Vec<Project> {
        self.load().projects
    }

    pub fn add_project(&self, project: Project) -> Result<(), StoreError> {
        self.modify(|doc| {
            doc.projects.push(project);
            Some(())
        })?;
        Ok(())
    }

    /// Remove a project and every session that references it.
    ///
    /// Returns the removed sessions.
    pub fn remove_project(&self, project_id: &str) -> Result<Vec<Session>, StoreError> {
        let removed = self.modify(|doc| {
            let (removed, kept): (Vec<Session>, Vec<Session>) = doc
                .sessions
                .drain(..)
                .partition(|s| s.project_id == project_id);
            doc.sessions = kept;
            doc.projects.retain(|p| p.id != project_id);
            Some(removed)
        })?;
        Ok(removed.unwrap_or_default())
    }

    /// Move the project at `from` so it ends up at index `to`.
    pub fn reorder_projects(&self, from: usize, to: usize) -> Result<(), StoreError> {
        let mut out_of_range = None;
        self.modify(|doc| {
            let len = doc.projects.len();
            if from >= len || to >= len {
                out_of_range = Some(StoreError::IndexOutOfRange { from, to, len });
                return None;
            }
            let moved = doc.projects.remove(from);
            doc.projects.insert(to, moved);
            Some(())
        })?;
        match out_of_range {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// All sessions, or only those of `project_id`.
    pub fn get_sessions(&self, project_id: Option<&str>) -> Vec<Session> {
        let doc = self.load();
        match project_id {
            Some(id) => doc.sessions_of(id),
            None => doc.sessions,
        }
    }

    pub fn add_session(&self, session: Session) -> Result<(), StoreError> {
        self.modify(|doc| {
            doc.sessions.push(session);
            Some(())
        })?;
        Ok(())
    }

    /// Patch one session in place. Returns `false` for unknown ids.
    pub fn update_session(
        &self,
        session_id: &str,
        patch: impl FnOnce(&mut Session),
    ) -> Result<bool, StoreError> {
        let updated = self.modify(|doc| {
            let session = doc.sessions.iter_mut().find(|s| s.id == session_id)?;
            patch(session);
            Some(())
        })?;
        Ok(updated.is_some())
    }

    /// Delete a session record. Returns `false` for unknown ids.
    pub fn remove_session(&self, session_id: &str) -> Result<bool, StoreError> {
        let removed = self.modify(|doc| {
            let index = doc.sessions.iter().position(|s| s.id == session_id)?;
            doc.sessions.remove(index);
            Some(())
        })?;
        Ok(removed.is_some())
    }

    /// Drop every session record, keeping projects.
    pub fn clear_all_sessions(&self) -> Result<(), StoreError> {
        self.modify(|doc| {
            doc.sessions.clear();
            Some(())
        })?;
        Ok(())
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workspace.json".to_string())
    }

    fn ensure_dir(&self) -> Result<PathBuf, StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(dir)
    }

    fn lock_file(&self) -> Result<FileLock, StoreError> {
        let dir = self.ensure_dir()?;
        let path = dir.join(format!("{}.lock", self.file_name()));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| StoreError::Lock {
                path: path.clone(),
                source,
            })?;
        FileExt::lock_exclusive(&file)
            .map_err(|source| StoreError::Lock { path, source })?;
        Ok(FileLock(file))
    }
}

/// Holds the advisory lock until dropped.
struct FileLock(File);

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

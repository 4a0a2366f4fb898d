//! Session orchestration.
//!
//! [`SessionOrchestrator`] is the façade used by the UI layer. It keeps the
//! durable session records (through [`DurableStore`]) consistent with the
//! live processes (owned by [`ProcessRegistry`]) and delivers output and
//! exit notifications to one consumer.
//!
//! Consistency rules:
//! - A record is persisted as `running` before its process is spawned.
//! - A live process is killed before its record is marked `stopped` or
//!   deleted.
//! - On a spontaneous exit the registry entry is reaped and the record is
//!   marked `stopped` before `Exited` reaches the consumer.
//!
//! Together these keep the live id set a subset of the `running` records.

mod error;
mod event;
mod pump;

pub use error::SessionError;
pub use event::SessionEvent;

use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::AppConfig;
use crate::naming;
use crate::pty::{ProcessRegistry, PtySpawnConfig};
use crate::session::pump::EventPump;
use crate::store::{generate_id, DurableStore, Project, Session, SessionKind, SessionStatus};

pub struct SessionOrchestrator {
    store: Arc<DurableStore>,
    registry: Arc<ProcessRegistry>,
}

impl SessionOrchestrator {
    /// Reconcile the store and start accepting session operations.
    ///
    /// Returns the orchestrator and the receiver of all session events.
    pub fn start(
        config: &AppConfig,
        store: DurableStore,
    ) -> Result<(Self, UnboundedReceiver<SessionEvent>), SessionError> {
        Self::with_spawn_config(PtySpawnConfig::from_config(config), store)
    }

    pub fn with_spawn_config(
        spawn_config: PtySpawnConfig,
        store: DurableStore,
    ) -> Result<(Self, UnboundedReceiver<SessionEvent>), SessionError> {
        // No process survives a restart, so no persisted session can be live.
        store.clear_all_sessions()?;
        tracing::info!(path = %store.path().display(), "Cleared sessions from previous run");

        let (process_tx, process_rx) = mpsc::channel();
        let (consumer, events) = tokio::sync::mpsc::unbounded_channel();
        let store = Arc::new(store);
        let registry = Arc::new(ProcessRegistry::new(spawn_config, process_tx));

        EventPump {
            store: Arc::clone(&store),
            registry: Arc::downgrade(&registry),
            consumer,
        }
        .spawn(process_rx)
        .map_err(SessionError::EventPump)?;

        Ok((Self { store, registry }, events))
    }

    // -- projects -------------------------------------------------------------

    pub fn projects(&self) -> Vec<Project> {
        self.store.projects()
    }

    /// Register the directory at `path` as a project.
    ///
    /// Fails with [`SessionError::InvalidProjectPath`] when it is not an
    /// existing directory; the stored path is canonical.
    pub fn add_project(&self, path: &Path) -> Result<Project, SessionError> {
        let project = Project::from_dir(path).map_err(|source| SessionError::InvalidProjectPath {
            path: path.to_path_buf(),
            source,
        })?;
        self.store.add_project(project.clone())?;
        tracing::info!(project_id = %project.id, path = %project.path, "Project added");
        Ok(project)
    }

    pub fn reorder_projects(&self, from: usize, to: usize) -> Result<(), SessionError> {
        self.store.reorder_projects(from, to)?;
        Ok(())
    }

    /// Delete a project and all of its sessions.
    ///
    /// Live processes of those sessions are killed as well.
    pub fn remove_project(&self, project_id: &str) -> Result<(), SessionError> {
        for session in self.store.get_sessions(Some(project_id)) {
            self.registry.kill(&session.id);
        }
        let removed = self.store.remove_project(project_id)?;
        // Sessions created while the first pass ran.
        for session in &removed {
            self.registry.kill(&session.id);
        }
        tracing::info!(project_id = %project_id, sessions = removed.len(), "Project removed");
        Ok(())
    }

    // -- sessions -------------------------------------------------------------

    /// All session records, or only those of `project_id`.
    pub fn sessions(&self, project_id: Option<&str>) -> Vec<Session> {
        self.store.get_sessions(project_id)
    }

    /// Create a session record and start its process.
    ///
    /// Fails with [`SessionError::ProjectNotFound`] without touching the store
    /// or spawning anything. Returns as soon as the record is persisted; the
    /// process starts in the background.
    pub fn create_session(&self, project_id: &str, kind: SessionKind) -> Result<Session, SessionError> {
        let created = self.store.modify(|doc| {
            let project = doc.project(project_id)?.clone();
            let existing = doc.sessions_of(project_id);
            let session = Session {
                id: generate_id(),
                project_id: project_id.to_string(),
                kind,
                name: naming::next_name(kind, &existing),
                status: SessionStatus::Running,
            };
            doc.sessions.push(session.clone());
            Some((session, project))
        })?;

        let Some((session, project)) = created else {
            return Err(SessionError::ProjectNotFound {
                project_id: project_id.to_string(),
            });
        };

        tracing::info!(
            session_id = %session.id,
            project_id = %project_id,
            kind = %kind,
            name = %session.name,
            "Session created"
        );
        self.registry.spawn(&session.id, kind, Path::new(&project.path));
        Ok(session)
    }

    /// Forward input to the session's process. No-op when it is not live.
    pub fn write_input(&self, session_id: &str, bytes: &[u8]) {
        self.registry.write(session_id, bytes);
    }

    /// Resize the session's PTY. No-op when it is not live.
    pub fn resize(&self, session_id: &str, cols: u16, rows: u16) {
        self.registry.resize(session_id, cols, rows);
    }

    /// Kill the process and keep the record as `stopped`.
    pub fn kill_session(&self, session_id: &str) -> Result<(), SessionError> {
        self.registry.kill(session_id);
        self.store
            .update_session(session_id, |s| s.status = SessionStatus::Stopped)?;
        Ok(())
    }

    /// Kill the process and delete the record.
    pub fn remove_session(&self, session_id: &str) -> Result<(), SessionError> {
        self.registry.kill(session_id);
        if self.store.remove_session(session_id)? {
            tracing::info!(session_id = %session_id, "Session removed");
        }
        Ok(())
    }

    pub fn is_live(&self, session_id: &str) -> bool {
        self.registry.is_live(session_id)
    }

    pub fn live_session_ids(&self) -> Vec<String> {
        self.registry.live_ids()
    }

    /// Kill every live process and mark its record `stopped`.
    pub fn shutdown(&self) -> Result<(), SessionError> {
        let killed = self.registry.kill_all();
        if killed.is_empty() {
            return Ok(());
        }
        self.store.modify(|doc| {
            for session in doc.sessions.iter_mut().filter(|s| killed.contains(&s.id)) {
                session.status = SessionStatus::Stopped;
            }
            Some(())
        })?;
        tracing::info!(sessions = killed.len(), "Killed live sessions on shutdown");
        Ok(())
    }
}

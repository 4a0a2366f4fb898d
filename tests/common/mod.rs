//! Shared test utilities for session and store tests.

#![allow(dead_code, unused_imports)]

use ptydeck::pty::PtySpawnConfig;
use ptydeck::session::{SessionEvent, SessionOrchestrator};
use ptydeck::store::{Document, DurableStore, SessionStatus};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Temp dir holding the store document plus a project directory.
pub struct Workspace {
    pub dir: TempDir,
    pub document: PathBuf,
    pub project_dir: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let document = dir.path().join("state").join("workspace.json");
        let project_dir = dir.path().join("demo");
        std::fs::create_dir_all(&project_dir).expect("Failed to create project dir");
        let project_dir = project_dir.canonicalize().expect("Failed to resolve project dir");
        Self {
            dir,
            document,
            project_dir,
        }
    }

    pub fn store(&self) -> DurableStore {
        DurableStore::new(self.document.clone())
    }

    /// Independent view of the same document, for assertions.
    pub fn read(&self) -> Document {
        self.store().load()
    }

    pub fn raw(&self) -> String {
        std::fs::read_to_string(&self.document).unwrap_or_default()
    }

    pub fn new_project_dir(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(&path).expect("Failed to create project dir");
        path.canonicalize().expect("Failed to resolve project dir")
    }
}

/// `/bin/sh` sessions with a fast agent launch that prints a marker.
pub fn shell_spawn_config() -> PtySpawnConfig {
    PtySpawnConfig::new("/bin/sh".to_string(), Vec::new()).with_agent(
        "printf 'agent%s\\n' -launched".to_string(),
        Duration::from_millis(100),
    )
}

pub fn start(workspace: &Workspace) -> (SessionOrchestrator, UnboundedReceiver<SessionEvent>) {
    SessionOrchestrator::with_spawn_config(shell_spawn_config(), workspace.store())
        .expect("Failed to start orchestrator")
}

/// Collect output of `session_id` until it contains `needle`.
pub async fn wait_for_output(
    events: &mut UnboundedReceiver<SessionEvent>,
    session_id: &str,
    needle: &str,
) -> String {
    let mut output = Vec::new();
    let found = tokio::time::timeout(EVENT_TIMEOUT, async {
        while let Some(event) = events.recv().await {
            if let SessionEvent::Output { session_id: id, bytes } = event {
                if id == session_id {
                    output.extend_from_slice(&bytes);
                    if String::from_utf8_lossy(&output).contains(needle) {
                        return true;
                    }
                }
            }
        }
        false
    })
    .await;
    let text = String::from_utf8_lossy(&output).into_owned();
    assert!(
        matches!(found, Ok(true)),
        "never saw {needle:?} in output of {session_id}: {text:?}"
    );
    text
}

/// Wait for the `Exited` event of `session_id`, returning the output seen
/// before it.
pub async fn wait_for_exit(events: &mut UnboundedReceiver<SessionEvent>, session_id: &str) -> Vec<u8> {
    let mut output = Vec::new();
    let exited = tokio::time::timeout(EVENT_TIMEOUT, async {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Output { session_id: id, bytes } if id == session_id => {
                    output.extend_from_slice(&bytes);
                }
                SessionEvent::Exited { session_id: id } if id == session_id => return true,
                _ => {}
            }
        }
        false
    })
    .await;
    assert!(matches!(exited, Ok(true)), "session {session_id} never exited");
    output
}

/// Every live process must belong to a `running` record.
pub fn assert_live_subset_of_running(orchestrator: &SessionOrchestrator) {
    let running: HashSet<String> = orchestrator
        .sessions(None)
        .into_iter()
        .filter(|s| s.status == SessionStatus::Running)
        .map(|s| s.id)
        .collect();
    for id in orchestrator.live_session_ids() {
        assert!(running.contains(&id), "live session {id} has no running record");
    }
}

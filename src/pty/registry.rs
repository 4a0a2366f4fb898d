//! Live session id → PTY process map.
//!
//! The registry is the only owner of live handles. Every operation on an id
//! that is not live is a silent no-op: input or resizes racing a closing
//! session are expected, not errors.

use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::pty::event::ProcessEvent;
use crate::pty::handle::PtyHandle;
use crate::pty::session::PtySession;
use crate::pty::spawn_config::PtySpawnConfig;
use crate::store::SessionKind;

pub struct ProcessRegistry {
    live: Mutex<HashMap<String, Slot>>,
    spawn_config: PtySpawnConfig,
    events: Sender<ProcessEvent>,
}

enum Slot {
    /// Reserved while the PTY and process are being created.
    Starting,
    Running(LiveProcess),
}

struct LiveProcess {
    handle: PtyHandle,
    /// Pending agent launch. Dropping it cancels the launch.
    _launch: Option<LaunchTimer>,
}

impl ProcessRegistry {
    /// Create an empty registry. Output and exit events of every spawned
    /// process are sent to `events`.
    pub fn new(spawn_config: PtySpawnConfig, events: Sender<ProcessEvent>) -> Self {
        Self {
            live: Mutex::new(HashMap::new()),
            spawn_config,
            events,
        }
    }

    pub fn spawn_config(&self) -> &PtySpawnConfig {
        &self.spawn_config
    }

    /// Launch the shell for `session_id` in `cwd`.
    ///
    /// Never fails synchronously: when the PTY or the process cannot be
    /// started, an `Exited` event is sent instead. The id counts as live
    /// from the start of the call; a kill or reap that lands before the
    /// process is ready removes the reservation and the new process is
    /// terminated as soon as it exists.
    pub fn spawn(&self, session_id: &str, kind: SessionKind, cwd: &Path) {
        self.live.lock().insert(session_id.to_string(), Slot::Starting);

        let handle = match PtySession::spawn(session_id, cwd, &self.spawn_config, self.events.clone()) {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(
                    session_id = %session_id,
                    kind = %kind,
                    cwd = %cwd.display(),
                    error = %err,
                    "Failed to spawn PTY process"
                );
                self.live.lock().remove(session_id);
                let _ = self.events.send(ProcessEvent::Exited {
                    session_id: session_id.to_string(),
                });
                return;
            }
        };

        let launch = self.spawn_config.launch_input(kind).and_then(|input| {
            LaunchTimer::schedule(
                session_id,
                handle.clone(),
                input,
                self.spawn_config.launch_delay(),
            )
        });
        let process = LiveProcess {
            handle,
            _launch: launch,
        };

        let mut live = self.live.lock();
        if matches!(live.get(session_id), Some(Slot::Starting)) {
            live.insert(session_id.to_string(), Slot::Running(process));
            drop(live);
            tracing::info!(session_id = %session_id, kind = %kind, cwd = %cwd.display(), "PTY process started");
        } else {
            drop(live);
            tracing::debug!(session_id = %session_id, "Session ended while starting");
            terminate(session_id, process);
        }
    }

    pub fn write(&self, session_id: &str, bytes: &[u8]) {
        let Some(handle) = self.handle(session_id) else {
            tracing::trace!(session_id = %session_id, "Input for non-live session dropped");
            return;
        };
        if let Err(err) = handle.send_input(bytes) {
            tracing::debug!(session_id = %session_id, error = %err, "PTY write failed");
        }
    }

    pub fn resize(&self, session_id: &str, cols: u16, rows: u16) {
        let Some(handle) = self.handle(session_id) else {
            return;
        };
        if let Err(err) = handle.resize(cols, rows) {
            tracing::debug!(session_id = %session_id, cols, rows, error = %err, "PTY resize failed");
        }
    }

    /// Terminate the process and forget it. Returns whether it was live.
    ///
    /// The entry is gone when this returns; the process's own `Exited` event
    /// still arrives later.
    pub fn kill(&self, session_id: &str) -> bool {
        match self.live.lock().remove(session_id) {
            Some(Slot::Running(process)) => terminate(session_id, process),
            Some(Slot::Starting) => {}
            None => return false,
        }
        true
    }

    /// Forget a process that already exited on its own.
    pub fn reap(&self, session_id: &str) -> bool {
        self.live.lock().remove(session_id).is_some()
    }

    /// Kill every live process. Returns the ids that were live.
    pub fn kill_all(&self) -> Vec<String> {
        let drained: Vec<(String, Slot)> = self.live.lock().drain().collect();
        drained
            .into_iter()
            .map(|(session_id, slot)| {
                if let Slot::Running(process) = slot {
                    terminate(&session_id, process);
                }
                session_id
            })
            .collect()
    }

    pub fn is_live(&self, session_id: &str) -> bool {
        self.live.lock().contains_key(session_id)
    }

    pub fn live_ids(&self) -> Vec<String> {
        self.live.lock().keys().cloned().collect()
    }

    fn handle(&self, session_id: &str) -> Option<PtyHandle> {
        match self.live.lock().get(session_id) {
            Some(Slot::Running(process)) => Some(process.handle.clone()),
            _ => None,
        }
    }
}

impl Drop for ProcessRegistry {
    fn drop(&mut self) {
        self.kill_all();
    }
}

fn terminate(session_id: &str, process: LiveProcess) {
    process.handle.close_writer();
    if let Err(err) = process.handle.kill() {
        tracing::debug!(session_id = %session_id, error = %err, "PTY kill failed");
    }
    tracing::info!(session_id = %session_id, "PTY process killed");
}

/// One-shot delayed write, cancelled when dropped.
struct LaunchTimer {
    _cancel: Sender<()>,
}

impl LaunchTimer {
    fn schedule(
        session_id: &str,
        handle: PtyHandle,
        input: Vec<u8>,
        delay: Duration,
    ) -> Option<Self> {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let timer_id = session_id.to_string();
        let spawned = thread::Builder::new()
            .name(format!("pty-launch-{session_id}"))
            .spawn(move || match cancelled.recv_timeout(delay) {
                Err(RecvTimeoutError::Timeout) => {
                    tracing::debug!(session_id = %timer_id, "Launching agent command");
                    if let Err(err) = handle.send_input(&input) {
                        tracing::debug!(session_id = %timer_id, error = %err, "Agent launch write failed");
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    tracing::trace!(session_id = %timer_id, "Agent launch cancelled");
                }
            });
        match spawned {
            Ok(_) => Some(Self { _cancel: cancel }),
            Err(err) => {
                tracing::warn!(session_id = %session_id, error = %err, "Failed to schedule agent launch");
                None
            }
        }
    }
}

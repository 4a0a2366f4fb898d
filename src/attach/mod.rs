//! Uses the host terminal as the display surface of one session.
//!
//! Output of the attached session is copied to stdout as-is; the host
//! terminal does the emulation. Input is read raw from stdin.

mod input;
mod resize;

pub use input::{split_detach, DETACH_KEY};

use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode, size as terminal_size};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::attach::input::spawn_input_forwarder;
use crate::attach::resize::ResizeWatcher;
use crate::session::{SessionEvent, SessionOrchestrator};
use crate::shutdown::ShutdownHandle;
use crate::store::Session;

/// Why an attachment ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The session's process exited.
    SessionExited,
    /// The user pressed the detach key or stdin closed.
    Detached,
    /// The host received SIGINT/SIGTERM.
    Signaled,
}

/// Attach the current terminal to `session` until it exits, the user
/// detaches, or the host is asked to terminate.
///
/// Events for other sessions are ignored.
pub async fn run(
    orchestrator: Arc<SessionOrchestrator>,
    session: &Session,
    mut events: UnboundedReceiver<SessionEvent>,
) -> Result<AttachOutcome, Box<dyn Error>> {
    let raw_mode_guard = RawModeGuard::new()?;

    if let Ok((cols, rows)) = terminal_size() {
        orchestrator.resize(&session.id, cols, rows);
    }

    let shutdown = ShutdownHandle::new();
    spawn_input_forwarder(Arc::clone(&orchestrator), session.id.clone(), shutdown.clone())?;
    let resize_watcher = ResizeWatcher::start(Arc::clone(&orchestrator), session.id.clone())?;

    let signaled = termination_signal();
    tokio::pin!(signaled);

    let mut stdout = io::stdout();
    let outcome = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(SessionEvent::Output { session_id, bytes }) if session_id == session.id => {
                    stdout.write_all(&bytes)?;
                    stdout.flush()?;
                }
                Some(SessionEvent::Exited { session_id }) if session_id == session.id => {
                    break AttachOutcome::SessionExited;
                }
                Some(_) => {}
                None => break AttachOutcome::SessionExited,
            },
            _ = shutdown.wait() => break AttachOutcome::Detached,
            _ = &mut signaled => break AttachOutcome::Signaled,
        }
    };

    shutdown.signal();
    if let Some(watcher) = resize_watcher {
        watcher.stop();
    }
    drop(raw_mode_guard);
    tracing::info!(session_id = %session.id, outcome = ?outcome, "Detached from session");
    Ok(outcome)
}

#[cfg(unix)]
async fn termination_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn termination_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

struct RawModeGuard;

impl RawModeGuard {
    fn new() -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

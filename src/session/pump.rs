use std::sync::mpsc::Receiver;
use std::sync::{Arc, Weak};
use std::thread;

use tokio::sync::mpsc::UnboundedSender;

use crate::pty::{ProcessEvent, ProcessRegistry};
use crate::session::SessionEvent;
use crate::store::{DurableStore, SessionStatus};

/// Background loop turning raw process events into session events.
///
/// Exits are reconciled before they are forwarded: the registry entry is
/// reaped and the record marked `stopped`, so a consumer that sees
/// `Exited` can rely on the persisted status. The loop ends once every
/// event sender (registry and reader threads) is gone.
pub(crate) struct EventPump {
    pub store: Arc<DurableStore>,
    pub registry: Weak<ProcessRegistry>,
    pub consumer: UnboundedSender<SessionEvent>,
}

impl EventPump {
    pub fn spawn(self, events: Receiver<ProcessEvent>) -> std::io::Result<()> {
        thread::Builder::new()
            .name("session-events".to_string())
            .spawn(move || self.run(events))?;
        Ok(())
    }

    fn run(self, events: Receiver<ProcessEvent>) {
        while let Ok(event) = events.recv() {
            match event {
                ProcessEvent::Output { session_id, bytes } => {
                    let _ = self.consumer.send(SessionEvent::Output { session_id, bytes });
                }
                ProcessEvent::Exited { session_id } => self.handle_exit(session_id),
            }
        }
        tracing::debug!("Session event pump stopped");
    }

    fn handle_exit(&self, session_id: String) {
        if let Some(registry) = self.registry.upgrade() {
            registry.reap(&session_id);
        }

        match self
            .store
            .update_session(&session_id, |s| s.status = SessionStatus::Stopped)
        {
            Ok(true) => tracing::info!(session_id = %session_id, "Session stopped"),
            Ok(false) => tracing::debug!(session_id = %session_id, "Exit for removed session"),
            Err(err) => {
                tracing::warn!(session_id = %session_id, error = %err, "Failed to persist session stop")
            }
        }

        let _ = self.consumer.send(SessionEvent::Exited { session_id });
    }
}

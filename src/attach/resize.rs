use std::error::Error;
use std::sync::Arc;

use crate::session::SessionOrchestrator;

#[cfg(unix)]
use crossterm::terminal::size as terminal_size;
#[cfg(unix)]
use signal_hook::consts::signal::SIGWINCH;
#[cfg(unix)]
use signal_hook::iterator::Signals;
#[cfg(unix)]
use std::thread;

/// Follows the host terminal's size and forwards it to one session.
pub struct ResizeWatcher {
    #[cfg(unix)]
    handle: signal_hook::iterator::Handle,
    #[cfg(unix)]
    thread: thread::JoinHandle<()>,
}

impl ResizeWatcher {
    pub fn start(
        orchestrator: Arc<SessionOrchestrator>,
        session_id: String,
    ) -> Result<Option<Self>, Box<dyn Error>> {
        #[cfg(unix)]
        {
            let mut signals = Signals::new([SIGWINCH])?;
            let handle = signals.handle();
            let thread = thread::spawn(move || {
                for _ in signals.forever() {
                    let (cols, rows) = match terminal_size() {
                        Ok(size) => size,
                        Err(_) => continue,
                    };
                    orchestrator.resize(&session_id, cols, rows);
                }
            });
            Ok(Some(Self { handle, thread }))
        }

        #[cfg(not(unix))]
        {
            let _ = orchestrator;
            let _ = session_id;
            Ok(None)
        }
    }

    pub fn stop(self) {
        #[cfg(unix)]
        {
            self.handle.close();
            let _ = self.thread.join();
        }
    }
}

use std::io::{self, Read};
use std::sync::Arc;
use std::thread;

use crate::session::SessionOrchestrator;
use crate::shutdown::ShutdownHandle;

/// Ctrl-Q. Detaches instead of reaching the session.
pub const DETACH_KEY: u8 = 0x11;

/// Split a chunk of keyboard input at the detach key.
///
/// Returns the bytes to forward and whether the detach key was pressed.
/// Anything after the detach key is dropped.
pub fn split_detach(bytes: &[u8]) -> (&[u8], bool) {
    match bytes.iter().position(|&b| b == DETACH_KEY) {
        Some(index) => (&bytes[..index], true),
        None => (bytes, false),
    }
}

/// Forward stdin to `session_id` on a background thread until the detach
/// key is pressed or stdin closes; either way `shutdown` is signaled.
pub fn spawn_input_forwarder(
    orchestrator: Arc<SessionOrchestrator>,
    session_id: String,
    shutdown: ShutdownHandle,
) -> io::Result<()> {
    thread::Builder::new()
        .name("stdin-forwarder".to_string())
        .spawn(move || {
            let mut stdin = io::stdin();
            let mut buffer = [0u8; 1024];

            loop {
                let read_bytes = match stdin.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(count) => count,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                };

                let (forward, detach) = split_detach(&buffer[..read_bytes]);
                if !forward.is_empty() {
                    orchestrator.write_input(&session_id, forward);
                }
                if detach {
                    tracing::info!(session_id = %session_id, "Detach key pressed");
                    break;
                }
                if shutdown.is_shutting_down() {
                    break;
                }
            }
            shutdown.signal();
        })?;
    Ok(())
}

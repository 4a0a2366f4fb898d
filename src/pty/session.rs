use crate::pty::event::ProcessEvent;
use crate::pty::handle::PtyHandle;
use crate::pty::spawn_config::PtySpawnConfig;
use parking_lot::Mutex;
use portable_pty::{native_pty_system, Child};
use std::io::Read;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const READ_BUFFER_SIZE: usize = 8192;

/// How long the exit waiter lets the reader drain output the child wrote
/// before exiting. A background job holding the PTY open stretches the
/// drain to this bound.
const EXIT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Launches one PTY-backed shell with its reader and exit waiter.
pub struct PtySession;

impl PtySession {
    /// Open a PTY, start the shell in `cwd` and spawn the background threads.
    ///
    /// The reader thread sends one `Output` event per chunk read, in order.
    /// The waiter thread sends exactly one `Exited` event once the child
    /// process terminates, even when a background job keeps the PTY open.
    /// No `Output` follows `Exited`.
    pub fn spawn(
        session_id: &str,
        cwd: &Path,
        config: &PtySpawnConfig,
        events: Sender<ProcessEvent>,
    ) -> anyhow::Result<PtyHandle> {
        let pty_system = native_pty_system();
        let pair = pty_system.openpty(config.initial_size())?;

        let child = pair.slave.spawn_command(config.command(cwd))?;
        drop(pair.slave);

        let reader = pair.master.try_clone_reader()?;
        let writer = pair.master.take_writer()?;
        let killer = child.clone_killer();
        let handle = PtyHandle::new(writer, pair.master, killer);

        let gate = OutputGate {
            closed: Arc::new(Mutex::new(false)),
            events,
        };
        let (drained, reader_done) = mpsc::channel::<()>();

        let reader_id = session_id.to_string();
        let reader_gate = gate.clone();
        thread::Builder::new()
            .name(format!("pty-reader-{session_id}"))
            .spawn(move || pump_output(reader_id, reader, reader_gate, drained))?;

        let waiter_id = session_id.to_string();
        thread::Builder::new()
            .name(format!("pty-wait-{session_id}"))
            .spawn(move || wait_for_exit(waiter_id, child, gate, reader_done))?;

        Ok(handle)
    }
}

/// Shared between reader and waiter. Once closed, no more output is sent.
#[derive(Clone)]
struct OutputGate {
    closed: Arc<Mutex<bool>>,
    events: Sender<ProcessEvent>,
}

impl OutputGate {
    fn send_output(&self, session_id: &str, bytes: &[u8]) -> bool {
        let closed = self.closed.lock();
        if *closed {
            return false;
        }
        self.events
            .send(ProcessEvent::Output {
                session_id: session_id.to_string(),
                bytes: bytes.to_vec(),
            })
            .is_ok()
    }

    fn close_with_exit(&self, session_id: String) {
        let mut closed = self.closed.lock();
        *closed = true;
        let _ = self.events.send(ProcessEvent::Exited { session_id });
    }
}

fn pump_output(
    session_id: String,
    mut reader: Box<dyn Read + Send>,
    gate: OutputGate,
    _drained: Sender<()>,
) {
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(count) => count,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        };
        if !gate.send_output(&session_id, &buffer[..count]) {
            break;
        }
    }
    tracing::trace!(session_id = %session_id, "PTY reader finished");
}

fn wait_for_exit(
    session_id: String,
    mut child: Box<dyn Child + Send + Sync>,
    gate: OutputGate,
    reader_done: Receiver<()>,
) {
    match child.wait() {
        Ok(status) => {
            tracing::debug!(session_id = %session_id, exit_code = status.exit_code(), "PTY process exited");
        }
        Err(err) => {
            tracing::debug!(session_id = %session_id, error = %err, "PTY process wait failed");
        }
    }

    // Disconnects as soon as the reader hits EOF.
    if let Err(RecvTimeoutError::Timeout) = reader_done.recv_timeout(EXIT_DRAIN_TIMEOUT) {
        tracing::debug!(session_id = %session_id, "PTY still held open after exit, detaching reader");
    }
    gate.close_with_exit(session_id);
}

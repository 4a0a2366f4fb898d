use parking_lot::Mutex;
use portable_pty::{ChildKiller, MasterPty, PtySize};
use std::io::{self, Write};
use std::sync::Arc;

/// Control side of one live PTY process: input, size, termination.
///
/// Cheap to clone. Once [`close_writer`](Self::close_writer) has run, every
/// further `send_input` is a silent no-op.
#[derive(Clone)]
pub struct PtyHandle {
    writer: Arc<Mutex<Option<Box<dyn Write + Send>>>>,
    master: Arc<Mutex<Box<dyn MasterPty + Send>>>,
    killer: Arc<Mutex<Box<dyn ChildKiller + Send + Sync>>>,
}

impl PtyHandle {
    pub fn new(
        writer: Box<dyn Write + Send>,
        master: Box<dyn MasterPty + Send>,
        killer: Box<dyn ChildKiller + Send + Sync>,
    ) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Some(writer))),
            master: Arc::new(Mutex::new(master)),
            killer: Arc::new(Mutex::new(killer)),
        }
    }

    pub fn send_input(&self, bytes: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock();
        let Some(writer) = writer.as_mut() else {
            return Ok(());
        };
        if bytes.is_empty() {
            return Ok(());
        }
        writer.write_all(bytes)?;
        writer.flush()?;
        Ok(())
    }

    pub fn resize(&self, cols: u16, rows: u16) -> anyhow::Result<()> {
        let size = PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        self.master.lock().resize(size)?;
        Ok(())
    }

    pub fn close_writer(&self) {
        *self.writer.lock() = None;
    }

    /// Ask the process to terminate. Does not wait for it.
    pub fn kill(&self) -> io::Result<()> {
        self.killer.lock().kill()
    }
}

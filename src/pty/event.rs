/// Raw notification from a PTY reader thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// One chunk of process output, in the order it was produced.
    Output { session_id: String, bytes: Vec<u8> },
    /// The process terminated. Sent exactly once per spawn, including
    /// spawns that failed before producing any output.
    Exited { session_id: String },
}

impl ProcessEvent {
    pub fn session_id(&self) -> &str {
        match self {
            Self::Output { session_id, .. } | Self::Exited { session_id } => session_id,
        }
    }
}

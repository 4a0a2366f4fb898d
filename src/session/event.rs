/// Notification delivered to the registered session consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// One chunk of terminal output for `session_id`.
    Output { session_id: String, bytes: Vec<u8> },
    /// The session's process is gone. Its record is already `stopped`.
    Exited { session_id: String },
}

impl SessionEvent {
    pub fn session_id(&self) -> &str {
        match self {
            Self::Output { session_id, .. } | Self::Exited { session_id } => session_id,
        }
    }
}

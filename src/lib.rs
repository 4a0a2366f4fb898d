//! Project-scoped PTY sessions.
//!
//! Projects are directories; each project runs any number of PTY-backed
//! sessions (a plain shell, or a shell that launches an agent command).
//! [`session::SessionOrchestrator`] is the entry point.

pub mod attach;
pub mod config;
pub mod logging;
pub mod naming;
pub mod pty;
pub mod session;
pub mod shutdown;
pub mod store;

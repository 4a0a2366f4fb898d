mod event;
mod handle;
mod registry;
mod session;
mod spawn_config;

pub use event::ProcessEvent;
pub use handle::PtyHandle;
pub use registry::ProcessRegistry;
pub use session::PtySession;
pub use spawn_config::PtySpawnConfig;

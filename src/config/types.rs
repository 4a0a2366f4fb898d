use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How session shells are launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Shell program for every session (default: bash, powershell.exe on Windows).
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Extra arguments passed to the shell.
    #[serde(default)]
    pub args: Vec<String>,
    /// Value of `TERM` inside the PTY.
    #[serde(default = "default_term")]
    pub term: String,
    /// Initial PTY width, until the display surface resizes it.
    #[serde(default = "default_cols")]
    pub cols: u16,
    /// Initial PTY height.
    #[serde(default = "default_rows")]
    pub rows: u16,
}

/// Agent auto-launch for `claude-code` sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Command line typed into the shell once it has started.
    #[serde(default = "default_agent_command")]
    pub command: String,
    /// Delay before the command is typed, in milliseconds (default: 500).
    #[serde(default = "default_launch_delay_ms")]
    pub launch_delay_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Location of the project/session document. Defaults to the data dir.
    #[serde(default)]
    pub document_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (default: "info").
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file for attached sessions. Defaults to the data dir.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_shell() -> String {
    if cfg!(windows) {
        "powershell.exe".to_string()
    } else {
        "bash".to_string()
    }
}

fn default_term() -> String {
    "xterm-256color".to_string()
}

fn default_cols() -> u16 {
    120
}

fn default_rows() -> u16 {
    30
}

fn default_agent_command() -> String {
    "claude".to_string()
}

fn default_launch_delay_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            args: Vec::new(),
            term: default_term(),
            cols: default_cols(),
            rows: default_rows(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: default_agent_command(),
            launch_delay_ms: default_launch_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

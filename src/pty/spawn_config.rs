use std::path::Path;
use std::time::Duration;

use portable_pty::{CommandBuilder, PtySize};

use crate::config::AppConfig;
use crate::store::SessionKind;

/// Configuration for spawning session shells.
///
/// Owns the installation-wide constants (shell, TERM, initial size) and the
/// agent auto-launch settings used by `claude-code` sessions.
#[derive(Debug, Clone)]
pub struct PtySpawnConfig {
    shell: String,
    args: Vec<String>,
    term: String,
    cols: u16,
    rows: u16,
    agent_command: String,
    agent_launch_delay: Duration,
}

impl PtySpawnConfig {
    pub fn new(shell: String, args: Vec<String>) -> Self {
        Self {
            shell,
            args,
            term: "xterm-256color".to_string(),
            cols: 120,
            rows: 30,
            agent_command: "claude".to_string(),
            agent_launch_delay: Duration::from_millis(500),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            shell: config.terminal.shell.clone(),
            args: config.terminal.args.clone(),
            term: config.terminal.term.clone(),
            cols: config.terminal.cols,
            rows: config.terminal.rows,
            agent_command: config.agent.command.clone(),
            agent_launch_delay: Duration::from_millis(config.agent.launch_delay_ms),
        }
    }

    pub fn with_initial_size(mut self, cols: u16, rows: u16) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }

    pub fn with_agent(mut self, command: String, delay: Duration) -> Self {
        self.agent_command = command;
        self.agent_launch_delay = delay;
        self
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Size the PTY is opened with. The display surface corrects it later.
    pub fn initial_size(&self) -> PtySize {
        PtySize {
            rows: self.rows,
            cols: self.cols,
            pixel_width: 0,
            pixel_height: 0,
        }
    }

    /// Shell command rooted at `cwd`. Inherits the host environment.
    pub fn command(&self, cwd: &Path) -> CommandBuilder {
        let mut cmd = CommandBuilder::new(&self.shell);
        cmd.args(&self.args);
        cmd.cwd(cwd);
        cmd.env("TERM", &self.term);
        cmd
    }

    /// Bytes typed into the shell after start-up, if any.
    ///
    /// Only `claude-code` sessions launch something; the line ends with a
    /// carriage return as if Enter was pressed.
    pub fn launch_input(&self, kind: SessionKind) -> Option<Vec<u8>> {
        match kind {
            SessionKind::Terminal => None,
            SessionKind::Agent => Some(format!("{}\r", self.agent_command).into_bytes()),
        }
    }

    pub fn launch_delay(&self) -> Duration {
        self.agent_launch_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn from_config_uses_configured_values() {
        let mut config = AppConfig::default();
        config.terminal.shell = "zsh".to_string();
        config.terminal.cols = 100;
        config.terminal.rows = 40;
        config.agent.launch_delay_ms = 250;
        let spawn = PtySpawnConfig::from_config(&config);
        assert_eq!(spawn.shell(), "zsh");
        assert_eq!(spawn.initial_size().cols, 100);
        assert_eq!(spawn.initial_size().rows, 40);
        assert_eq!(spawn.launch_delay(), Duration::from_millis(250));
    }

    #[test]
    fn command_runs_shell_in_project_dir() {
        let spawn = PtySpawnConfig::new("sh".to_string(), vec!["-i".to_string()]);
        let cmd = spawn.command(Path::new("/tmp"));
        let argv: Vec<_> = cmd.get_argv().iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(argv, vec!["sh", "-i"]);
        assert_eq!(cmd.get_cwd().map(|c| c.as_os_str()), Some(OsStr::new("/tmp")));
        assert_eq!(cmd.get_env("TERM"), Some(OsStr::new("xterm-256color")));
    }

    #[test]
    fn only_agent_sessions_have_launch_input() {
        let spawn = PtySpawnConfig::new("sh".to_string(), Vec::new())
            .with_agent("claude --resume".to_string(), Duration::from_millis(10));
        assert_eq!(spawn.launch_input(SessionKind::Terminal), None);
        assert_eq!(
            spawn.launch_input(SessionKind::Agent),
            Some(b"claude --resume\r".to_vec())
        );
    }
}

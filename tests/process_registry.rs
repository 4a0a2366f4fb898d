#![cfg(unix)]

mod common;

use common::{shell_spawn_config, Workspace};
use ptydeck::pty::{ProcessEvent, ProcessRegistry, PtySpawnConfig};
use ptydeck::store::SessionKind;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Collect events until `Exited` for `session_id` or the deadline, returning
/// output and whether the exit was seen.
fn drain_until_exit(events: &Receiver<ProcessEvent>, session_id: &str, within: Duration) -> (String, bool) {
    let deadline = Instant::now() + within;
    let mut output = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(ProcessEvent::Output { session_id: id, bytes }) if id == session_id => {
                output.extend_from_slice(&bytes);
            }
            Ok(ProcessEvent::Exited { session_id: id }) if id == session_id => {
                return (String::from_utf8_lossy(&output).into_owned(), true);
            }
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                return (String::from_utf8_lossy(&output).into_owned(), false);
            }
        }
    }
}

#[test]
fn spawn_kill_and_idempotent_kill() {
    let ws = Workspace::new();
    let (tx, rx) = mpsc::channel();
    let registry = ProcessRegistry::new(shell_spawn_config(), tx);

    registry.spawn("s1", SessionKind::Terminal, &ws.project_dir);
    assert!(registry.is_live("s1"));
    assert_eq!(registry.live_ids(), vec!["s1".to_string()]);

    assert!(registry.kill("s1"));
    assert!(!registry.is_live("s1"));
    assert!(!registry.kill("s1"), "second kill is a no-op");
    assert!(!registry.reap("s1"));

    let (_, exited) = drain_until_exit(&rx, "s1", Duration::from_secs(10));
    assert!(exited, "killed process still reports its exit");
}

#[test]
fn operations_on_unknown_ids_are_no_ops() {
    let (tx, _rx) = mpsc::channel();
    let registry = ProcessRegistry::new(shell_spawn_config(), tx);

    registry.write("ghost", b"ls\n");
    registry.resize("ghost", 80, 24);
    assert!(!registry.kill("ghost"));
    assert!(registry.kill_all().is_empty());
}

#[test]
fn killing_agent_session_cancels_pending_launch() {
    let ws = Workspace::new();
    let (tx, rx) = mpsc::channel();
    let config = PtySpawnConfig::new("/bin/sh".to_string(), Vec::new()).with_agent(
        "printf 'agent%s\\n' -launched".to_string(),
        Duration::from_millis(300),
    );
    let registry = ProcessRegistry::new(config, tx);

    registry.spawn("agent", SessionKind::Agent, &ws.project_dir);
    assert!(registry.kill("agent"));

    let (output, _) = drain_until_exit(&rx, "agent", Duration::from_millis(600));
    assert!(!output.contains("agent-launched"), "launch ran after kill: {output:?}");
}

#[test]
fn terminal_sessions_get_no_launch_input() {
    let ws = Workspace::new();
    let (tx, rx) = mpsc::channel();
    let registry = ProcessRegistry::new(shell_spawn_config(), tx);

    registry.spawn("term", SessionKind::Terminal, &ws.project_dir);
    std::thread::sleep(Duration::from_millis(300));
    registry.write("term", b"exit\n");

    let (output, exited) = drain_until_exit(&rx, "term", Duration::from_secs(10));
    assert!(exited);
    assert!(!output.contains("agent-launched"));
}

#[test]
fn failed_spawn_reports_exit() {
    let ws = Workspace::new();
    let (tx, rx) = mpsc::channel();
    let config = PtySpawnConfig::new("/definitely/not/a/shell".to_string(), Vec::new());
    let registry = ProcessRegistry::new(config, tx);

    registry.spawn("broken", SessionKind::Terminal, &ws.project_dir);

    let (_, exited) = drain_until_exit(&rx, "broken", Duration::from_secs(10));
    assert!(exited, "spawn failure must surface as an exit event");
}

#[test]
fn kill_all_returns_every_live_id() {
    let ws = Workspace::new();
    let (tx, _rx) = mpsc::channel();
    let registry = ProcessRegistry::new(shell_spawn_config(), tx);

    registry.spawn("a", SessionKind::Terminal, &ws.project_dir);
    registry.spawn("b", SessionKind::Agent, &ws.project_dir);

    let mut killed = registry.kill_all();
    killed.sort();

    assert_eq!(killed, vec!["a".to_string(), "b".to_string()]);
    assert!(registry.live_ids().is_empty());
}

#[test]
fn kill_racing_spawn_never_leaves_process_live() {
    let ws = Workspace::new();
    let (tx, rx) = mpsc::channel();
    let registry = ProcessRegistry::new(shell_spawn_config(), tx);

    std::thread::scope(|scope| {
        scope.spawn(|| registry.spawn("racy", SessionKind::Agent, &ws.project_dir));
        scope.spawn(|| {
            let deadline = Instant::now() + Duration::from_secs(10);
            while !registry.kill("racy") && Instant::now() < deadline {
                std::thread::yield_now();
            }
        });
    });

    assert!(!registry.is_live("racy"));
    let (output, exited) = drain_until_exit(&rx, "racy", Duration::from_secs(10));
    assert!(exited, "killed process must still report its exit");
    assert!(!output.contains("agent-launched"));
}

#[test]
fn input_to_other_sessions_flows_while_one_starts() {
    let ws = Workspace::new();
    let (tx, rx) = mpsc::channel();
    let registry = ProcessRegistry::new(shell_spawn_config(), tx);
    registry.spawn("steady", SessionKind::Terminal, &ws.project_dir);

    std::thread::scope(|scope| {
        scope.spawn(|| registry.spawn("late", SessionKind::Terminal, &ws.project_dir));
        registry.write("steady", b"printf 'ste%s\\n' ady; exit\n");
    });

    let (output, exited) = drain_until_exit(&rx, "steady", Duration::from_secs(10));
    assert!(exited);
    assert!(output.contains("steady"), "{output:?}");
    registry.kill_all();
}

//! Display names for new sessions: `"<prefix> #<n>"`, numbered per kind
//! within one project.

use crate::store::{Session, SessionKind};

/// Fixed label for each session kind.
pub fn prefix(kind: SessionKind) -> &'static str {
    match kind {
        SessionKind::Terminal => "Terminal",
        SessionKind::Agent => "Claude",
    }
}

/// Name for the next session of `kind`.
///
/// `existing` must hold only the sessions of the project the new session
/// belongs to. The number is one past the highest `#<digits>` suffix among
/// sessions of the same kind; names without a suffix count as 0.
pub fn next_name(kind: SessionKind, existing: &[Session]) -> String {
    let next = existing
        .iter()
        .filter(|s| s.kind == kind)
        .map(|s| trailing_number(&s.name))
        .max()
        .map_or(1, |max| max.saturating_add(1));
    format!("{} #{}", prefix(kind), next)
}

fn trailing_number(name: &str) -> u64 {
    let Some((_, digits)) = name.rsplit_once('#') else {
        return 0;
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    digits.parse().unwrap_or(0)
}

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A directory the user works in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    /// Last path segment at add time. Never re-derived.
    pub name: String,
    pub path: String,
}

impl Project {
    /// New project for the existing directory at `dir`.
    ///
    /// The stored path is absolute and canonical; relative paths resolve
    /// against the current directory.
    pub fn from_dir(dir: &Path) -> io::Result<Self> {
        let path = dir.canonicalize()?;
        if !path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", path.display()),
            ));
        }
        Ok(Self::from_path(&path))
    }

    fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id: generate_id(),
            name,
            path: path.display().to_string(),
        }
    }
}

/// What a session runs inside its PTY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    /// Plain interactive shell.
    #[serde(rename = "terminal")]
    Terminal,
    /// Shell that launches the agent command once it has started.
    #[serde(rename = "claude-code")]
    Agent,
}

impl SessionKind {
    /// Stable wire name, same as the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Terminal => "terminal",
            Self::Agent => "claude-code",
        }
    }

    /// Parse from the wire name. Unknown names return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "terminal" => Some(Self::Terminal),
            "claude-code" => Some(Self::Agent),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Stopped,
}

/// Logical record of a session. Outlives the process it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(rename = "projectId")]
    pub project_id: String,
    #[serde(rename = "type")]
    pub kind: SessionKind,
    /// Display name, assigned once at creation.
    pub name: String,
    pub status: SessionStatus,
}

/// The whole persisted state, rewritten on every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

impl Document {
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Sessions belonging to `project_id`, in creation order.
    pub fn sessions_of(&self, project_id: &str) -> Vec<Session> {
        self.sessions
            .iter()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect()
    }
}

/// Fresh opaque identifier for a project or session.
///
/// Random v4 UUIDs; collisions are not checked.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_uses_wire_field_names() {
        let session = Session {
            id: "s1".to_string(),
            project_id: "p1".to_string(),
            kind: SessionKind::Agent,
            name: "Claude #1".to_string(),
            status: SessionStatus::Running,
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["projectId"], "p1");
        assert_eq!(value["type"], "claude-code");
        assert_eq!(value["status"], "running");
        assert!(value.get("project_id").is_none());
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn project_name_is_last_path_segment() {
        let project = Project::from_path(Path::new("/tmp/demo"));
        assert_eq!(project.name, "demo");
        assert_eq!(project.path, "/tmp/demo");
        assert!(!project.id.is_empty());

        let trailing = Project::from_path(Path::new("/tmp/demo/"));
        assert_eq!(trailing.name, "demo");

        let root = Project::from_path(Path::new("/"));
        assert_eq!(root.name, "/");
    }

    #[test]
    fn from_dir_canonicalizes() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("demo");
        std::fs::create_dir(&nested).unwrap();

        let project = Project::from_dir(&nested.join("..").join("demo")).unwrap();

        let canonical = nested.canonicalize().unwrap();
        assert_eq!(project.path, canonical.display().to_string());
        assert!(Path::new(&project.path).is_absolute());
        assert_eq!(project.name, "demo");
    }

    #[test]
    fn from_dir_rejects_files_and_missing_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "x").unwrap();

        let err = Project::from_dir(&file).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(Project::from_dir(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn generated_ids_do_not_collide() {
        let ids: std::collections::HashSet<String> = (0..10_000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn document_tolerates_missing_sections() {
        let doc: Document = serde_json::from_str(r#"{"projects": []}"#).unwrap();
        assert!(doc.sessions.is_empty());
    }

    #[test]
    fn kind_parse_matches_wire_names() {
        assert_eq!(SessionKind::parse("terminal"), Some(SessionKind::Terminal));
        assert_eq!(SessionKind::parse("claude-code"), Some(SessionKind::Agent));
        assert_eq!(SessionKind::parse("bash"), None);
        assert_eq!(SessionKind::Agent.to_string(), "claude-code");
    }
}

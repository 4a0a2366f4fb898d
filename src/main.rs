use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use ptydeck::attach::{self, AttachOutcome};
use ptydeck::config::AppConfig;
use ptydeck::logging::{init_tracing, LogTarget};
use ptydeck::session::SessionOrchestrator;
use ptydeck::store::{DurableStore, Project, SessionKind};

#[derive(Debug, Parser)]
#[command(name = "ptydeck", about = "Project-scoped terminal sessions", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage projects.
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Start a new session in a project and attach this terminal to it.
    ///
    /// Press Ctrl-Q to detach; the session is killed on detach.
    Open {
        /// Project id (see `project list`).
        project: String,

        #[arg(long, value_enum, default_value_t = KindArg::Terminal)]
        kind: KindArg,
    },
}

#[derive(Debug, Subcommand)]
enum ProjectCommand {
    /// Add a directory as a project.
    Add { path: PathBuf },
    /// List projects in display order.
    List,
    /// Remove a project and its sessions.
    Remove { id: String },
    /// Move the project at FROM to position TO.
    Move { from: usize, to: usize },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum KindArg {
    Terminal,
    ClaudeCode,
}

impl From<KindArg> for SessionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Terminal => SessionKind::Terminal,
            KindArg::ClaudeCode => SessionKind::Agent,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    match cli.command {
        Command::Project(command) => {
            init_tracing(&config.logging.level, LogTarget::Stderr)?;
            run_project_command(&config, command)
        }
        Command::Open { project, kind } => {
            init_tracing(&config.logging.level, LogTarget::File(config.log_file_path()))?;
            open(&config, &project, kind.into()).await
        }
    }
}

/// Project commands touch only the store; they never reconcile sessions,
/// so they are safe to run next to an attached session.
fn run_project_command(config: &AppConfig, command: ProjectCommand) -> Result<()> {
    let store = DurableStore::new(config.document_path());
    match command {
        ProjectCommand::Add { path } => {
            let project = Project::from_dir(&path)
                .with_context(|| format!("adding project {}", path.display()))?;
            store.add_project(project.clone())?;
            println!("{}\t{}\t{}", project.id, project.name, project.path);
        }
        ProjectCommand::List => {
            for (index, project) in store.projects().iter().enumerate() {
                println!("{index}\t{}\t{}\t{}", project.id, project.name, project.path);
            }
        }
        ProjectCommand::Remove { id } => {
            let removed = store.remove_project(&id)?;
            println!("removed {id} ({} sessions)", removed.len());
        }
        ProjectCommand::Move { from, to } => {
            store.reorder_projects(from, to)?;
        }
    }
    Ok(())
}

async fn open(config: &AppConfig, project_id: &str, kind: SessionKind) -> Result<()> {
    let store = DurableStore::new(config.document_path());
    let (orchestrator, events) = SessionOrchestrator::start(config, store)?;
    let orchestrator = Arc::new(orchestrator);

    let session = orchestrator.create_session(project_id, kind)?;
    let outcome = attach::run(Arc::clone(&orchestrator), &session, events)
        .await
        .map_err(|err| anyhow!("attach failed: {err}"));

    orchestrator.shutdown()?;

    match outcome? {
        AttachOutcome::SessionExited => eprintln!("[{}] exited", session.name),
        AttachOutcome::Detached => eprintln!("[{}] detached, session killed", session.name),
        AttachOutcome::Signaled => eprintln!("[{}] terminated by signal", session.name),
    }
    Ok(())
}

//! Progress Engine - Binary Entry Point
//!
//! Inspection and maintenance commands over a learner data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use progress_engine::event_store::{ProgressStore, StoreConfig};
use progress_engine::gems::DepthMap;
use progress_engine::session::LearnerSession;
use progress_engine::skill_graph::{SkillCatalog, SkillGraph};

#[derive(Parser)]
#[command(name = "progress-engine", version, about = "Learner progress and review scheduling")]
struct Cli {
    /// Learner data directory [default: $PROGRESS_DATA_DIR or ./data]
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Snapshots kept after each checkpoint [default: $PROGRESS_SNAPSHOT_RETENTION or 10]
    #[arg(long, global = true)]
    retention: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show every tracked skill and its review status
    Status,
    /// List skills due for review, most overdue first
    Due,
    /// Mark overdue mastered skills as rusty and checkpoint
    Decay,
    /// Delete old snapshots
    Prune {
        /// Number of newest snapshots to keep
        #[arg(long)]
        keep: usize,
    },
    /// Show depth and gem rarity for every skill in a graph file
    Rarity {
        /// JSON array of { "id", "prerequisites" }
        #[arg(long)]
        graph: PathBuf,
    },
    /// Print events recorded after a sequence number
    Events {
        #[arg(long, default_value_t = 0)]
        after: u64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let now = Utc::now();
    let mut config = StoreConfig::from_env();
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(keep) = cli.retention {
        config = config.with_retention(keep);
    }

    let open_store = || -> anyhow::Result<Arc<ProgressStore>> {
        let store = ProgressStore::open(config.clone()).with_context(|| {
            format!("failed to open store at {}", config.data_dir().display())
        })?;
        Ok(Arc::new(store))
    };

    match &cli.command {
        Command::Status => {
            let session = LearnerSession::open(open_store()?, cli_session_id())?;
            for (skill_id, state) in session.scheduler().all_review_states() {
                println!(
                    "{}\tstage={}\thits={}\t{}\tin {}d",
                    skill_id,
                    state.stage,
                    state.consecutive_hits,
                    state.status(now),
                    state.days_until_review(now)
                );
            }
        }
        Command::Due => {
            let session = LearnerSession::open(open_store()?, cli_session_id())?;
            for skill_id in session.due_skills(now) {
                println!("{}", skill_id);
            }
        }
        Command::Decay => {
            let session = LearnerSession::open(open_store()?, cli_session_id())?;
            let transitions = session.start(now);
            for t in &transitions {
                println!("{}\t{} -> {}", t.skill_id, t.from, t.to);
            }
            let snapshot = session.finish()?;
            tracing::info!(
                decayed = transitions.len(),
                sequence = snapshot.sequence,
                "decay sweep complete"
            );
        }
        Command::Prune { keep } => {
            let deleted = open_store()?.snapshots().prune(*keep)?;
            println!("deleted {} snapshot(s)", deleted);
        }
        Command::Events { after } => {
            for event in open_store()?.events().load_all_after(*after)? {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
        Command::Rarity { graph } => print_rarity(graph)?,
    }

    Ok(())
}

fn print_rarity(path: &Path) -> anyhow::Result<()> {
    let catalog = SkillCatalog::from_file(path)
        .with_context(|| format!("failed to load skill graph {}", path.display()))?;
    let depths = DepthMap::compute(&catalog);

    let [q1, q2, q3] = depths.boundaries();
    println!("boundaries: {} {} {}", q1, q2, q3);
    for skill_id in catalog.topological_order() {
        println!(
            "{}\tdepth={}\t{}",
            skill_id,
            depths.depth(skill_id),
            depths.rarity_for_skill(skill_id)
        );
    }
    Ok(())
}

fn cli_session_id() -> String {
    format!("cli-{}", Utc::now().timestamp())
}

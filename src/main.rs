//! Binary entry point for lanefile.
//!
//! Serves the MCP bridge over stdio and offers direct board commands for
//! scripting and inspection.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print to stdout/stderr in the CLI binary
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use lanefile::config::BoardConfig;
use lanefile::mcp::{self, BridgeMode};
use lanefile::models::{TaskId, TaskUpdate};
use lanefile::storage::TaskRepository;
use std::path::PathBuf;
use std::process::ExitCode;

/// Lanefile - a markdown-file kanban board with an MCP tool bridge.
#[derive(Parser)]
#[command(name = "lanefile")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Board root directory.
    #[arg(long, global = true, env = "TASKS_DIR")]
    board: Option<PathBuf>,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Serve the MCP bridge over stdio.
    Serve {
        /// Serve each request with a fresh, session-free bridge instance.
        #[arg(long)]
        stateless: bool,
    },

    /// List lanes.
    Lanes,

    /// List tasks, across the board or in one lane.
    Cards {
        /// Restrict to one lane.
        #[arg(short, long)]
        lane: Option<String>,
    },

    /// Create a task.
    Add {
        /// The lane to create the task in (created if absent).
        lane: String,

        /// The task title, carried in the filename.
        title: String,

        /// Markdown content for the task.
        #[arg(default_value = "")]
        content: String,
    },

    /// Move a task between lanes.
    Mv {
        /// The task id.
        id: String,

        /// Source lane.
        from: String,

        /// Destination lane.
        to: String,
    },

    /// Update a task's content in place.
    Edit {
        /// The task id.
        id: String,

        /// Replacement content.
        content: String,

        /// Current lane of the task (skips the board-wide search).
        #[arg(short, long)]
        lane: Option<String>,
    },

    /// Delete a task.
    Rm {
        /// The task id.
        id: String,

        /// Current lane of the task (skips the board-wide search).
        #[arg(short, long)]
        lane: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        },
    };

    let result = match cli.command {
        Commands::Serve { stateless } => {
            let mode = if stateless {
                BridgeMode::Stateless
            } else {
                BridgeMode::Stateful
            };
            mcp::serve_stdio(&config, mode)
        },
        Commands::Lanes => cmd_lanes(&config),
        Commands::Cards { lane } => cmd_cards(&config, lane.as_deref()),
        Commands::Add {
            lane,
            title,
            content,
        } => cmd_add(&config, &lane, &title, &content),
        Commands::Mv { id, from, to } => cmd_move(&config, &id, &from, &to),
        Commands::Edit { id, content, lane } => cmd_edit(&config, &id, content, lane),
        Commands::Rm { id, lane } => cmd_rm(&config, &id, lane.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Initializes the tracing subscriber; `-v` raises the default level.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves the effective configuration from file, env, and flags.
fn load_config(cli: &Cli) -> lanefile::Result<BoardConfig> {
    let mut config = match &cli.config {
        Some(path) => BoardConfig::load_from(path)?,
        None => BoardConfig::load_default(),
    };
    if let Some(board) = &cli.board {
        config = config.with_board_root(board);
    }
    Ok(config)
}

fn cmd_lanes(config: &BoardConfig) -> lanefile::Result<()> {
    let repo = TaskRepository::new(config);
    for lane in repo.store().list_lanes()? {
        println!("{lane}");
    }
    Ok(())
}

fn cmd_cards(config: &BoardConfig, lane: Option<&str>) -> lanefile::Result<()> {
    let repo = TaskRepository::new(config);
    let tasks = match lane {
        Some(lane) => repo.get_lane_tasks(lane)?,
        None => repo.get_cards()?,
    };
    for task in tasks {
        let title = if task.title.is_empty() {
            "(untitled)"
        } else {
            &task.title
        };
        println!("{}  {}  [{}]", task.id, title, task.lane);
    }
    Ok(())
}

fn cmd_add(config: &BoardConfig, lane: &str, title: &str, content: &str) -> lanefile::Result<()> {
    let repo = TaskRepository::new(config);
    let task = repo.create_task(lane, title, content)?;
    println!("{}", task.id);
    Ok(())
}

fn cmd_move(config: &BoardConfig, id: &str, from: &str, to: &str) -> lanefile::Result<()> {
    let repo = TaskRepository::new(config);
    let task = repo.move_task(&TaskId::new(id), from, to)?;
    println!("{} -> {}", task.id, task.lane);
    Ok(())
}

fn cmd_edit(
    config: &BoardConfig,
    id: &str,
    content: String,
    lane: Option<String>,
) -> lanefile::Result<()> {
    let repo = TaskRepository::new(config);
    repo.update_task(
        &TaskId::new(id),
        TaskUpdate {
            content: Some(content),
            lane,
            new_lane: None,
        },
    )?;
    Ok(())
}

fn cmd_rm(config: &BoardConfig, id: &str, lane: Option<&str>) -> lanefile::Result<()> {
    let repo = TaskRepository::new(config);
    repo.delete_task(&TaskId::new(id), lane)
}

//! # tododeck
//!
//! A terminal todo manager that keeps a local cache in step with a REST
//! todo backend. Quick edits go through the CLI; `tododeck ui` opens an
//! interactive board with list, kanban and calendar views.
//!
//! ## Usage
//!
//! ```bash
//! # Sign in once; the token is stored next to the cache
//! tododeck login ada@example.com
//!
//! # Add and list
//! tododeck add "Buy milk" --priority high --tag errand --due 2026-11-02
//! tododeck list --priority high --sort due-date --asc
//!
//! # Workflow
//! tododeck status 3f2a in-progress
//! tododeck subtask add 3f2a "Find a shop"
//! tododeck log 3f2a 25 -m "walked there"
//!
//! # Boards
//! tododeck kanban
//! tododeck calendar --due this-week
//! ```
//!
//! Todos are addressed by any unique prefix of their id.
//!
//! ## Offline use
//!
//! Without a session, or with `--offline`, every command works against the
//! local cache only. The cache lives in `$TODODECK_DIR` or the platform data
//! directory (`~/.local/share/tododeck` on Linux).
//!
//! ## Logging
//!
//! Diagnostics go to stderr and are filtered by `RUST_LOG`
//! (default `warn`), e.g. `RUST_LOG=tododeck=debug tododeck pull`.

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tododeck::commands::*;
use tododeck::config::{Config, GlobalOpts};
use tododeck::error::AppResult;
use tododeck::models::{NewAttachment, Status};
use tododeck::tui::run_tui;

#[derive(Parser)]
#[command(name = "tododeck")]
#[command(about = "Terminal todo manager with server sync", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Login {
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "TODODECK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        name: String,
        email: String,
        #[arg(long, env = "TODODECK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Replace the local cache with the server's todos
    Pull,
    /// List todos
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show one todo in full
    Show { id: String },
    /// Add a new todo
    Add {
        #[command(flatten)]
        args: AddArgs,
    },
    /// Edit a todo
    Edit {
        id: String,
        #[command(flatten)]
        args: EditArgs,
    },
    /// Toggle a todo's completion
    Done { id: String },
    /// Toggle the star on a todo
    Star { id: String },
    /// Archive or unarchive a todo
    Archive { id: String },
    /// Remove a todo
    Rm { id: String },
    /// Move a todo to a position in the list (1-based)
    Move { id: String, position: usize },
    /// Move a todo to a workflow column
    Status {
        id: String,
        #[arg(value_enum)]
        status: Status,
    },
    /// Manage subtasks
    Subtask {
        #[command(subcommand)]
        command: SubtaskCommands,
    },
    /// Manage comments
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },
    /// Log minutes worked on a todo
    Log {
        id: String,
        minutes: u32,
        #[arg(short = 'm', long)]
        description: Option<String>,
    },
    /// Attach a link to a todo
    Attach {
        id: String,
        name: String,
        url: String,
        /// MIME type
        #[arg(long, default_value = "application/octet-stream")]
        kind: String,
        /// Size in bytes
        #[arg(long, default_value_t = 0)]
        size: u64,
    },
    /// Show todos as kanban columns
    Kanban {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show todos by due day
    Calendar {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show aggregate statistics
    Stats,
    /// Delete the local cache and session
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum SubtaskCommands {
    /// Add a subtask
    Add { id: String, text: String },
    /// Toggle a subtask (1-based index)
    Done { id: String, index: usize },
    /// Remove a subtask (1-based index)
    Rm { id: String, index: usize },
}

#[derive(Subcommand)]
enum CommentCommands {
    /// Add a comment
    Add { id: String, text: String },
    /// Remove a comment (1-based index)
    Rm { id: String, index: usize },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(command: Option<Commands>, config: &Config) -> AppResult<()> {
    match command {
        Some(Commands::Login { email, password }) => cmd_login(config, &email, password),
        Some(Commands::Register { name, email, password }) => cmd_register(config, &name, &email, password),
        Some(Commands::Logout) => cmd_logout(config),
        Some(Commands::Whoami) => {
            cmd_whoami(config);
            Ok(())
        }
        Some(Commands::Reset { force }) => cmd_reset(config, force),
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "tododeck", &mut io::stdout());
            Ok(())
        }
        Some(command) => {
            let mut sync = open(config);
            match command {
                Commands::Pull => cmd_pull(&mut sync),
                Commands::List { filter } => {
                    cmd_list(&mut sync, &filter);
                    Ok(())
                }
                Commands::Show { id } => cmd_show(&sync, &id),
                Commands::Add { args } => cmd_add(&mut sync, args).map(|_| ()),
                Commands::Edit { id, args } => cmd_edit(&mut sync, &id, &args),
                Commands::Done { id } => cmd_done(&mut sync, &id),
                Commands::Star { id } => cmd_star(&mut sync, &id),
                Commands::Archive { id } => cmd_archive(&mut sync, &id),
                Commands::Rm { id } => cmd_remove(&mut sync, &id),
                Commands::Move { id, position } => cmd_move(&mut sync, &id, position),
                Commands::Status { id, status } => cmd_status(&mut sync, &id, status),
                Commands::Subtask { command } => match command {
                    SubtaskCommands::Add { id, text } => cmd_subtask_add(&mut sync, &id, text),
                    SubtaskCommands::Done { id, index } => cmd_subtask_done(&mut sync, &id, index),
                    SubtaskCommands::Rm { id, index } => cmd_subtask_remove(&mut sync, &id, index),
                },
                Commands::Comment { command } => match command {
                    CommentCommands::Add { id, text } => cmd_comment_add(&mut sync, config, &id, text),
                    CommentCommands::Rm { id, index } => cmd_comment_remove(&mut sync, &id, index),
                },
                Commands::Log { id, minutes, description } => cmd_log(&mut sync, &id, minutes, description),
                Commands::Attach { id, name, url, kind, size } => {
                    cmd_attach(&mut sync, &id, NewAttachment { name, url, kind, size })
                }
                Commands::Kanban { filter } => {
                    cmd_kanban(&mut sync, &filter);
                    Ok(())
                }
                Commands::Calendar { filter } => {
                    cmd_calendar(&mut sync, &filter);
                    Ok(())
                }
                Commands::Stats => cmd_stats(&sync),
                Commands::Ui => run_tui(sync),
                Commands::Login { .. }
                | Commands::Register { .. }
                | Commands::Logout
                | Commands::Whoami
                | Commands::Reset { .. }
                | Commands::Completions { .. } => Ok(()),
            }
        }
        None => run_tui(open(config)),
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::from(cli.global);
    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

//! # askhive
//!
//! Command-line client for the askhive Q&A forum.
//!
//! ## Commands
//!
//! - `register`, `login`, `logout`, `whoami`: account session
//! - `list`: print questions, most urgent first
//! - `ask`, `answer`: post a question or an answer
//! - `mark-answered`, `escalate`: change a question's status
//! - `suggest`: ask the server for an AI-drafted answer
//! - `watch`: follow the forum live until Ctrl-C
//!
//! ## Example
//!
//! ```bash
//! askhive login --username ana
//! askhive ask "How do I reset my router?"
//! askhive watch
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use askhive_client::WsTransport;
use askhive_types::QuestionId;
use commands::{account, questions, watch};

/// Command-line client for the askhive Q&A forum.
#[derive(Parser, Debug)]
#[command(name = "askhive")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the stored session and config.toml
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to config.toml in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account and sign in
    Register {
        #[arg(long, short)]
        username: String,

        #[arg(long, short)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Sign in
    Login {
        #[arg(long, short)]
        username: String,

        /// Password (will prompt if not provided)
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// List questions, most urgent first
    List,

    /// Post a question
    Ask {
        message: String,
    },

    /// Answer a question
    Answer {
        id: u64,
        message: String,
    },

    /// Mark a question answered
    MarkAnswered {
        id: u64,
    },

    /// Escalate a question
    Escalate {
        id: u64,
    },

    /// Request an AI-drafted answer for a question
    Suggest {
        id: u64,
    },

    /// Follow the forum live until Ctrl-C
    Watch {
        /// Poll the REST API instead of holding a WebSocket connection
        #[arg(long)]
        poll: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    config::prepare_data_dir(&data_dir).await?;

    let client_config = config::load_config(cli.config.as_deref(), &data_dir)?;
    let service = config::open_service::<WsTransport>(client_config, &data_dir)?;

    match cli.command {
        Commands::Register {
            username,
            email,
            password,
        } => account::register(&service, &username, &email, password).await?,
        Commands::Login { username, password } => {
            account::login(&service, &username, password).await?
        }
        Commands::Logout => account::logout(&service).await?,
        Commands::Whoami => account::whoami(&service).await?,
        Commands::List => questions::list(&service).await?,
        Commands::Ask { message } => questions::ask(&service, &message).await?,
        Commands::Answer { id, message } => {
            questions::answer(&service, QuestionId::new(id), &message).await?
        }
        Commands::MarkAnswered { id } => {
            questions::mark_answered(&service, QuestionId::new(id)).await?
        }
        Commands::Escalate { id } => questions::escalate(&service, QuestionId::new(id)).await?,
        Commands::Suggest { id } => questions::suggest(&service, QuestionId::new(id)).await?,
        Commands::Watch { poll } => {
            let transport = (!poll).then(WsTransport::new);
            watch::run(&service, transport, interrupted()).await?
        }
    }

    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn interrupted() {
    wait_for_signal(tokio::signal::ctrl_c()).await
}

async fn wait_for_signal(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        error!(error = %e, "cannot listen for Ctrl-C; stop with another signal");
        std::future::pending::<()>().await;
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `askhive=info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("askhive=info,askhive_client=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Get the default data directory for askhive.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "askhive", "askhive")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

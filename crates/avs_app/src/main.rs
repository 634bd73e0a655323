mod commands;

use std::path::PathBuf;

use anyhow::Context;
use avs_logging::{avs_error, LogDestination};
use clap::{Parser, Subcommand};

use commands::{AuthorizeArgs, DocumentArgs, OfficeCommand, ProfileCommand, Workspace};

/// Travel authorization (AVS) generator from NFC-e receipts.
#[derive(Parser)]
#[command(name = "avs", version, about)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding profiles, office record and sessions
    #[arg(long, default_value = "avs-data", global = true)]
    data_dir: PathBuf,

    /// Session id; each session has its own pending URLs
    #[arg(long, default_value = "default", global = true)]
    session: String,

    /// Write the log to this file (./avs.log when no path is given); the
    /// terminal only shows it with -v
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        default_missing_value = avs_logging::DEFAULT_LOG_FILE
    )]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a receipt URL to the session
    AddUrl { url: String },
    /// Forget pending URLs and the last result
    Clear,
    /// List pending URLs
    Pending,
    /// Fetch every pending receipt and summarize the totals
    Authorize(AuthorizeArgs),
    /// Generate the PDF from the last authorization
    Document(DocumentArgs),
    /// Manage traveler profiles
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Inspect or update the office record
    #[command(subcommand)]
    Office(OfficeCommand),
}

fn main() {
    let cli = Cli::parse();
    let destination = LogDestination::select(cli.log_file.clone(), cli.verbose > 0);
    avs_logging::initialize(destination, avs_logging::level_from_verbosity(cli.verbose));

    if let Err(err) = run(cli) {
        avs_error!("{:#}", err);
        eprintln!("Erro: {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let ws = Workspace {
        data_dir: cli.data_dir,
        session_id: cli.session,
    };
    match cli.command {
        Command::AddUrl { url } => commands::add_url(&ws, &url),
        Command::Clear => commands::clear(&ws),
        Command::Pending => commands::pending(&ws),
        Command::Authorize(args) => {
            runtime()?.block_on(commands::authorize(&ws, args))
        }
        Command::Document(args) => commands::document(&ws, args),
        Command::Profile(command) => commands::profile(&ws, command),
        Command::Office(command) => commands::office(&ws, command),
    }
}

// Receipts are fetched one at a time, so a single thread is enough.
fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")
}

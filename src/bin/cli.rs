//! caskdb CLI
//!
//! Command-line interface over a caskdb log file.

use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use caskdb::config::RecoveryPolicy;
use caskdb::log::{replay, ReplayStop};
use caskdb::medium::{FileMedium, Medium, MediumReader};
use caskdb::{Config, Engine};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// caskdb CLI
#[derive(Parser, Debug)]
#[command(name = "caskdb-cli")]
#[command(about = "CLI for the caskdb log-structured key-value store")]
#[command(version)]
struct Args {
    /// Log file
    #[arg(short, long, default_value = "./caskdb_data/cask.log")]
    log: PathBuf,

    /// Cut a corrupt tail off the log instead of refusing to open it
    #[arg(long)]
    truncate_corrupt_tail: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// List live keys
    Keys,

    /// Replay the log without modifying it and report its state
    Verify,
}

fn main() {
    // Logs go to stderr; stdout carries values
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> caskdb::Result<()> {
    match args.command {
        Commands::Verify => verify(&args.log),
        Commands::Get { key } => {
            let engine = open_engine(&args.log, args.truncate_corrupt_tail)?;
            let value = engine.get(key.as_bytes())?;
            println!("{}", String::from_utf8_lossy(&value));
            engine.close()
        }
        Commands::Put { key, value } => {
            let engine = open_engine(&args.log, args.truncate_corrupt_tail)?;
            engine.put(key.as_bytes(), value.as_bytes())?;
            engine.close()
        }
        Commands::Keys => {
            let engine = open_engine(&args.log, args.truncate_corrupt_tail)?;
            for key in engine.keys() {
                println!("{}", String::from_utf8_lossy(&key));
            }
            engine.close()
        }
    }
}

fn open_engine(path: &Path, truncate_corrupt_tail: bool) -> caskdb::Result<Engine> {
    let policy = if truncate_corrupt_tail {
        RecoveryPolicy::TruncateTail
    } else {
        RecoveryPolicy::Strict
    };

    let config = Config::builder()
        .log_path(path)
        .recovery_policy(policy)
        .build();

    Engine::open(config)
}

fn verify(path: &Path) -> caskdb::Result<()> {
    if !path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no log file at {}", path.display()),
        )
        .into());
    }

    let mut medium = FileMedium::open(path)?;
    let log_len = medium.len()?;
    let result = replay(BufReader::new(MediumReader::new(&mut medium)?))?;

    println!("records:    {}", result.entries_recovered);
    println!("live keys:  {}", result.keydir.len());
    println!("live bytes: {}", result.keydir.live_value_bytes());
    println!("log length: {}", log_len);

    match &result.stop {
        ReplayStop::EndOfLog => println!("status:     ok"),
        ReplayStop::Corrupt { offset, reason } => {
            println!("status:     corrupt at offset {}: {}", offset, reason);
            println!("valid:      {} bytes", result.valid_len);
        }
    }

    result.into_keydir().map(|_| ())
}

//! Tutorín CLI
//!
//! Serves the tutoring API and runs the administrative resets.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use tutorin_orchestrator::{
    create_router, AppState, Config, HintBackend, HintSelector, OpenAiBackend, TutorError,
};
use tutorin_store::ProgressStore;

/// Tutorín - step-by-step arithmetic tutor
///
/// Walks pupils through column arithmetic, fractions, decimals and word
/// problems one sub-step at a time, with escalating hints.
#[derive(Parser, Debug)]
#[command(name = "tutorin")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: tutorin.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database file
        #[arg(short, long, value_name = "PATH")]
        database: Option<String>,
    },

    /// Delete the stored progress of one exercise
    ResetExercise {
        /// Exercise identifier
        #[arg(value_name = "ID")]
        exercise_id: String,
    },

    /// Wipe all progress and history
    ResetAll {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Configuration mistakes exit with 2, everything else with 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    let fatal = err
        .downcast_ref::<TutorError>()
        .is_some_and(TutorError::is_fatal);
    if fatal {
        2
    } else {
        1
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    match args.command.unwrap_or(Command::Serve {
        port: None,
        database: None,
    }) {
        Command::Serve { port, database } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(database) = database {
                config.database = database;
            }
            // Re-validate after overrides
            config.validate()?;
            serve(config).await
        }
        Command::ResetExercise { exercise_id } => {
            let store = open_store(&config)?;
            if store.reset_progress(&exercise_id)? {
                println!("Progress of exercise '{exercise_id}' deleted");
            } else {
                println!("No progress stored for exercise '{exercise_id}'");
            }
            Ok(())
        }
        Command::ResetAll { yes } => {
            if !yes {
                anyhow::bail!(
                    "Refusing to wipe '{}' without confirmation\n\nSuggestion: Re-run with --yes",
                    config.database
                );
            }
            let (progress, history) = open_store(&config)?.reset_all()?;
            println!("Deleted {progress} progress records and {history} history rows");
            Ok(())
        }
    }
}

/// Runs the HTTP server until Ctrl+C.
async fn serve(config: Config) -> anyhow::Result<()> {
    print_config(&config);

    let store = Arc::new(open_store(&config)?);
    let hints = HintSelector::new(hint_backend(&config));
    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let router = create_router(AppState::new(config, store, hints));

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!("HTTP API server running on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}

/// Loads configuration from the given path or the current directory.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Ok(Config::load_from_file(path)?)
        }
        None => Ok(Config::load()?),
    }
}

fn open_store(config: &Config) -> anyhow::Result<ProgressStore> {
    ProgressStore::open(&config.database).map_err(|e| {
        anyhow::anyhow!(
            "Failed to open database '{}': {e}\n\nSuggestion: Check the path and its permissions",
            config.database
        )
    })
}

/// Builds the generative backend when enabled and a key is present.
fn hint_backend(config: &Config) -> Option<Arc<dyn HintBackend>> {
    if !config.hints.enabled {
        tracing::info!("Generative hints disabled");
        return None;
    }
    match OpenAiBackend::from_config(&config.hints) {
        Ok(backend) => {
            tracing::info!(model = backend.model(), "Generative hints enabled");
            Some(Arc::new(backend))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Generative hints unavailable, using scripted hints only");
            None
        }
    }
}

fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Port: {}", config.port);
    println!("  Database: {}", config.database);
    println!("  Default cycle: {}", config.default_cycle);
    println!("  CORS origins: {}", config.cors_origins.join(", "));
    println!("  Generative hints: {}", config.hints.enabled);
}

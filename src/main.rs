use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use humanise::cli::commands::transform::TransformOptions;
use humanise::cli::{InputSource, load_config};
use humanise::{HumaniseError, Mode};

/// Exit status after Ctrl-C (128 + SIGINT)
const EXIT_CANCELLED: u8 = 130;

/// Parse target mode from string
fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse::<Mode>().map_err(|e| e.to_string())
}

/// Parse a threshold in (0, 1]
fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("Invalid threshold '{}': expected a number", s))?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("Threshold must be in (0, 1], got {}", value))
    }
}

#[derive(Parser)]
#[command(name = "humanise")]
#[command(
    version,
    about = "Rewrite machine-generated prose so it reads as human-written"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Load configuration from this file")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Humanise a text in the given style
    Transform {
        #[arg(long, short, value_parser = parse_mode, help = "Target style: sales, journalist")]
        mode: Mode,
        #[arg(long, short, conflicts_with = "file", help = "Text to transform")]
        text: Option<String>,
        #[arg(long, short, help = "Read the text from a file")]
        file: Option<PathBuf>,
        #[arg(long, help = "Topic hint for exemplar retrieval")]
        topic: Option<String>,
        #[arg(long, value_parser = parse_threshold, help = "Quality threshold override (0.0-1.0]")]
        threshold: Option<f64>,
        #[arg(
            long,
            value_parser = clap::value_parser!(u16).range(1..),
            help = "Max iterations override"
        )]
        max_iterations: Option<u16>,
        #[arg(long, help = "Score from text metrics only")]
        no_judge: bool,
        #[arg(long, help = "Print JSON instead of text")]
        json: bool,
        #[arg(short = 'd', long, help = "Include per-iteration details")]
        detailed: bool,
    },

    /// List available modes
    Modes {
        #[arg(long, help = "Print JSON instead of text")]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show {
        #[arg(long, help = "Print JSON instead of TOML")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
    /// Write a default configuration file
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mhumanise encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Default hook prints the backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if matches!(e.downcast_ref::<HumaniseError>(), Some(HumaniseError::Cancelled)) {
                eprintln!("\x1b[33mCancelled\x1b[0m");
                return ExitCode::from(EXIT_CANCELLED);
            }
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "humanise=debug"
    } else if cli.quiet {
        "error"
    } else {
        "humanise=warn"
    };

    // Logs go to stderr; stdout carries the transformed text or JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Transform {
            mode,
            text,
            file,
            topic,
            threshold,
            max_iterations,
            no_judge,
            json,
            detailed,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let options = TransformOptions {
                mode,
                input: InputSource::from_args(text, file),
                topic,
                threshold,
                max_iterations: max_iterations.map(usize::from),
                no_judge,
                json,
                detailed,
            };

            let rt = Runtime::new()?;
            rt.block_on(async {
                let cancel = CancellationToken::new();
                let on_signal = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("Interrupt received, cancelling");
                        on_signal.cancel();
                    }
                });

                humanise::cli::commands::transform::run(config, options, cancel).await
            })?;
        }
        Commands::Modes { json } => {
            humanise::cli::commands::modes::run(json)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                humanise::cli::commands::config::show(cli.config.as_deref(), json)?;
            }
            ConfigAction::Path => {
                humanise::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                humanise::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}

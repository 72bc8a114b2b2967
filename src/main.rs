use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxlive::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxlive::AppCommand {
    fn from(cmd: Commands) -> fxlive::AppCommand {
        match cmd {
            Commands::Live { base, duration } => fxlive::AppCommand::Live {
                base,
                duration_secs: duration,
            },
            Commands::Convert {
                amount,
                from,
                to,
                swap,
            } => fxlive::AppCommand::Convert {
                amount,
                from,
                to,
                swap,
            },
            Commands::Currencies => fxlive::AppCommand::Currencies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Watch live exchange rates
    Live {
        /// Base currency, defaults to the configured one
        #[arg(short, long)]
        base: Option<String>,
        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },
    /// Convert an amount between two currencies
    Convert {
        amount: String,
        #[arg(short, long)]
        from: Option<String>,
        #[arg(short, long)]
        to: Option<String>,
        /// Swap the source and target currencies
        #[arg(short, long)]
        swap: bool,
    },
    /// List available currency codes
    Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxlive::cli::setup::setup(),
        Some(cmd) => fxlive::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

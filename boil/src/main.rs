use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;

use cli::{Cli, Commands};
use config::BoilConfig;

fn main() -> Result<()> {
    // Parse CLI arguments first to get verbosity level
    let cli = Cli::parse();

    // Progress bars own the terminal, so only warnings show by default
    let filter = match cli.verbose {
        0 => "warn",
        1 => "debug",
        2.. => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = BoilConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Gen(args) => {
            debug!("Gen command: {:?}", args);
            // Create async runtime for the command
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::generate::execute(args, config))?;
        }
        Commands::Config => {
            print!("{}", config.to_redacted_toml()?);
        }
    }

    Ok(())
}

// Main entry point for unitrun

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use unitrun::cli::Cli;
use unitrun::commands::{handle_completion, handle_show_config, run_tests};
use unitrun::config::Config;
use unitrun::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // Load configuration from file (if exists)
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring configuration: {:#}", e);
        None
    });

    if cli.verbose {
        info!("Starting unitrun v{}", env!("CARGO_PKG_VERSION"));
    }

    if cli.config {
        handle_show_config(config.as_ref());
        return Ok(());
    }

    if let Some(config_file) = &cli.init_config {
        std::fs::write(config_file, Config::default().to_toml())?;
        println!("Configuration file created: {}", config_file.display());
        println!("\nYou can now edit the file to customize your settings.");
        return Ok(());
    }

    if let Some(shell_type) = &cli.completion {
        return handle_completion(shell_type);
    }

    let config = config.unwrap_or_default();
    let successful = run_tests(cli.get_run_args(), &config, cli.verbose)?;
    if !successful {
        std::process::exit(1);
    }

    Ok(())
}

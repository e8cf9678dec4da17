// Commands module - handles CLI command execution

use anyhow::Result;

pub mod run;

pub use run::{execute, run_tests};

/// Handle shell completion
pub fn handle_completion(shell_type: &str) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{Shell, generate};

    let shell = match shell_type.to_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "elvish" => Shell::Elvish,
        "powershell" => Shell::PowerShell,
        _ => {
            anyhow::bail!(
                "Unsupported shell: {}. Supported: bash, zsh, fish, elvish, powershell",
                shell_type
            );
        }
    };

    let mut cmd = crate::cli::Cli::command();
    let name = cmd.get_name().to_string();
    let mut stdout = std::io::stdout();

    generate(shell, &mut cmd, name, &mut stdout);

    Ok(())
}

/// Print the effective configuration
pub fn handle_show_config(config: Option<&crate::config::Config>) {
    match config {
        Some(cfg) => {
            println!("Configuration file loaded:\n");
            print!("{}", cfg.to_toml());
        }
        None => {
            println!("No configuration file loaded, using defaults:\n");
            print!("{}", crate::config::Config::default().to_toml());
            println!(
                "\nCreate one with: unitrun --init-config {}",
                crate::config::CONFIG_FILE_NAME
            );
        }
    }

    println!("\nConfiguration precedence:");
    println!("  1. Command-line arguments (highest)");
    println!("  2. Configuration file");
    println!("  3. Built-in defaults (lowest)");
}

// CLI argument definitions using Clap

use crate::config::Config;
use crate::execution::RunOptions;
use crate::report::{ColorMode, Columns, PrinterOptions};
use crate::state::StopPolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Replay scripted test plans through the unitrun reporters
#[derive(Parser, Debug)]
#[command(name = "unitrun")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run test plans and report results", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // Lets `unitrun plan.json` work without the `run` subcommand
    #[command(flatten)]
    pub run_args: RunArgs,

    /// List risky, incomplete and skipped tests and enable debug logging
    #[arg(short = 'v', long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Show current configuration and exit
    #[arg(long, default_value_t = false)]
    pub config: bool,

    /// Create default configuration file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub init_config: Option<PathBuf>,

    /// Print shell completion script (bash, zsh, fish, elvish, powershell)
    #[arg(
        long,
        value_name = "SHELL_TYPE",
        value_parser = ["bash", "zsh", "fish", "elvish", "powershell"]
    )]
    pub completion: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a test plan (default)
    Run(RunArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// JSON test plan to run
    // Optional so the flattened top-level form does not clash with subcommands
    #[arg(required = false)]
    pub plan: Option<PathBuf>,

    /// Only run tests from the given group(s)
    #[arg(long = "group", value_name = "GROUP", value_delimiter = ',')]
    pub groups: Vec<String>,

    /// Exclude tests from the given group(s)
    #[arg(long = "exclude-group", value_name = "GROUP", value_delimiter = ',')]
    pub exclude_groups: Vec<String>,

    /// Run the plan repeatedly
    #[arg(long, allow_negative_numbers = true)]
    pub repeat: Option<i64>,

    /// Use colors in output (never, auto, always)
    #[arg(long, value_name = "MODE")]
    pub colors: Option<ColorMode>,

    /// Number of columns for progress output, or "max"
    #[arg(long, value_name = "N")]
    pub columns: Option<Columns>,

    /// Display debugging information while tests run
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Print defects in reverse order
    #[arg(long, default_value_t = false)]
    pub reverse_list: bool,

    #[arg(long, default_value_t = false)]
    pub stop_on_error: bool,

    /// Stop on the first error or failure
    #[arg(long, default_value_t = false)]
    pub stop_on_failure: bool,

    #[arg(long, default_value_t = false)]
    pub stop_on_warning: bool,

    #[arg(long, default_value_t = false)]
    pub stop_on_risky: bool,

    #[arg(long, default_value_t = false)]
    pub stop_on_incomplete: bool,

    #[arg(long, default_value_t = false)]
    pub stop_on_skipped: bool,

    /// Mark tests that perform no assertions as risky
    #[arg(long, default_value_t = false)]
    pub report_useless_tests: bool,

    /// Write a JSON event log to FILE
    #[arg(long, value_name = "FILE")]
    pub log_json: Option<PathBuf>,

    /// Write a TestDox XML document to FILE
    #[arg(long, value_name = "FILE")]
    pub testdox_xml: Option<PathBuf>,

    /// Close and reopen tickets in a JSON ticket ledger
    #[arg(long, value_name = "FILE")]
    pub tickets: Option<PathBuf>,

    /// Flag every test as running in its own process
    #[arg(long, default_value_t = false)]
    pub process_isolation: bool,
}

impl Cli {
    /// Helper to get effective RunArgs
    pub fn get_run_args(&self) -> &RunArgs {
        match &self.command {
            Some(Commands::Run(args)) => args,
            None => &self.run_args,
        }
    }
}

impl RunArgs {
    /// Console options; flags win over the configuration file
    pub fn printer_options(&self, config: &Config, verbose: bool) -> PrinterOptions {
        let mut options = config.printer.options();
        options.verbose |= verbose;
        options.debug |= self.debug;
        options.reverse |= self.reverse_list;
        if let Some(colors) = self.colors {
            options.colors = colors;
        }
        if let Some(columns) = self.columns {
            options.columns = columns;
        }
        options
    }

    pub fn run_options(&self, config: &Config) -> RunOptions {
        let run = &config.run;
        let configured = run.stop_policy();
        let stop = StopPolicy {
            stop_on_error: configured.stop_on_error || self.stop_on_error,
            stop_on_failure: configured.stop_on_failure || self.stop_on_failure,
            stop_on_warning: configured.stop_on_warning || self.stop_on_warning,
            stop_on_risky: configured.stop_on_risky || self.stop_on_risky,
            stop_on_incomplete: configured.stop_on_incomplete || self.stop_on_incomplete,
            stop_on_skipped: configured.stop_on_skipped || self.stop_on_skipped,
        };

        RunOptions {
            groups: self.groups.clone(),
            exclude_groups: self.exclude_groups.clone(),
            repeat: self.repeat.unwrap_or(run.repeat),
            process_isolation: self.process_isolation,
            stop,
            conversion: run.conversion(),
            report_useless_tests: run.report_useless_tests || self.report_useless_tests,
            log_json: self
                .log_json
                .clone()
                .or_else(|| config.logging.json.as_ref().map(PathBuf::from)),
            testdox_xml: self
                .testdox_xml
                .clone()
                .or_else(|| config.logging.testdox_xml.as_ref().map(PathBuf::from)),
        }
    }
}

// Configuration file handling

use crate::report::{ColorMode, Columns, PrinterOptions};
use crate::state::{ConditionConversion, StopPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = ".unitrunrc.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub printer: PrinterConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PrinterConfig {
    /// never, auto or always
    #[serde(default)]
    pub colors: ColorMode,

    /// Progress line width, or "max" for the terminal width
    #[serde(default)]
    pub columns: Columns,

    /// List risky, incomplete and skipped tests too
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub debug: bool,

    /// Print defects newest first
    #[serde(default)]
    pub reverse_list: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    #[serde(default)]
    pub stop_on_error: bool,

    #[serde(default)]
    pub stop_on_failure: bool,

    #[serde(default)]
    pub stop_on_warning: bool,

    #[serde(default)]
    pub stop_on_risky: bool,

    #[serde(default)]
    pub stop_on_incomplete: bool,

    #[serde(default)]
    pub stop_on_skipped: bool,

    /// Mark tests without assertions as risky
    #[serde(default)]
    pub report_useless_tests: bool,

    #[serde(default = "default_convert")]
    pub convert_warnings: bool,

    #[serde(default = "default_convert")]
    pub convert_notices: bool,

    #[serde(default = "default_convert")]
    pub convert_deprecations: bool,

    /// How many times to run the whole plan
    #[serde(default = "default_repeat")]
    pub repeat: i64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            stop_on_error: false,
            stop_on_failure: false,
            stop_on_warning: false,
            stop_on_risky: false,
            stop_on_incomplete: false,
            stop_on_skipped: false,
            report_useless_tests: false,
            convert_warnings: default_convert(),
            convert_notices: default_convert(),
            convert_deprecations: default_convert(),
            repeat: default_repeat(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LoggingConfig {
    /// Write the JSON event log here
    #[serde(default)]
    pub json: Option<String>,

    /// Write the TestDox XML document here
    #[serde(default)]
    pub testdox_xml: Option<String>,
}

fn default_convert() -> bool {
    true
}

pub fn default_repeat() -> i64 {
    1
}

impl RunConfig {
    pub fn stop_policy(&self) -> StopPolicy {
        StopPolicy {
            stop_on_error: self.stop_on_error,
            stop_on_failure: self.stop_on_failure,
            stop_on_warning: self.stop_on_warning,
            stop_on_risky: self.stop_on_risky,
            stop_on_incomplete: self.stop_on_incomplete,
            stop_on_skipped: self.stop_on_skipped,
        }
    }

    pub fn conversion(&self) -> ConditionConversion {
        ConditionConversion {
            warnings: self.convert_warnings,
            notices: self.convert_notices,
            deprecations: self.convert_deprecations,
        }
    }
}

impl PrinterConfig {
    pub fn options(&self) -> PrinterOptions {
        PrinterOptions {
            verbose: self.verbose,
            colors: self.colors,
            debug: self.debug,
            columns: self.columns,
            reverse: self.reverse_list,
        }
    }
}

impl Config {
    /// Load configuration from default locations.
    /// `Ok(None)` when no file exists; an unreadable or invalid file is an error
    /// so the caller can report it once logging is up.
    pub fn load() -> Result<Option<Self>> {
        // 1. ./.unitrunrc.toml
        // 2. ~/.unitrunrc.toml
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join(CONFIG_FILE_NAME));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(CONFIG_FILE_NAME));
        }

        match paths.iter().find(|path| path.exists()) {
            Some(path) => Self::load_from_file(path).map(Some),
            None => Ok(None),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid configuration file {}", path.display()))
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Option<Self> {
        toml::from_str(content).ok()
    }

    /// Generate default configuration as TOML
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|_| String::new())
    }
}

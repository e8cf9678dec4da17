// ANSI colouring for console output

use crate::error::FrameworkError;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static ANSI_CODES: Lazy<HashMap<&'static str, u8>> = Lazy::new(|| {
    HashMap::from([
        ("bold", 1),
        ("fg-black", 30),
        ("fg-red", 31),
        ("fg-green", 32),
        ("fg-yellow", 33),
        ("fg-blue", 34),
        ("fg-magenta", 35),
        ("fg-cyan", 36),
        ("fg-white", 37),
        ("bg-black", 40),
        ("bg-red", 41),
        ("bg-green", 42),
        ("bg-yellow", 43),
        ("bg-blue", 44),
        ("bg-magenta", 45),
        ("bg-cyan", 46),
        ("bg-white", 47),
    ])
});

/// Applies colour specs such as `"fg-white, bg-red"` to text
#[derive(Debug, Clone, Copy, Default)]
pub struct Colorizer {
    enabled: bool,
}

impl Colorizer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Resolve a comma-separated colour spec to its SGR sequence
    pub fn style(spec: &str) -> Result<String, FrameworkError> {
        let codes = spec
            .split(',')
            .map(str::trim)
            .map(|name| {
                ANSI_CODES
                    .get(name)
                    .map(|code| code.to_string())
                    .ok_or_else(|| FrameworkError::UnknownColor(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(format!("\x1b[{}m", codes.join(";")))
    }

    /// Wrap every line of `buffer` in the style, padding lines to a common width.
    /// Returns the buffer unchanged when colours are off.
    pub fn format_with_color(&self, spec: &str, buffer: &str) -> Result<String, FrameworkError> {
        if !self.enabled {
            return Ok(buffer.to_string());
        }

        let style = Self::style(spec)?;
        let lines: Vec<&str> = buffer.split('\n').collect();
        let padding = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        let styled: Vec<String> = lines
            .iter()
            .map(|line| format!("{}{:<width$}\x1b[0m", style, line, width = padding))
            .collect();

        Ok(styled.join("\n"))
    }
}

// Diagnostic logging on stderr, kept apart from the report stream on stdout

use chrono::Local;
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

pub struct CustomFormatter;

impl<S, N> FormatEvent<S, N> for CustomFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let level = event.metadata().level();
        let timestamp = Local::now().format("%H:%M:%S");

        let (emoji, level_str) = match *level {
            tracing::Level::TRACE => ("🔬", "TRACE"),
            tracing::Level::DEBUG => ("🐛", "DEBUG"),
            tracing::Level::INFO => ("ℹ️ ", "INFO"),
            tracing::Level::WARN => ("⚠️ ", "WARN"),
            tracing::Level::ERROR => ("❌", "ERROR"),
        };

        write!(writer, "{} {} [{}]: ", emoji, level_str, timestamp)?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Filter used when RUST_LOG is not set
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "unitrun=debug,warn"
    } else {
        "unitrun=warn,error"
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbose: bool) {
    let filter = default_filter(verbose);
    let _ = tracing_subscriber::fmt()
        .event_format(CustomFormatter)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .try_init();
}

//! Utilities for logging.

use std::str::FromStr;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One json object per line. CloudWatch indexes the fields.
    #[default]
    Json,
    HumanReadable,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "pretty" | "human" => Ok(LogFormat::HumanReadable),
            other => Err(format!("Unknown log format: '{other}'")),
        }
    }
}

/// Configure the global tracing subscriber.
///
/// `default_level` applies when `RUST_LOG` is unset or unparsable. Calling
/// this more than once keeps the first subscriber.
pub fn configure_global_logger<W>(default_level: Level, format: LogFormat, make_writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(default_level).into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(make_writer)
        .with_ansi(false);

    let result = match format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.json().flatten_event(true).finish())
        }
        LogFormat::HumanReadable => tracing::subscriber::set_global_default(builder.finish()),
    };

    if result.is_err() {
        tracing::debug!("global logger already configured");
    }
}

/// Initialize a human readable logger for tests.
///
/// Output is captured by the test harness.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_log_format() {
        assert_eq!(LogFormat::Json, "json".parse().unwrap());
        assert_eq!(LogFormat::Json, "JSON".parse().unwrap());
        assert_eq!(LogFormat::HumanReadable, "text".parse().unwrap());
        assert!("xml".parse::<LogFormat>().is_err());
    }
}

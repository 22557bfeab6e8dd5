use anyhow::{Context, Result, anyhow};
use std::io::IsTerminal;
use std::path::Path;
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "yearcal.log";

/// Where log lines are written.
pub enum LogTarget<'a> {
    /// Plain subcommands that print to stdout.
    Stderr,
    /// The TUI owns the terminal, so logs go to a daily-rolling file here.
    Dir(&'a Path),
}

/// Level name for a `-v` count.
///
/// - 0 (none) -> warn
/// - 1 (-v)   -> info
/// - 2 (-vv)  -> debug
/// - 3+ (-vvv)-> trace
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn default_filter(verbosity: u8) -> String {
    format!("yearcal={}", level_for(verbosity))
}

/// Initialize tracing. `RUST_LOG` overrides the verbosity flag when set.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the program.
pub fn init(verbosity: u8, target: LogTarget<'_>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbosity)))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    match target {
        LogTarget::Stderr => {
            let result = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr)
                .try_init();
            if let Err(err) = result {
                debug!(error = %err, "tracing subscriber already set, continuing");
            }
            Ok(None)
        }
        LogTarget::Dir(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log dir {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let result = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .try_init();
            if let Err(err) = result {
                debug!(error = %err, "tracing subscriber already set, continuing");
            }
            Ok(Some(guard))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(3), "trace");
        assert_eq!(level_for(9), "trace");
    }

    #[test]
    fn test_default_filter_targets_crate() {
        assert_eq!(default_filter(1), "yearcal=info");
        assert!(EnvFilter::try_new(default_filter(2)).is_ok());
    }
}

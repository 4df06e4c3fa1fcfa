//! Tracing setup for the `checkin` binary.
//!
//! Everything the store and the exporter log goes to stderr, leaving stdout
//! to command output such as `list --json`. A save that fails, or a signature
//! that cannot be decoded for the sheet, is a `warn` event rather than an
//! error: the command still succeeds.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much of `checkin`'s own logging reaches stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// `-q`: errors only. Failed saves are still reported by `add` itself.
    Quiet,
    /// Loads and exports, plus warnings.
    #[default]
    Normal,
    /// `-v`: adds per-append writes and page layout.
    Verbose,
    /// `-vv`: everything.
    Trace,
}

impl Verbosity {
    /// Most detailed level that is shown.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    #[must_use]
    pub fn directive(&self) -> String {
        format!("checkin={}", self.to_level_filter().to_string().to_lowercase())
    }
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` replaces the directive derived from `verbosity`. A second call
/// is a no-op.
///
/// # Examples
///
/// ```no_run
/// use checkin::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init();
}

/// Route warnings from the code under test into the test harness output.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_to_level() {
        assert_eq!(Verbosity::Quiet.to_level_filter(), Level::ERROR);
        assert_eq!(Verbosity::Normal.to_level_filter(), Level::INFO);
        assert_eq!(Verbosity::Verbose.to_level_filter(), Level::DEBUG);
        assert_eq!(Verbosity::Trace.to_level_filter(), Level::TRACE);
    }

    #[test]
    fn test_directive_targets_checkin() {
        assert_eq!(Verbosity::Quiet.directive(), "checkin=error");
        assert_eq!(Verbosity::default().directive(), "checkin=info");
        assert_eq!(Verbosity::Trace.directive(), "checkin=trace");
    }

    #[test]
    fn test_init_logging_with_all_verbosity_levels() {
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Normal);
        init_logging(Verbosity::Verbose);
        init_logging(Verbosity::Trace);
    }

    #[test]
    fn test_init_test_logging_accepts_warnings() {
        init_test_logging();
        init_test_logging();
        tracing::warn!("attendee list could not be saved");
    }
}

//! Sinks for the per-package change lines of a run

use tracing::info;

/// Receives one human readable line per changed package
///
/// Lines arrive in fetch completion order.
pub trait ChangeLogger: Send + Sync {
    fn log(&self, line: &str);
}

impl<F> ChangeLogger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, line: &str) {
        self(line)
    }
}

/// Forwards change lines to `tracing` at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl ChangeLogger for TracingLogger {
    fn log(&self, line: &str) {
        info!("{}", line);
    }
}

//! Logging sink injected into the import pipeline.

use calreader_core::constants::IMPORT_LOG_TARGET;

/// Receives the pipeline's diagnostics.
pub trait ImportLogger {
    fn debug(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to `tracing` under the `calreader::import` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl ImportLogger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: IMPORT_LOG_TARGET, "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: IMPORT_LOG_TARGET, "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: IMPORT_LOG_TARGET, "{message}");
    }
}

/// Adapts a pair of debug and error callables.
///
/// Warnings go to the error callable.
pub struct FnLogger<D, E> {
    debug: D,
    error: E,
}

impl<D, E> FnLogger<D, E>
where
    D: Fn(&str),
    E: Fn(&str),
{
    #[must_use]
    pub fn new(debug: D, error: E) -> Self {
        Self { debug, error }
    }
}

impl<D, E> ImportLogger for FnLogger<D, E>
where
    D: Fn(&str),
    E: Fn(&str),
{
    fn debug(&self, message: &str) {
        (self.debug)(message);
    }

    fn warn(&self, message: &str) {
        (self.error)(message);
    }

    fn error(&self, message: &str) {
        (self.error)(message);
    }
}

//! Downstream logger facade.

use std::fmt;

/// Application logger that receives the rendered SQL trace lines.
///
/// Each method takes pre-built [`fmt::Arguments`], so implementations decide
/// whether and where the message is actually formatted.
pub trait Logger: fmt::Debug + Send + Sync {
    fn info(&self, args: fmt::Arguments<'_>);
    fn warn(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);
}

/// Default [`Logger`] that emits `tracing` events.
///
/// Events are recorded under the `sea_orm_sql_logger` target, so they can be
/// filtered with e.g. `RUST_LOG=sea_orm_sql_logger=warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "sea_orm_sql_logger", "{}", args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(target: "sea_orm_sql_logger", "{}", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(target: "sea_orm_sql_logger", "{}", args);
    }
}

impl<T: Logger + ?Sized> Logger for std::sync::Arc<T> {
    fn info(&self, args: fmt::Arguments<'_>) {
        (**self).info(args)
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        (**self).warn(args)
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        (**self).error(args)
    }
}

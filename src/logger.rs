//! SQL trace logger and the hook contract database layers call into.

use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::Span;

use crate::config::LoggerConfig;
use crate::level::{AtomicLogLevel, LogLevel};
use crate::sink::{Logger, TracingLogger};

/// Trace hook invoked by a database layer after every completed operation.
///
/// The trait is object safe so connections can hold an `Arc<dyn TraceHook>`.
pub trait TraceHook: fmt::Debug + Send + Sync {
    /// Replace the severity threshold.
    fn log_mode(&self, level: LogLevel) -> &dyn TraceHook;

    fn info(&self, args: fmt::Arguments<'_>);

    fn warn(&self, args: fmt::Arguments<'_>);

    fn error(&self, args: fmt::Arguments<'_>);

    /// Report one finished operation.
    ///
    /// `fc` yields the SQL text and the affected row count (`-1` when unknown).
    /// It is only called when the event is actually logged. The location of the
    /// call to this method is used as the line tag, also through `dyn TraceHook`.
    #[track_caller]
    fn trace(
        &self,
        begin: Instant,
        fc: &dyn Fn() -> (String, i64),
        err: Option<&dyn fmt::Display>,
    );
}

/// Translates trace events into log lines on a downstream [`Logger`].
///
/// Statements are classified in order:
///
/// 1. failed statements are logged at ERROR (level `Error` and above),
/// 2. statements slower than the slow threshold at WARN (level `Warn` and above),
/// 3. everything else at INFO, only when the level is exactly `Info`.
///
/// The level and slow threshold live in atomics, so they can be changed while
/// other threads are tracing through the same instance.
///
/// # Example
///
/// ```rust
/// use sea_orm_sql_logger::{LogLevel, SqlLogger, TracingLogger};
/// use std::time::{Duration, Instant};
///
/// let logger = SqlLogger::new(tracing::Span::none(), TracingLogger, Duration::from_millis(200));
/// logger.log_mode(LogLevel::Warn);
///
/// let begin = Instant::now();
/// logger.trace(begin, || ("SELECT 1".to_string(), 1), None);
/// ```
#[derive(Debug)]
pub struct SqlLogger<L = TracingLogger> {
    span: Span,
    logger: L,
    level: AtomicLogLevel,
    slow_threshold_nanos: AtomicU64,
}

impl<L: Logger> SqlLogger<L> {
    /// Create a logger at level `Info`.
    ///
    /// Records are emitted inside `span`; pass `Span::none()` to attach them to
    /// whatever span is current at the call site.
    pub fn new(span: Span, logger: L, slow_threshold: Duration) -> Self {
        Self {
            span,
            logger,
            level: AtomicLogLevel::new(LogLevel::Info),
            slow_threshold_nanos: AtomicU64::new(duration_to_nanos(slow_threshold)),
        }
    }

    pub fn from_config(logger: L, config: &LoggerConfig) -> Self {
        let span = match &config.database_name {
            Some(name) => tracing::info_span!("sql_logger", db.name = %name),
            None => Span::none(),
        };

        let sql_logger = Self::new(span, logger, config.slow_threshold);
        sql_logger.log_mode(config.level);
        sql_logger
    }

    /// Replace the severity threshold.
    pub fn log_mode(&self, level: LogLevel) -> &Self {
        self.level.store(level);
        self
    }

    /// Replace the slow-query threshold. `Duration::ZERO` disables it.
    pub fn set_slow_threshold(&self, threshold: Duration) -> &Self {
        self.slow_threshold_nanos
            .store(duration_to_nanos(threshold), Ordering::Relaxed);
        self
    }

    pub fn level(&self) -> LogLevel {
        self.level.load()
    }

    pub fn slow_threshold(&self) -> Duration {
        Duration::from_nanos(self.slow_threshold_nanos.load(Ordering::Relaxed))
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        let _entered = self.span.enter();
        self.logger.info(args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        let _entered = self.span.enter();
        self.logger.warn(args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        let _entered = self.span.enter();
        self.logger.error(args);
    }

    /// Log one finished operation that started at `begin`.
    ///
    /// The caller location of this method is used as the line tag.
    #[track_caller]
    pub fn trace<F>(&self, begin: Instant, fc: F, err: Option<&dyn fmt::Display>)
    where
        F: FnOnce() -> (String, i64),
    {
        let level = self.level();
        if level <= LogLevel::Silent {
            return;
        }

        let caller = Location::caller();
        let elapsed = begin.elapsed();
        let slow_threshold = self.slow_threshold();
        let _entered = self.span.enter();

        match err {
            Some(err) if level >= LogLevel::Error => {
                let (sql, rows) = fc();
                self.logger.error(format_args!(
                    "{} {}\n[{:.3}ms] [rows:{}] {}",
                    caller,
                    err,
                    as_millis(elapsed),
                    Rows(rows),
                    sql
                ));
            }
            _ if elapsed > slow_threshold
                && !slow_threshold.is_zero()
                && level >= LogLevel::Warn =>
            {
                let (sql, rows) = fc();
                self.logger.warn(format_args!(
                    "{} SLOW SQL >= {:?}\n[{:.3}ms] [rows:{}] {}",
                    caller,
                    slow_threshold,
                    as_millis(elapsed),
                    Rows(rows),
                    sql
                ));
            }
            _ if level == LogLevel::Info => {
                let (sql, rows) = fc();
                self.logger.info(format_args!(
                    "{}\n[{:.3}ms] [rows:{}] {}",
                    caller,
                    as_millis(elapsed),
                    Rows(rows),
                    sql
                ));
            }
            _ => {}
        }
    }
}

impl Default for SqlLogger<TracingLogger> {
    fn default() -> Self {
        Self::from_config(TracingLogger, &LoggerConfig::default())
    }
}

impl<L: Logger> TraceHook for SqlLogger<L> {
    fn log_mode(&self, level: LogLevel) -> &dyn TraceHook {
        SqlLogger::log_mode(self, level);
        self
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        SqlLogger::info(self, args)
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        SqlLogger::warn(self, args)
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        SqlLogger::error(self, args)
    }

    #[track_caller]
    fn trace(
        &self,
        begin: Instant,
        fc: &dyn Fn() -> (String, i64),
        err: Option<&dyn fmt::Display>,
    ) {
        SqlLogger::trace(self, begin, fc, err)
    }
}

/// Row count as printed in trace lines; `-1` means unknown.
struct Rows(i64);

impl fmt::Display for Rows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == -1 {
            f.write_str("-")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

fn as_millis(elapsed: Duration) -> f64 {
    elapsed.as_nanos() as f64 / 1e6
}

fn duration_to_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

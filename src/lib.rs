//! # sea-orm-sql-logger
//!
//! Human-readable SQL trace logging for SeaORM database operations.
//!
//! Every statement run through a [`LoggedConnection`] is reported to a [`TraceHook`].
//! The default hook, [`SqlLogger`], turns each report into at most one log line:
//!
//! ```text
//! src/handlers/users.rs:42:10
//! [1.204ms] [rows:3] SELECT "users"."id" FROM "users"
//! ```
//!
//! ## Features
//!
//! - **Severity Cascade**: Failed statements log at ERROR, slow statements at WARN,
//!   everything else at INFO
//! - **Runtime Levels**: Change the level from any thread with `log_mode`
//! - **Lazy SQL Rendering**: SQL text is only built when a line is actually written
//! - **Pluggable Output**: Log through `tracing` or any type implementing [`Logger`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sea_orm::Database;
//! use sea_orm_sql_logger::LoggedConnection;
//!
//! let db = Database::connect("postgres://localhost/mydb").await?;
//! let logged_db = LoggedConnection::from(db);
//!
//! let users = Users::find().all(&logged_db).await?;
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! use sea_orm_sql_logger::{LogLevel, LoggedConnection, LoggerConfig};
//!
//! let config = LoggerConfig::default()
//!     .with_level(LogLevel::Warn)                      // errors and slow queries only
//!     .with_slow_threshold(Duration::from_millis(100)) // Duration::ZERO disables
//!     .with_parameter_logging(false);                  // inline bound values (default: false)
//!
//! let logged_db = LoggedConnection::new(db, config);
//! ```
//!
//! ## Limitations
//!
//! - Statements run on a `DatabaseTransaction` returned by `begin` or `transaction`
//!   are not logged; only the `BEGIN`, or the transaction as a whole, is reported.
//! - Records from a [`LoggedConnection`] are tagged with a line inside this crate,
//!   since the caller's location cannot cross SeaORM's async trait methods. Calling
//!   [`TraceHook::trace`] directly tags the line of that call.
//!
//! ## Levels
//!
//! | Level | Failed | Slow | Other |
//! |-------|--------|------|-------|
//! | `Silent` | - | - | - |
//! | `Error` | ERROR | - | - |
//! | `Warn` | ERROR | WARN | - |
//! | `Info` | ERROR | WARN | INFO |

mod config;
mod connection;
mod level;
mod logger;
mod parser;
mod sink;

pub use config::LoggerConfig;
pub use connection::{LoggedConnection, LoggingExt};
pub use level::{LogLevel, ParseLevelError};
pub use logger::{SqlLogger, TraceHook};
pub use sink::{Logger, TracingLogger};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{LogLevel, LoggedConnection, LoggerConfig, LoggingExt, SqlLogger, TraceHook};
}

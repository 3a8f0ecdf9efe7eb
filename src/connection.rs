//! Database connection wrapper that reports every operation to a [`TraceHook`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr,
    ExecResult, IsolationLevel, QueryResult, Statement, StreamTrait, TransactionError,
    TransactionTrait,
};
use tracing::{field, Instrument, Span};

use crate::config::LoggerConfig;
use crate::logger::{SqlLogger, TraceHook};
use crate::parser::ParsedSql;
use crate::sink::TracingLogger;

/// Row count reported when the operation has no meaningful one.
const UNKNOWN_ROWS: i64 = -1;

/// A logging wrapper around SeaORM's `DatabaseConnection`.
///
/// Implements `ConnectionTrait`, `StreamTrait` and `TransactionTrait`, so it can be
/// used anywhere a `DatabaseConnection` is. After each operation the configured
/// [`TraceHook`] receives the start time, a lazy producer of the SQL text and row
/// count, and the error if the operation failed.
///
/// Statements run inside a `db.query` span named after the parsed SQL
/// (e.g. `SELECT users`), so log lines nest under the caller's spans.
///
/// Only the `BEGIN` of a transaction is reported here; statements issued on the
/// returned `DatabaseTransaction` bypass the hook.
///
/// The line tag of each record points at the operation inside this module, not at
/// the application code that issued the query: SeaORM's async trait methods cannot
/// forward the caller's location. Use the enclosing spans to find the call site.
///
/// # Example
///
/// ```rust,ignore
/// use sea_orm::Database;
/// use sea_orm_sql_logger::{LoggedConnection, LoggerConfig};
///
/// let db = Database::connect("postgres://localhost/mydb").await?;
/// let logged = LoggedConnection::new(db, LoggerConfig::production());
///
/// let users = Users::find().all(&logged).await?;
/// ```
#[derive(Debug)]
pub struct LoggedConnection {
    inner: DatabaseConnection,
    hook: Arc<dyn TraceHook>,
    config: Arc<LoggerConfig>,
}

impl LoggedConnection {
    /// Wrap a connection, logging through `tracing`.
    pub fn new(connection: DatabaseConnection, config: LoggerConfig) -> Self {
        let hook = Arc::new(SqlLogger::from_config(TracingLogger, &config));
        Self::with_hook(connection, hook, config)
    }

    /// Wrap a connection with the default configuration.
    pub fn wrap(connection: DatabaseConnection) -> Self {
        Self::new(connection, LoggerConfig::default())
    }

    /// Wrap a connection, reporting to a custom hook.
    ///
    /// Only `log_parameters` and `database_name` are read from `config`; level and
    /// slow threshold belong to the hook.
    pub fn with_hook(
        connection: DatabaseConnection,
        hook: Arc<dyn TraceHook>,
        config: LoggerConfig,
    ) -> Self {
        Self {
            inner: connection,
            hook,
            config: Arc::new(config),
        }
    }

    pub fn inner(&self) -> &DatabaseConnection {
        &self.inner
    }

    /// The hook receiving trace events. Use it to change the level at runtime.
    pub fn hook(&self) -> &Arc<dyn TraceHook> {
        &self.hook
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn into_inner(self) -> DatabaseConnection {
        self.inner
    }

    fn db_system(&self) -> &'static str {
        match self.inner.get_database_backend() {
            DbBackend::Postgres => "postgresql",
            DbBackend::MySql => "mysql",
            DbBackend::Sqlite => "sqlite",
        }
    }

    fn query_span(&self, stmt: &Statement) -> Span {
        let parsed = ParsedSql::parse(&stmt.sql);

        let span = tracing::info_span!(
            "db.query",
            otel.name = %parsed.span_name(),
            db.system = %self.db_system(),
            db.operation = %parsed.operation,
            db.sql.table = field::Empty,
            db.name = field::Empty,
            otel.status_code = field::Empty,
        );

        if let Some(table) = &parsed.table {
            span.record("db.sql.table", table.as_str());
        }
        if let Some(db_name) = &self.config.database_name {
            span.record("db.name", db_name.as_str());
        }

        span
    }

    fn transaction_span(&self, operation: &'static str) -> Span {
        let span = tracing::info_span!(
            "db.transaction",
            otel.name = operation,
            db.system = %self.db_system(),
            db.operation = operation,
            db.name = field::Empty,
            otel.status_code = field::Empty,
        );

        if let Some(db_name) = &self.config.database_name {
            span.record("db.name", db_name.as_str());
        }

        span
    }

    /// SQL as it should appear in the log line.
    fn render(&self, stmt: &Statement) -> String {
        if self.config.log_parameters {
            stmt.to_string()
        } else {
            stmt.sql.clone()
        }
    }

    /// Hand a finished operation to the hook inside its span.
    #[track_caller]
    fn report<T, E: fmt::Display>(
        &self,
        span: &Span,
        begin: Instant,
        result: &Result<T, E>,
        sql: impl Fn() -> String,
        rows: impl FnOnce(&T) -> i64,
    ) {
        let _entered = span.enter();

        let status = if result.is_ok() { "OK" } else { "ERROR" };
        span.record("otel.status_code", status);

        let rows = result.as_ref().map(rows).unwrap_or(UNKNOWN_ROWS);
        let err = result.as_ref().err().map(|e| e as &dyn fmt::Display);

        self.hook.trace(begin, &|| (sql(), rows), err);
    }

    async fn begin_logged<F>(
        &self,
        operation: &'static str,
        begin_tx: F,
    ) -> Result<DatabaseTransaction, DbErr>
    where
        F: Future<Output = Result<DatabaseTransaction, DbErr>> + Send,
    {
        let span = self.transaction_span(operation);
        let begin = Instant::now();

        let result = begin_tx.instrument(span.clone()).await;
        self.report(&span, begin, &result, || operation.to_string(), |_| UNKNOWN_ROWS);

        result
    }
}

fn row_count(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

impl From<DatabaseConnection> for LoggedConnection {
    fn from(connection: DatabaseConnection) -> Self {
        Self::wrap(connection)
    }
}

impl AsRef<DatabaseConnection> for LoggedConnection {
    fn as_ref(&self) -> &DatabaseConnection {
        &self.inner
    }
}

#[async_trait]
impl ConnectionTrait for LoggedConnection {
    fn get_database_backend(&self) -> DbBackend {
        self.inner.get_database_backend()
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr> {
        let span = self.query_span(&stmt);
        let begin = Instant::now();

        let result = self
            .inner
            .execute(stmt.clone())
            .instrument(span.clone())
            .await;

        self.report(&span, begin, &result, || self.render(&stmt), |r| {
            row_count(r.rows_affected())
        });

        result
    }

    async fn execute_unprepared(&self, sql: &str) -> Result<ExecResult, DbErr> {
        let stmt = Statement::from_string(self.get_database_backend(), sql);
        let span = self.query_span(&stmt);
        let begin = Instant::now();

        let result = self
            .inner
            .execute_unprepared(sql)
            .instrument(span.clone())
            .await;

        self.report(&span, begin, &result, || sql.to_string(), |r| {
            row_count(r.rows_affected())
        });

        result
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr> {
        let span = self.query_span(&stmt);
        let begin = Instant::now();

        let result = self
            .inner
            .query_one(stmt.clone())
            .instrument(span.clone())
            .await;

        self.report(&span, begin, &result, || self.render(&stmt), |row| {
            i64::from(row.is_some())
        });

        result
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        let span = self.query_span(&stmt);
        let begin = Instant::now();

        let result = self
            .inner
            .query_all(stmt.clone())
            .instrument(span.clone())
            .await;

        self.report(&span, begin, &result, || self.render(&stmt), |rows| {
            row_count(rows.len() as u64)
        });

        result
    }

    fn support_returning(&self) -> bool {
        self.inner.support_returning()
    }

    fn is_mock_connection(&self) -> bool {
        self.inner.is_mock_connection()
    }
}

impl StreamTrait for LoggedConnection {
    type Stream<'a> = <DatabaseConnection as StreamTrait>::Stream<'a>;

    fn stream<'a>(
        &'a self,
        stmt: Statement,
    ) -> Pin<Box<dyn Future<Output = Result<Self::Stream<'a>, DbErr>> + 'a + Send>> {
        let span = self.query_span(&stmt);
        let begin = Instant::now();

        Box::pin(async move {
            let result = self
                .inner
                .stream(stmt.clone())
                .instrument(span.clone())
                .await;

            // Rows are consumed later by the caller, so the count is unknown here.
            self.report(&span, begin, &result, || self.render(&stmt), |_| UNKNOWN_ROWS);

            result
        })
    }
}

#[async_trait]
impl TransactionTrait for LoggedConnection {
    async fn begin(&self) -> Result<DatabaseTransaction, DbErr> {
        self.begin_logged("BEGIN", self.inner.begin()).await
    }

    async fn begin_with_config(
        &self,
        isolation_level: Option<IsolationLevel>,
        access_mode: Option<AccessMode>,
    ) -> Result<DatabaseTransaction, DbErr> {
        self.begin_logged(
            "BEGIN",
            self.inner.begin_with_config(isolation_level, access_mode),
        )
        .await
    }

    async fn transaction<F, T, E>(&self, callback: F) -> Result<T, TransactionError<E>>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>
            + Send,
        T: Send,
        E: std::fmt::Display + std::fmt::Debug + Send,
    {
        let span = self.transaction_span("TRANSACTION");
        let begin = Instant::now();

        let result = self
            .inner
            .transaction(callback)
            .instrument(span.clone())
            .await;

        let outcome = result.as_ref().map(|_| ()).map_err(|e| format!("{e:?}"));
        self.report(&span, begin, &outcome, || "TRANSACTION".to_string(), |_| {
            UNKNOWN_ROWS
        });

        result
    }

    async fn transaction_with_config<F, T, E>(
        &self,
        callback: F,
        isolation_level: Option<IsolationLevel>,
        access_mode: Option<AccessMode>,
    ) -> Result<T, TransactionError<E>>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>
            + Send,
        T: Send,
        E: std::fmt::Display + std::fmt::Debug + Send,
    {
        let span = self.transaction_span("TRANSACTION");
        let begin = Instant::now();

        let result = self
            .inner
            .transaction_with_config(callback, isolation_level, access_mode)
            .instrument(span.clone())
            .await;

        let outcome = result.as_ref().map(|_| ()).map_err(|e| format!("{e:?}"));
        self.report(&span, begin, &outcome, || "TRANSACTION".to_string(), |_| {
            UNKNOWN_ROWS
        });

        result
    }
}

/// Extension trait for wrapping database connections.
pub trait LoggingExt {
    /// Wrap this connection with the default logger.
    fn with_sql_logger(self) -> LoggedConnection;

    /// Wrap this connection with a custom configuration.
    fn with_sql_logger_config(self, config: LoggerConfig) -> LoggedConnection;
}

impl LoggingExt for DatabaseConnection {
    fn with_sql_logger(self) -> LoggedConnection {
        LoggedConnection::wrap(self)
    }

    fn with_sql_logger_config(self, config: LoggerConfig) -> LoggedConnection {
        LoggedConnection::new(self, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LogLevel;
    use crate::logger::tests::Recorder;
    use sea_orm::{MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn logged(db: DatabaseConnection, config: LoggerConfig) -> (LoggedConnection, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let hook = Arc::new(SqlLogger::new(Span::none(), recorder.clone(), Duration::ZERO));
        (LoggedConnection::with_hook(db, hook, config), recorder)
    }

    fn user_row(id: i32) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("id", Value::Int(Some(id)))])
    }

    #[tokio::test]
    async fn test_execute_reports_rows_affected() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            }])
            .into_connection();
        let (conn, recorder) = logged(db, LoggerConfig::default());

        let stmt = Statement::from_string(DbBackend::Postgres, "UPDATE users SET active = true");
        let result = conn.execute(stmt).await.unwrap();
        assert_eq!(result.rows_affected(), 3);

        let records = recorder.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, LogLevel::Info);
        assert!(records[0].1.contains("[rows:3] UPDATE users SET active = true"));
    }

    #[tokio::test]
    async fn test_failed_execute_reports_error() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_errors([DbErr::Custom("disk full".to_owned())])
            .into_connection();
        let (conn, recorder) = logged(db, LoggerConfig::default());

        let stmt = Statement::from_string(DbBackend::Postgres, "DELETE FROM users");
        assert!(conn.execute(stmt).await.is_err());

        let records = recorder.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, LogLevel::Error);
        assert!(records[0].1.contains("disk full"));
        assert!(records[0].1.contains("[rows:-] DELETE FROM users"));
    }

    #[tokio::test]
    async fn test_query_all_counts_rows() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![user_row(1), user_row(2)]])
            .into_connection();
        let (conn, recorder) = logged(db, LoggerConfig::default());

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT id FROM users WHERE id > $1",
            [Value::Int(Some(0))],
        );
        let rows = conn.query_all(stmt).await.unwrap();
        assert_eq!(rows.len(), 2);

        let message = &recorder.records()[0].1;
        assert!(message.contains("[rows:2]"));
        assert!(message.contains("id > $1"));
    }

    #[tokio::test]
    async fn test_parameter_logging_inlines_values() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![user_row(7)]])
            .into_connection();
        let (conn, recorder) = logged(db, LoggerConfig::default().with_parameter_logging(true));

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT id FROM users WHERE id = $1",
            [Value::Int(Some(7))],
        );
        let row = conn.query_one(stmt).await.unwrap();
        assert!(row.is_some());

        let message = &recorder.records()[0].1;
        assert!(message.contains("[rows:1]"));
        assert!(message.contains("WHERE id = 7"));
        assert!(!message.contains("$1"));
    }

    #[tokio::test]
    async fn test_silent_hook_logs_nothing() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let (conn, recorder) = logged(db, LoggerConfig::default());
        conn.hook().log_mode(LogLevel::Silent);

        conn.execute_unprepared("TRUNCATE sessions").await.unwrap();

        assert!(recorder.records().is_empty());
    }

    #[tokio::test]
    async fn test_begin_reports_unknown_rows() {
        let db = MockDatabase::new(DbBackend::Postgres).into_connection();
        let (conn, recorder) = logged(db, LoggerConfig::default());

        let txn = conn.begin().await.unwrap();
        txn.commit().await.unwrap();

        let records = recorder.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].1.contains("[rows:-] BEGIN"));
    }

    #[tokio::test]
    async fn test_records_are_tagged_with_the_reporting_operation() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let (conn, recorder) = logged(db, LoggerConfig::default());

        conn.execute_unprepared("DELETE FROM sessions").await.unwrap();

        let message = &recorder.records()[0].1;
        let tag = message.lines().next().unwrap();
        assert!(tag.starts_with(&format!("{}:", file!())), "{tag}");
        assert!(!tag.contains("logger.rs"), "{tag}");
    }

    #[test]
    fn test_extension_trait_uses_config() {
        let db = MockDatabase::new(DbBackend::Sqlite).into_connection();
        let conn = db.with_sql_logger_config(LoggerConfig::development().with_database_name("app"));

        assert!(conn.config().log_parameters);
        assert_eq!(conn.config().database_name.as_deref(), Some("app"));
        assert!(conn.is_mock_connection());
        assert_eq!(conn.db_system(), "sqlite");
    }
}

//! Logs a few mock statements at different levels.
//!
//! Run with: cargo run --example basic

use std::time::Duration;

use sea_orm::{ConnectionTrait, DbBackend, MockDatabase, MockExecResult, Statement};
use sea_orm_sql_logger::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = MockDatabase::new(DbBackend::Postgres)
        .append_exec_results([
            MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 12,
            },
        ])
        .into_connection();

    let logged_db = db.with_sql_logger_config(
        LoggerConfig::development().with_slow_threshold(Duration::from_millis(50)),
    );

    // Logged at INFO with the inlined parameter.
    logged_db
        .execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "INSERT INTO users (name) VALUES ($1)",
            ["ada".into()],
        ))
        .await?;

    // Only errors and slow statements from here on.
    logged_db.hook().log_mode(LogLevel::Warn);
    logged_db
        .execute_unprepared("UPDATE users SET active = true")
        .await?;

    tracing::info!("done");

    Ok(())
}

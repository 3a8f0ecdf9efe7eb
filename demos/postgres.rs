//! Wraps a real PostgreSQL connection.
//!
//! Run with: DATABASE_URL=postgres://localhost/test cargo run --example postgres

use sea_orm::{ConnectionTrait, Database};
use sea_orm_sql_logger::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sea_orm_sql_logger=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/test".into());
    let level: LogLevel = std::env::var("SQL_LOG_LEVEL")
        .unwrap_or_else(|_| "info".into())
        .parse()?;

    tracing::info!("Connecting to database...");

    let db = Database::connect(&database_url).await?;
    let logged_db = LoggedConnection::new(
        db,
        LoggerConfig::default()
            .with_level(level)
            .with_database_name("test"),
    );

    logged_db.execute_unprepared("SELECT pg_sleep(0.3)").await?;

    // A failing statement is logged at ERROR and the error is returned unchanged.
    if let Err(err) = logged_db.execute_unprepared("SELECT * FROM missing_table").await {
        tracing::info!(error = %err, "query failed as expected");
    }

    Ok(())
}

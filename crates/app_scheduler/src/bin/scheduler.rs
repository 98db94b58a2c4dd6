//! Recurring invoice scheduler binary
//!
//! Processes and sends recurring invoices that are due. Intended to run from
//! cron (or any external trigger); the `--date` flag simulates a different
//! processing instant for testing and backfill.
//!
//! # Usage
//!
//! ```bash
//! # Process everything due now
//! cargo run --bin scheduler
//!
//! # Simulate a specific processing date
//! cargo run --bin scheduler -- --date 2025-03-01
//! ```
//!
//! # Environment Variables
//!
//! * `SCHEDULER_DATABASE_URL` (or `DATABASE_URL`) - PostgreSQL connection string
//! * `SCHEDULER_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app_scheduler::{LoggingDeliveryQueue, RecurrenceProcessor, SchedulerConfig};
use infra_db::{create_pool, DatabaseConfig, Lookups, PgInvoiceStore, PgTimezoneDirectory};

#[derive(Parser)]
#[command(name = "scheduler")]
#[command(about = "Process and send recurring invoices that are due")]
struct Cli {
    /// The date to simulate processing for (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config();
    init_tracing(&config.log_level);

    let as_of = match cli.date {
        Some(date) => Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)),
        None => Utc::now(),
    };

    tracing::info!(%as_of, "processing recurring invoices");

    let pool = create_pool(DatabaseConfig::new(config.database_url.clone())).await?;
    infra_db::MIGRATOR.run(&pool).await?;

    let lookups = Lookups::load(&pool).await?;
    let store = PgInvoiceStore::new(pool.clone(), lookups);
    let timezones = PgTimezoneDirectory::new(pool);
    let processor = RecurrenceProcessor::new(store, timezones, LoggingDeliveryQueue::new());

    let report = processor.run(as_of).await?;

    for failure in &report.failures {
        eprintln!(
            "Failed to process invoice {}: {}",
            failure.invoice_id, failure.message
        );
    }
    println!("Processed {} recurring invoice(s).", report.processed);

    Ok(())
}

/// Loads scheduler configuration from environment variables.
///
/// Falls back to default values if environment variables are not set.
fn load_config() -> SchedulerConfig {
    SchedulerConfig::from_env().unwrap_or_else(|_| SchedulerConfig {
        database_url: std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("SCHEDULER_DATABASE_URL"))
            .unwrap_or_else(|_| "postgres://localhost/invoicing".to_string()),
        log_level: std::env::var("SCHEDULER_LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string()),
    })
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

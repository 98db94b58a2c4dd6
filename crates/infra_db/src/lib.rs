//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL adapters for the invoicing core's
//! ports, implemented with SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: the domain defines port traits
//! (`InvoiceStore`, `TimezoneDirectory`) and this crate implements them,
//! hiding the database details from the domain layer. Lookup tables (invoice
//! statuses, recurring frequencies) are loaded once into a read-through
//! [`Lookups`] service rather than queried ad hoc.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, Lookups, PgInvoiceStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/invoicing")).await?;
//! let lookups = Lookups::load(&pool).await?;
//! let store = PgInvoiceStore::new(pool, lookups);
//! ```

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use repositories::invoices::PgInvoiceStore;
pub use repositories::lookups::Lookups;
pub use repositories::settings::PgTimezoneDirectory;

/// Embedded migrations, run by the scheduler binary at startup
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

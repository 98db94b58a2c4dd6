//! Invoicing Domain - Recurring Invoice Scheduling
//!
//! This crate implements the invoice entity and the recurring-invoice
//! scheduling core: deciding when a recurring invoice is due, generating its
//! successor, and advancing the recurring chain.
//!
//! # Recurrence lifecycle
//!
//! A recurring invoice carries a `next_occurrence_at` instant. When that
//! instant passes, the invoice is *advanced*: a successor is built by
//! replicating the parent's business fields onto new schedule-dependent
//! fields, and the parent is marked completed. Exactly one invoice per chain
//! is ever in flight; `completed_at` gates re-processing.
//!
//! All date arithmetic happens in the owning user's timezone and is stored
//! in UTC. The timezone is always an explicit argument, never ambient state.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_invoicing::{advance, AdvanceContext};
//!
//! let ctx = AdvanceContext::new(timezone, Utc::now(), sequence);
//! let advancement = advance(&parent, &ctx)?;
//! store.persist_advancement(parent.id, &advancement).await?;
//! ```

pub mod error;
pub mod invoice;
pub mod ports;
pub mod recurrence;
pub mod replicate;
pub mod schedule;
pub mod status;

pub use error::RecurrenceError;
pub use invoice::{generate_invoice_number, Invoice, LineItem, RecurrenceState, UnitType};
pub use ports::{DeliveryQueue, InvoiceStore, TimezoneDirectory};
pub use recurrence::{advance, AdvanceContext, Advancement};
pub use replicate::{replicate, ReplicationOverrides};
pub use schedule::next_occurrence;
pub use status::{Frequency, InvoiceStatus};

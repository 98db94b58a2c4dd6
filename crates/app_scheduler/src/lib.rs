//! Recurring Invoice Scheduler
//!
//! The application layer that drives the recurring-invoice core: finds the
//! invoices due as of an instant, advances each through the recurrence state
//! machine, and hands the parent off to email delivery, with per-invoice
//! failure isolation so one bad invoice never blocks the batch.
//!
//! Wiring lives in the `scheduler` binary; the processor itself is generic
//! over the domain ports and runs identically against PostgreSQL or the
//! in-memory test adapters.

pub mod config;
pub mod delivery;
pub mod error;
pub mod processor;

pub use config::SchedulerConfig;
pub use delivery::LoggingDeliveryQueue;
pub use error::SchedulerError;
pub use processor::{ProcessingFailure, ProcessingReport, RecurrenceProcessor};

//! Scheduler errors

use core_kernel::PortError;
use domain_invoicing::RecurrenceError;
use thiserror::Error;

/// Errors surfaced by the scheduler application layer
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The recurrence state machine rejected the invoice
    #[error("Recurrence error: {0}")]
    Recurrence(#[from] RecurrenceError),

    /// A collaborator port failed
    #[error(transparent)]
    Port(#[from] PortError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Configuration(String),
}

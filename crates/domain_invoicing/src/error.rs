//! Invoicing domain errors

use core_kernel::InvoiceId;
use thiserror::Error;

/// Errors raised by the recurrence state machine
///
/// These are precondition violations: the invoice is not in a state the
/// machine can advance from. Recoverable schedule problems (an unknown
/// frequency) never surface here; they fall back to the monthly default.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecurrenceError {
    /// The invoice is not part of a recurring chain
    #[error("Invoice {0} is not recurring")]
    NotRecurring(InvoiceId),

    /// The invoice already produced its successor
    #[error("Invoice {0} has already been advanced")]
    AlreadyCompleted(InvoiceId),

    /// The invoice has no anchor to compute the next occurrence from
    #[error("Invoice {0} has no next occurrence set")]
    MissingAnchor(InvoiceId),
}

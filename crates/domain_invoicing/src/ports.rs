//! Ports consumed by the scheduling core
//!
//! The invoice store, the user timezone directory, and the delivery queue
//! are collaborators the core depends on but does not own. Adapters live in
//! the infrastructure layer (PostgreSQL, the mail service) and in test_utils
//! (in-memory doubles).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use core_kernel::{DomainPort, InvoiceId, PortError, Timezone, UserId};

use crate::invoice::Invoice;
use crate::recurrence::Advancement;

/// Persistence port for invoices
#[async_trait]
pub trait InvoiceStore: DomainPort {
    /// Reads an invoice by id
    async fn find(&self, id: InvoiceId) -> Result<Invoice, PortError>;

    /// Returns the invoices eligible for advancement as of `as_of`
    ///
    /// The eligibility predicate is: recurring, `next_occurrence_at` set and
    /// not after `as_of`, not yet completed, and status `pending`.
    async fn due_candidates(&self, as_of: DateTime<Utc>) -> Result<Vec<Invoice>, PortError>;

    /// Counts a recipient's invoices issued on or after `since`
    ///
    /// Feeds the sequence component of generated invoice numbers.
    async fn count_for_recipient_since(
        &self,
        recipient_email: &str,
        since: NaiveDate,
    ) -> Result<u32, PortError>;

    /// Persists an advancement atomically
    ///
    /// Inserts the child and stamps the parent's `completed_at` in a single
    /// transaction, re-checking the parent's eligibility under a row lock.
    /// Returns `PortError::Conflict` if the parent was advanced concurrently.
    async fn persist_advancement(
        &self,
        parent_id: InvoiceId,
        advancement: &Advancement,
    ) -> Result<(), PortError>;
}

/// Resolves the timezone an invoice owner does business in
#[async_trait]
pub trait TimezoneDirectory: DomainPort {
    /// Returns the user's IANA timezone, or UTC when unset
    async fn timezone_for(&self, user_id: UserId) -> Result<Timezone, PortError>;
}

/// Asynchronous hand-off to email delivery
///
/// Enqueue is fire-and-forget: the delivery collaborator owns the eventual
/// `pending` → `sent` transition and the `last_sent_at` stamp. The scheduler
/// never sets those itself.
#[async_trait]
pub trait DeliveryQueue: DomainPort {
    /// Enqueues delivery of the given invoice
    async fn enqueue(&self, invoice_id: InvoiceId) -> Result<(), PortError>;
}

//! Invoice Replication
//!
//! Builds a successor invoice from a parent, copying every business field and
//! overriding the schedule-dependent ones. This is a pure builder: nothing is
//! persisted here, so the caller can stage the child inside whatever
//! transaction also marks the parent completed.

use chrono::{DateTime, NaiveDate, Utc};

use core_kernel::InvoiceId;

use crate::invoice::Invoice;
use crate::status::InvoiceStatus;

/// The schedule-dependent fields a replica does not inherit
#[derive(Debug, Clone)]
pub struct ReplicationOverrides {
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub next_occurrence_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Builds a new invoice from `parent`
///
/// Copies recipient, amounts, description, line items, and recurrence
/// settings. Identity, audit timestamps, delivery/payment tracking, and the
/// recurrence progress fields are NOT copied: the child gets a fresh id,
/// starts unsent and uncompleted, and links back to the parent.
pub fn replicate(parent: &Invoice, overrides: ReplicationOverrides) -> Invoice {
    Invoice {
        id: InvoiceId::new_v7(),
        user_id: parent.user_id,
        contact_id: parent.contact_id,
        invoice_number: overrides.invoice_number,
        recipient_name: parent.recipient_name.clone(),
        recipient_email: parent.recipient_email.clone(),
        recipient_address: parent.recipient_address.clone(),
        amount: parent.amount,
        gst: parent.gst,
        description: parent.description.clone(),
        line_items: parent.line_items.clone(),
        status: overrides.status,
        issue_date: Some(overrides.issue_date),
        due_date: Some(overrides.due_date),
        is_recurring: parent.is_recurring,
        frequency: parent.frequency,
        next_occurrence_at: overrides.next_occurrence_at,
        completed_at: None,
        parent_invoice_id: Some(parent.id),
        last_sent_at: None,
        paid_at: None,
        created_at: overrides.created_at,
        updated_at: overrides.created_at,
    }
}

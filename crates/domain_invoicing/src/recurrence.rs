//! Recurrence State Machine
//!
//! Governs the lifecycle transition from an in-flight recurring invoice to a
//! (parent, successor) pair. The transition itself is pure: it takes the
//! owner's timezone and the current instant explicitly and returns the child
//! plus the parent's completion timestamp. The store persists both inside a
//! single transaction so the at-most-one-in-flight invariant holds even
//! across overlapping batch runs.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use core_kernel::Timezone;

use crate::error::RecurrenceError;
use crate::invoice::{generate_invoice_number, Invoice};
use crate::replicate::{replicate, ReplicationOverrides};
use crate::schedule::next_occurrence;
use crate::status::InvoiceStatus;

/// Inputs for a single advance transition
#[derive(Debug, Clone)]
pub struct AdvanceContext {
    /// The owning user's timezone, resolved by the caller
    pub timezone: Timezone,
    /// The current instant; becomes the parent's `completed_at`
    pub now: DateTime<Utc>,
    /// The recipient's invoice count for the current year, plus one
    pub sequence_in_year: u32,
}

impl AdvanceContext {
    pub fn new(timezone: Timezone, now: DateTime<Utc>, sequence_in_year: u32) -> Self {
        Self {
            timezone,
            now,
            sequence_in_year,
        }
    }
}

/// Outcome of an advance transition
///
/// Both halves must be persisted atomically: the child insert and the
/// parent's `completed_at` update succeed or roll back together.
#[derive(Debug, Clone)]
pub struct Advancement {
    /// The successor invoice, not yet persisted
    pub child: Invoice,
    /// The instant to stamp on the parent's `completed_at`
    pub completed_at: DateTime<Utc>,
}

/// Advances a recurring invoice, producing its successor
///
/// The child's issue date is the parent's `next_occurrence_at` seen in the
/// owner's timezone (the date the successor goes out); its due date
/// preserves the parent's payment terms; its own `next_occurrence_at` is one
/// frequency interval later. The child starts `Pending`, recurring, and
/// linked to the parent. The parent keeps its status and its historical
/// `next_occurrence_at`: only `completed_at` changes, and only once the
/// caller commits.
///
/// # Errors
///
/// Returns `RecurrenceError` when the invoice is not recurring, was already
/// advanced, or has no anchor. A missing frequency is not an error: the
/// chain falls back to a monthly advance.
pub fn advance(parent: &Invoice, ctx: &AdvanceContext) -> Result<Advancement, RecurrenceError> {
    if !parent.is_recurring {
        return Err(RecurrenceError::NotRecurring(parent.id));
    }
    if parent.completed_at.is_some() {
        return Err(RecurrenceError::AlreadyCompleted(parent.id));
    }
    let anchor = parent
        .next_occurrence_at
        .ok_or(RecurrenceError::MissingAnchor(parent.id))?;

    if parent.frequency.is_none() {
        warn!(invoice_id = %parent.id, "recurring invoice has no frequency, defaulting to monthly");
    }

    let issue_date = ctx.timezone.local_date(anchor);
    let due_date = issue_date + Duration::days(parent.payment_terms_days());
    let child_next = next_occurrence(anchor, ctx.timezone, parent.frequency);

    let child = replicate(
        parent,
        ReplicationOverrides {
            invoice_number: generate_invoice_number(
                ctx.timezone.local_date(ctx.now),
                ctx.sequence_in_year,
            ),
            issue_date,
            due_date,
            status: InvoiceStatus::Pending,
            next_occurrence_at: Some(child_next),
            created_at: ctx.now,
        },
    );

    Ok(Advancement {
        child,
        completed_at: ctx.now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use core_kernel::{Currency, Money, UserId};

    use crate::status::Frequency;

    fn recurring_parent(next_at: DateTime<Utc>) -> Invoice {
        let created = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        let mut invoice = Invoice::new(
            UserId::new(),
            "Acme Ltd",
            "billing@acme.test",
            Money::from_minor(100_000, Currency::NZD),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            created,
        );
        invoice.status = InvoiceStatus::Pending;
        invoice.is_recurring = true;
        invoice.frequency = Some(Frequency::Monthly);
        invoice.next_occurrence_at = Some(next_at);
        invoice
    }

    fn ctx() -> AdvanceContext {
        AdvanceContext::new(
            Timezone::default(),
            Utc.with_ymd_and_hms(2025, 2, 10, 6, 0, 0).unwrap(),
            1,
        )
    }

    #[test]
    fn test_advance_builds_linked_pending_child() {
        let next_at = Utc.with_ymd_and_hms(2025, 2, 10, 0, 0, 0).unwrap();
        let parent = recurring_parent(next_at);
        let advancement = advance(&parent, &ctx()).unwrap();

        let child = &advancement.child;
        assert_eq!(child.parent_invoice_id, Some(parent.id));
        assert_eq!(child.status, InvoiceStatus::Pending);
        assert!(child.is_recurring);
        assert!(child.completed_at.is_none());
    }

    #[test]
    fn test_advance_preserves_payment_terms() {
        let next_at = Utc.with_ymd_and_hms(2025, 2, 10, 0, 0, 0).unwrap();
        let parent = recurring_parent(next_at);
        let advancement = advance(&parent, &ctx()).unwrap();

        let child = advancement.child;
        let child_terms = (child.due_date.unwrap() - child.issue_date.unwrap()).num_days();
        assert_eq!(child_terms, parent.payment_terms_days());
    }

    #[test]
    fn test_advance_schedules_next_interval() {
        let next_at = Utc.with_ymd_and_hms(2025, 2, 10, 0, 0, 0).unwrap();
        let parent = recurring_parent(next_at);
        let advancement = advance(&parent, &ctx()).unwrap();

        assert_eq!(
            advancement.child.next_occurrence_at,
            Some(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap())
        );
        assert_eq!(advancement.completed_at, ctx().now);
    }

    #[test]
    fn test_advance_issue_date_in_owner_timezone() {
        // Due instant 2025-02-09T12:00Z is already Feb 10 in Auckland
        let next_at = Utc.with_ymd_and_hms(2025, 2, 9, 12, 0, 0).unwrap();
        let parent = recurring_parent(next_at);
        let ctx = AdvanceContext::new(
            Timezone::parse("Pacific/Auckland").unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 9, 13, 0, 0).unwrap(),
            1,
        );
        let advancement = advance(&parent, &ctx).unwrap();
        assert_eq!(
            advancement.child.issue_date,
            Some(NaiveDate::from_ymd_opt(2025, 2, 10).unwrap())
        );
    }

    #[test]
    fn test_advance_missing_frequency_defaults_monthly() {
        let next_at = Utc.with_ymd_and_hms(2025, 2, 10, 0, 0, 0).unwrap();
        let mut parent = recurring_parent(next_at);
        parent.frequency = None;
        let advancement = advance(&parent, &ctx()).unwrap();
        assert_eq!(
            advancement.child.next_occurrence_at,
            Some(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_advance_rejects_non_recurring() {
        let next_at = Utc.with_ymd_and_hms(2025, 2, 10, 0, 0, 0).unwrap();
        let mut parent = recurring_parent(next_at);
        parent.is_recurring = false;
        assert_eq!(
            advance(&parent, &ctx()).unwrap_err(),
            RecurrenceError::NotRecurring(parent.id)
        );
    }

    #[test]
    fn test_advance_rejects_completed() {
        let next_at = Utc.with_ymd_and_hms(2025, 2, 10, 0, 0, 0).unwrap();
        let mut parent = recurring_parent(next_at);
        parent.completed_at = Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(
            advance(&parent, &ctx()).unwrap_err(),
            RecurrenceError::AlreadyCompleted(parent.id)
        );
    }

    #[test]
    fn test_advance_rejects_missing_anchor() {
        let next_at = Utc.with_ymd_and_hms(2025, 2, 10, 0, 0, 0).unwrap();
        let mut parent = recurring_parent(next_at);
        parent.next_occurrence_at = None;
        assert_eq!(
            advance(&parent, &ctx()).unwrap_err(),
            RecurrenceError::MissingAnchor(parent.id)
        );
    }
}

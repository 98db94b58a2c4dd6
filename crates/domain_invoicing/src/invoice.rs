//! The invoice entity
//!
//! This module defines the central `Invoice` record, its line items, and the
//! recurrence-state classification the scheduler operates on.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ContactId, Currency, InvoiceId, Money, UserId};

use crate::status::{Frequency, InvoiceStatus};

/// Default payment terms for manually created invoices, in days
pub const DEFAULT_PAYMENT_TERMS_DAYS: i64 = 30;

/// An invoice
///
/// Created either manually (starting as `Draft`) or by the recurrence state
/// machine as a successor in a recurring chain (starting as `Pending`).
/// The scheduler never deletes invoices; it only creates successors and
/// flips the recurrence tracking fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Owning user
    pub user_id: UserId,
    /// Optional link to the contact book
    pub contact_id: Option<ContactId>,
    /// Human-readable invoice number
    pub invoice_number: String,
    /// Recipient display name
    pub recipient_name: String,
    /// Recipient email (also the recipient key for number sequencing)
    pub recipient_email: String,
    /// Recipient postal address
    pub recipient_address: Option<String>,
    /// Invoice total, excluding GST
    pub amount: Money,
    /// GST amount, if charged
    pub gst: Option<Money>,
    /// Free-text description
    pub description: Option<String>,
    /// Line items
    pub line_items: Vec<LineItem>,
    /// Status
    pub status: InvoiceStatus,
    /// Issue date (calendar date in the owner's timezone)
    pub issue_date: Option<NaiveDate>,
    /// Due date
    pub due_date: Option<NaiveDate>,
    /// Whether this invoice repeats
    pub is_recurring: bool,
    /// Calendar-add rule; only meaningful when `is_recurring`
    pub frequency: Option<Frequency>,
    /// When this invoice is next due to be advanced (UTC)
    pub next_occurrence_at: Option<DateTime<Utc>>,
    /// Set once this invoice's recurrence step has produced a successor
    pub completed_at: Option<DateTime<Utc>>,
    /// Chain linkage to the invoice this one was replicated from
    pub parent_invoice_id: Option<InvoiceId>,
    /// When delivery last confirmed dispatch
    pub last_sent_at: Option<DateTime<Utc>>,
    /// When payment was recorded
    pub paid_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates a new draft invoice
    ///
    /// Manual creation path: the invoice starts as `Draft` with the default
    /// 30-day payment terms and no recurrence schedule.
    pub fn new(
        user_id: UserId,
        recipient_name: impl Into<String>,
        recipient_email: impl Into<String>,
        amount: Money,
        issue_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: InvoiceId::new_v7(),
            user_id,
            contact_id: None,
            invoice_number: generate_invoice_number(issue_date, 1),
            recipient_name: recipient_name.into(),
            recipient_email: recipient_email.into(),
            recipient_address: None,
            amount,
            gst: None,
            description: None,
            line_items: Vec::new(),
            status: InvoiceStatus::Draft,
            issue_date: Some(issue_date),
            due_date: Some(issue_date + chrono::Duration::days(DEFAULT_PAYMENT_TERMS_DAYS)),
            is_recurring: false,
            frequency: None,
            next_occurrence_at: None,
            completed_at: None,
            parent_invoice_id: None,
            last_sent_at: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the payment terms in days
    ///
    /// The gap between issue and due date, clamped at zero. Defaults to 0
    /// when either date is missing, so a successor of a dateless parent is
    /// due on its own issue date.
    pub fn payment_terms_days(&self) -> i64 {
        match (self.issue_date, self.due_date) {
            (Some(issue), Some(due)) => (due - issue).num_days().max(0),
            _ => 0,
        }
    }

    /// Classifies this invoice's position in the recurrence lifecycle
    pub fn recurrence_state(&self) -> RecurrenceState {
        if !self.is_recurring {
            RecurrenceState::NonRecurring
        } else if self.completed_at.is_some() {
            RecurrenceState::Completed
        } else {
            RecurrenceState::ActiveAwaitingDue
        }
    }

    /// Returns the invoice total including GST
    ///
    /// GST always shares the invoice currency.
    pub fn total_with_gst(&self) -> Money {
        match self.gst {
            Some(gst) => self.amount + gst,
            None => self.amount,
        }
    }

    /// Checks if the invoice is overdue as of the given date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => today > due && !self.status.is_terminal(),
            None => false,
        }
    }

    /// Returns the currency of the invoice total
    pub fn currency(&self) -> Currency {
        self.amount.currency()
    }
}

/// Position of an invoice in the recurrence lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceState {
    /// Not part of any recurring chain
    NonRecurring,
    /// In flight: owns the chain's active `next_occurrence_at`
    ActiveAwaitingDue,
    /// Already produced its successor
    Completed,
}

/// A line item on an invoice
///
/// Prices are plain decimals in the invoice's currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub unit_type: UnitType,
}

impl LineItem {
    pub fn new(
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        unit_type: UnitType,
    ) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            unit_type,
        }
    }

    /// Calculates the total for this line
    pub fn total(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

/// Billing unit for a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Quantity,
    Hours,
    Days,
    Months,
}

impl UnitType {
    /// Returns the display label
    pub fn label(&self) -> &'static str {
        match self {
            UnitType::Quantity => "Quantity",
            UnitType::Hours => "Hours",
            UnitType::Days => "Days",
            UnitType::Months => "Months",
        }
    }
}

/// Generates an invoice number
///
/// Format: 3 random digits + 2-digit year + 2-digit month + 2-digit
/// sequence-within-year for the recipient (zero-padded). The random prefix
/// makes collisions rare; actual uniqueness is enforced by the store's
/// unique constraint. `sequence_in_year` is the count of the recipient's
/// invoices issued since the start of the year, plus one; the store
/// supplies the count so this stays a pure computation over its inputs.
pub fn generate_invoice_number(issued_on: NaiveDate, sequence_in_year: u32) -> String {
    let prefix: u32 = rand::rng().random_range(100..=999);
    format!(
        "{}{:02}{:02}{:02}",
        prefix,
        issued_on.year() % 100,
        issued_on.month(),
        sequence_in_year
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn nz_date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_invoice_defaults() {
        let now = Utc::now();
        let invoice = Invoice::new(
            UserId::new(),
            "Acme Ltd",
            "billing@acme.test",
            Money::from_minor(150_000, Currency::NZD),
            nz_date(2025, 3, 1),
            now,
        );
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.due_date, Some(nz_date(2025, 3, 31)));
        assert_eq!(invoice.payment_terms_days(), DEFAULT_PAYMENT_TERMS_DAYS);
        assert_eq!(invoice.recurrence_state(), RecurrenceState::NonRecurring);
    }

    #[test]
    fn test_payment_terms_missing_dates_default_to_zero() {
        let now = Utc::now();
        let mut invoice = Invoice::new(
            UserId::new(),
            "Acme Ltd",
            "billing@acme.test",
            Money::from_minor(1_000, Currency::USD),
            nz_date(2025, 3, 1),
            now,
        );
        invoice.due_date = None;
        assert_eq!(invoice.payment_terms_days(), 0);
    }

    #[test]
    fn test_payment_terms_clamped_at_zero() {
        let now = Utc::now();
        let mut invoice = Invoice::new(
            UserId::new(),
            "Acme Ltd",
            "billing@acme.test",
            Money::from_minor(1_000, Currency::USD),
            nz_date(2025, 3, 10),
            now,
        );
        invoice.due_date = Some(nz_date(2025, 3, 1));
        assert_eq!(invoice.payment_terms_days(), 0);
    }

    #[test]
    fn test_line_item_total() {
        let item = LineItem::new("Consulting", dec!(7.5), dec!(120), UnitType::Hours);
        assert_eq!(item.total(), dec!(900));
    }

    #[test]
    fn test_invoice_number_format() {
        let number = generate_invoice_number(nz_date(2025, 11, 5), 3);
        assert_eq!(number.len(), 9);
        assert_eq!(&number[3..5], "25");
        assert_eq!(&number[5..7], "11");
        assert_eq!(&number[7..9], "03");
        let prefix: u32 = number[..3].parse().unwrap();
        assert!((100..=999).contains(&prefix));
    }

    #[test]
    fn test_is_overdue() {
        let now = Utc::now();
        let invoice = Invoice::new(
            UserId::new(),
            "Acme Ltd",
            "billing@acme.test",
            Money::from_minor(1_000, Currency::USD),
            nz_date(2025, 3, 1),
            now,
        );
        assert!(!invoice.is_overdue(nz_date(2025, 3, 31)));
        assert!(invoice.is_overdue(nz_date(2025, 4, 1)));
    }
}

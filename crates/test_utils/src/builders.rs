//! Test Data Builders
//!
//! Builder for constructing test invoices with sensible defaults. Tests
//! specify only the fields they care about and take defaults for the rest.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::Fake;

use core_kernel::{Currency, InvoiceId, Money, UserId};
use domain_invoicing::{Frequency, Invoice, InvoiceStatus, LineItem};

/// Builder for constructing test invoices
pub struct InvoiceBuilder {
    user_id: UserId,
    recipient_name: String,
    recipient_email: String,
    amount: Money,
    status: InvoiceStatus,
    issue_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    is_recurring: bool,
    frequency: Option<Frequency>,
    next_occurrence_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    parent_invoice_id: Option<InvoiceId>,
    line_items: Vec<LineItem>,
    created_at: DateTime<Utc>,
}

impl Default for InvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            user_id: UserId::new(),
            recipient_name: CompanyName().fake(),
            recipient_email: SafeEmail().fake(),
            amount: Money::from_minor(150_000, Currency::NZD),
            status: InvoiceStatus::Draft,
            issue_date: Some(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()),
            due_date: Some(NaiveDate::from_ymd_opt(2025, 2, 14).unwrap()),
            is_recurring: false,
            frequency: None,
            next_occurrence_at: None,
            completed_at: None,
            parent_invoice_id: None,
            line_items: Vec::new(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap(),
        }
    }

    /// Sets the owning user
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = user_id;
        self
    }

    /// Sets the recipient
    pub fn with_recipient(
        mut self,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        self.recipient_name = name.into();
        self.recipient_email = email.into();
        self
    }

    /// Sets the amount
    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    /// Sets the status
    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the issue and due dates
    pub fn with_dates(mut self, issue: NaiveDate, due: NaiveDate) -> Self {
        self.issue_date = Some(issue);
        self.due_date = Some(due);
        self
    }

    /// Clears both calendar dates
    pub fn without_dates(mut self) -> Self {
        self.issue_date = None;
        self.due_date = None;
        self
    }

    /// Makes the invoice a pending recurring one due at `next_at`
    pub fn recurring(mut self, frequency: Frequency, next_at: DateTime<Utc>) -> Self {
        self.is_recurring = true;
        self.frequency = Some(frequency);
        self.next_occurrence_at = Some(next_at);
        self.status = InvoiceStatus::Pending;
        self
    }

    /// Marks the recurrence step as already completed
    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    /// Links to a parent invoice
    pub fn with_parent(mut self, parent: InvoiceId) -> Self {
        self.parent_invoice_id = Some(parent);
        self
    }

    /// Adds a line item
    pub fn with_line_item(mut self, item: LineItem) -> Self {
        self.line_items.push(item);
        self
    }

    /// Builds the invoice
    pub fn build(self) -> Invoice {
        let mut invoice = Invoice::new(
            self.user_id,
            self.recipient_name,
            self.recipient_email,
            self.amount,
            self.issue_date
                .unwrap_or_else(|| NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()),
            self.created_at,
        );
        invoice.status = self.status;
        invoice.issue_date = self.issue_date;
        invoice.due_date = self.due_date;
        invoice.is_recurring = self.is_recurring;
        invoice.frequency = self.frequency;
        invoice.next_occurrence_at = self.next_occurrence_at;
        invoice.completed_at = self.completed_at;
        invoice.parent_invoice_id = self.parent_invoice_id;
        invoice.line_items = self.line_items;
        invoice
    }
}

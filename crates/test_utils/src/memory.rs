//! In-memory port adapters
//!
//! Mock adapters implementing the domain ports so the batch processor can be
//! exercised without a database or mail service. Each adapter is a cheap
//! cloneable handle over shared state: tests keep one handle for assertions
//! and move a clone into the processor. The store honors the same
//! eligibility predicate and atomic-advancement contract as the PostgreSQL
//! adapter, and supports fault injection for failure-isolation tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use core_kernel::{DomainPort, InvoiceId, PortError, Timezone, UserId};
use domain_invoicing::{
    Advancement, DeliveryQueue, Invoice, InvoiceStatus, InvoiceStore, TimezoneDirectory,
};

#[derive(Default)]
struct StoreInner {
    invoices: Mutex<HashMap<InvoiceId, Invoice>>,
    fail_advancement_for: Mutex<HashSet<InvoiceId>>,
}

/// In-memory `InvoiceStore`
#[derive(Clone, Default)]
pub struct InMemoryInvoiceStore {
    inner: Arc<StoreInner>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an invoice to the store
    pub fn seed(&self, invoice: Invoice) {
        self.inner
            .invoices
            .lock()
            .unwrap()
            .insert(invoice.id, invoice);
    }

    /// Makes `persist_advancement` fail for the given parent
    pub fn fail_advancement_for(&self, parent_id: InvoiceId) {
        self.inner
            .fail_advancement_for
            .lock()
            .unwrap()
            .insert(parent_id);
    }

    /// Returns a snapshot of an invoice
    pub fn get(&self, id: InvoiceId) -> Option<Invoice> {
        self.inner.invoices.lock().unwrap().get(&id).cloned()
    }

    /// Returns all stored invoices
    pub fn all(&self) -> Vec<Invoice> {
        self.inner.invoices.lock().unwrap().values().cloned().collect()
    }

    /// Returns the children of the given parent
    pub fn children_of(&self, parent_id: InvoiceId) -> Vec<Invoice> {
        self.inner
            .invoices
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.parent_invoice_id == Some(parent_id))
            .cloned()
            .collect()
    }

    fn is_eligible(invoice: &Invoice, as_of: DateTime<Utc>) -> bool {
        invoice.is_recurring
            && invoice.completed_at.is_none()
            && invoice.status == InvoiceStatus::Pending
            && invoice
                .next_occurrence_at
                .is_some_and(|next| next <= as_of)
    }
}

impl DomainPort for InMemoryInvoiceStore {}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn find(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        self.get(id)
            .ok_or_else(|| PortError::not_found("Invoice", id))
    }

    async fn due_candidates(&self, as_of: DateTime<Utc>) -> Result<Vec<Invoice>, PortError> {
        let mut candidates: Vec<Invoice> = self
            .inner
            .invoices
            .lock()
            .unwrap()
            .values()
            .filter(|i| Self::is_eligible(i, as_of))
            .cloned()
            .collect();
        candidates.sort_by_key(|i| i.next_occurrence_at);
        Ok(candidates)
    }

    async fn count_for_recipient_since(
        &self,
        recipient_email: &str,
        since: NaiveDate,
    ) -> Result<u32, PortError> {
        let count = self
            .inner
            .invoices
            .lock()
            .unwrap()
            .values()
            .filter(|i| {
                i.recipient_email == recipient_email
                    && i.issue_date.is_some_and(|issued| issued >= since)
            })
            .count();
        Ok(count as u32)
    }

    async fn persist_advancement(
        &self,
        parent_id: InvoiceId,
        advancement: &Advancement,
    ) -> Result<(), PortError> {
        if self
            .inner
            .fail_advancement_for
            .lock()
            .unwrap()
            .contains(&parent_id)
        {
            return Err(PortError::internal("injected store failure"));
        }

        let mut invoices = self.inner.invoices.lock().unwrap();
        let parent = invoices
            .get_mut(&parent_id)
            .ok_or_else(|| PortError::not_found("Invoice", parent_id))?;

        // Same re-check the PostgreSQL adapter performs under its row lock
        if !parent.is_recurring
            || parent.completed_at.is_some()
            || parent.status != InvoiceStatus::Pending
        {
            return Err(PortError::conflict(format!(
                "invoice {parent_id} is no longer eligible for advancement"
            )));
        }

        parent.completed_at = Some(advancement.completed_at);
        parent.updated_at = advancement.completed_at;
        invoices.insert(advancement.child.id, advancement.child.clone());
        Ok(())
    }
}

#[derive(Default)]
struct QueueInner {
    enqueued: Mutex<Vec<InvoiceId>>,
    failing: Mutex<bool>,
}

/// Recording `DeliveryQueue` with optional failure injection
#[derive(Clone, Default)]
pub struct RecordingDeliveryQueue {
    inner: Arc<QueueInner>,
}

impl RecordingDeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent enqueue fail
    pub fn set_failing(&self, failing: bool) {
        *self.inner.failing.lock().unwrap() = failing;
    }

    /// Returns the enqueued invoice ids, in order
    pub fn enqueued(&self) -> Vec<InvoiceId> {
        self.inner.enqueued.lock().unwrap().clone()
    }
}

impl DomainPort for RecordingDeliveryQueue {}

#[async_trait]
impl DeliveryQueue for RecordingDeliveryQueue {
    async fn enqueue(&self, invoice_id: InvoiceId) -> Result<(), PortError> {
        if *self.inner.failing.lock().unwrap() {
            return Err(PortError::connection("mail service unavailable"));
        }
        self.inner.enqueued.lock().unwrap().push(invoice_id);
        Ok(())
    }
}

#[derive(Default)]
struct DirectoryInner {
    default: Timezone,
    overrides: Mutex<HashMap<UserId, Timezone>>,
}

/// `TimezoneDirectory` backed by a fixed map
#[derive(Clone, Default)]
pub struct StaticTimezoneDirectory {
    inner: Arc<DirectoryInner>,
}

impl StaticTimezoneDirectory {
    /// Directory answering UTC for everyone
    pub fn utc() -> Self {
        Self::default()
    }

    /// Directory answering `default` for everyone
    pub fn with_default(default: Timezone) -> Self {
        Self {
            inner: Arc::new(DirectoryInner {
                default,
                overrides: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Pins a specific user to a timezone
    pub fn set(&self, user_id: UserId, tz: Timezone) {
        self.inner.overrides.lock().unwrap().insert(user_id, tz);
    }
}

impl DomainPort for StaticTimezoneDirectory {}

#[async_trait]
impl TimezoneDirectory for StaticTimezoneDirectory {
    async fn timezone_for(&self, user_id: UserId) -> Result<Timezone, PortError> {
        Ok(self
            .inner
            .overrides
            .lock()
            .unwrap()
            .get(&user_id)
            .copied()
            .unwrap_or(self.inner.default))
    }
}

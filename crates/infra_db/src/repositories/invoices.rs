//! Invoice repository implementation
//!
//! Adapts the domain's `InvoiceStore` port onto PostgreSQL. The advancement
//! path is the critical section: the parent row is locked `FOR UPDATE`, its
//! eligibility re-checked, and the child insert plus the parent's completion
//! stamp commit together or not at all. A candidate that lost the race to a
//! concurrent run surfaces as a conflict, never as a double advance.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{ContactId, Currency, DomainPort, InvoiceId, Money, PortError, UserId};
use domain_invoicing::{Advancement, Invoice, InvoiceStore, LineItem};

use crate::error::DatabaseError;
use crate::repositories::lookups::Lookups;

const INVOICE_COLUMNS: &str = "id, user_id, contact_id, invoice_number, recipient_name, \
     recipient_email, recipient_address, amount_minor, gst_minor, currency, description, \
     line_items, invoice_status_id, issue_date, due_date, is_recurring, \
     recurring_frequency_id, next_occurrence_at, recurring_completed_at, parent_invoice_id, \
     last_sent_at, paid_at, created_at, updated_at";

/// PostgreSQL adapter for the `InvoiceStore` port
#[derive(Debug, Clone)]
pub struct PgInvoiceStore {
    pool: PgPool,
    lookups: Lookups,
}

impl PgInvoiceStore {
    /// Creates a new store over the given pool and pre-loaded lookups
    pub fn new(pool: PgPool, lookups: Lookups) -> Self {
        Self { pool, lookups }
    }

    /// Inserts an invoice
    ///
    /// Used by the manual-creation path and by test setup; the scheduler
    /// itself only inserts through `persist_advancement`.
    pub async fn insert(&self, invoice: &Invoice) -> Result<(), DatabaseError> {
        let row = InvoiceRow::from_domain(invoice, &self.lookups)?;
        insert_row(&self.pool, &row).await
    }

    /// Marks an invoice as sent
    ///
    /// Called by the delivery collaborator once dispatch succeeds; the
    /// scheduler never transitions status itself.
    pub async fn mark_sent(&self, id: InvoiceId, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        let sent_id = self.lookups.status_id(domain_invoicing::InvoiceStatus::Sent)?;
        let result = sqlx::query(
            "UPDATE invoices SET invoice_status_id = $2, last_sent_at = $3, updated_at = $3 \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(sent_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Invoice", id));
        }
        Ok(())
    }
}

impl DomainPort for PgInvoiceStore {}

#[async_trait]
impl InvoiceStore for PgInvoiceStore {
    async fn find(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::classify(e)))?;

        match row {
            Some(row) => Ok(row.into_domain(&self.lookups)?),
            None => Err(PortError::not_found("Invoice", id)),
        }
    }

    #[instrument(skip(self))]
    async fn due_candidates(&self, as_of: DateTime<Utc>) -> Result<Vec<Invoice>, PortError> {
        let pending_id = self
            .lookups
            .status_id(domain_invoicing::InvoiceStatus::Pending)
            .map_err(PortError::from)?;

        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE is_recurring \
               AND next_occurrence_at IS NOT NULL \
               AND next_occurrence_at <= $1 \
               AND recurring_completed_at IS NULL \
               AND invoice_status_id = $2 \
             ORDER BY next_occurrence_at"
        ))
        .bind(as_of)
        .bind(pending_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::classify(e)))?;

        debug!(count = rows.len(), "loaded due candidates");

        rows.into_iter()
            .map(|row| row.into_domain(&self.lookups).map_err(PortError::from))
            .collect()
    }

    async fn count_for_recipient_since(
        &self,
        recipient_email: &str,
        since: NaiveDate,
    ) -> Result<u32, PortError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invoices WHERE recipient_email = $1 AND issue_date >= $2",
        )
        .bind(recipient_email)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::classify(e)))?;

        Ok(count.max(0) as u32)
    }

    #[instrument(skip(self, advancement), fields(child_id = %advancement.child.id))]
    async fn persist_advancement(
        &self,
        parent_id: InvoiceId,
        advancement: &Advancement,
    ) -> Result<(), PortError> {
        let pending_id = self
            .lookups
            .status_id(domain_invoicing::InvoiceStatus::Pending)
            .map_err(PortError::from)?;
        let child_row =
            InvoiceRow::from_domain(&advancement.child, &self.lookups).map_err(PortError::from)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::from(DatabaseError::classify(e)))?;

        // Serialize read-then-write per invoice: lock the parent row for the
        // duration of the re-check and the writes.
        let locked: Option<(bool, Option<DateTime<Utc>>, Uuid)> = sqlx::query_as(
            "SELECT is_recurring, recurring_completed_at, invoice_status_id \
             FROM invoices WHERE id = $1 FOR UPDATE",
        )
        .bind(parent_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| PortError::from(DatabaseError::classify(e)))?;

        let (is_recurring, completed_at, status_id) = match locked {
            Some(row) => row,
            None => return Err(PortError::not_found("Invoice", parent_id)),
        };
        if !is_recurring || completed_at.is_some() || status_id != pending_id {
            return Err(PortError::conflict(format!(
                "invoice {parent_id} is no longer eligible for advancement"
            )));
        }

        insert_row(&mut *tx, &child_row)
            .await
            .map_err(PortError::from)?;

        sqlx::query(
            "UPDATE invoices SET recurring_completed_at = $2, updated_at = $2 WHERE id = $1",
        )
        .bind(parent_id.as_uuid())
        .bind(advancement.completed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::from(DatabaseError::classify(e)))?;

        tx.commit()
            .await
            .map_err(|e| PortError::from(DatabaseError::classify(e)))?;

        debug!(parent_id = %parent_id, "advancement committed");
        Ok(())
    }
}

async fn insert_row<'e, E>(executor: E, row: &InvoiceRow) -> Result<(), DatabaseError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(&format!(
        "INSERT INTO invoices ({INVOICE_COLUMNS}) VALUES \
         ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, \
          $19, $20, $21, $22, $23, $24)"
    ))
    .bind(row.id)
    .bind(row.user_id)
    .bind(row.contact_id)
    .bind(&row.invoice_number)
    .bind(&row.recipient_name)
    .bind(&row.recipient_email)
    .bind(&row.recipient_address)
    .bind(row.amount_minor)
    .bind(row.gst_minor)
    .bind(&row.currency)
    .bind(&row.description)
    .bind(&row.line_items)
    .bind(row.invoice_status_id)
    .bind(row.issue_date)
    .bind(row.due_date)
    .bind(row.is_recurring)
    .bind(row.recurring_frequency_id)
    .bind(row.next_occurrence_at)
    .bind(row.recurring_completed_at)
    .bind(row.parent_invoice_id)
    .bind(row.last_sent_at)
    .bind(row.paid_at)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(executor)
    .await
    .map_err(DatabaseError::classify)?;
    Ok(())
}

/// Flat database row for an invoice
#[derive(Debug, Clone, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    user_id: Uuid,
    contact_id: Option<Uuid>,
    invoice_number: String,
    recipient_name: String,
    recipient_email: String,
    recipient_address: Option<String>,
    amount_minor: i64,
    gst_minor: Option<i64>,
    currency: String,
    description: Option<String>,
    line_items: Json<Vec<LineItem>>,
    invoice_status_id: Uuid,
    issue_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    is_recurring: bool,
    recurring_frequency_id: Option<Uuid>,
    next_occurrence_at: Option<DateTime<Utc>>,
    recurring_completed_at: Option<DateTime<Utc>>,
    parent_invoice_id: Option<Uuid>,
    last_sent_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn from_domain(invoice: &Invoice, lookups: &Lookups) -> Result<Self, DatabaseError> {
        let amount_minor = invoice
            .amount
            .as_minor()
            .map_err(|e| DatabaseError::CorruptRow(format!("amount out of range: {e}")))?;
        let gst_minor = invoice
            .gst
            .map(|gst| gst.as_minor())
            .transpose()
            .map_err(|e| DatabaseError::CorruptRow(format!("gst out of range: {e}")))?;
        let frequency_id = invoice
            .frequency
            .map(|f| lookups.frequency_id(f))
            .transpose()?;

        Ok(Self {
            id: *invoice.id.as_uuid(),
            user_id: *invoice.user_id.as_uuid(),
            contact_id: invoice.contact_id.map(|c| *c.as_uuid()),
            invoice_number: invoice.invoice_number.clone(),
            recipient_name: invoice.recipient_name.clone(),
            recipient_email: invoice.recipient_email.clone(),
            recipient_address: invoice.recipient_address.clone(),
            amount_minor,
            gst_minor,
            currency: invoice.currency().code().to_string(),
            description: invoice.description.clone(),
            line_items: Json(invoice.line_items.clone()),
            invoice_status_id: lookups.status_id(invoice.status)?,
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            is_recurring: invoice.is_recurring,
            recurring_frequency_id: frequency_id,
            next_occurrence_at: invoice.next_occurrence_at,
            recurring_completed_at: invoice.completed_at,
            parent_invoice_id: invoice.parent_invoice_id.map(|p| *p.as_uuid()),
            last_sent_at: invoice.last_sent_at,
            paid_at: invoice.paid_at,
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
        })
    }

    fn into_domain(self, lookups: &Lookups) -> Result<Invoice, DatabaseError> {
        let currency: Currency = self
            .currency
            .parse()
            .map_err(|e| DatabaseError::CorruptRow(format!("invoice {}: {e}", self.id)))?;
        let status = lookups.status_for(self.invoice_status_id)?;
        let frequency = self
            .recurring_frequency_id
            .map(|id| lookups.frequency_or_default(id));

        Ok(Invoice {
            id: InvoiceId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            contact_id: self.contact_id.map(ContactId::from_uuid),
            invoice_number: self.invoice_number,
            recipient_name: self.recipient_name,
            recipient_email: self.recipient_email,
            recipient_address: self.recipient_address,
            amount: Money::from_minor(self.amount_minor, currency),
            gst: self.gst_minor.map(|g| Money::from_minor(g, currency)),
            description: self.description,
            line_items: self.line_items.0,
            status,
            issue_date: self.issue_date,
            due_date: self.due_date,
            is_recurring: self.is_recurring,
            frequency,
            next_occurrence_at: self.next_occurrence_at,
            completed_at: self.recurring_completed_at,
            parent_invoice_id: self.parent_invoice_id.map(InvoiceId::from_uuid),
            last_sent_at: self.last_sent_at,
            paid_at: self.paid_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_invoice() -> Invoice {
        let now = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        let mut invoice = Invoice::new(
            UserId::new(),
            "Acme Ltd",
            "billing@acme.test",
            Money::from_minor(123_456, Currency::NZD),
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            now,
        );
        invoice.gst = Some(Money::from_minor(18_518, Currency::NZD));
        invoice.is_recurring = true;
        invoice.frequency = Some(domain_invoicing::Frequency::Quarterly);
        invoice.next_occurrence_at = Some(now);
        invoice.status = domain_invoicing::InvoiceStatus::Pending;
        invoice
    }

    #[test]
    fn test_row_round_trip() {
        let lookups = Lookups::seeded();
        let invoice = sample_invoice();

        let row = InvoiceRow::from_domain(&invoice, &lookups).unwrap();
        let back = row.into_domain(&lookups).unwrap();

        assert_eq!(back.id, invoice.id);
        assert_eq!(back.amount, invoice.amount);
        assert_eq!(back.gst, invoice.gst);
        assert_eq!(back.status, invoice.status);
        assert_eq!(back.frequency, invoice.frequency);
        assert_eq!(back.next_occurrence_at, invoice.next_occurrence_at);
    }

    #[test]
    fn test_unknown_currency_is_corrupt_row() {
        let lookups = Lookups::seeded();
        let invoice = sample_invoice();
        let mut row = InvoiceRow::from_domain(&invoice, &lookups).unwrap();
        row.currency = "XXX".to_string();
        assert!(matches!(
            row.into_domain(&lookups),
            Err(DatabaseError::CorruptRow(_))
        ));
    }
}

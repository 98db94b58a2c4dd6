//! Batch Due-Invoice Processor
//!
//! One run: query the candidates due as of an instant, then for each one
//! independently advance the chain and enqueue delivery of the parent.
//! The store persists each advancement atomically; the enqueue happens after
//! that commit, so a delivery hiccup can never lose recurrence progress.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::{error, info, instrument, warn};

use core_kernel::InvoiceId;
use domain_invoicing::{
    advance, AdvanceContext, DeliveryQueue, Invoice, InvoiceStore, TimezoneDirectory,
};

use crate::error::SchedulerError;

/// Result of one batch run
#[derive(Debug, Clone, Default)]
pub struct ProcessingReport {
    /// Invoices successfully advanced
    pub processed: usize,
    /// Per-invoice failures; the batch continued past each of them
    pub failures: Vec<ProcessingFailure>,
}

impl ProcessingReport {
    /// True when every candidate advanced and every enqueue succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A failure attributable to one invoice
#[derive(Debug, Clone)]
pub struct ProcessingFailure {
    pub invoice_id: InvoiceId,
    pub message: String,
}

/// Drives the recurrence state machine over all due invoices
///
/// Generic over the domain ports: the binary wires in PostgreSQL adapters,
/// tests wire in the in-memory ones.
pub struct RecurrenceProcessor<S, T, D> {
    store: S,
    timezones: T,
    delivery: D,
}

impl<S, T, D> RecurrenceProcessor<S, T, D>
where
    S: InvoiceStore,
    T: TimezoneDirectory,
    D: DeliveryQueue,
{
    pub fn new(store: S, timezones: T, delivery: D) -> Self {
        Self {
            store,
            timezones,
            delivery,
        }
    }

    /// Processes every invoice due as of `as_of`
    ///
    /// Candidates are advanced independently: a failure rolls back that
    /// invoice only (it stays eligible for the next run) and is recorded in
    /// the report; the batch moves on.
    ///
    /// # Errors
    ///
    /// Only the candidate query itself can fail the run; everything after
    /// that is isolated per invoice.
    #[instrument(skip(self))]
    pub async fn run(&self, as_of: DateTime<Utc>) -> Result<ProcessingReport, SchedulerError> {
        let candidates = self.store.due_candidates(as_of).await?;

        if candidates.is_empty() {
            info!("no recurring invoices due");
            return Ok(ProcessingReport::default());
        }

        info!(count = candidates.len(), "processing recurring invoices");

        let mut report = ProcessingReport::default();
        for candidate in candidates {
            match self.advance_candidate(&candidate).await {
                Ok(outcome) => {
                    report.processed += 1;
                    info!(
                        parent = %candidate.invoice_number,
                        child_id = %outcome.child_id,
                        "advanced recurring invoice"
                    );
                    if let Some(message) = outcome.enqueue_error {
                        report.failures.push(ProcessingFailure {
                            invoice_id: candidate.id,
                            message,
                        });
                    }
                }
                Err(err) => {
                    warn!(
                        invoice = %candidate.invoice_number,
                        error = %err,
                        "failed to advance recurring invoice"
                    );
                    report.failures.push(ProcessingFailure {
                        invoice_id: candidate.id,
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            processed = report.processed,
            failures = report.failures.len(),
            "recurring invoice run complete"
        );
        Ok(report)
    }

    /// Advances a single invoice by id
    ///
    /// The per-invoice entry point for direct triggering; behaves exactly
    /// like one iteration of [`run`](Self::run).
    pub async fn advance_one(&self, parent_id: InvoiceId) -> Result<InvoiceId, SchedulerError> {
        let parent = self.store.find(parent_id).await?;
        let outcome = self.advance_candidate(&parent).await?;
        Ok(outcome.child_id)
    }

    async fn advance_candidate(&self, parent: &Invoice) -> Result<AdvanceOutcome, SchedulerError> {
        let timezone = self.timezones.timezone_for(parent.user_id).await?;
        let now = Utc::now();

        // Sequence component of the child's invoice number: the recipient's
        // invoice count since the start of the current (local) year, plus one.
        let year_start = start_of_year(timezone.local_date(now));
        let count = self
            .store
            .count_for_recipient_since(&parent.recipient_email, year_start)
            .await?;

        let ctx = AdvanceContext::new(timezone, now, count + 1);
        let advancement = advance(parent, &ctx)?;
        let child_id = advancement.child.id;

        self.store
            .persist_advancement(parent.id, &advancement)
            .await?;

        // The advancement is committed; delivery is fire-and-forget from
        // here. An enqueue failure is reported, never rolled back; the
        // parent's null last_sent_at is the monitoring signal.
        let enqueue_error = match self.delivery.enqueue(parent.id).await {
            Ok(()) => None,
            Err(err) => {
                error!(
                    invoice_id = %parent.id,
                    error = %err,
                    "delivery enqueue failed after advancement committed"
                );
                Some(format!("delivery enqueue failed: {err}"))
            }
        };

        Ok(AdvanceOutcome {
            child_id,
            enqueue_error,
        })
    }
}

struct AdvanceOutcome {
    child_id: InvoiceId,
    enqueue_error: Option<String>,
}

fn start_of_year(today: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today)
}

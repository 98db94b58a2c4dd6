//! Delivery queue backends
//!
//! Production delivery (PDF render + SMTP send + the pending→sent status
//! transition) is owned by the mail service; the scheduler only hands off an
//! invoice id. This module provides the development backend that logs the
//! hand-off instead of queueing it.

use async_trait::async_trait;
use tracing::info;

use core_kernel::{DomainPort, InvoiceId, PortError};
use domain_invoicing::DeliveryQueue;

/// Delivery backend that logs instead of sending
///
/// Useful for local development and dry runs: the scheduler behaves exactly
/// as in production, but nothing leaves the machine.
#[derive(Debug, Clone, Default)]
pub struct LoggingDeliveryQueue;

impl LoggingDeliveryQueue {
    pub fn new() -> Self {
        Self
    }
}

impl DomainPort for LoggingDeliveryQueue {}

#[async_trait]
impl DeliveryQueue for LoggingDeliveryQueue {
    async fn enqueue(&self, invoice_id: InvoiceId) -> Result<(), PortError> {
        info!(%invoice_id, "queued invoice email");
        Ok(())
    }
}

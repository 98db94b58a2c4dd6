//! Read-through lookup service for statuses and frequencies
//!
//! Status and frequency rows live in lookup tables so the dashboard can sort
//! and label them, but the scheduler should not hit those tables on every
//! candidate. `Lookups` loads both tables once per run and resolves names and
//! ids in memory, with the monthly-default fallback for unknown frequencies
//! centralized here.

use std::collections::HashMap;
use std::str::FromStr;

use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use domain_invoicing::{Frequency, InvoiceStatus};

use crate::error::DatabaseError;

#[derive(Debug, Clone, sqlx::FromRow)]
struct LookupRow {
    id: Uuid,
    name: String,
}

/// In-memory view of the status and frequency lookup tables
#[derive(Debug, Clone)]
pub struct Lookups {
    status_ids: HashMap<InvoiceStatus, Uuid>,
    statuses_by_id: HashMap<Uuid, InvoiceStatus>,
    frequency_ids: HashMap<Frequency, Uuid>,
    frequencies_by_id: HashMap<Uuid, Frequency>,
}

impl Lookups {
    /// Loads both lookup tables
    ///
    /// Rows whose names the domain does not recognize are skipped with a
    /// warning; resolution of a missing row fails at use time instead.
    pub async fn load(pool: &PgPool) -> Result<Self, DatabaseError> {
        let status_rows: Vec<LookupRow> =
            sqlx::query_as("SELECT id, name FROM invoice_statuses ORDER BY sort_order")
                .fetch_all(pool)
                .await
                .map_err(DatabaseError::classify)?;

        let frequency_rows: Vec<LookupRow> =
            sqlx::query_as("SELECT id, name FROM recurring_frequencies ORDER BY sort_order")
                .fetch_all(pool)
                .await
                .map_err(DatabaseError::classify)?;

        let mut lookups = Self {
            status_ids: HashMap::new(),
            statuses_by_id: HashMap::new(),
            frequency_ids: HashMap::new(),
            frequencies_by_id: HashMap::new(),
        };

        for row in status_rows {
            match InvoiceStatus::from_str(&row.name) {
                Ok(status) => {
                    lookups.status_ids.insert(status, row.id);
                    lookups.statuses_by_id.insert(row.id, status);
                }
                Err(_) => warn!(name = %row.name, "skipping unknown invoice status row"),
            }
        }
        for row in frequency_rows {
            match Frequency::from_str(&row.name) {
                Ok(frequency) => {
                    lookups.frequency_ids.insert(frequency, row.id);
                    lookups.frequencies_by_id.insert(row.id, frequency);
                }
                Err(_) => warn!(name = %row.name, "skipping unknown frequency row"),
            }
        }

        Ok(lookups)
    }

    /// Resolves a status to its lookup-row id
    pub fn status_id(&self, status: InvoiceStatus) -> Result<Uuid, DatabaseError> {
        self.status_ids
            .get(&status)
            .copied()
            .ok_or_else(|| DatabaseError::not_found("InvoiceStatus", status))
    }

    /// Resolves a lookup-row id back to a status
    pub fn status_for(&self, id: Uuid) -> Result<InvoiceStatus, DatabaseError> {
        self.statuses_by_id
            .get(&id)
            .copied()
            .ok_or_else(|| DatabaseError::CorruptRow(format!("unknown invoice_status_id {id}")))
    }

    /// Resolves a frequency to its lookup-row id
    pub fn frequency_id(&self, frequency: Frequency) -> Result<Uuid, DatabaseError> {
        self.frequency_ids
            .get(&frequency)
            .copied()
            .ok_or_else(|| DatabaseError::not_found("Frequency", frequency))
    }

    /// Resolves a lookup-row id to a frequency, defaulting when unknown
    ///
    /// An id that no longer matches a frequency row does not poison the
    /// chain: the invoice advances monthly.
    pub fn frequency_or_default(&self, id: Uuid) -> Frequency {
        match self.frequencies_by_id.get(&id) {
            Some(frequency) => *frequency,
            None => {
                warn!(frequency_id = %id, "unknown frequency id, defaulting to monthly");
                Frequency::default()
            }
        }
    }

    /// Builds a Lookups from fixed rows, for tests
    pub fn from_rows(
        statuses: impl IntoIterator<Item = (InvoiceStatus, Uuid)>,
        frequencies: impl IntoIterator<Item = (Frequency, Uuid)>,
    ) -> Self {
        let mut lookups = Self {
            status_ids: HashMap::new(),
            statuses_by_id: HashMap::new(),
            frequency_ids: HashMap::new(),
            frequencies_by_id: HashMap::new(),
        };
        for (status, id) in statuses {
            lookups.status_ids.insert(status, id);
            lookups.statuses_by_id.insert(id, status);
        }
        for (frequency, id) in frequencies {
            lookups.frequency_ids.insert(frequency, id);
            lookups.frequencies_by_id.insert(id, frequency);
        }
        lookups
    }

    /// A fully populated Lookups with fresh ids, for tests
    pub fn seeded() -> Self {
        Self::from_rows(
            InvoiceStatus::ALL.map(|s| (s, Uuid::new_v4())),
            Frequency::ALL.map(|f| (f, Uuid::new_v4())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_ids() {
        let lookups = Lookups::seeded();
        for status in InvoiceStatus::ALL {
            let id = lookups.status_id(status).unwrap();
            assert_eq!(lookups.status_for(id).unwrap(), status);
        }
        for frequency in Frequency::ALL {
            let id = lookups.frequency_id(frequency).unwrap();
            assert_eq!(lookups.frequency_or_default(id), frequency);
        }
    }

    #[test]
    fn test_unknown_frequency_id_defaults_to_monthly() {
        let lookups = Lookups::seeded();
        assert_eq!(
            lookups.frequency_or_default(Uuid::new_v4()),
            Frequency::Monthly
        );
    }

    #[test]
    fn test_missing_status_row_is_an_error() {
        let lookups = Lookups::from_rows([], []);
        assert!(lookups.status_id(InvoiceStatus::Pending).is_err());
    }
}

//! Invoice status and recurring frequency lookups
//!
//! Both are persisted as lookup tables (id, name, sort_order); the enums here
//! are the domain-side view with the display label and ordering attached.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Invoice status
///
/// Ordered by lifecycle: draft < pending < sent < paid < overdue < cancelled.
/// New invoices start as `Draft`; recurring successors start as `Pending` and
/// move to `Sent` only once the delivery collaborator confirms dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Pending,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    /// All statuses in sort order, as seeded into the lookup table
    pub const ALL: [InvoiceStatus; 6] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Pending,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
        InvoiceStatus::Cancelled,
    ];

    /// Returns the lookup-row name
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// Returns the display label
    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Sent => "Sent",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
            InvoiceStatus::Cancelled => "Cancelled",
        }
    }

    /// Returns the lookup-row sort order
    pub fn sort_order(&self) -> i32 {
        match self {
            InvoiceStatus::Draft => 1,
            InvoiceStatus::Pending => 2,
            InvoiceStatus::Sent => 3,
            InvoiceStatus::Paid => 4,
            InvoiceStatus::Overdue => 5,
            InvoiceStatus::Cancelled => 6,
        }
    }

    /// Returns true for the statuses that close out an invoice
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = UnknownLookupName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "pending" => Ok(InvoiceStatus::Pending),
            "sent" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(UnknownLookupName {
                kind: "invoice status",
                name: other.to_string(),
            }),
        }
    }
}

/// Recurring frequency
///
/// Each variant maps to a calendar-add rule in the owner's local timezone;
/// see [`crate::schedule::next_occurrence`]. The `Default` impl is the
/// system-wide fallback for invoices whose frequency cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// All frequencies in sort order, as seeded into the lookup table
    pub const ALL: [Frequency; 4] = [
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Yearly,
    ];

    /// Returns the lookup-row name
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }

    /// Returns the display label
    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
            Frequency::Quarterly => "Quarterly",
            Frequency::Yearly => "Yearly",
        }
    }

    /// Returns the lookup-row sort order
    pub fn sort_order(&self) -> i32 {
        match self {
            Frequency::Weekly => 1,
            Frequency::Monthly => 2,
            Frequency::Quarterly => 3,
            Frequency::Yearly => 4,
        }
    }

    /// Returns the calendar interval in months, or None for weekly
    pub fn months(&self) -> Option<u32> {
        match self {
            Frequency::Weekly => None,
            Frequency::Monthly => Some(1),
            Frequency::Quarterly => Some(3),
            Frequency::Yearly => Some(12),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = UnknownLookupName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(UnknownLookupName {
                kind: "recurring frequency",
                name: other.to_string(),
            }),
        }
    }
}

/// A lookup name that does not match any known row
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown {kind}: {name}")]
pub struct UnknownLookupName {
    pub kind: &'static str,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in InvoiceStatus::ALL {
            assert_eq!(status.as_str().parse::<InvoiceStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_ordering() {
        let orders: Vec<i32> = InvoiceStatus::ALL.iter().map(|s| s.sort_order()).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_frequency_round_trip() {
        for frequency in Frequency::ALL {
            assert_eq!(frequency.as_str().parse::<Frequency>().unwrap(), frequency);
        }
    }

    #[test]
    fn test_frequency_default_is_monthly() {
        assert_eq!(Frequency::default(), Frequency::Monthly);
    }

    #[test]
    fn test_unknown_name_error() {
        let err = "fortnightly".parse::<Frequency>().unwrap_err();
        assert!(err.to_string().contains("fortnightly"));
    }
}

//! Core Kernel - Foundational types and utilities for the invoicing system
//!
//! This crate provides the fundamental building blocks used across all
//! domain modules:
//! - Money types with precise decimal arithmetic
//! - Timezone-aware temporal helpers
//! - Common identifiers and value objects
//! - Port infrastructure for the hexagonal architecture

pub mod error;
pub mod identifiers;
pub mod money;
pub mod ports;
pub mod temporal;

pub use error::CoreError;
pub use identifiers::{ContactId, FrequencyId, InvoiceId, StatusId, UserId};
pub use money::{Currency, Money, MoneyError};
pub use ports::{DomainPort, PortError};
pub use temporal::{TemporalError, Timezone};

//! Test Utilities Crate
//!
//! Provides shared test infrastructure for the invoicing test suite.
//!
//! # Modules
//!
//! - `builders`: Builder patterns for test invoice construction
//! - `memory`: In-memory adapters for the domain ports, with fault injection

pub mod builders;
pub mod memory;

pub use builders::*;
pub use memory::*;

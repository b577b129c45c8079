//! Household finance projection library
//!
//! This crate provides a deterministic year-by-year projection engine for
//! household finances. It supports:
//! - Per-year recorded value histories with caching, invalidation, and
//!   caller-supplied overrides
//! - Continuous and discrete compound growth with balance projection to any
//!   point in a year
//! - Account flavors (savings, registered, debt) with per-flavor inflow and
//!   outflow limits
//! - Contribution room shared across accounts through (contributor, token)
//!   pools, accrued one year ahead of consumption
//! - Intra-year transfer scheduling that picks the earliest feasible time
//!   and keeps balances non-negative when possible
//! - An unwindable transfer ledger for re-runnable planning passes
//!
//! Tax policy is pluggable: the engine aggregates per-account taxable
//! income and hands it to an external [`tax::TaxTreatment`].

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod account;
pub mod error;
pub mod growth;
pub mod household;
pub mod person;
pub mod record;
pub mod scheduler;
pub mod tax;
pub mod timing;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use account::{Account, AccountKind, AccountOverrides, RateSource};
pub use growth::Compounding;
pub use household::{Household, RoomAccrual};
pub use person::Person;
pub use record::{Temporal, Year};
pub use scheduler::{Pool, Scheduler, Transfer};
pub use timing::{TransactionSeries, When};

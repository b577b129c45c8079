//! Integration tests for the projection engine
//!
//! Tests are organized by topic:
//! - `records` - Recorded histories, caching, invalidation, overrides
//! - `accounts` - Balance projection and flow limits
//! - `debt` - Liability payment limits
//! - `contribution_room` - Shared room pools and accrual across years
//! - `scheduling` - Feasibility-shifted transfers and the unwind ledger

mod accounts;
mod debt;

//! Type definitions shared across the engine

mod ids;

pub use ids::{AccountId, PersonId, RoomToken};

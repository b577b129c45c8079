//! People and the contribution-room histories they carry.
//!
//! Contribution room belongs to the contributor, not to any single account:
//! registered accounts that share a (contributor, token) pair draw on one
//! room history, while distinct tokens never interact. Room for a year that
//! was never assigned reads as `None`, which is "unknown", not zero.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::model::{AccountId, RoomToken};
use crate::record::{PropertyDef, Recorded, Temporal, Year, YearClock};

/// Per-token contribution-room histories for one contributor.
#[derive(Debug, Clone, Default)]
pub struct RoomRegistry {
    rooms: FxHashMap<RoomToken, Recorded<f64>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        RoomRegistry {
            rooms: FxHashMap::default(),
        }
    }

    /// Ensure a room history exists for `token`, creating an empty one on
    /// first registration.
    pub(crate) fn register(&mut self, token: &RoomToken) {
        if !self.rooms.contains_key(token) {
            self.rooms.insert(token.clone(), Recorded::new());
        }
    }

    /// The room assigned for `token` in `year`, or `None` if never set.
    pub fn room(&self, token: &RoomToken, year: Year) -> Option<f64> {
        self.rooms.get(token).and_then(|r| r.get(year)).copied()
    }

    /// Record room for a year only if none was assigned yet.
    pub(crate) fn record_room(&mut self, token: &RoomToken, year: Year, value: f64) {
        self.register(token);
        if let Some(record) = self.rooms.get_mut(token) {
            record.record(year, value);
        }
    }

    /// Assign room for a year, replacing any earlier assignment.
    pub(crate) fn set_room(&mut self, token: &RoomToken, year: Year, value: f64) {
        self.register(token);
        if let Some(record) = self.rooms.get_mut(token) {
            record.force(year, value);
        }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &RoomToken> {
        self.rooms.keys()
    }
}

/// A member of the household: owns accounts and carries contribution room.
#[derive(Debug, Clone)]
pub struct Person {
    clock: YearClock,
    accounts: BTreeSet<AccountId>,
    rooms: RoomRegistry,
}

static PERSON_PROPERTIES: [PropertyDef<Person>; 0] = [];

impl Person {
    pub fn new(initial_year: Year) -> Self {
        Person {
            clock: YearClock::new(initial_year),
            accounts: BTreeSet::new(),
            rooms: RoomRegistry::new(),
        }
    }

    pub fn accounts(&self) -> impl Iterator<Item = AccountId> + '_ {
        self.accounts.iter().copied()
    }

    pub(crate) fn attach_account(&mut self, id: AccountId) {
        self.accounts.insert(id);
    }

    pub fn room(&self, token: &RoomToken, year: Year) -> Option<f64> {
        self.rooms.room(token, year)
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub(crate) fn rooms_mut(&mut self) -> &mut RoomRegistry {
        &mut self.rooms
    }
}

impl Temporal for Person {
    fn clock(&self) -> &YearClock {
        &self.clock
    }

    fn clock_mut(&mut self) -> &mut YearClock {
        &mut self.clock
    }

    fn properties() -> &'static [PropertyDef<Self>] {
        &PERSON_PROPERTIES
    }
}

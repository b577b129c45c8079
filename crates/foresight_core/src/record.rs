//! Per-year value histories and the advancement protocol.
//!
//! Every long-lived entity carries a [`YearClock`] and a set of recorded
//! properties. A recorded property has a per-year history plus optional
//! per-year overrides supplied at construction; overrides always win over
//! computed values and survive invalidation. Advancing an entity snapshots
//! each declared property for the closing year, then moves the clock.
//!
//! Cached properties additionally memoize the current year's computed value
//! through a `Cell`, so read paths stay `&self`.

use std::cell::Cell;
use std::collections::BTreeMap;

use crate::error::Result;

/// Calendar year.
pub type Year = i16;

/// Tracks an entity's position in time.
///
/// `this_year` never precedes `initial_year` and only moves forward, one
/// year per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearClock {
    pub initial_year: Year,
    pub this_year: Year,
}

impl YearClock {
    pub fn new(initial_year: Year) -> Self {
        YearClock {
            initial_year,
            this_year: initial_year,
        }
    }

    pub fn tick(&mut self) {
        self.this_year += 1;
    }
}

/// A per-year history with caller-supplied overrides.
#[derive(Debug, Clone)]
pub struct Recorded<T> {
    history: BTreeMap<Year, T>,
    overrides: BTreeMap<Year, T>,
}

impl<T> Recorded<T> {
    pub fn new() -> Self {
        Recorded {
            history: BTreeMap::new(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_overrides(overrides: BTreeMap<Year, T>) -> Self {
        Recorded {
            history: BTreeMap::new(),
            overrides,
        }
    }

    /// The value for `year`: the override if one exists, else the recorded
    /// history entry.
    pub fn get(&self, year: Year) -> Option<&T> {
        self.overrides.get(&year).or_else(|| self.history.get(&year))
    }

    pub fn contains(&self, year: Year) -> bool {
        self.overrides.contains_key(&year) || self.history.contains_key(&year)
    }

    /// Record a value for `year` unless the year is overridden or already
    /// recorded. Snapshots during advancement go through here so a recorded
    /// year is write-once.
    pub fn record(&mut self, year: Year, value: T) {
        if !self.contains(year) {
            self.history.insert(year, value);
        }
    }

    /// Write a value for `year` regardless of any prior history entry.
    /// Overrides still win on read and are never replaced.
    pub fn force(&mut self, year: Year, value: T) {
        if !self.overrides.contains_key(&year) {
            self.history.insert(year, value);
        }
    }

    /// Drop the recorded entry for `year`. An overridden year is untouched.
    pub fn invalidate(&mut self, year: Year) {
        if !self.overrides.contains_key(&year) {
            self.history.remove(&year);
        }
    }

    pub fn set_override(&mut self, year: Year, value: T) {
        self.overrides.insert(year, value);
    }

    pub fn history(&self) -> &BTreeMap<Year, T> {
        &self.history
    }

    /// The most recent entry at or before `year`, override-aware.
    pub fn latest_at_or_before(&self, year: Year) -> Option<(Year, &T)> {
        let hist = self.history.range(..=year).next_back();
        let over = self.overrides.range(..=year).next_back();
        match (hist, over) {
            (Some((hy, hv)), Some((oy, ov))) => {
                if oy >= hy {
                    Some((*oy, ov))
                } else {
                    Some((*hy, hv))
                }
            }
            (Some((y, v)), None) | (None, Some((y, v))) => Some((*y, v)),
            (None, None) => None,
        }
    }
}

impl<T> Default for Recorded<T> {
    fn default() -> Self {
        Recorded::new()
    }
}

/// A [`Recorded`] history with a current-year memo for `&self` getters.
///
/// The memo holds at most one `(year, value)` pair; computing a value for a
/// different year simply replaces it. History and overrides behave exactly
/// as in [`Recorded`].
#[derive(Debug, Clone)]
pub struct Cached<T: Copy> {
    recorded: Recorded<T>,
    memo: Cell<Option<(Year, T)>>,
}

impl<T: Copy> Cached<T> {
    pub fn new() -> Self {
        Cached {
            recorded: Recorded::new(),
            memo: Cell::new(None),
        }
    }

    pub fn with_overrides(overrides: BTreeMap<Year, T>) -> Self {
        Cached {
            recorded: Recorded::with_overrides(overrides),
            memo: Cell::new(None),
        }
    }

    pub fn get(&self, year: Year) -> Option<T> {
        if let Some(v) = self.recorded.get(year) {
            return Some(*v);
        }
        match self.memo.get() {
            Some((y, v)) if y == year => Some(v),
            _ => None,
        }
    }

    /// Cache a computed value for `year` without touching history. A year
    /// with an override is left alone.
    pub fn memoize(&self, year: Year, value: T) {
        if !self.recorded.contains(year) {
            self.memo.set(Some((year, value)));
        }
    }

    /// Snapshot a value into history (write-once, override-aware).
    pub fn record(&mut self, year: Year, value: T) {
        self.recorded.record(year, value);
    }

    /// Write a history entry unconditionally (overrides still win on read).
    pub fn seed(&mut self, year: Year, value: T) {
        self.recorded.force(year, value);
    }

    /// Drop the cached and recorded value for `year`. Overrides survive.
    pub fn invalidate(&mut self, year: Year) {
        if let Some((y, _)) = self.memo.get()
            && y == year
        {
            self.memo.set(None);
        }
        self.recorded.invalidate(year);
    }

    pub fn set_override(&mut self, year: Year, value: T) {
        if let Some((y, _)) = self.memo.get()
            && y == year
        {
            self.memo.set(None);
        }
        self.recorded.set_override(year, value);
    }

    pub fn recorded(&self) -> &Recorded<T> {
        &self.recorded
    }
}

impl<T: Copy> Default for Cached<T> {
    fn default() -> Self {
        Cached::new()
    }
}

/// One declared recorded property of an entity.
///
/// The explicit table of these replaces discovery-by-reflection: an entity
/// lists its properties as static data and `advance` walks the list.
pub struct PropertyDef<E> {
    pub name: &'static str,
    pub cached: bool,
    /// Snapshot this property's current-year value into its history.
    pub record: fn(&mut E) -> Result<()>,
}

/// An entity that lives year to year.
pub trait Temporal {
    fn clock(&self) -> &YearClock;

    fn clock_mut(&mut self) -> &mut YearClock;

    /// The entity's declared recorded properties.
    fn properties() -> &'static [PropertyDef<Self>]
    where
        Self: Sized + 'static;

    /// Hook that runs after the clock ticks; per-year working state is
    /// reset here.
    fn start_new_year(&mut self) {}

    fn this_year(&self) -> Year {
        self.clock().this_year
    }

    fn initial_year(&self) -> Year {
        self.clock().initial_year
    }

    /// Close out the current year and move to the next: snapshot every
    /// declared property, tick the clock, reset working state.
    fn advance(&mut self) -> Result<()>
    where
        Self: Sized + 'static,
    {
        for property in Self::properties() {
            (property.record)(self)?;
        }
        self.clock_mut().tick();
        self.start_new_year();
        Ok(())
    }
}

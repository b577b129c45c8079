//! Transfer scheduling within a year.
//!
//! A transfer asks for money to move at a time; the scheduler's job is to
//! pick the earliest time at or after the request where the source can
//! actually cover it, so balances stay non-negative when possible. When no
//! time works, the transfer happens at the requested time anyway and the
//! source goes negative: missing a payment is worse than an overdraft.
//!
//! Every applied movement lands in a ledger so a planning pass can be
//! unwound and re-run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::household::Household;
use crate::model::AccountId;
use crate::record::{PropertyDef, Temporal, Year, YearClock};
use crate::timing::{TransactionSeries, When, split_when};

/// Where a transfer endpoint lives. An omitted endpoint is the outside
/// world, which absorbs or supplies money without limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pool {
    /// The scheduler's own uncommitted cash pool.
    Available,
    Account(AccountId),
}

/// One applied movement of money.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transfer {
    pub value: f64,
    pub when: When,
    pub from: Option<Pool>,
    pub to: Option<Pool>,
}

pub struct Scheduler {
    clock: YearClock,
    available: TransactionSeries,
    available_history: BTreeMap<Year, TransactionSeries>,
    ledger: Vec<Transfer>,
}

static SCHEDULER_PROPERTIES: [PropertyDef<Scheduler>; 1] = [PropertyDef {
    name: "available",
    cached: false,
    record: Scheduler::record_available,
}];

impl Scheduler {
    pub fn new(initial_year: Year) -> Self {
        Scheduler {
            clock: YearClock::new(initial_year),
            available: TransactionSeries::new(),
            available_history: BTreeMap::new(),
            ledger: Vec::new(),
        }
    }

    /// This year's uncommitted cash flows.
    pub fn available(&self) -> &TransactionSeries {
        &self.available
    }

    pub fn available_for(&self, year: Year) -> Option<&TransactionSeries> {
        if year == self.clock.this_year {
            Some(&self.available)
        } else {
            self.available_history.get(&year)
        }
    }

    /// Net uncommitted cash for the year.
    pub fn total_available(&self) -> f64 {
        self.available.total()
    }

    pub fn ledger(&self) -> &[Transfer] {
        &self.ledger
    }

    /// Move `value` from `from` to `to` at (or after) `when`.
    ///
    /// A negative value swaps the endpoints. With `frequency` set, the value
    /// splits into that many equal parts at `(i + when) / frequency`, each
    /// placed independently. Unless `strict`, the time shifts to the
    /// earliest feasible moment as described in [`Scheduler::shift_when`];
    /// `strict` pins the requested time regardless of feasibility.
    #[allow(clippy::too_many_arguments)]
    pub fn schedule(
        &mut self,
        household: &mut Household,
        value: f64,
        when: When,
        frequency: Option<u32>,
        from: Option<Pool>,
        to: Option<Pool>,
        strict: bool,
    ) -> std::result::Result<(), ScheduleError> {
        if let Some(n) = frequency {
            let times = split_when(when, n)?;
            let share = value / n as f64;
            for w in times {
                self.schedule_one(household, share, w, from, to, strict)?;
            }
            return Ok(());
        }
        self.schedule_one(household, value, when, from, to, strict)
    }

    fn schedule_one(
        &mut self,
        household: &mut Household,
        value: f64,
        when: When,
        from: Option<Pool>,
        to: Option<Pool>,
        strict: bool,
    ) -> std::result::Result<(), ScheduleError> {
        let (value, from, to) = if value < 0.0 {
            (-value, to, from)
        } else {
            (value, from, to)
        };
        if value == 0.0 {
            return Ok(());
        }
        let when = if strict {
            when
        } else {
            self.shift_when(household, value, when, from)?
        };
        if let Some(pool) = from {
            self.apply(household, pool, -value, when)?;
        }
        if let Some(pool) = to {
            self.apply(household, pool, value, when)?;
        }
        self.ledger.push(Transfer {
            value,
            when,
            from,
            to,
        });
        Ok(())
    }

    /// Reverse every ledgered transfer, newest first, restoring the pool
    /// and account series to their pre-scheduling state.
    pub fn unwind(
        &mut self,
        household: &mut Household,
    ) -> std::result::Result<(), ScheduleError> {
        for transfer in std::mem::take(&mut self.ledger).into_iter().rev() {
            if let Some(pool) = transfer.to {
                self.apply(household, pool, -transfer.value, transfer.when)?;
            }
            if let Some(pool) = transfer.from {
                self.apply(household, pool, transfer.value, transfer.when)?;
            }
        }
        Ok(())
    }

    fn apply(
        &mut self,
        household: &mut Household,
        pool: Pool,
        value: f64,
        when: When,
    ) -> std::result::Result<(), ScheduleError> {
        match pool {
            Pool::Available => {
                self.available.add(when, value);
                Ok(())
            }
            Pool::Account(id) => household
                .add_transaction(id, value, when)
                .map_err(Into::into),
        }
    }

    /// The earliest time at or after `when` where the source covers `value`.
    ///
    /// Candidate times are the source's existing transaction times from
    /// `when` onward, plus `when` itself. For accounts, when two adjacent
    /// candidates straddle the requested value an interpolated candidate is
    /// added at the exact balance crossing. A candidate qualifies only if
    /// the withdrawable amount there and at every later candidate covers
    /// the value, so the withdrawal cannot strand a later commitment. With
    /// no qualifying candidate, the requested `when` is returned and the
    /// balance is allowed to go negative.
    fn shift_when(
        &self,
        household: &Household,
        value: f64,
        when: When,
        from: Option<Pool>,
    ) -> std::result::Result<When, ScheduleError> {
        let Some(pool) = from else {
            // external source, always feasible
            return Ok(when);
        };

        let mut times: Vec<When> = match pool {
            Pool::Available => self.available.times().filter(|t| *t >= when).collect(),
            Pool::Account(id) => household
                .account(id)?
                .transactions()
                .times()
                .filter(|t| *t >= when)
                .collect(),
        };
        if !times.contains(&when) {
            times.push(when);
        }
        times.sort();

        let mut withdrawable = Vec::with_capacity(times.len());
        for &t in &times {
            withdrawable.push(self.withdrawable_at(household, pool, t)?);
        }

        if let Pool::Account(id) = pool {
            let account = household.account(id)?;
            let mut crossings = Vec::new();
            for i in 1..times.len() {
                if (withdrawable[i - 1] < value) != (withdrawable[i] < value) {
                    let t = account.time_to_balance(value, times[i - 1])?;
                    if t > times[i - 1].value()
                        && t < times[i].value()
                        && let Ok(crossing) = When::new(t)
                    {
                        crossings.push(crossing);
                    }
                }
            }
            for crossing in crossings {
                if let Err(idx) = times.binary_search(&crossing) {
                    let amount = self.withdrawable_at(household, pool, crossing)?;
                    times.insert(idx, crossing);
                    withdrawable.insert(idx, amount);
                }
            }
        }

        let tolerance = value.abs().max(1.0) * 1e-9;
        let mut suffix_min = f64::INFINITY;
        let mut chosen = None;
        for i in (0..times.len()).rev() {
            suffix_min = suffix_min.min(withdrawable[i]);
            if suffix_min >= value - tolerance {
                chosen = Some(times[i]);
            }
        }
        Ok(chosen.unwrap_or(when))
    }

    fn withdrawable_at(
        &self,
        household: &Household,
        pool: Pool,
        t: When,
    ) -> std::result::Result<f64, ScheduleError> {
        match pool {
            Pool::Available => Ok(self.available.running_total(t)),
            Pool::Account(id) => Ok(-household.max_outflow(id, t)?),
        }
    }

    fn record_available(&mut self) -> Result<()> {
        let year = self.clock.this_year;
        if !self.available_history.contains_key(&year) {
            self.available_history.insert(year, self.available.clone());
        }
        Ok(())
    }
}

impl Temporal for Scheduler {
    fn clock(&self) -> &YearClock {
        &self.clock
    }

    fn clock_mut(&mut self) -> &mut YearClock {
        &mut self.clock
    }

    fn properties() -> &'static [PropertyDef<Self>] {
        &SCHEDULER_PROPERTIES
    }

    fn start_new_year(&mut self) {
        self.available.clear();
        self.ledger.clear();
    }
}

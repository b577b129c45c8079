//! Accounts: balance-bearing containers that grow, accept transactions,
//! and bound how money may move through them.
//!
//! An account's balance for a year is fully determined by the prior year's
//! closing state: last year's balance projected over the year plus each of
//! last year's transactions projected from its time to year end. Current-year
//! transactions therefore never disturb the current year's opening balance;
//! they show up in `balance_at` within the year and in next year's balance.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{LookupError, Result};
use crate::growth::{Compounding, accumulation_factor, project, time_to_factor};
use crate::model::{PersonId, RoomToken};
use crate::record::{Cached, PropertyDef, Recorded, Temporal, Year, YearClock};
use crate::timing::{TransactionSeries, When};

/// Where an account's yearly growth rate comes from.
#[derive(Clone)]
pub enum RateSource {
    Constant(f64),
    ByYear(FxHashMap<Year, f64>),
    Function(Rc<dyn Fn(Year) -> f64>),
}

impl RateSource {
    pub fn rate_for(&self, year: Year) -> Result<f64> {
        match self {
            RateSource::Constant(rate) => Ok(*rate),
            RateSource::ByYear(rates) => rates
                .get(&year)
                .copied()
                .ok_or(LookupError::RateNotFound { year }),
            RateSource::Function(f) => Ok(f(year)),
        }
    }
}

impl fmt::Debug for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSource::Constant(rate) => f.debug_tuple("Constant").field(rate).finish(),
            RateSource::ByYear(rates) => f.debug_tuple("ByYear").field(rates).finish(),
            RateSource::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// The flavor of an account, which decides its flow limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AccountKind {
    /// Plain balance-bearing account: unlimited inflow, outflow capped by
    /// the balance.
    Savings,
    /// Tax-advantaged account whose inflows are capped by contribution room
    /// tracked against its contributor.
    Registered {
        contributor: PersonId,
        token: RoomToken,
        /// Room for the account's first year, if known up front.
        initial_room: Option<f64>,
    },
    /// A liability. Balances are non-positive; inflows are payments.
    Debt {
        minimum_payment: f64,
        accelerated_payment: f64,
    },
}

/// Per-year value overrides applied at construction.
///
/// An overridden year always reads as the given value; snapshots and
/// invalidation leave it alone.
#[derive(Debug, Clone, Default)]
pub struct AccountOverrides {
    pub balance: BTreeMap<Year, f64>,
    pub rate: BTreeMap<Year, f64>,
    pub returns: BTreeMap<Year, f64>,
}

#[derive(Debug, Clone)]
pub struct Account {
    clock: YearClock,
    owner: Option<PersonId>,
    kind: AccountKind,
    rate_source: RateSource,
    compounding: Compounding,
    balance: Cached<f64>,
    rate: Cached<f64>,
    returns: Cached<f64>,
    taxable_income: Recorded<f64>,
    transactions: TransactionSeries,
    transactions_history: BTreeMap<Year, TransactionSeries>,
}

static ACCOUNT_PROPERTIES: [PropertyDef<Account>; 5] = [
    PropertyDef {
        name: "rate",
        cached: true,
        record: Account::record_rate,
    },
    PropertyDef {
        name: "balance",
        cached: true,
        record: Account::record_balance,
    },
    PropertyDef {
        name: "returns",
        cached: true,
        record: Account::record_returns,
    },
    PropertyDef {
        name: "transactions",
        cached: false,
        record: Account::record_transactions,
    },
    PropertyDef {
        name: "taxable_income",
        cached: false,
        record: Account::record_taxable_income,
    },
];

impl Account {
    /// Build an account opening in `initial_year` with the given balance.
    ///
    /// Debt balances are stored non-positive; the owed amount may be passed
    /// with either sign.
    pub fn new(
        initial_year: Year,
        balance: f64,
        rate_source: RateSource,
        compounding: Compounding,
        kind: AccountKind,
    ) -> Self {
        let balance = if matches!(kind, AccountKind::Debt { .. }) {
            -balance.abs()
        } else {
            balance
        };
        let mut seeded = Cached::new();
        seeded.seed(initial_year, balance);
        Account {
            clock: YearClock::new(initial_year),
            owner: None,
            kind,
            rate_source,
            compounding,
            balance: seeded,
            rate: Cached::new(),
            returns: Cached::new(),
            taxable_income: Recorded::new(),
            transactions: TransactionSeries::new(),
            transactions_history: BTreeMap::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: AccountOverrides) -> Self {
        for (year, value) in overrides.balance {
            self.balance.set_override(year, value);
        }
        for (year, value) in overrides.rate {
            self.rate.set_override(year, value);
        }
        for (year, value) in overrides.returns {
            self.returns.set_override(year, value);
        }
        self
    }

    pub fn kind(&self) -> &AccountKind {
        &self.kind
    }

    pub fn compounding(&self) -> Compounding {
        self.compounding
    }

    pub fn owner(&self) -> Option<PersonId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: PersonId) {
        self.owner = Some(owner);
    }

    /// This year's transactions.
    pub fn transactions(&self) -> &TransactionSeries {
        &self.transactions
    }

    /// The transactions of any year: the live series for the current year,
    /// recorded history otherwise.
    pub fn transactions_for(&self, year: Year) -> Option<&TransactionSeries> {
        if year == self.clock.this_year {
            Some(&self.transactions)
        } else {
            self.transactions_history.get(&year)
        }
    }

    /// The growth rate for `year`, resolved from the rate source and cached.
    pub fn rate_for(&self, year: Year) -> Result<f64> {
        if let Some(rate) = self.rate.get(year) {
            return Ok(rate);
        }
        let rate = self.rate_source.rate_for(year)?;
        self.rate.memoize(year, rate);
        Ok(rate)
    }

    pub fn rate(&self) -> Result<f64> {
        self.rate_for(self.clock.this_year)
    }

    /// The opening balance of `year`, derived year over year from the last
    /// recorded balance.
    pub fn balance_for(&self, year: Year) -> Result<f64> {
        if let Some(balance) = self.balance.get(year) {
            return Ok(balance);
        }
        let (start, mut balance) = self
            .balance
            .recorded()
            .latest_at_or_before(year)
            .map(|(y, v)| (y, *v))
            .ok_or(LookupError::BalanceNotRecorded { year })?;
        for y in start..year {
            let rate = self.rate_for(y)?;
            balance = project(balance, rate, self.compounding, 1.0);
            if let Some(transactions) = self.transactions_for(y) {
                for (when, value) in transactions.iter() {
                    balance += project(value, rate, self.compounding, 1.0 - when.value());
                }
            }
        }
        self.balance.memoize(year, balance);
        Ok(balance)
    }

    pub fn balance(&self) -> Result<f64> {
        self.balance_for(self.clock.this_year)
    }

    /// The balance at time `when` within the current year, including growth
    /// and every transaction at or before `when`.
    pub fn balance_at(&self, when: When) -> Result<f64> {
        let year = self.clock.this_year;
        let rate = self.rate_for(year)?;
        let mut balance = project(self.balance_for(year)?, rate, self.compounding, when.value());
        for (t, value) in self.transactions.iter() {
            if t <= when {
                balance += project(value, rate, self.compounding, when.value() - t.value());
            }
        }
        Ok(balance)
    }

    /// Growth earned over the current year, on the opening balance and on
    /// each transaction from its time to year end.
    pub fn returns(&self) -> Result<f64> {
        let year = self.clock.this_year;
        if let Some(returns) = self.returns.get(year) {
            return Ok(returns);
        }
        let rate = self.rate_for(year)?;
        let mut returns =
            self.balance_for(year)? * (accumulation_factor(rate, self.compounding, 1.0) - 1.0);
        for (t, value) in self.transactions.iter() {
            returns += value * (accumulation_factor(rate, self.compounding, 1.0 - t.value()) - 1.0);
        }
        self.returns.memoize(year, returns);
        Ok(returns)
    }

    /// Taxable income generated this year. Positive returns only; losses
    /// do not offset.
    pub fn taxable_income(&self) -> Result<f64> {
        if let Some(value) = self.taxable_income.get(self.clock.this_year) {
            return Ok(*value);
        }
        Ok(self.returns()?.max(0.0))
    }

    /// Taxable income for any year: recorded history, or computed fresh for
    /// the current year, or `None` for an unrecorded year.
    pub fn taxable_income_for(&self, year: Year) -> Result<Option<f64>> {
        if let Some(value) = self.taxable_income.get(year) {
            return Ok(Some(*value));
        }
        if year == self.clock.this_year {
            return self.taxable_income().map(Some);
        }
        Ok(None)
    }

    /// Record a signed flow at `when`. Entries at the same time merge.
    ///
    /// Invalidates the values that depend on this year's transactions:
    /// this year's returns and taxable income, and the following year's
    /// balance and returns.
    pub fn add_transaction(&mut self, value: f64, when: When) {
        self.transactions.add(when, value);
        let year = self.clock.this_year;
        self.returns.invalidate(year);
        self.taxable_income.invalidate(year);
        self.balance.invalidate(year + 1);
        self.returns.invalidate(year + 1);
    }

    /// Largest outflow allowed at `when`, as a non-positive value.
    pub fn max_outflow(&self, when: When) -> Result<f64> {
        match self.kind {
            AccountKind::Debt { .. } => Ok(0.0),
            _ => Ok((-self.balance_at(when)?).min(0.0)),
        }
    }

    pub fn min_outflow(&self, _when: When) -> Result<f64> {
        Ok(0.0)
    }

    /// Largest inflow allowed at `when`.
    ///
    /// Registered accounts need their contribution room for the year;
    /// querying without one is an error, distinct from a room of zero.
    pub fn max_inflow(&self, when: When, room: Option<f64>) -> Result<f64> {
        match &self.kind {
            AccountKind::Savings => Ok(f64::INFINITY),
            AccountKind::Registered { token, .. } => {
                let room = room.ok_or_else(|| LookupError::RoomNotSet {
                    token: token.clone(),
                    year: self.clock.this_year,
                })?;
                Ok((room - self.transactions.inflows()).max(0.0))
            }
            AccountKind::Debt {
                minimum_payment,
                accelerated_payment,
            } => {
                let outstanding = (-self.balance_at(when)?).max(0.0);
                let remaining =
                    (minimum_payment + accelerated_payment - self.transactions.inflows()).max(0.0);
                Ok(outstanding.min(remaining))
            }
        }
    }

    /// Smallest inflow required at `when`. Zero except for debts, which owe
    /// whatever is left of the minimum payment, capped at the outstanding
    /// balance.
    pub fn min_inflow(&self, when: When) -> Result<f64> {
        match &self.kind {
            AccountKind::Debt {
                minimum_payment, ..
            } => {
                let outstanding = (-self.balance_at(when)?).max(0.0);
                let remaining = (minimum_payment - self.transactions.inflows()).max(0.0);
                Ok(outstanding.min(remaining))
            }
            _ => Ok(0.0),
        }
    }

    /// The earliest time at or after `when` when the balance is at or above
    /// `value`, accounting for growth and scheduled transactions.
    ///
    /// Returns a value past 1.0 (possibly infinite) when the level is not
    /// reached within the year.
    pub fn time_to_balance(&self, value: f64, when: When) -> Result<f64> {
        let rate = self.rate_for(self.clock.this_year)?;
        let balance = self.balance_at(when)?;
        if balance >= value {
            return Ok(when.value());
        }
        let dt = if balance == 0.0 || (balance < 0.0) != (value < 0.0) {
            // growth alone never crosses or reaches zero
            f64::INFINITY
        } else {
            time_to_factor(value / balance, rate, self.compounding)
        };
        let mut target = when.value() + dt;
        if !(target >= when.value()) {
            // NaN or a crossing behind us; only a later transaction can help
            target = f64::INFINITY;
        }
        // a transaction before the crossing changes the trajectory; restart
        // from there
        for (t, _) in self.transactions.iter() {
            if t.value() > when.value() && t.value() < target {
                return self.time_to_balance(value, t);
            }
        }
        Ok(target)
    }

    fn record_rate(&mut self) -> Result<()> {
        let year = self.clock.this_year;
        let rate = self.rate_for(year)?;
        self.rate.record(year, rate);
        Ok(())
    }

    fn record_balance(&mut self) -> Result<()> {
        let year = self.clock.this_year;
        let balance = self.balance_for(year)?;
        self.balance.record(year, balance);
        Ok(())
    }

    fn record_returns(&mut self) -> Result<()> {
        let year = self.clock.this_year;
        let returns = self.returns()?;
        self.returns.record(year, returns);
        Ok(())
    }

    fn record_transactions(&mut self) -> Result<()> {
        let year = self.clock.this_year;
        if !self.transactions_history.contains_key(&year) {
            self.transactions_history
                .insert(year, self.transactions.clone());
        }
        Ok(())
    }

    fn record_taxable_income(&mut self) -> Result<()> {
        let year = self.clock.this_year;
        if !self.taxable_income.contains(year) {
            let value = self.taxable_income()?;
            self.taxable_income.record(year, value);
        }
        Ok(())
    }
}

impl Temporal for Account {
    fn clock(&self) -> &YearClock {
        &self.clock
    }

    fn clock_mut(&mut self) -> &mut YearClock {
        &mut self.clock
    }

    fn properties() -> &'static [PropertyDef<Self>] {
        &ACCOUNT_PROPERTIES
    }

    fn start_new_year(&mut self) {
        self.transactions.clear();
    }
}

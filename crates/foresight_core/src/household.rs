//! The household arena: people and accounts held by id, plus the
//! coordination rules for moving them through years together.
//!
//! Entities refer to each other by id only, so ownership stays acyclic.
//! Advancement keeps a partial order rather than a global step: advancing an
//! account first brings its people up to date, and a registered account's
//! contribution room for the new year is computed from the old year's state
//! before the boundary, then assigned after it. Room is therefore always
//! decided one step ahead of the year that consumes it.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::account::{Account, AccountKind};
use crate::error::{AdvanceError, LookupError, PolicyError, Result};
use crate::model::{AccountId, PersonId, RoomToken};
use crate::person::Person;
use crate::record::{Temporal, Year};
use crate::tax::TaxInputs;
use crate::timing::When;

/// Computes next year's contribution room from an account's current-year
/// state and the room it had this year (`None` when never assigned).
pub type RoomAccrual = Rc<dyn Fn(&Account, Option<f64>) -> f64>;

#[derive(Default)]
pub struct Household {
    people: FxHashMap<PersonId, Person>,
    accounts: FxHashMap<AccountId, Account>,
    room_accruals: FxHashMap<AccountId, RoomAccrual>,
    next_person: u16,
    next_account: u16,
}

impl Household {
    pub fn new() -> Self {
        Household::default()
    }

    pub fn add_person(&mut self, person: Person) -> PersonId {
        let id = PersonId(self.next_person);
        self.next_person += 1;
        self.people.insert(id, person);
        id
    }

    /// Add an account, wiring its owner back-reference and, for registered
    /// accounts, registering its room token with the contributor (seeding
    /// the first year's room if one was given).
    pub fn add_account(&mut self, owner: Option<PersonId>, mut account: Account) -> Result<AccountId> {
        if let Some(pid) = owner
            && !self.people.contains_key(&pid)
        {
            return Err(LookupError::PersonNotFound(pid));
        }
        let registered = match account.kind() {
            AccountKind::Registered {
                contributor,
                token,
                initial_room,
            } => Some((*contributor, token.clone(), *initial_room)),
            _ => None,
        };
        if let Some((contributor, _, _)) = &registered
            && !self.people.contains_key(contributor)
        {
            return Err(LookupError::PersonNotFound(*contributor));
        }

        let id = AccountId(self.next_account);
        self.next_account += 1;
        if let Some(pid) = owner {
            account.set_owner(pid);
            if let Some(person) = self.people.get_mut(&pid) {
                person.attach_account(id);
            }
        }
        if let Some((contributor, token, initial_room)) = registered {
            let initial_year = account.initial_year();
            if let Some(person) = self.people.get_mut(&contributor) {
                person.rooms_mut().register(&token);
                if let Some(room) = initial_room {
                    person.rooms_mut().record_room(&token, initial_year, room);
                }
            }
        }
        self.accounts.insert(id, account);
        Ok(id)
    }

    /// Install the room accrual function for a registered account. Required
    /// before the account can be advanced.
    pub fn set_room_accrual(
        &mut self,
        id: AccountId,
        accrual: RoomAccrual,
    ) -> std::result::Result<(), AdvanceError> {
        let account = self
            .accounts
            .get(&id)
            .ok_or(LookupError::AccountNotFound(id))?;
        if !matches!(account.kind(), AccountKind::Registered { .. }) {
            return Err(PolicyError::NotRegistered(id).into());
        }
        self.room_accruals.insert(id, accrual);
        Ok(())
    }

    pub fn person(&self, id: PersonId) -> Result<&Person> {
        self.people.get(&id).ok_or(LookupError::PersonNotFound(id))
    }

    pub fn account(&self, id: AccountId) -> Result<&Account> {
        self.accounts
            .get(&id)
            .ok_or(LookupError::AccountNotFound(id))
    }

    pub fn account_mut(&mut self, id: AccountId) -> Result<&mut Account> {
        self.accounts
            .get_mut(&id)
            .ok_or(LookupError::AccountNotFound(id))
    }

    pub fn people(&self) -> impl Iterator<Item = (PersonId, &Person)> {
        self.people.iter().map(|(id, p)| (*id, p))
    }

    pub fn accounts(&self) -> impl Iterator<Item = (AccountId, &Account)> {
        self.accounts.iter().map(|(id, a)| (*id, a))
    }

    // ------------------------------------------------------------------
    // Id-keyed query surface
    // ------------------------------------------------------------------

    pub fn balance_at(&self, id: AccountId, when: When) -> Result<f64> {
        self.account(id)?.balance_at(when)
    }

    pub fn add_transaction(&mut self, id: AccountId, value: f64, when: When) -> Result<()> {
        self.account_mut(id)?.add_transaction(value, when);
        Ok(())
    }

    /// The contribution room available to a registered account for its
    /// current year. `Ok(None)` means unknown (never assigned) or not a
    /// registered account.
    pub fn contribution_room(&self, id: AccountId) -> Result<Option<f64>> {
        let account = self.account(id)?;
        match account.kind() {
            AccountKind::Registered {
                contributor, token, ..
            } => {
                let person = self
                    .people
                    .get(contributor)
                    .ok_or(LookupError::PersonNotFound(*contributor))?;
                Ok(person.room(token, account.this_year()))
            }
            _ => Ok(None),
        }
    }

    pub fn max_inflow(&self, id: AccountId, when: When) -> Result<f64> {
        let account = self.account(id)?;
        let room = match account.kind() {
            AccountKind::Registered { .. } => self.contribution_room(id)?,
            _ => None,
        };
        account.max_inflow(when, room)
    }

    pub fn max_outflow(&self, id: AccountId, when: When) -> Result<f64> {
        self.account(id)?.max_outflow(when)
    }

    pub fn min_inflow(&self, id: AccountId, when: When) -> Result<f64> {
        self.account(id)?.min_inflow(when)
    }

    pub fn min_outflow(&self, id: AccountId, when: When) -> Result<f64> {
        self.account(id)?.min_outflow(when)
    }

    /// Aggregate the tax inputs every account produced for `year`. Accounts
    /// with nothing recorded for that year contribute nothing.
    pub fn tax_inputs(&self, year: Year) -> Result<TaxInputs> {
        let mut inputs = TaxInputs::default();
        for account in self.accounts.values() {
            if let Some(income) = account.taxable_income_for(year)? {
                inputs.taxable_income += income;
            }
        }
        Ok(inputs)
    }

    // ------------------------------------------------------------------
    // Advancement
    // ------------------------------------------------------------------

    /// Move one account across its year boundary.
    ///
    /// Registered accounts accrue next year's room from this year's state
    /// first (a missing accrual function fails fast), then advance, then
    /// pull their people up to the new year, then receive the accrued room.
    pub fn advance_account(&mut self, id: AccountId) -> std::result::Result<(), AdvanceError> {
        let account = self
            .accounts
            .get(&id)
            .ok_or(LookupError::AccountNotFound(id))?;
        let year = account.this_year();
        let owner = account.owner();
        let registered = match account.kind() {
            AccountKind::Registered {
                contributor, token, ..
            } => Some((*contributor, token.clone())),
            _ => None,
        };

        let next_room = if let Some((contributor, token)) = &registered {
            let accrual = self
                .room_accruals
                .get(&id)
                .cloned()
                .ok_or(PolicyError::MissingRoomAccrual(id))?;
            let current = self
                .people
                .get(contributor)
                .ok_or(LookupError::PersonNotFound(*contributor))?
                .room(token, year);
            let account = self
                .accounts
                .get(&id)
                .ok_or(LookupError::AccountNotFound(id))?;
            Some(accrual(account, current))
        } else {
            None
        };

        let account = self
            .accounts
            .get_mut(&id)
            .ok_or(LookupError::AccountNotFound(id))?;
        account.advance()?;
        let new_year = account.this_year();

        if let Some(pid) = owner {
            self.catch_up_person(pid, new_year)?;
        }
        if let Some((contributor, token)) = registered {
            self.catch_up_person(contributor, new_year)?;
            if let Some(room) = next_room {
                let person = self
                    .people
                    .get_mut(&contributor)
                    .ok_or(LookupError::PersonNotFound(contributor))?;
                person.rooms_mut().set_room(&token, new_year, room);
            }
        }
        Ok(())
    }

    /// Advance every entity to one year past the furthest-ahead entity.
    /// Entities already ahead advance less; none advances past the target.
    pub fn advance_year(&mut self) -> std::result::Result<(), AdvanceError> {
        let furthest = self
            .people
            .values()
            .map(|p| p.this_year())
            .chain(self.accounts.values().map(|a| a.this_year()))
            .max();
        let Some(furthest) = furthest else {
            return Ok(());
        };
        let target = furthest + 1;

        let mut ids: Vec<AccountId> = self.accounts.keys().copied().collect();
        ids.sort();
        for id in ids {
            while self.account(id)?.this_year() < target {
                self.advance_account(id)?;
            }
        }
        let mut pids: Vec<PersonId> = self.people.keys().copied().collect();
        pids.sort();
        for pid in pids {
            self.catch_up_person(pid, target)?;
        }
        Ok(())
    }

    fn catch_up_person(
        &mut self,
        id: PersonId,
        year: Year,
    ) -> std::result::Result<(), AdvanceError> {
        let person = self
            .people
            .get_mut(&id)
            .ok_or(LookupError::PersonNotFound(id))?;
        while person.this_year() < year {
            person.advance()?;
        }
        Ok(())
    }

    /// The room token of a registered account, if it is one.
    pub fn room_token(&self, id: AccountId) -> Result<Option<&RoomToken>> {
        match self.account(id)?.kind() {
            AccountKind::Registered { token, .. } => Ok(Some(token)),
            _ => Ok(None),
        }
    }
}

use std::fmt;

use crate::model::{AccountId, PersonId, RoomToken};
use crate::record::Year;

/// Errors related to in-year timing values
#[derive(Debug, Clone)]
pub enum TimingError {
    /// A `when` value outside the [0, 1] year fraction range
    WhenOutOfRange(f64),
    /// A `when` string that is neither "start", "end", nor a number
    UnknownWhen(String),
    /// An unrecognized compounding frequency code
    UnknownFrequency(String),
    /// A periodic frequency of zero
    ZeroPeriods,
}

impl fmt::Display for TimingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingError::WhenOutOfRange(v) => {
                write!(f, "time {v} is outside the year fraction range [0, 1]")
            }
            TimingError::UnknownWhen(s) => write!(f, "cannot interpret {s:?} as a time"),
            TimingError::UnknownFrequency(s) => {
                write!(f, "unknown compounding frequency code {s:?}")
            }
            TimingError::ZeroPeriods => write!(f, "compounding frequency must be non-zero"),
        }
    }
}

impl std::error::Error for TimingError {}

/// Errors related to resource lookups
#[derive(Debug, Clone)]
pub enum LookupError {
    AccountNotFound(AccountId),
    PersonNotFound(PersonId),
    /// A by-year rate source has no entry for the requested year
    RateNotFound { year: Year },
    /// Contribution room queried before any value was assigned for the year
    RoomNotSet { token: RoomToken, year: Year },
    /// No balance recorded at or before the requested year
    BalanceNotRecorded { year: Year },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::AccountNotFound(id) => write!(f, "account {id:?} not found"),
            LookupError::PersonNotFound(id) => write!(f, "person {id:?} not found"),
            LookupError::RateNotFound { year } => {
                write!(f, "no rate available for year {year}")
            }
            LookupError::RoomNotSet { token, year } => {
                write!(f, "contribution room {token} not set for year {year}")
            }
            LookupError::BalanceNotRecorded { year } => {
                write!(f, "no balance recorded for year {year}")
            }
        }
    }
}

impl std::error::Error for LookupError {}

pub type Result<T> = std::result::Result<T, LookupError>;

/// Errors from missing or mismatched entity wiring
#[derive(Debug, Clone)]
pub enum PolicyError {
    /// A registered account was advanced without a room accrual function
    MissingRoomAccrual(AccountId),
    /// A room operation on an account that is not a registered account
    NotRegistered(AccountId),
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::MissingRoomAccrual(id) => {
                write!(f, "registered account {id:?} has no room accrual function")
            }
            PolicyError::NotRegistered(id) => {
                write!(f, "account {id:?} is not a registered account")
            }
        }
    }
}

impl std::error::Error for PolicyError {}

/// Errors surfaced while advancing entities through a year boundary
#[derive(Debug, Clone)]
pub enum AdvanceError {
    Lookup(LookupError),
    Policy(PolicyError),
}

impl fmt::Display for AdvanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdvanceError::Lookup(e) => write!(f, "{e}"),
            AdvanceError::Policy(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AdvanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AdvanceError::Lookup(e) => Some(e),
            AdvanceError::Policy(e) => Some(e),
        }
    }
}

impl From<LookupError> for AdvanceError {
    fn from(e: LookupError) -> Self {
        AdvanceError::Lookup(e)
    }
}

impl From<PolicyError> for AdvanceError {
    fn from(e: PolicyError) -> Self {
        AdvanceError::Policy(e)
    }
}

/// Errors surfaced while scheduling transfers
#[derive(Debug, Clone)]
pub enum ScheduleError {
    Timing(TimingError),
    Lookup(LookupError),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::Timing(e) => write!(f, "{e}"),
            ScheduleError::Lookup(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ScheduleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScheduleError::Timing(e) => Some(e),
            ScheduleError::Lookup(e) => Some(e),
        }
    }
}

impl From<TimingError> for ScheduleError {
    fn from(e: TimingError) -> Self {
        ScheduleError::Timing(e)
    }
}

impl From<LookupError> for ScheduleError {
    fn from(e: LookupError) -> Self {
        ScheduleError::Lookup(e)
    }
}

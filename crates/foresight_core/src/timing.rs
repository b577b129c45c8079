//! In-year timing values and per-year transaction series.
//!
//! Times within a year are fractions in [0, 1]: 0 is the start of the year,
//! 1 the end, 0.5 mid-year. `When` enforces the range at construction and
//! carries a total order so it can key ordered maps.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TimingError;

/// A point in time within a year, as a fraction in [0, 1].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct When(f64);

impl When {
    pub const START: When = When(0.0);
    pub const MID: When = When(0.5);
    pub const END: When = When(1.0);

    /// Build a `When` from a year fraction. Values outside [0, 1] are
    /// rejected, never clamped.
    pub fn new(value: f64) -> Result<Self, TimingError> {
        if (0.0..=1.0).contains(&value) {
            Ok(When(value))
        } else {
            Err(TimingError::WhenOutOfRange(value))
        }
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for When {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0).is_eq()
    }
}

impl Eq for When {}

impl PartialOrd for When {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for When {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for When {
    type Err = TimingError;

    /// Accepts "start", "end", or a numeric year fraction.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(When::START),
            "end" => Ok(When::END),
            other => match other.parse::<f64>() {
                Ok(v) => When::new(v),
                Err(_) => Err(TimingError::UnknownWhen(other.to_string())),
            },
        }
    }
}

impl<'de> Deserialize<'de> for When {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        When::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Split a value's timing into `frequency` equal sub-times at
/// `(i + when) / frequency`. All results stay within [0, 1].
pub fn split_when(when: When, frequency: u32) -> Result<Vec<When>, TimingError> {
    if frequency == 0 {
        return Err(TimingError::ZeroPeriods);
    }
    let n = frequency as f64;
    (0..frequency)
        .map(|i| When::new((i as f64 + when.value()) / n))
        .collect()
}

/// Signed money flows within a single year, keyed by time.
///
/// Entries at an identical time merge into one signed sum; an entry that
/// nets to exactly zero is dropped. Positive values are inflows, negative
/// values outflows.
#[derive(Debug, Clone, Default)]
pub struct TransactionSeries {
    entries: BTreeMap<When, f64>,
}

impl TransactionSeries {
    pub fn new() -> Self {
        TransactionSeries {
            entries: BTreeMap::new(),
        }
    }

    /// Add a signed value at `when`, merging with any existing entry there.
    pub fn add(&mut self, when: When, value: f64) {
        let total = self.entries.entry(when).or_insert(0.0);
        *total += value;
        if *total == 0.0 {
            self.entries.remove(&when);
        }
    }

    /// The net value recorded at exactly `when` (0 if none).
    pub fn get(&self, when: When) -> f64 {
        self.entries.get(&when).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (When, f64)> + '_ {
        self.entries.iter().map(|(w, v)| (*w, *v))
    }

    pub fn times(&self) -> impl Iterator<Item = When> + '_ {
        self.entries.keys().copied()
    }

    /// Sum of all entries at or before `until`.
    pub fn running_total(&self, until: When) -> f64 {
        self.entries
            .range(..=until)
            .map(|(_, v)| v)
            .sum()
    }

    /// Sum of all positive entries.
    pub fn inflows(&self) -> f64 {
        self.entries.values().filter(|v| **v > 0.0).sum()
    }

    /// Sum of all negative entries.
    pub fn outflows(&self) -> f64 {
        self.entries.values().filter(|v| **v < 0.0).sum()
    }

    /// Net sum of all entries.
    pub fn total(&self) -> f64 {
        self.entries.values().sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_when_rejects_out_of_range() {
        assert!(When::new(-0.1).is_err());
        assert!(When::new(1.1).is_err());
        assert!(When::new(0.0).is_ok());
        assert!(When::new(1.0).is_ok());
    }

    #[test]
    fn test_when_from_str() {
        assert_eq!("start".parse::<When>().unwrap(), When::START);
        assert_eq!("end".parse::<When>().unwrap(), When::END);
        assert_eq!("0.25".parse::<When>().unwrap(), When::new(0.25).unwrap());
        assert!("soon".parse::<When>().is_err());
        assert!("1.5".parse::<When>().is_err());
    }

    #[test]
    fn test_split_when_quarterly() {
        let times = split_when(When::MID, 4).unwrap();
        let expected = [0.125, 0.375, 0.625, 0.875];
        assert_eq!(times.len(), 4);
        for (t, e) in times.iter().zip(expected) {
            assert!(
                (t.value() - e).abs() < 1e-12,
                "expected {e}, got {}",
                t.value()
            );
        }
    }

    #[test]
    fn test_split_when_end_stays_in_range() {
        let times = split_when(When::END, 12).unwrap();
        assert!(times.iter().all(|t| t.value() <= 1.0));
    }

    #[test]
    fn test_split_when_zero_periods() {
        assert!(split_when(When::MID, 0).is_err());
    }

    #[test]
    fn test_series_merges_identical_times() {
        let mut series = TransactionSeries::new();
        series.add(When::MID, 100.0);
        series.add(When::MID, -30.0);
        assert_eq!(series.len(), 1);
        assert_eq!(series.get(When::MID), 70.0);
    }

    #[test]
    fn test_series_drops_zero_entries() {
        let mut series = TransactionSeries::new();
        series.add(When::MID, 100.0);
        series.add(When::MID, -100.0);
        assert!(series.is_empty());
    }

    #[test]
    fn test_series_running_total() {
        let mut series = TransactionSeries::new();
        series.add(When::START, 50.0);
        series.add(When::MID, 50.0);
        series.add(When::END, -25.0);
        assert_eq!(series.running_total(When::START), 50.0);
        assert_eq!(series.running_total(When::new(0.75).unwrap()), 100.0);
        assert_eq!(series.running_total(When::END), 75.0);
    }

    #[test]
    fn test_series_flow_sums() {
        let mut series = TransactionSeries::new();
        series.add(When::START, 50.0);
        series.add(When::MID, -20.0);
        assert_eq!(series.inflows(), 50.0);
        assert_eq!(series.outflows(), -20.0);
        assert_eq!(series.total(), 30.0);
    }
}

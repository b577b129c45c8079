//! Compound growth math.
//!
//! All projection is nominal-rate compounding over fractions of a year:
//! `e^(r·t)` for continuous compounding, `(1 + r/n)^(n·t)` for n periods
//! per year. Fractional `t` between period boundaries is evaluated with the
//! same closed form, which does not match how a real bank credits interest
//! mid-period; it is the standard smooth approximation.
//!
//! Negative `t` discounts instead of growing (the present-value direction).

use serde::{Deserialize, Serialize};

use crate::error::TimingError;

/// How often growth compounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compounding {
    Continuous,
    /// Discrete compounding with this many periods per year
    Periodic(u32),
}

impl Compounding {
    /// Number of periods per year, or `None` for continuous.
    pub fn periods(self) -> Option<u32> {
        match self {
            Compounding::Continuous => None,
            Compounding::Periodic(n) => Some(n),
        }
    }

    /// Build from a discrete period count. Zero is rejected.
    pub fn from_periods(n: u32) -> Result<Self, TimingError> {
        if n == 0 {
            Err(TimingError::ZeroPeriods)
        } else {
            Ok(Compounding::Periodic(n))
        }
    }

    /// Parse a conventional frequency code:
    /// `C` continuous, `D` daily (365), `W` weekly (52), `BW` biweekly (26),
    /// `SM` semi-monthly (24), `M` monthly (12), `BM` bimonthly (6),
    /// `Q` quarterly (4), `SA` semi-annual (2), `A` annual (1).
    pub fn from_code(code: &str) -> Result<Self, TimingError> {
        let n = match code {
            "C" => return Ok(Compounding::Continuous),
            "D" => 365,
            "W" => 52,
            "BW" => 26,
            "SM" => 24,
            "M" => 12,
            "BM" => 6,
            "Q" => 4,
            "SA" => 2,
            "A" => 1,
            other => return Err(TimingError::UnknownFrequency(other.to_string())),
        };
        Ok(Compounding::Periodic(n))
    }
}

/// Growth factor after `t` years at nominal rate `rate`.
#[inline]
pub fn accumulation_factor(rate: f64, compounding: Compounding, t: f64) -> f64 {
    match compounding {
        Compounding::Continuous => (rate * t).exp(),
        Compounding::Periodic(n) => {
            let n = n as f64;
            (1.0 + rate / n).powf(n * t)
        }
    }
}

/// Project `value` over `dt` years.
#[inline]
pub fn project(value: f64, rate: f64, compounding: Compounding, dt: f64) -> f64 {
    value * accumulation_factor(rate, compounding, dt)
}

/// Years needed for the growth factor to reach `factor`; the inverse of
/// [`accumulation_factor`].
///
/// With `rate == 0` the factor never moves, so the answer is 0 for a factor
/// of exactly 1 and `±inf` otherwise. A non-positive `factor` is unreachable
/// by compounding and yields a non-finite result.
pub fn time_to_factor(factor: f64, rate: f64, compounding: Compounding) -> f64 {
    if rate == 0.0 {
        return if factor == 1.0 {
            0.0
        } else if factor > 1.0 {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
    }
    match compounding {
        Compounding::Continuous => factor.ln() / rate,
        Compounding::Periodic(n) => {
            let n = n as f64;
            factor.ln() / ((1.0 + rate / n).ln() * n)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_continuous_factor() {
        assert!(close(
            accumulation_factor(0.05, Compounding::Continuous, 1.0),
            (0.05f64).exp()
        ));
        assert!(close(
            accumulation_factor(0.05, Compounding::Continuous, 0.0),
            1.0
        ));
    }

    #[test]
    fn test_periodic_factor() {
        // 100% annually compounded once doubles in a year
        assert!(close(
            accumulation_factor(1.0, Compounding::Periodic(1), 1.0),
            2.0
        ));
        // monthly compounding beats annual at the same nominal rate
        let monthly = accumulation_factor(0.12, Compounding::Periodic(12), 1.0);
        let annual = accumulation_factor(0.12, Compounding::Periodic(1), 1.0);
        assert!(
            monthly > annual,
            "monthly {monthly:.6} should exceed annual {annual:.6}"
        );
    }

    #[test]
    fn test_negative_t_discounts() {
        let grow = accumulation_factor(0.07, Compounding::Periodic(12), 1.0);
        let shrink = accumulation_factor(0.07, Compounding::Periodic(12), -1.0);
        assert!(close(grow * shrink, 1.0));
    }

    #[test]
    fn test_frequency_codes() {
        assert_eq!(Compounding::from_code("C").unwrap(), Compounding::Continuous);
        assert_eq!(
            Compounding::from_code("M").unwrap(),
            Compounding::Periodic(12)
        );
        assert_eq!(
            Compounding::from_code("BW").unwrap(),
            Compounding::Periodic(26)
        );
        assert!(Compounding::from_code("X").is_err());
    }

    #[test]
    fn test_zero_periods_rejected() {
        assert!(Compounding::from_periods(0).is_err());
    }

    #[test]
    fn test_time_to_factor_round_trip() {
        for compounding in [Compounding::Continuous, Compounding::Periodic(12)] {
            let t = time_to_factor(1.5, 0.06, compounding);
            let factor = accumulation_factor(0.06, compounding, t);
            assert!(
                close(factor, 1.5),
                "round trip via {compounding:?} gave {factor:.9}"
            );
        }
    }

    #[test]
    fn test_time_to_factor_zero_rate() {
        let c = Compounding::Continuous;
        assert_eq!(time_to_factor(1.0, 0.0, c), 0.0);
        assert_eq!(time_to_factor(2.0, 0.0, c), f64::INFINITY);
        assert_eq!(time_to_factor(0.5, 0.0, c), f64::NEG_INFINITY);
    }

    #[test]
    fn test_time_to_factor_negative_rate() {
        // decay to half the value takes positive time at a negative rate
        let t = time_to_factor(0.5, -0.05, Compounding::Continuous);
        assert!(t > 0.0, "expected positive time, got {t}");
    }
}

//! The seam where tax policy plugs in.
//!
//! The engine only aggregates what accounts produce; bracket tables,
//! jurisdictions, and filing rules live outside the crate and arrive as a
//! [`TaxTreatment`] callable.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::record::Year;

/// Per-year aggregates a tax treatment consumes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxInputs {
    pub taxable_income: f64,
    pub credits: f64,
    pub deductions: f64,
}

/// External tax policy: inputs and a year in, tax owed out.
pub type TaxTreatment = Rc<dyn Fn(&TaxInputs, Year) -> f64>;

/// A single-rate treatment. Mostly useful in tests and examples.
pub fn flat_tax(rate: f64) -> TaxTreatment {
    Rc::new(move |inputs, _year| {
        let base = (inputs.taxable_income - inputs.deductions).max(0.0);
        (base * rate - inputs.credits).max(0.0)
    })
}

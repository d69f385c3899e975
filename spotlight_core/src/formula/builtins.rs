// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The fixed set of functions a formula may call.

use super::FormulaError;

/// A callable builtin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `loanReverse(monthlyPayment, annualRatePercent, years)`.
    LoanReverse,
    /// `min(a, b, ...)`.
    Min,
    /// `max(a, b, ...)`.
    Max,
    /// `round(x)`, half away from zero.
    Round,
}

impl Builtin {
    /// Every builtin, in documentation order.
    pub const ALL: [Self; 4] = [Self::LoanReverse, Self::Min, Self::Max, Self::Round];

    /// Resolves a function name. Names are case-sensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    /// The name formulas call it by.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::LoanReverse => "loanReverse",
            Self::Min => "min",
            Self::Max => "max",
            Self::Round => "round",
        }
    }

    /// Checks the argument count.
    pub(crate) fn check_arity(self, got: usize) -> Result<(), FormulaError> {
        let ok = match self {
            Self::LoanReverse => got == 3,
            Self::Round => got == 1,
            Self::Min | Self::Max => got >= 1,
        };
        if ok {
            Ok(())
        } else {
            Err(FormulaError::Arity {
                name: self.name(),
                got,
            })
        }
    }

    /// Applies the builtin. Arity was checked at parse time.
    pub(crate) fn apply(self, args: &[f64]) -> f64 {
        match self {
            Self::LoanReverse => loan_reverse(args[0], args[1], args[2]),
            Self::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Round => args[0].round(),
        }
    }
}

/// Principal that `monthly_payment` pays off over `years` at
/// `annual_rate_percent` interest, compounded monthly.
///
/// This inverts the standard amortization payment
/// `P = L·r(1+r)^n / ((1+r)^n − 1)` with `r` the monthly rate and `n` the
/// number of months. At a zero rate the principal is simply
/// `monthly_payment · n`. A non-positive term yields `0`.
///
/// ```
/// use spotlight_core::formula::builtins::loan_reverse;
/// assert_eq!(loan_reverse(10.0, 0.0, 1.0), 120.0);
/// ```
#[must_use]
pub fn loan_reverse(monthly_payment: f64, annual_rate_percent: f64, years: f64) -> f64 {
    let months = years * 12.0;
    if months <= 0.0 {
        return 0.0;
    }
    let rate = annual_rate_percent / 100.0 / 12.0;
    if rate == 0.0 {
        return monthly_payment * months;
    }
    let growth = (1.0 + rate).powf(months);
    let factor = rate * growth / (growth - 1.0);
    monthly_payment / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loan_reverse_matches_reference_amortization() {
        // 12 万円/month, 1.5%/year, 35 years.
        let principal = loan_reverse(12.0, 1.5, 35.0);

        // Reference: discount each of the 420 payments back to today.
        let r: f64 = 0.015 / 12.0;
        let mut reference = 0.0;
        let mut discount = 1.0;
        for _ in 0..420 {
            discount /= 1.0 + r;
            reference += 12.0 * discount;
        }
        assert!(
            (principal - reference).abs() < 1e-6,
            "closed form {principal} vs discounted sum {reference}"
        );
        assert!(
            (3915.0..3925.0).contains(&principal),
            "expected roughly 3,919 万円, got {principal}"
        );
    }

    #[test]
    fn loan_reverse_edge_cases() {
        assert_eq!(loan_reverse(10.0, 0.0, 2.0), 240.0);
        assert_eq!(loan_reverse(10.0, 1.5, 0.0), 0.0);
        assert_eq!(loan_reverse(10.0, 1.5, -5.0), 0.0);
    }

    #[test]
    fn names_round_trip() {
        for b in Builtin::ALL {
            assert_eq!(Builtin::from_name(b.name()), Some(b));
        }
        assert_eq!(Builtin::from_name("Max"), None);
        assert_eq!(Builtin::from_name("eval"), None);
    }

    #[test]
    fn arity_rules() {
        assert!(Builtin::Round.check_arity(1).is_ok());
        assert!(Builtin::Round.check_arity(2).is_err());
        assert!(Builtin::LoanReverse.check_arity(2).is_err());
        assert!(Builtin::Min.check_arity(0).is_err());
        assert!(Builtin::Max.check_arity(5).is_ok());
    }

    #[test]
    fn min_max_round() {
        assert_eq!(Builtin::Min.apply(&[3.0, -1.0, 2.0]), -1.0);
        assert_eq!(Builtin::Max.apply(&[3.0, -1.0, 2.0]), 3.0);
        assert_eq!(Builtin::Round.apply(&[2.5]), 3.0);
        assert_eq!(Builtin::Round.apply(&[-2.5]), -3.0);
    }
}

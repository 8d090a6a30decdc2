//! Close-to-close volatility estimate.
//!
//! A cheap ATR-style proxy: the mean absolute move between consecutive
//! closes, expressed as a percentage of the most recent close.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Decimal places kept on the published percentage.
pub const VOLATILITY_DP: u32 = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimateError {
    #[error("need at least 2 closes, got {len}")]
    InsufficientData { len: usize },

    #[error("most recent close is zero")]
    Division,

    #[error("closes out of decimal range")]
    Overflow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VolatilityEstimate {
    /// Most recent close.
    pub reference_price: Decimal,
    /// Unrounded mean absolute close-to-close change.
    pub mean_abs_delta: Decimal,
    /// `mean_abs_delta / reference_price * 100`, rounded half away from zero.
    pub volatility_pct: Decimal,
}

/// Estimates volatility from closes ordered oldest to newest.
pub fn estimate(closes: &[Decimal]) -> Result<VolatilityEstimate, EstimateError> {
    let n = closes.len();
    if n < 2 {
        return Err(EstimateError::InsufficientData { len: n });
    }

    let reference_price = closes[n - 1];
    if reference_price.is_zero() {
        return Err(EstimateError::Division);
    }

    let total = closes.windows(2).try_fold(Decimal::ZERO, |acc, w| {
        w[1].checked_sub(w[0])
            .and_then(|delta| acc.checked_add(delta.abs()))
            .ok_or(EstimateError::Overflow)
    })?;
    let mean_abs_delta = total
        .checked_div(Decimal::from(n - 1))
        .ok_or(EstimateError::Overflow)?;

    // abs() keeps the percentage non-negative on a (nonsensical) negative feed.
    let volatility_pct = mean_abs_delta
        .checked_div(reference_price.abs())
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(EstimateError::Overflow)?
        .round_dp_with_strategy(VOLATILITY_DP, RoundingStrategy::MidpointAwayFromZero);

    Ok(VolatilityEstimate {
        reference_price,
        mean_abs_delta,
        volatility_pct,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn price() -> impl Strategy<Value = Decimal> {
        // 0.0001 ..= 1_000_000.0000
        (1i64..=10_000_000_000i64).prop_map(|units| Decimal::new(units, 4))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]
        #[test]
        fn volatility_is_never_negative(closes in prop::collection::vec(price(), 2..16)) {
            let est = estimate(&closes).unwrap();
            prop_assert!(est.volatility_pct >= Decimal::ZERO);
            prop_assert_eq!(est.reference_price, *closes.last().unwrap());
        }

        #[test]
        fn constant_closes_give_zero(p in price(), n in 2usize..16) {
            let est = estimate(&vec![p; n]).unwrap();
            prop_assert_eq!(est.volatility_pct, Decimal::ZERO);
        }
    }
}

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::ValidationError;

/// Applied when the table holds no entry for an instrument (0.2%).
pub const DEFAULT_THRESHOLD_PCT: Decimal = Decimal::from_parts(2, 0, 0, false, 1);

/// Upper bound accepted for a threshold edit (10%).
pub const MAX_THRESHOLD_PCT: Decimal = Decimal::TEN;

/// An instrument alerts when its volatility reaches the threshold.
pub fn is_alert(volatility_pct: Decimal, threshold_pct: Decimal) -> bool {
    volatility_pct >= threshold_pct
}

/// Accepts `0 <= pct <= MAX_THRESHOLD_PCT`; never substitutes a default.
pub fn validate_threshold(pct: Decimal) -> Result<Decimal, ValidationError> {
    if pct < Decimal::ZERO {
        return Err(ValidationError::Negative);
    }
    if pct > MAX_THRESHOLD_PCT {
        return Err(ValidationError::OutOfRange {
            max: MAX_THRESHOLD_PCT,
        });
    }
    Ok(pct.normalize())
}

/// Parses user input such as `"0.25"`.
pub fn parse_threshold(raw: &str) -> Result<Decimal, ValidationError> {
    let trimmed = raw.trim();
    let pct = Decimal::from_str(trimmed)
        .map_err(|_| ValidationError::NotNumeric(raw.to_string()))?;
    validate_threshold(pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_is_point_two_percent() {
        assert_eq!(DEFAULT_THRESHOLD_PCT, dec!(0.2));
    }

    #[test]
    fn alert_is_inclusive() {
        assert!(is_alert(dec!(0.20), dec!(0.2)));
        assert!(is_alert(dec!(0.17), dec!(0.15)));
        assert!(!is_alert(dec!(0.17), dec!(0.2)));
        assert!(is_alert(Decimal::ZERO, Decimal::ZERO));
    }

    #[test]
    fn parse_accepts_trimmed_decimals() {
        assert_eq!(parse_threshold(" 0.25 ").unwrap(), dec!(0.25));
        assert_eq!(parse_threshold("10").unwrap(), dec!(10));
        assert_eq!(parse_threshold("0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(
            parse_threshold("abc"),
            Err(ValidationError::NotNumeric("abc".into()))
        );
        assert_eq!(parse_threshold(""), Err(ValidationError::NotNumeric("".into())));
        assert_eq!(parse_threshold("-0.1"), Err(ValidationError::Negative));
        assert_eq!(
            parse_threshold("10.01"),
            Err(ValidationError::OutOfRange { max: dec!(10) })
        );
    }
}

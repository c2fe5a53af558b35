//! Contract specification and expiration arithmetic.
//!
//! `ContractSpec` is the immutable description of a tradable instrument.
//! A "different" contract (e.g. the next quarterly expiry) is a different
//! instance, never a mutation of an existing one.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from contract spec construction.
#[derive(Debug, Error)]
pub enum ContractError {
    /// Futures contract constructed without a multiplier.
    #[error("Futures contract {symbol} requires a multiplier")]
    MissingMultiplier {
        /// Offending contract symbol.
        symbol: String,
    },

    /// Futures contract constructed with a zero or negative multiplier.
    #[error("Futures contract {symbol} has non-positive multiplier {multiplier}")]
    InvalidMultiplier {
        /// Offending contract symbol.
        symbol: String,
        /// The rejected multiplier value.
        multiplier: Decimal,
    },

    /// No futures defaults known for a root symbol during normalization.
    #[error("No futures defaults known for root symbol {root}")]
    UnknownRoot {
        /// The root symbol that has no defaults entry.
        root: String,
    },
}

/// Security type discriminant.
///
/// One tagged record covers both generic and futures flows; non-futures
/// instruments simply leave the futures-only fields unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecType {
    /// Futures contract.
    Fut,
    /// Stock / equity.
    Stk,
    /// Option contract.
    Opt,
    /// Cash / FX.
    Cash,
}

impl SecType {
    /// Returns true for futures contracts.
    #[must_use]
    pub const fn is_futures(&self) -> bool {
        matches!(self, Self::Fut)
    }
}

/// Immutable description of a tradable instrument.
///
/// Invariant: a [`SecType::Fut`] spec always carries a positive
/// multiplier. Construction fails otherwise; it is never silently
/// defaulted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractSpec {
    symbol: String,
    sec_type: SecType,
    exchange: String,
    currency: String,
    local_symbol: Option<String>,
    multiplier: Option<Decimal>,
    expiration_date: Option<String>,
    con_id: Option<i64>,
    underlying: Option<String>,
}

impl ContractSpec {
    /// Create a new contract spec.
    ///
    /// The symbol is canonicalized to uppercase. Fails fast when a
    /// futures spec is missing a positive multiplier.
    pub fn new(
        symbol: impl Into<String>,
        sec_type: SecType,
        exchange: impl Into<String>,
        multiplier: Option<Decimal>,
    ) -> Result<Self, ContractError> {
        let symbol = symbol.into().to_uppercase();

        if sec_type.is_futures() {
            match multiplier {
                None => return Err(ContractError::MissingMultiplier { symbol }),
                Some(m) if m <= Decimal::ZERO => {
                    return Err(ContractError::InvalidMultiplier {
                        symbol,
                        multiplier: m,
                    });
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            symbol,
            sec_type,
            exchange: exchange.into(),
            currency: "USD".to_string(),
            local_symbol: None,
            multiplier,
            expiration_date: None,
            con_id: None,
            underlying: None,
        })
    }

    /// Convenience constructor for a futures contract.
    pub fn futures(
        symbol: impl Into<String>,
        exchange: impl Into<String>,
        multiplier: Decimal,
    ) -> Result<Self, ContractError> {
        Self::new(symbol, SecType::Fut, exchange, Some(multiplier))
    }

    /// Convenience constructor for a stock.
    pub fn stock(symbol: impl Into<String>, exchange: impl Into<String>) -> Self {
        // A non-futures spec cannot fail construction.
        Self {
            symbol: symbol.into().to_uppercase(),
            sec_type: SecType::Stk,
            exchange: exchange.into(),
            currency: "USD".to_string(),
            local_symbol: None,
            multiplier: None,
            expiration_date: None,
            con_id: None,
            underlying: None,
        }
    }

    /// Set the expiration date (`YYYYMMDD` or `YYYYMM`).
    #[must_use]
    pub fn with_expiration(mut self, expiration_date: impl Into<String>) -> Self {
        self.expiration_date = Some(expiration_date.into());
        self
    }

    /// Set the broker-assigned contract identifier.
    #[must_use]
    pub const fn with_con_id(mut self, con_id: i64) -> Self {
        self.con_id = Some(con_id);
        self
    }

    /// Set the exchange-local symbol alias.
    #[must_use]
    pub fn with_local_symbol(mut self, local_symbol: impl Into<String>) -> Self {
        self.local_symbol = Some(local_symbol.into());
        self
    }

    /// Set the currency (defaults to USD).
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Set the logical root symbol (e.g. "ES" for "ESH26").
    #[must_use]
    pub fn with_underlying(mut self, underlying: impl Into<String>) -> Self {
        self.underlying = Some(underlying.into().to_uppercase());
        self
    }

    /// Contract symbol (uppercase ticker+month+year code for futures).
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Security type.
    #[must_use]
    pub const fn sec_type(&self) -> SecType {
        self.sec_type
    }

    /// Listing exchange.
    #[must_use]
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Settlement currency.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Exchange-local symbol alias, if any.
    #[must_use]
    pub fn local_symbol(&self) -> Option<&str> {
        self.local_symbol.as_deref()
    }

    /// Contract multiplier (always present for futures).
    #[must_use]
    pub const fn multiplier(&self) -> Option<Decimal> {
        self.multiplier
    }

    /// Raw expiration date string, if any.
    #[must_use]
    pub fn expiration_date(&self) -> Option<&str> {
        self.expiration_date.as_deref()
    }

    /// Broker-assigned contract identifier, if known.
    #[must_use]
    pub const fn con_id(&self) -> Option<i64> {
        self.con_id
    }

    /// Logical root symbol, if set.
    #[must_use]
    pub fn underlying(&self) -> Option<&str> {
        self.underlying.as_deref()
    }

    /// Calendar days between `reference` and the parsed expiration date.
    ///
    /// Negative when the contract is already expired. `None` when the
    /// expiration date is absent or unparsable; callers must treat
    /// `None` as "unknown", never as a failure.
    #[must_use]
    pub fn days_to_expiry(&self, reference: NaiveDate) -> Option<i64> {
        let expiry = parse_expiration(self.expiration_date.as_deref()?)?;
        Some((expiry - reference).num_days())
    }

    /// True iff the expiration date is known and before `reference`.
    #[must_use]
    pub fn is_expired(&self, reference: NaiveDate) -> bool {
        self.days_to_expiry(reference).is_some_and(|days| days < 0)
    }

    /// True iff the contract expires within `threshold_days` of
    /// `reference` (inclusive) and is not already expired.
    #[must_use]
    pub fn is_near_expiry(&self, threshold_days: i64, reference: NaiveDate) -> bool {
        self.days_to_expiry(reference)
            .is_some_and(|days| days >= 0 && days <= threshold_days)
    }
}

/// Parse an expiration string into a calendar date.
///
/// Accepts 8-digit `YYYYMMDD` (exact date) and 6-digit `YYYYMM`,
/// normalized to the **last** calendar day of that month so that
/// month-granularity broker data yields a conservative expiry estimate.
/// Any other form yields `None`.
#[must_use]
pub fn parse_expiration(raw: &str) -> Option<NaiveDate> {
    match raw.len() {
        8 => NaiveDate::parse_from_str(raw, "%Y%m%d").ok(),
        6 => {
            // Slicing by byte offset is only safe on ASCII input.
            let year: i32 = raw.get(..4)?.parse().ok()?;
            let month: u32 = raw.get(4..)?.parse().ok()?;
            last_day_of_month(year, month)
        }
        _ => None,
    }
}

/// Last calendar day of the given month.
fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).map(|first| first - Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_futures_without_multiplier_fails() {
        let err = ContractSpec::new("ESH26", SecType::Fut, "CME", None).unwrap_err();
        assert!(matches!(err, ContractError::MissingMultiplier { .. }));
    }

    #[test]
    fn test_futures_with_non_positive_multiplier_fails() {
        let err = ContractSpec::futures("ESH26", "CME", dec!(0)).unwrap_err();
        assert!(matches!(err, ContractError::InvalidMultiplier { .. }));

        let err = ContractSpec::futures("ESH26", "CME", dec!(-50)).unwrap_err();
        assert!(matches!(err, ContractError::InvalidMultiplier { .. }));
    }

    #[test]
    fn test_futures_with_multiplier_succeeds() {
        let spec = ContractSpec::futures("esh26", "CME", dec!(50)).unwrap();
        assert_eq!(spec.symbol(), "ESH26");
        assert_eq!(spec.sec_type(), SecType::Fut);
        assert_eq!(spec.multiplier(), Some(dec!(50)));
        assert_eq!(spec.currency(), "USD");
    }

    #[test]
    fn test_stock_never_requires_multiplier() {
        let spec = ContractSpec::stock("aapl", "NASDAQ");
        assert_eq!(spec.symbol(), "AAPL");
        assert_eq!(spec.sec_type(), SecType::Stk);
        assert_eq!(spec.multiplier(), None);
    }

    #[test]
    fn test_days_to_expiry_exact_date() {
        let spec = ContractSpec::futures("ESH26", "CME", dec!(50))
            .unwrap()
            .with_expiration("20260320");
        assert_eq!(spec.days_to_expiry(date(2026, 3, 10)), Some(10));
    }

    #[test]
    fn test_days_to_expiry_negative_when_past() {
        let spec = ContractSpec::futures("CLZ25", "NYMEX", dec!(1000))
            .unwrap()
            .with_expiration("20251219");
        assert_eq!(spec.days_to_expiry(date(2025, 12, 25)), Some(-6));
        assert!(spec.is_expired(date(2025, 12, 25)));
    }

    #[test]
    fn test_days_to_expiry_unknown_without_date() {
        let spec = ContractSpec::futures("ESH26", "CME", dec!(50)).unwrap();
        assert_eq!(spec.days_to_expiry(date(2026, 1, 1)), None);
        assert!(!spec.is_expired(date(2026, 1, 1)));
    }

    #[test]
    fn test_days_to_expiry_unknown_for_garbage_date() {
        let spec = ContractSpec::futures("ESH26", "CME", dec!(50))
            .unwrap()
            .with_expiration("not-a-date");
        assert_eq!(spec.days_to_expiry(date(2026, 1, 1)), None);
        assert!(!spec.is_expired(date(2026, 1, 1)));
    }

    #[test_case(0, true; "expires today")]
    #[test_case(7, true; "expires at threshold")]
    #[test_case(8, false; "expires past threshold")]
    #[test_case(-1, false; "already expired")]
    fn test_is_near_expiry(days_out: i64, expected: bool) {
        let reference = date(2026, 3, 10);
        let expiry = reference + Duration::days(days_out);
        let spec = ContractSpec::futures("ESH26", "CME", dec!(50))
            .unwrap()
            .with_expiration(expiry.format("%Y%m%d").to_string());
        assert_eq!(spec.is_near_expiry(7, reference), expected);
    }

    #[test]
    fn test_parse_expiration_month_form_uses_last_day() {
        assert_eq!(parse_expiration("202603"), Some(date(2026, 3, 31)));
        assert_eq!(parse_expiration("202602"), Some(date(2026, 2, 28)));
        // Leap year
        assert_eq!(parse_expiration("202802"), Some(date(2028, 2, 29)));
        // December wraps the year boundary
        assert_eq!(parse_expiration("202512"), Some(date(2025, 12, 31)));
    }

    #[test]
    fn test_parse_expiration_rejects_other_forms() {
        assert_eq!(parse_expiration(""), None);
        assert_eq!(parse_expiration("2026"), None);
        assert_eq!(parse_expiration("2026033"), None);
        assert_eq!(parse_expiration("20261301"), None);
        assert_eq!(parse_expiration("202613"), None);
        assert_eq!(parse_expiration("abcdef"), None);
    }

    #[test]
    fn test_parse_expiration_rejects_non_ascii() {
        // Multi-byte input whose byte length matches a valid form must
        // come back unknown, not split mid-character.
        assert_eq!(parse_expiration("日本"), None);
        assert_eq!(parse_expiration("é2026"), None);
        assert_eq!(parse_expiration("année202"), None);
    }

    proptest! {
        /// For any valid calendar date, the YYYYMMDD rendering round-trips
        /// and days_to_expiry equals the exact calendar-day difference.
        #[test]
        fn prop_days_to_expiry_matches_calendar_difference(
            expiry_offset in -3650i64..3650,
            ref_ordinal in 0i64..3650,
        ) {
            let reference = date(2020, 1, 1) + Duration::days(ref_ordinal);
            let expiry = reference + Duration::days(expiry_offset);
            let spec = ContractSpec::futures("ESH26", "CME", dec!(50))
                .unwrap()
                .with_expiration(expiry.format("%Y%m%d").to_string());
            prop_assert_eq!(spec.days_to_expiry(reference), Some(expiry_offset));
            prop_assert_eq!(spec.is_expired(reference), expiry_offset < 0);
        }
    }
}

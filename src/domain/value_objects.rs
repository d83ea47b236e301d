//! Value objects shared across the payment flow.

use std::fmt;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An amount of one currency. Construction rejects negative amounts;
/// payment amounts go through [`Money::positive`], which also rejects zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount must not be negative")]
    Negative,
    #[error("amount must be positive")]
    NotPositive,
    #[error("currency mismatch")]
    CurrencyMismatch,
}

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Result<Self, MoneyError> {
        if amount < Decimal::ZERO {
            return Err(MoneyError::Negative);
        }
        Ok(Self {
            amount,
            currency: currency.to_string(),
        })
    }

    pub fn positive(amount: Decimal, currency: &str) -> Result<Self, MoneyError> {
        if amount <= Decimal::ZERO {
            return Err(MoneyError::NotPositive);
        }
        Ok(Self {
            amount,
            currency: currency.to_string(),
        })
    }

    pub fn zero(currency: &str) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency: currency.to_string(),
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch);
        }
        Ok(Self {
            amount: self.amount + other.amount,
            currency: self.currency.clone(),
        })
    }

    pub fn multiply(&self, qty: u32) -> Money {
        Self {
            amount: self.amount * Decimal::from(qty),
            currency: self.currency.clone(),
        }
    }
}

/// Kenyan MSISDN normalized to the international `254XXXXXXXXX` form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number must contain digits only")]
    NonDigit,
    #[error("phone number must be a Kenyan number (07XXXXXXXX or 254XXXXXXXXX)")]
    BadPrefix,
    #[error("phone number has the wrong length")]
    BadLength,
}

impl PhoneNumber {
    /// Normalize a raw phone number: a leading local `0` is replaced with
    /// `254`, a `+` prefix is tolerated, anything not resolving to
    /// `254` + 9 digits is rejected.
    pub fn parse(raw: &str) -> Result<Self, PhoneError> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::NonDigit);
        }
        let normalized = if let Some(rest) = digits.strip_prefix('0') {
            format!("254{rest}")
        } else {
            digits.to_string()
        };
        if !normalized.starts_with("254") {
            return Err(PhoneError::BadPrefix);
        }
        if normalized.len() != 12 {
            return Err(PhoneError::BadLength);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-legible, globally unique payment reference:
/// `{PREFIX}{millis-since-epoch}{16-hex-random}`.
pub struct PaymentReference;

impl PaymentReference {
    pub fn generate(prefix: &str) -> String {
        format!(
            "{prefix}{}{:016x}",
            Utc::now().timestamp_millis(),
            rand::random::<u64>()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    #[test]
    fn negative_money_is_rejected() {
        assert_eq!(Money::new(dec!(-1), "KES"), Err(MoneyError::Negative));
    }

    #[test]
    fn zero_is_a_valid_amount_but_not_a_payment() {
        assert!(Money::new(Decimal::ZERO, "KES").is_ok());
        assert_eq!(
            Money::positive(Decimal::ZERO, "KES"),
            Err(MoneyError::NotPositive)
        );
    }

    #[test]
    fn adding_mixed_currencies_is_rejected() {
        let kes = Money::new(dec!(100), "KES").unwrap();
        let usd = Money::new(dec!(100), "USD").unwrap();
        assert_eq!(kes.add(&usd), Err(MoneyError::CurrencyMismatch));
    }

    #[test]
    fn add_and_multiply_track_the_amount() {
        let unit = Money::new(dec!(49.99), "KES").unwrap();
        let pair = unit.multiply(2);
        assert_eq!(pair.amount(), dec!(99.98));
        let total = Money::zero("KES").add(&pair).unwrap();
        assert_eq!(total.amount(), dec!(99.98));
        assert_eq!(total.currency(), "KES");
    }

    #[test]
    fn local_zero_prefix_is_internationalized() {
        assert_eq!(
            PhoneNumber::parse("0712345678").unwrap().as_str(),
            "254712345678"
        );
    }

    #[test]
    fn international_form_passes_through() {
        assert_eq!(
            PhoneNumber::parse("254712345678").unwrap().as_str(),
            "254712345678"
        );
    }

    #[test]
    fn plus_prefix_is_tolerated() {
        assert_eq!(
            PhoneNumber::parse("+254712345678").unwrap().as_str(),
            "254712345678"
        );
    }

    #[test]
    fn foreign_prefix_is_rejected() {
        assert_eq!(
            PhoneNumber::parse("1712345678"),
            Err(PhoneError::BadPrefix)
        );
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert_eq!(PhoneNumber::parse("07123456"), Err(PhoneError::BadLength));
        assert_eq!(
            PhoneNumber::parse("2547123456789"),
            Err(PhoneError::BadLength)
        );
    }

    #[test]
    fn letters_are_rejected() {
        assert_eq!(
            PhoneNumber::parse("07123A5678"),
            Err(PhoneError::NonDigit)
        );
    }

    #[test]
    fn references_do_not_collide() {
        // Uniqueness rests on the 64-bit random suffix when many references
        // are generated inside one millisecond.
        let mut seen = HashSet::new();
        for _ in 0..100_000 {
            assert!(seen.insert(PaymentReference::generate("MP")));
        }
    }

    #[test]
    fn reference_carries_prefix() {
        assert!(PaymentReference::generate("FLW").starts_with("FLW"));
    }
}

//! # Money
//!
//! Currency codes and conversions between the decimal strings the storefront
//! passes around and the minor units (cents) gateways report.

use crate::error::{CheckoutError, CheckoutResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
    AUD,
    CHF,
    MXN,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "usd",
            Currency::EUR => "eur",
            Currency::GBP => "gbp",
            Currency::JPY => "jpy",
            Currency::CAD => "cad",
            Currency::AUD => "aud",
            Currency::CHF => "chf",
            Currency::MXN => "mxn",
        }
    }

    /// Returns the number of decimal places for this currency
    /// (JPY has 0 decimals, most others have 2)
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    fn minor_per_major(&self) -> i64 {
        10_i64.pow(self.decimal_places())
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::USD
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

impl FromStr for Currency {
    type Err = CheckoutError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code.trim().to_lowercase().as_str() {
            "usd" => Ok(Currency::USD),
            "eur" => Ok(Currency::EUR),
            "gbp" => Ok(Currency::GBP),
            "jpy" => Ok(Currency::JPY),
            "cad" => Ok(Currency::CAD),
            "aud" => Ok(Currency::AUD),
            "chf" => Ok(Currency::CHF),
            "mxn" => Ok(Currency::MXN),
            other => Err(CheckoutError::InvalidRequest(format!(
                "Unsupported currency: {}",
                other
            ))),
        }
    }
}

/// Parse a decimal amount string ("25.00", "0.5", "12") into minor units.
///
/// Digits beyond the currency's precision are accepted only when they are zeros.
pub fn parse_minor_units(amount: &str, currency: Currency) -> CheckoutResult<i64> {
    let invalid = |message: &str| CheckoutError::InvalidAmount {
        message: format!("{} ({:?})", message, amount),
    };

    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(invalid("Amount is empty"));
    }
    if trimmed.starts_with('-') {
        return Err(invalid("Amount must not be negative"));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("Amount is not a decimal number"));
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("Amount is not a decimal number"));
    }

    let places = currency.decimal_places() as usize;
    let (kept, excess) = fraction.split_at(fraction.len().min(places));
    if excess.bytes().any(|b| b != b'0') {
        return Err(invalid("Amount has too many decimal places"));
    }

    let major: i64 = whole.parse().map_err(|_| invalid("Amount is too large"))?;
    let mut minor_digits = kept.to_string();
    while minor_digits.len() < places {
        minor_digits.push('0');
    }
    let minor: i64 = if minor_digits.is_empty() {
        0
    } else {
        minor_digits
            .parse()
            .map_err(|_| invalid("Amount is not a decimal number"))?
    };

    major
        .checked_mul(currency.minor_per_major())
        .and_then(|m| m.checked_add(minor))
        .ok_or_else(|| invalid("Amount is too large"))
}

/// Format minor units as the shortest decimal string.
///
/// `2599` → `"25.99"`, `2500` → `"25"`, `2550` → `"25.5"`.
pub fn format_minor_units(minor: i64, currency: Currency) -> String {
    let per_major = currency.minor_per_major();
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    let whole = abs / per_major as u64;
    let fraction = abs % per_major as u64;

    if fraction == 0 {
        return format!("{}{}", sign, whole);
    }

    let digits = format!(
        "{:0width$}",
        fraction,
        width = currency.decimal_places() as usize
    );
    format!("{}{}.{}", sign, whole, digits.trim_end_matches('0'))
}

/// An amount in smallest currency unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in smallest currency unit (cents for USD)
    pub minor: i64,
    /// Currency
    pub currency: Currency,
}

impl Money {
    /// Create from smallest unit (cents)
    pub fn from_minor(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    /// Parse from a decimal string as sent by the storefront
    pub fn parse(amount: &str, currency: Currency) -> CheckoutResult<Self> {
        Ok(Self {
            minor: parse_minor_units(amount, currency)?,
            currency,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Shortest decimal form (e.g. "25", "25.99")
    pub fn to_decimal_string(&self) -> String {
        format_minor_units(self.minor, self.currency)
    }

    /// Format for display (e.g., "$10.00")
    pub fn display(&self) -> String {
        let symbol = match self.currency {
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "¥",
            Currency::CAD => "C$",
            Currency::AUD => "A$",
            Currency::CHF => "CHF ",
            Currency::MXN => "MX$",
        };
        let places = self.currency.decimal_places() as usize;
        if places == 0 {
            return format!("{}{}", symbol, self.minor);
        }
        let per_major = self.currency.minor_per_major();
        format!(
            "{}{}.{:0width$}",
            symbol,
            self.minor / per_major,
            (self.minor % per_major).abs(),
            width = places
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_minor_units() {
        assert_eq!(format_minor_units(2599, Currency::USD), "25.99");
        assert_eq!(format_minor_units(2500, Currency::USD), "25");
        assert_eq!(format_minor_units(2550, Currency::USD), "25.5");
        assert_eq!(format_minor_units(5, Currency::USD), "0.05");
        assert_eq!(format_minor_units(0, Currency::USD), "0");
        assert_eq!(format_minor_units(1500, Currency::JPY), "1500");
    }

    #[test]
    fn test_parse_minor_units() {
        assert_eq!(parse_minor_units("25.00", Currency::USD).unwrap(), 2500);
        assert_eq!(parse_minor_units("25.99", Currency::USD).unwrap(), 2599);
        assert_eq!(parse_minor_units("0.5", Currency::USD).unwrap(), 50);
        assert_eq!(parse_minor_units(" 12 ", Currency::USD).unwrap(), 1200);
        assert_eq!(parse_minor_units("0.00", Currency::USD).unwrap(), 0);
        assert_eq!(parse_minor_units("1.500", Currency::USD).unwrap(), 150);
        assert_eq!(parse_minor_units("1500", Currency::JPY).unwrap(), 1500);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "abc", "-1.00", "1.2.3", ".50", "1.005", "1e3"] {
            let err = parse_minor_units(bad, Currency::USD).unwrap_err();
            assert!(
                matches!(err, CheckoutError::InvalidAmount { .. }),
                "{:?} should be rejected",
                bad
            );
        }
        assert!(parse_minor_units("99999999999999999999", Currency::USD).is_err());
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("USD".parse::<Currency>().unwrap(), Currency::USD);
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::EUR);
        assert!("xyz".parse::<Currency>().is_err());
        assert_eq!(Currency::USD.to_string(), "USD");
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_minor(2599, Currency::USD).display(), "$25.99");
        assert_eq!(Money::from_minor(50, Currency::USD).display(), "$0.50");
        assert_eq!(Money::from_minor(1500, Currency::JPY).display(), "¥1500");
        assert!(Money::parse("0.00", Currency::USD).unwrap().is_zero());
    }
}

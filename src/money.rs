use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    CAD,
    EUR,
    GBP,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::USD => write!(f, "USD"),
            Currency::CAD => write!(f, "CAD"),
            Currency::EUR => write!(f, "EUR"),
            Currency::GBP => write!(f, "GBP"),
        }
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Currency::USD),
            "CAD" => Ok(Currency::CAD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            _ => Err(format!("Unknown currency: {}", s)),
        }
    }
}

/// Whole currency units. Vehicle prices are never fractional in listings.
pub type AmountValue = i64;

/// Basis points, 10000 = 100%.
pub type BasisPoints = u32;

pub const FULL_BASIS_POINTS: BasisPoints = 10_000;

/// Largest price, bid or offer the marketplace accepts.
pub const MAX_AMOUNT: AmountValue = 1_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount {
    currency: Currency,
    value: AmountValue,
}

impl Amount {
    pub fn new(currency: Currency, value: AmountValue) -> Self {
        Amount { currency, value }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn value(&self) -> AmountValue {
        self.value
    }

    /// Share of this amount in basis points, rounded half away from zero.
    pub fn share(&self, bps: BasisPoints) -> Amount {
        let scaled = self.value as i128 * bps as i128;
        let half = FULL_BASIS_POINTS as i128 / 2;
        let rounded = if scaled >= 0 {
            (scaled + half) / FULL_BASIS_POINTS as i128
        } else {
            (scaled - half) / FULL_BASIS_POINTS as i128
        };
        Amount::new(self.currency, rounded as AmountValue)
    }

    pub fn checked_sub(self, other: Amount) -> Result<Amount, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch);
        }
        self.value
            .checked_sub(other.value)
            .map(|value| Amount::new(self.currency, value))
            .ok_or(MoneyError::Overflow)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Cannot combine amounts with different currencies")]
    CurrencyMismatch,

    #[error("Amount overflow")]
    Overflow,
}

impl Add for Amount {
    type Output = Result<Amount, MoneyError>;

    fn add(self, other: Self) -> Self::Output {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch);
        }
        self.value
            .checked_add(other.value)
            .map(|value| Amount::new(self.currency, value))
            .ok_or(MoneyError::Overflow)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.currency, self.value)
    }
}

//! Monetary amounts.

use serde::{Deserialize, Serialize};

/// Money amount represented in cents to avoid floating point issues.
///
/// Serializes as a bare integer number of cents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Returns `percent` percent of this amount, rounded toward zero to the cent.
    ///
    /// Computed in 128 bits; results beyond the `i64` range saturate.
    pub fn percent(&self, percent: u8) -> Money {
        let scaled = i128::from(self.cents) * i128::from(percent) / 100;
        let cents = i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX });
        Money { cents }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_dollars_and_cents() {
        assert_eq!(Money::from_cents(12345).to_string(), "$123.45");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-250).to_string(), "-$2.50");
    }

    #[test]
    fn percent_of_large_amounts_does_not_overflow() {
        assert_eq!(
            Money::from_cents(i64::MAX).percent(80),
            Money::from_cents(7_378_697_629_483_820_645)
        );
        assert_eq!(Money::from_cents(i64::MAX / 2).percent(100).cents(), i64::MAX / 2);
        assert_eq!(Money::from_cents(i64::MAX).percent(200).cents(), i64::MAX);
        assert_eq!(Money::from_cents(i64::MIN).percent(200).cents(), i64::MIN);
    }

    #[test]
    fn percent_rounds_down() {
        assert_eq!(Money::from_cents(10_000).percent(80), Money::from_cents(8_000));
        assert_eq!(Money::from_cents(999).percent(50), Money::from_cents(499));
        assert_eq!(Money::from_cents(999).percent(100), Money::from_cents(999));
    }

    #[test]
    fn serializes_as_integer_cents() {
        let json = serde_json::to_string(&Money::from_cents(1999)).unwrap();
        assert_eq!(json, "1999");
        let back: Money = serde_json::from_str("1999").unwrap();
        assert_eq!(back.cents(), 1999);
    }
}

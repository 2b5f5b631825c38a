mod customer;
mod payment;
mod reservation;
mod resource;
mod timetable;

use std::fmt::{self, Display};

use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};

pub use self::customer::*;
pub use self::payment::*;
pub use self::reservation::*;
pub use self::resource::*;
pub use self::timetable::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    JPY,
    USD,
    EUR,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::JPY => "¥",
            Currency::USD => "$",
            Currency::EUR => "€",
        }
    }

    /// Digits after the decimal point in the currency's minor unit.
    pub fn minor_units(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            Currency::USD | Currency::EUR => 2,
        }
    }
}

/// A non-negative amount held in the currency's minor unit (yen, cents).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Money {
    amount: u64,
    currency: Currency,
}

impl Money {
    pub fn new(amount: u64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn checked_mul(&self, factor: u64) -> Option<Money> {
        self.amount
            .checked_mul(factor)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// `None` when the currencies differ or `other` is larger.
    pub fn checked_sub(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount
            .checked_sub(other.amount)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// `None` when the currencies differ.
    pub fn fits_within(&self, limit: &Money) -> Option<bool> {
        (self.currency == limit.currency).then_some(self.amount <= limit.amount)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.currency.minor_units();
        let scale = 10u64.pow(digits);
        let major = (self.amount / scale).to_formatted_string(&Locale::en);
        match digits {
            0 => write!(f, "{}{}", self.currency.symbol(), major),
            _ => write!(
                f,
                "{}{}.{:0width$}",
                self.currency.symbol(),
                major,
                self.amount % scale,
                width = digits as usize
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(1000000, Currency::JPY).to_string(), "¥1,000,000");
        assert_eq!(Money::new(15000, Currency::USD).to_string(), "$150.00");
        assert_eq!(Money::new(123456705, Currency::EUR).to_string(), "€1,234,567.05");
    }

    #[test]
    fn test_money_arithmetic() {
        let rate = Money::new(5000, Currency::USD);
        assert_eq!(rate.checked_mul(3), Some(Money::new(15000, Currency::USD)));
        assert_eq!(Money::new(u64::MAX, Currency::USD).checked_mul(2), None);
        assert_eq!(
            Money::new(20000, Currency::USD).checked_sub(&rate),
            Some(Money::new(15000, Currency::USD))
        );
        assert_eq!(rate.checked_sub(&Money::new(5001, Currency::USD)), None);
        assert_eq!(rate.checked_sub(&Money::new(1, Currency::JPY)), None);
    }

    #[test]
    fn test_money_fits_within() {
        let rate = Money::new(5000, Currency::USD);
        assert_eq!(rate.fits_within(&Money::new(5000, Currency::USD)), Some(true));
        assert_eq!(rate.fits_within(&Money::new(4999, Currency::USD)), Some(false));
        assert_eq!(rate.fits_within(&Money::new(9999, Currency::JPY)), None);
    }
}

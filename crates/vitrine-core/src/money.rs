//! # Money Module
//!
//! Exact decimal types for every monetary column of the schema.
//!
//! ## Why Decimal?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  The schema declares price, cost, taxRate, unitCost, total, unitPrice, │
//! │  discount and amount as arbitrary-precision decimals. Money wraps      │
//! │  rust_decimal::Decimal, so                                              │
//! │    0.1 + 0.2 = 0.3                    ✅ exactly                        │
//! │  and a value written as 12.50 reads back as 12.50 (scale preserved).   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use vitrine_core::money::Money;
//!
//! let price = Money::new(Decimal::new(1099, 2)); // 10.99
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.amount(), Decimal::new(3297, 2));
//! ```
//!
//! ## Storage
//! With the `sqlx` feature both types encode as SQLite `TEXT` holding the
//! decimal's canonical string, so no digit or trailing zero is lost.

use rust_decimal::prelude::Zero;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Decimal places money is rounded to when a computation produces more.
pub const MONEY_SCALE: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount with exact decimal precision.
///
/// ## Design Decisions
/// - **Decimal (signed)**: negative values for refunds and adjustments
/// - **Transparent serde**: serialized as the decimal string, e.g. `"12.50"`
/// - **No currency field**: the schema stores currency on the sale, not
///   on each amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps a decimal amount as-is (scale preserved).
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Builds an amount from an integer count of minor units.
    ///
    /// ## Example
    /// ```rust
    /// use vitrine_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(1099, 2).to_string(), "10.99");
    /// assert_eq!(Money::from_minor(500, 0).to_string(), "500");
    /// ```
    #[inline]
    pub fn from_minor(units: i64, scale: u32) -> Self {
        Money(Decimal::new(units, scale))
    }

    /// Returns the underlying decimal.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Rounds to `dp` decimal places using Bankers Rounding.
    ///
    /// ## Bankers Rounding Explained
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  BANKERS ROUNDING (Round Half to Even)                              │
    /// │                                                                     │
    /// │  Standard rounding always rounds 0.5 UP, causing systematic bias:  │
    /// │    0.5 → 1, 1.5 → 2, 2.5 → 3, 3.5 → 4 (always up = +bias)         │
    /// │                                                                     │
    /// │  Bankers Rounding rounds 0.5 to nearest EVEN number:               │
    /// │    0.5 → 0, 1.5 → 2, 2.5 → 2, 3.5 → 4 (alternates = no bias)      │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    pub fn round_dp(&self, dp: u32) -> Self {
        Money(self.0.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven))
    }

    /// Calculates tax at `rate`, rounded to [`MONEY_SCALE`] places.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use vitrine_core::money::{Money, TaxRate};
    ///
    /// let price = Money::new(Decimal::new(1000, 2)); // 10.00
    /// let rate = TaxRate::new(Decimal::new(825, 2)); // 8.25%
    ///
    /// // 10.00 × 8.25% = 0.825 → 0.82 (half to even)
    /// assert_eq!(price.calculate_tax(rate).to_string(), "0.82");
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(self.0 * rate.fraction()).round_dp(MONEY_SCALE)
    }

    /// Multiplies money by a quantity.
    ///
    /// Panics on `Decimal` overflow, like the `+`/`-` operators; amounts that
    /// passed validation never get there. Use
    /// [`checked_multiply_quantity`](Self::checked_multiply_quantity) for
    /// unchecked input.
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// `None` on overflow.
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(Decimal::from(qty)).map(Money)
    }

    /// `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// `None` on overflow.
    #[inline]
    pub fn checked_sub(&self, other: Money) -> Option<Self> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use vitrine_core::money::Money;
    ///
    /// let subtotal = Money::new(Decimal::new(10000, 2)); // 100.00
    /// let discounted = subtotal.apply_percentage_discount(Decimal::new(10, 0));
    /// assert_eq!(discounted.to_string(), "90.00");
    /// ```
    pub fn apply_percentage_discount(&self, percent: Decimal) -> Money {
        let discount = Money(self.0 * percent / Decimal::ONE_HUNDRED).round_dp(MONEY_SCALE);
        *self - discount
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate expressed as a percentage (`18` = 18%, `8.25` = 8.25%).
///
/// Stored in `Product.taxRate` with the same exact decimal encoding as
/// [`Money`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// Creates a tax rate from a percentage.
    #[inline]
    pub const fn new(percent: Decimal) -> Self {
        TaxRate(percent)
    }

    /// Zero tax rate.
    #[inline]
    pub fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    /// Returns the rate as a percentage.
    #[inline]
    pub const fn percent(&self) -> Decimal {
        self.0
    }

    /// Returns the rate as a fraction (`18` → `0.18`).
    #[inline]
    pub fn fraction(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl From<Decimal> for TaxRate {
    fn from(percent: Decimal) -> Self {
        TaxRate(percent)
    }
}

// =============================================================================
// SQLite Codecs
// =============================================================================

/// TEXT codecs shared by [`Money`] and [`TaxRate`].
///
/// SQLite has no exact numeric type: a `NUMERIC` or `REAL` column would round
/// `0.1` to a binary float. Both types are written as the decimal's string
/// and parsed back on read.
#[cfg(feature = "sqlx")]
mod sqlite_codec {
    use super::{Money, TaxRate};
    use rust_decimal::Decimal;
    use sqlx::encode::IsNull;
    use sqlx::error::BoxDynError;
    use sqlx::sqlite::{Sqlite, SqliteTypeInfo, SqliteValueRef};
    use sqlx::{Decode, Encode, Type};

    macro_rules! decimal_as_text {
        ($ty:ident) => {
            impl Type<Sqlite> for $ty {
                fn type_info() -> SqliteTypeInfo {
                    <String as Type<Sqlite>>::type_info()
                }

                fn compatible(ty: &SqliteTypeInfo) -> bool {
                    <String as Type<Sqlite>>::compatible(ty)
                        || <i64 as Type<Sqlite>>::compatible(ty)
                        || <f64 as Type<Sqlite>>::compatible(ty)
                }
            }

            impl<'q> Encode<'q, Sqlite> for $ty {
                fn encode_by_ref(
                    &self,
                    buf: &mut <Sqlite as sqlx::Database>::ArgumentBuffer<'q>,
                ) -> Result<IsNull, BoxDynError> {
                    <String as Encode<'q, Sqlite>>::encode(self.0.to_string(), buf)
                }
            }

            impl<'r> Decode<'r, Sqlite> for $ty {
                fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
                    let text = <&str as Decode<'r, Sqlite>>::decode(value)?;
                    Ok($ty(text.trim().parse::<Decimal>()?))
                }
            }
        };
    }

    decimal_as_text!(Money);
    decimal_as_text!(TaxRate);
}

// =============================================================================
// Unit Tests
// =============================================================================

/*! Exact time values.

All quantities handled by the analyses (costs, periods, deadlines,
interval lengths, and demand) are exact rationals. There is no
floating-point constructor: the tests are exact only as long as every
input is. */

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Sub};

use dashu::integer::{IBig, UBig};
use dashu::rational::RBig;
use derive_more::{Add, AddAssign, From, Sub, SubAssign};

/// An exact, possibly fractional, (signed) amount of time.
///
/// Values are normally non-negative; negative values occur only as
/// intermediate results (e.g., `D - C/α` for a task that cannot meet
/// its deadline at speed `α`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Add, Sub, AddAssign, SubAssign, From)]
pub struct Time(RBig);

/// Syntactic sugar to give a hint that a time value indicates a
/// point in time or some offset.
pub type Instant = Time;

/// Syntactic sugar to give a hint that a time value denotes an
/// interval length.
pub type Duration = Time;

/// Syntactic sugar to give a hint that a time value represents some
/// amount of processor service.
pub type Service = Time;

impl Time {
    pub fn zero() -> Time {
        Time(RBig::ZERO)
    }

    pub fn one() -> Time {
        Time(RBig::ONE)
    }

    /// The exact fraction `numerator / denominator`.
    ///
    /// Panics if `denominator` is zero.
    pub fn ratio(numerator: u64, denominator: u64) -> Time {
        assert!(denominator > 0, "zero denominator in time ratio");
        Time(RBig::from_parts(
            IBig::from(numerator),
            UBig::from(denominator),
        ))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == RBig::ZERO
    }

    pub fn is_positive(&self) -> bool {
        self.0 > RBig::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < RBig::ZERO
    }

    /// Is the value a whole number?
    pub fn is_integral(&self) -> bool {
        *self.0.denominator() == UBig::ONE
    }

    /// The largest integer not exceeding `self`.
    pub fn floor(&self) -> Time {
        Time(RBig::from(self.0.floor()))
    }

    /// The smallest integer not less than `self`.
    pub fn ceil(&self) -> Time {
        Time(RBig::from(self.0.ceil()))
    }

    /// `max(0, self - other)`
    pub fn saturating_sub(&self, other: &Time) -> Time {
        if self > other {
            self - other
        } else {
            Time::zero()
        }
    }

    /// Lossless conversion to a machine integer, if possible.
    pub fn to_u64(&self) -> Option<u64> {
        if self.is_integral() {
            u64::try_from(self.0.numerator().clone()).ok()
        } else {
            None
        }
    }
}

impl From<u64> for Time {
    fn from(val: u64) -> Self {
        Time(RBig::from_parts(IBig::from(val), UBig::ONE))
    }
}

impl From<u32> for Time {
    fn from(val: u32) -> Self {
        Time::from(u64::from(val))
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integral() {
            write!(f, "{}", self.0.numerator())
        } else {
            write!(f, "{}/{}", self.0.numerator(), self.0.denominator())
        }
    }
}

// Operators on references, so that the analyses don't have to clone
// arbitrary-precision values just to combine them.
macro_rules! ref_binop {
    ($trait:ident, $method:ident, $op:tt) => {
        impl<'a, 'b> $trait<&'b Time> for &'a Time {
            type Output = Time;

            fn $method(self, rhs: &'b Time) -> Time {
                Time(&self.0 $op &rhs.0)
            }
        }

        impl<'b> $trait<&'b Time> for Time {
            type Output = Time;

            fn $method(self, rhs: &'b Time) -> Time {
                Time(&self.0 $op &rhs.0)
            }
        }
    };
}

ref_binop!(Add, add, +);
ref_binop!(Sub, sub, -);
ref_binop!(Mul, mul, *);
ref_binop!(Div, div, /);

impl Mul for Time {
    type Output = Time;

    fn mul(self, rhs: Time) -> Time {
        Time(self.0 * rhs.0)
    }
}

impl Div for Time {
    type Output = Time;

    fn div(self, rhs: Time) -> Time {
        Time(self.0 / rhs.0)
    }
}

impl Sum for Time {
    fn sum<I: Iterator<Item = Time>>(iter: I) -> Time {
        iter.fold(Time::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Time> for Time {
    fn sum<I: Iterator<Item = &'a Time>>(iter: I) -> Time {
        iter.fold(Time::zero(), |acc, x| acc + x)
    }
}

// Exact rational numbers for musical time.
//
// Beat offsets within a bar and note durations are fractions of a whole
// note: a quarter note starts at 1/4, a rest filling a gap of 3/4 has a
// duration divisor of 4/3. Floating point would make onset lookups across
// voices unreliable, so every time value in the analyzer is a `Ratio`.
//
// Values are always kept in lowest terms with a positive denominator, which
// lets `PartialEq`/`Hash` be derived structurally while `Ord` compares by
// cross-multiplication.

use std::cmp::Ordering;
use std::fmt;
use std::ops;

/// An irreducible fraction `num / den` with `den > 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ratio {
    num: i64,
    den: i64,
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Ratio {
    /// Build a reduced ratio. A zero denominator is clamped to 1 so the value
    /// stays usable; callers never construct one intentionally.
    pub fn new(num: i64, den: i64) -> Ratio {
        if den == 0 {
            return Ratio { num, den: 1 };
        }
        let sign = if den < 0 { -1 } else { 1 };
        let t = gcd(num, den).max(1);
        Ratio {
            num: sign * num / t,
            den: sign * den / t,
        }
    }

    pub const fn zero() -> Ratio {
        Ratio { num: 0, den: 1 }
    }

    pub const fn one() -> Ratio {
        Ratio { num: 1, den: 1 }
    }

    pub fn numer(self) -> i64 {
        self.num
    }

    pub fn denom(self) -> i64 {
        self.den
    }

    pub fn is_zero(self) -> bool {
        self.num == 0
    }

    pub fn is_positive(self) -> bool {
        self.num > 0
    }

    pub fn is_integer(self) -> bool {
        self.den == 1
    }

    /// Reciprocal. Converts between a duration divisor and its elapsed
    /// length (divisor 4 lasts 1/4 of a whole note). The reciprocal of zero
    /// is zero.
    pub fn recip(self) -> Ratio {
        if self.num == 0 {
            return Ratio::zero();
        }
        Ratio::new(self.den, self.num)
    }

    /// Largest integer not greater than this value.
    pub fn floor(self) -> i64 {
        self.num.div_euclid(self.den)
    }

    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl From<i64> for Ratio {
    fn from(n: i64) -> Self {
        Ratio { num: n, den: 1 }
    }
}

impl From<i32> for Ratio {
    fn from(n: i32) -> Self {
        Ratio {
            num: i64::from(n),
            den: 1,
        }
    }
}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Ratio) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Ratio) -> Ordering {
        (self.num * other.den).cmp(&(other.num * self.den))
    }
}

impl<T: Into<Ratio>> ops::Add<T> for Ratio {
    type Output = Ratio;

    fn add(self, other: T) -> Ratio {
        let other: Ratio = other.into();
        Ratio::new(self.num * other.den + other.num * self.den, self.den * other.den)
    }
}

impl<T: Into<Ratio>> ops::Sub<T> for Ratio {
    type Output = Ratio;

    fn sub(self, other: T) -> Ratio {
        let other: Ratio = other.into();
        Ratio::new(self.num * other.den - other.num * self.den, self.den * other.den)
    }
}

impl<T: Into<Ratio>> ops::Mul<T> for Ratio {
    type Output = Ratio;

    fn mul(self, other: T) -> Ratio {
        let other: Ratio = other.into();
        Ratio::new(self.num * other.num, self.den * other.den)
    }
}

impl<T: Into<Ratio>> ops::Div<T> for Ratio {
    type Output = Ratio;

    fn div(self, other: T) -> Ratio {
        let other: Ratio = other.into();
        Ratio::new(self.num * other.den, self.den * other.num)
    }
}

impl ops::AddAssign for Ratio {
    fn add_assign(&mut self, other: Ratio) {
        *self = *self + other;
    }
}

impl ops::Neg for Ratio {
    type Output = Ratio;

    fn neg(self) -> Ratio {
        Ratio {
            num: -self.num,
            den: self.den,
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

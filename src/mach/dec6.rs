use crate::error;
use crate::lang::Error;
use std::cmp::Ordering;

type Result<T> = std::result::Result<T, Error>;

pub const MAX_DIGITS: u32 = 11;
pub const MAX_SCALE: u8 = 7;
const LIMIT: u64 = 100_000_000_000;

/// ## Packed decimal constants
///
/// Mirrors the six byte format of the runtime: bit 47 is the sign,
/// bits 44..46 the scale and the remaining 44 bits hold eleven BCD
/// digits. The compiler uses it to fold constants and to emit literals.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dec6 {
    negative: bool,
    scale: u8,
    digits: u64,
}

fn pow10(n: u8) -> u64 {
    10u64.pow(n as u32)
}

impl Dec6 {
    pub fn new(negative: bool, scale: u8, digits: u64) -> Result<Dec6> {
        if digits >= LIMIT || scale > MAX_SCALE {
            return Err(error!(Overflow; "DECIMAL"));
        }
        Ok(Dec6 {
            negative: negative && digits != 0,
            scale,
            digits,
        })
    }

    /// Parses literal text. The flag reports dropped fraction digits.
    pub fn from_literal(text: &str) -> Result<(Dec6, bool)> {
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, f),
            None => (text, ""),
        };
        let int_part = int_part.trim_start_matches('0');
        if int_part.len() > MAX_DIGITS as usize {
            return Err(error!(Overflow; text));
        }
        let mut digits: u64 = 0;
        let mut prec = 0u32;
        for ch in int_part.chars() {
            let d = ch.to_digit(10).ok_or_else(|| error!(SyntaxError; text))?;
            digits = digits * 10 + d as u64;
            prec += 1;
        }
        let mut scale = 0u8;
        let mut dropped = false;
        for ch in frac_part.chars() {
            let d = ch.to_digit(10).ok_or_else(|| error!(SyntaxError; text))?;
            if prec < MAX_DIGITS && scale < MAX_SCALE {
                digits = digits * 10 + d as u64;
                scale += 1;
                if digits > 0 {
                    prec += 1;
                }
            } else if d != 0 {
                dropped = true;
            }
        }
        while scale > 0 && digits % 10 == 0 {
            digits /= 10;
            scale -= 1;
        }
        Ok((Dec6::new(false, scale, digits)?, dropped))
    }

    pub fn from_i64(n: i64) -> Result<Dec6> {
        Dec6::new(n < 0, 0, n.unsigned_abs())
    }

    pub fn is_zero(&self) -> bool {
        self.digits == 0
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn neg(&self) -> Dec6 {
        Dec6 {
            negative: !self.negative && self.digits != 0,
            ..*self
        }
    }

    pub fn abs(&self) -> Dec6 {
        Dec6 {
            negative: false,
            ..*self
        }
    }

    /// Integer part, truncated toward zero.
    pub fn trunc_to_i64(&self) -> i64 {
        let n = (self.digits / pow10(self.scale)) as i64;
        if self.negative {
            -n
        } else {
            n
        }
    }

    pub fn is_integral(&self) -> bool {
        self.digits % pow10(self.scale) == 0
    }

    /// Brings both operands to one scale the way the runtime does:
    /// the smaller scale grows while its top digit is free, otherwise
    /// the larger shrinks. The flag reports non-zero digits lost.
    pub fn equalize(a: Dec6, b: Dec6) -> (Dec6, Dec6, bool) {
        let (mut lo, mut hi, swapped) = if a.scale <= b.scale {
            (a, b, false)
        } else {
            (b, a, true)
        };
        let mut truncated = false;
        while lo.scale < hi.scale {
            if lo.digits * 10 < LIMIT {
                lo.digits *= 10;
                lo.scale += 1;
            } else {
                truncated |= hi.digits % 10 != 0;
                hi.digits /= 10;
                hi.scale -= 1;
            }
        }
        lo.negative &= lo.digits != 0;
        hi.negative &= hi.digits != 0;
        if swapped {
            (hi, lo, truncated)
        } else {
            (lo, hi, truncated)
        }
    }

    fn signed(&self) -> i128 {
        if self.negative {
            -(self.digits as i128)
        } else {
            self.digits as i128
        }
    }

    fn from_signed(n: i128, scale: u8) -> Result<Dec6> {
        let digits = n.unsigned_abs();
        if digits >= LIMIT as u128 {
            return Err(error!(Overflow; "DECIMAL"));
        }
        Ok(Dec6::new(n < 0, scale, digits as u64)?.normalized())
    }

    fn normalized(mut self) -> Dec6 {
        while self.scale > 0 && self.digits % 10 == 0 {
            self.digits /= 10;
            self.scale -= 1;
        }
        self
    }

    pub fn add(&self, other: &Dec6) -> Result<Dec6> {
        let (a, b, _) = Dec6::equalize(*self, *other);
        Dec6::from_signed(a.signed() + b.signed(), a.scale)
    }

    pub fn sub(&self, other: &Dec6) -> Result<Dec6> {
        self.add(&other.neg())
    }

    /// Product with the fewest fraction digits dropped to fit.
    pub fn mul(&self, other: &Dec6) -> Result<Dec6> {
        let mut digits = self.digits as u128 * other.digits as u128;
        let mut scale = self.scale + other.scale;
        while scale > 0 && (digits >= LIMIT as u128 || scale > MAX_SCALE) {
            digits /= 10;
            scale -= 1;
        }
        let n = digits as i128;
        let negative = self.negative != other.negative;
        Dec6::from_signed(if negative { -n } else { n }, scale)
    }

    pub fn cmp(&self, other: &Dec6) -> Ordering {
        let scale = self.scale.max(other.scale);
        let a = self.signed() * pow10(scale - self.scale) as i128;
        let b = other.signed() * pow10(scale - other.scale) as i128;
        a.cmp(&b)
    }

    /// Six bytes, most significant first.
    pub fn to_bytes(&self) -> [u8; 6] {
        let mut bytes = [0u8; 6];
        let mut d = self.digits;
        for i in (1..6).rev() {
            let lo = (d % 10) as u8;
            d /= 10;
            let hi = (d % 10) as u8;
            d /= 10;
            bytes[i] = hi << 4 | lo;
        }
        bytes[0] = (d % 10) as u8 | (self.scale << 4);
        if self.negative {
            bytes[0] |= 0x80;
        }
        bytes
    }
}

impl std::fmt::Display for Dec6 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let p = pow10(self.scale);
        let sign = if self.negative { "-" } else { "" };
        if self.scale == 0 {
            write!(f, "{}{}", sign, self.digits)
        } else {
            write!(
                f,
                "{}{}.{:0width$}",
                sign,
                self.digits / p,
                self.digits % p,
                width = self.scale as usize
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dec(s: &str) -> Dec6 {
        Dec6::from_literal(s).unwrap().0
    }

    #[test]
    fn test_literal() {
        assert_eq!(dec("12.50").to_string(), "12.5");
        assert_eq!(dec("0.0000001").scale(), 7);
        let (d, dropped) = Dec6::from_literal("1.123456789").unwrap();
        assert_eq!(d.to_string(), "1.1234567");
        assert!(dropped);
        assert!(Dec6::from_literal("123456789012").is_err());
        assert_eq!(dec("99999999999").to_string(), "99999999999");
    }

    #[test]
    fn test_bytes() {
        assert_eq!(dec("12.5").to_bytes(), [0x10, 0x00, 0x00, 0x00, 0x01, 0x25]);
        assert_eq!(
            Dec6::from_i64(-32768).unwrap().to_bytes(),
            [0x80, 0x00, 0x00, 0x03, 0x27, 0x68]
        );
        assert_eq!(
            Dec6::from_i64(-2147483648).unwrap().to_bytes(),
            [0x80, 0x21, 0x47, 0x48, 0x36, 0x48]
        );
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(dec("1.5").add(&dec("2.25")).unwrap().to_string(), "3.75");
        assert_eq!(dec("1.5").sub(&dec("2.25")).unwrap().to_string(), "-0.75");
        assert_eq!(dec("1.5").mul(&dec("1.5")).unwrap().to_string(), "2.25");
        assert_eq!(dec("0.5").sub(&dec("0.5")).unwrap(), Dec6::default());
        assert!(dec("99999999999").add(&dec("1")).is_err());
        assert_eq!(dec("2.5").cmp(&dec("2.50")), Ordering::Equal);
        assert_eq!(dec("-2.5").trunc_to_i64(), -2);
    }

    proptest! {
        #[test]
        fn equalized_scales_match(
            a in 0u64..LIMIT, sa in 0u8..=MAX_SCALE, na in any::<bool>(),
            b in 0u64..LIMIT, sb in 0u8..=MAX_SCALE, nb in any::<bool>(),
        ) {
            let x = Dec6::new(na, sa, a).unwrap();
            let y = Dec6::new(nb, sb, b).unwrap();
            let (ex, ey, truncated) = Dec6::equalize(x, y);
            prop_assert_eq!(ex.scale(), ey.scale());
            if !truncated {
                prop_assert_eq!(ex.cmp(&x), Ordering::Equal);
                prop_assert_eq!(ey.cmp(&y), Ordering::Equal);
            }
        }
    }
}

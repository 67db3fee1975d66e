//! VAX F (32 bit) and G (64 bit) floating point.
//!
//! Both formats store 16 bit words in PDP-11 order and use an exponent bias two larger than
//! the matching IEEE format, so the fraction bits carry over unchanged. The `raw` values below
//! are the 4 or 8 field bytes read as one integer in the record's byte order.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VaxError {
    /// Sign bit set with a zero exponent. VAX traps on this pattern.
    #[error("VAX reserved operand")]
    ReservedOperand,
    /// NaN and infinities have no VAX representation.
    #[error("{0} has no VAX representation")]
    NotFinite(&'static str),
    #[error("value exceeds the VAX exponent range")]
    Overflow,
}

struct Format {
    bits: u32,
    frac_bits: u32,
    exp_mask: u64,
}

impl Format {
    const fn new(bits: u32, exp_bits: u32) -> Self {
        Format {
            bits,
            frac_bits: bits - 1 - exp_bits,
            exp_mask: (1 << exp_bits) - 1,
        }
    }

    fn split(&self, v: u64) -> (u64, u64, u64) {
        let sign = v >> (self.bits - 1) & 1;
        let exp = v >> self.frac_bits & self.exp_mask;
        let frac = v & self.frac_mask();
        (sign, exp, frac)
    }

    fn join(&self, sign: u64, exp: u64, frac: u64) -> u64 {
        sign << (self.bits - 1) | exp << self.frac_bits | frac
    }

    fn frac_mask(&self) -> u64 {
        (1 << self.frac_bits) - 1
    }

    fn hidden(&self) -> u64 {
        1 << self.frac_bits
    }

    /// Reverses the order of the 16 bit words.
    fn swap_words(&self, v: u64) -> u64 {
        let mut out = 0;
        for i in 0..self.bits / 16 {
            out = out << 16 | (v >> (16 * i)) & 0xFFFF;
        }
        out
    }

    fn decode(&self, raw: u64) -> Result<u64, VaxError> {
        let (sign, exp, frac) = self.split(self.swap_words(raw));
        if exp == 0 {
            return match sign {
                0 => Ok(0),
                _ => Err(VaxError::ReservedOperand),
            };
        }

        let exp = exp as i64 - 2;
        if exp > 0 {
            return Ok(self.join(sign, exp as u64, frac));
        }

        // Below the IEEE normal range.
        let shift = (1 - exp) as u32;
        Ok(self.join(sign, 0, (self.hidden() | frac) >> shift))
    }

    fn encode(&self, v: u64) -> Result<u64, VaxError> {
        let (sign, exp, frac) = self.split(v);
        if exp == self.exp_mask {
            return Err(VaxError::NotFinite(if frac == 0 { "infinity" } else { "NaN" }));
        }

        let (exp, frac) = if exp == 0 {
            if frac == 0 {
                return Ok(0);
            }
            let mut exp: i64 = 1;
            let mut frac = frac;
            while frac & self.hidden() == 0 {
                frac <<= 1;
                exp -= 1;
            }
            (exp, frac & self.frac_mask())
        } else {
            (exp as i64, frac)
        };

        let exp = exp + 2;
        if exp <= 0 {
            return Ok(0);
        }
        if exp as u64 > self.exp_mask {
            return Err(VaxError::Overflow);
        }

        Ok(self.swap_words(self.join(sign, exp as u64, frac)))
    }
}

const F: Format = Format::new(32, 8);
const G: Format = Format::new(64, 11);

/// VAX F bits to an IEEE single.
pub fn f_to_ieee(raw: u32) -> Result<f32, VaxError> {
    F.decode(raw as u64).map(|v| f32::from_bits(v as u32))
}

/// IEEE single to VAX F bits. Values too small for VAX become zero.
pub fn ieee_to_f(value: f32) -> Result<u32, VaxError> {
    F.encode(value.to_bits() as u64).map(|v| v as u32)
}

/// VAX G bits to an IEEE double.
pub fn g_to_ieee(raw: u64) -> Result<f64, VaxError> {
    G.decode(raw).map(f64::from_bits)
}

/// IEEE double to VAX G bits. Values too small for VAX become zero.
pub fn ieee_to_g(value: f64) -> Result<u64, VaxError> {
    G.encode(value.to_bits())
}

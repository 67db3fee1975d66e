//! Packed and zoned binary coded decimal.
//!
//! Packed BCD stores two digits per byte; the low nibble of the last byte is the sign.
//! Zoned BCD stores one digit per byte in the low nibble, a zone nibble in the high nibble of
//! every byte but the last, and the sign in the high nibble of the last byte.
//!
//! Sign nibbles 0xB and 0xD are negative; 0xA, 0xC, 0xE and 0xF are positive. The scale
//! (implied decimals) is not stored in the bytes.

use rust_decimal::Decimal;
use thiserror::Error;

/// Zone nibble 0.
pub const ZONE_ZERO: u8 = 0x00;
/// Zone nibble of ASCII digits (0x30..0x39).
pub const ZONE_ASCII: u8 = 0x03;
/// Zone nibble of EBCDIC digits (0xF0..0xF9).
pub const ZONE_EBCDIC: u8 = 0x0F;

const SIGN_PLUS: u8 = 0x0C;
const SIGN_MINUS: u8 = 0x0D;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BcdError {
    #[error("BCD field has no bytes")]
    Empty,
    /// A digit nibble outside 0..=9.
    #[error("invalid BCD digit 0x{nibble:X} in byte {position}")]
    InvalidDigit { position: usize, nibble: u8 },
    /// A zoned byte whose high nibble is neither the zone nor, in the last byte, a sign.
    #[error("invalid BCD zone 0x{nibble:X} in byte {position}")]
    InvalidZone { position: usize, nibble: u8 },
    /// The value needs more digits than the field holds, or more than a decimal can carry.
    #[error("value does not fit in {capacity} BCD digits")]
    Overflow { capacity: usize },
}

/// Decodes packed BCD with `decimals` implied decimals.
///
/// A digit in the low nibble of the last byte (no sign) is read as an unsigned digit.
pub fn decode_packed(bytes: &[u8], decimals: u32) -> Result<Decimal, BcdError> {
    let last = bytes.len().checked_sub(1).ok_or(BcdError::Empty)?;
    let capacity = 2 * bytes.len();

    let mut sum: i128 = 0;
    let mut negative = false;
    for (i, &b) in bytes.iter().enumerate() {
        let (high, low) = (b >> 4, b & 0x0F);
        if high > 9 {
            return Err(BcdError::InvalidDigit {
                position: i,
                nibble: high,
            });
        }
        sum = push_digit(sum, high, capacity)?;

        match low {
            0..=9 => sum = push_digit(sum, low, capacity)?,
            _ if i != last => {
                return Err(BcdError::InvalidDigit {
                    position: i,
                    nibble: low,
                });
            }
            0x0B | 0x0D => negative = true,
            _ => {}
        }
    }

    to_decimal(if negative { -sum } else { sum }, decimals, capacity)
}

/// Encodes `value` as `length` bytes of packed BCD with `decimals` implied decimals.
///
/// Digits beyond `decimals` are truncated.
pub fn encode_packed(value: &Decimal, decimals: u32, length: usize) -> Result<Vec<u8>, BcdError> {
    if length == 0 {
        return Err(BcdError::Empty);
    }
    let capacity = 2 * length - 1;
    let (negative, mut digits) = scaled_digits(value, decimals, capacity)?;

    let mut out = vec![0u8; length];
    let sign = if negative { SIGN_MINUS } else { SIGN_PLUS };
    out[length - 1] = ((digits % 10) as u8) << 4 | sign;
    digits /= 10;
    for byte in out[..length - 1].iter_mut().rev() {
        let low = (digits % 10) as u8;
        digits /= 10;
        let high = (digits % 10) as u8;
        digits /= 10;
        *byte = high << 4 | low;
    }

    Ok(out)
}

/// Decodes zoned BCD. Every byte but the last must carry `zone` in its high nibble.
pub fn decode_zoned(bytes: &[u8], zone: u8, decimals: u32) -> Result<Decimal, BcdError> {
    let last = bytes.len().checked_sub(1).ok_or(BcdError::Empty)?;
    let zone = zone & 0x0F;
    let capacity = bytes.len();

    let mut sum: i128 = 0;
    let mut negative = false;
    for (i, &b) in bytes.iter().enumerate() {
        let (high, low) = (b >> 4, b & 0x0F);
        if low > 9 {
            return Err(BcdError::InvalidDigit {
                position: i,
                nibble: low,
            });
        }
        sum = push_digit(sum, low, capacity)?;

        if high == zone {
            continue;
        }
        match high {
            _ if i != last => {
                return Err(BcdError::InvalidZone {
                    position: i,
                    nibble: high,
                });
            }
            0..=9 => {
                return Err(BcdError::InvalidZone {
                    position: i,
                    nibble: high,
                });
            }
            0x0B | 0x0D => negative = true,
            _ => {}
        }
    }

    to_decimal(if negative { -sum } else { sum }, decimals, capacity)
}

/// Encodes `value` as `length` bytes of zoned BCD with `decimals` implied decimals.
pub fn encode_zoned(
    value: &Decimal,
    zone: u8,
    decimals: u32,
    length: usize,
) -> Result<Vec<u8>, BcdError> {
    if length == 0 {
        return Err(BcdError::Empty);
    }
    let (negative, mut digits) = scaled_digits(value, decimals, length)?;

    let mut out = vec![0u8; length];
    let sign = if negative { SIGN_MINUS } else { SIGN_PLUS };
    out[length - 1] = sign << 4 | (digits % 10) as u8;
    digits /= 10;
    for byte in out[..length - 1].iter_mut().rev() {
        *byte = (zone & 0x0F) << 4 | (digits % 10) as u8;
        digits /= 10;
    }

    Ok(out)
}

fn push_digit(sum: i128, digit: u8, capacity: usize) -> Result<i128, BcdError> {
    sum.checked_mul(10)
        .and_then(|s| s.checked_add(digit as i128))
        .ok_or(BcdError::Overflow { capacity })
}

fn to_decimal(sum: i128, decimals: u32, capacity: usize) -> Result<Decimal, BcdError> {
    Decimal::try_from_i128_with_scale(sum, decimals).map_err(|_| BcdError::Overflow { capacity })
}

/// Sign and magnitude of `value * 10^decimals`, truncated toward zero.
fn scaled_digits(value: &Decimal, decimals: u32, capacity: usize) -> Result<(bool, u128), BcdError> {
    let overflow = BcdError::Overflow { capacity };
    let mantissa = value.mantissa();
    let scale = value.scale();

    let scaled = if scale >= decimals {
        mantissa / 10i128.pow(scale - decimals)
    } else {
        10i128
            .checked_pow(decimals - scale)
            .and_then(|factor| mantissa.checked_mul(factor))
            .ok_or(overflow.clone())?
    };

    let digits = scaled.unsigned_abs();
    if let Some(limit) = 10u128.checked_pow(capacity as u32) {
        if digits >= limit {
            return Err(overflow);
        }
    }

    Ok((scaled < 0, digits))
}

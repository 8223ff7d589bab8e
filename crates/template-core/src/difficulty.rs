//! Pool difficulty from a 256-bit network target.

use crate::error::{Result, TemplateError};

/// The "difficulty 1" target, `0x00000000ff000000...`.
pub const DIFF1_TARGET: [u8; 32] = {
    let mut target = [0u8; 32];
    target[4] = 0xff;
    target
};

/// Parse a big-endian hex target of at most 64 hex digits.
///
/// Short or odd-length strings are left-padded with zeros.
pub fn parse_target(target_hex: &str) -> Result<[u8; 32]> {
    let trimmed = target_hex.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() || digits.len() > 64 {
        return Err(TemplateError::Arithmetic(format!(
            "target must be 1 to 64 hex digits, got {}",
            digits.len()
        )));
    }

    let padded = format!("{:0>64}", digits);
    let mut target = [0u8; 32];
    hex::decode_to_slice(&padded, &mut target)
        .map_err(|e| TemplateError::Arithmetic(format!("target is not hex: {}", e)))?;
    Ok(target)
}

/// Convert a 256-bit big-endian target to the nearest f64.
///
/// The top 128 significant bits are converted in one step with any lower
/// set bits folded into a sticky bit, so the result is correctly rounded.
pub fn target_to_f64(target: &[u8; 32]) -> f64 {
    let mut high = [0u8; 16];
    let mut low = [0u8; 16];
    high.copy_from_slice(&target[..16]);
    low.copy_from_slice(&target[16..]);
    let high = u128::from_be_bytes(high);
    let low = u128::from_be_bytes(low);

    if high == 0 {
        return low as f64;
    }

    let leading = high.leading_zeros();
    let (top, rest) = if leading == 0 {
        (high, low)
    } else {
        ((high << leading) | (low >> (128 - leading)), low << leading)
    };
    let sticky = u128::from(rest != 0);

    (top | sticky) as f64 * 2f64.powi((128 - leading) as i32)
}

/// `DIFF1 / target`, rounded to 9 decimal places.
pub fn difficulty_from_target(target: &[u8; 32]) -> Result<f64> {
    if target.iter().all(|b| *b == 0) {
        return Err(TemplateError::Arithmetic("target is zero".into()));
    }

    let ratio = target_to_f64(&DIFF1_TARGET) / target_to_f64(target);
    round_to_9_places(ratio)
}

/// Pool difficulty for the daemon's hex `target` field.
pub fn pool_difficulty(target_hex: &str) -> Result<f64> {
    difficulty_from_target(&parse_target(target_hex)?)
}

/// Fraction digits needed to print any finite f64 exactly.
const F64_EXACT_FRACTION_DIGITS: usize = 1074;

/// Values from here on are never rounded, they have no fraction digits left.
const FIXED_NOTATION_LIMIT: f64 = 1e21;

/// Round half up at the 9th decimal on the exact binary value, then read the
/// digits back as the nearest f64.
fn round_to_9_places(value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(TemplateError::Arithmetic(format!("difficulty out of range: {}", value)));
    }
    if value >= FIXED_NOTATION_LIMIT {
        return Ok(value);
    }

    let exact = format!("{:.*}", F64_EXACT_FRACTION_DIGITS, value);
    let (integer, fraction) = exact
        .split_once('.')
        .ok_or_else(|| TemplateError::Arithmetic(format!("difficulty rounding: {}", exact)))?;

    let mut digits: Vec<u8> = integer.bytes().chain(fraction.bytes().take(9)).collect();
    if fraction.as_bytes().get(9).map_or(false, |digit| *digit >= b'5') {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }

    let split = digits.len() - 9;
    let rounded: String = digits[..split]
        .iter()
        .map(|d| char::from(*d))
        .chain(core::iter::once('.'))
        .chain(digits[split..].iter().map(|d| char::from(*d)))
        .collect();
    rounded
        .parse::<f64>()
        .map_err(|e| TemplateError::Arithmetic(format!("difficulty rounding: {}", e)))
}

//! Base32 variant used for public keys.
//!
//! Not RFC 4648: the alphabet drops vowels-ish confusables and bits are
//! packed least-significant first, five at a time.

use super::IdentityError;

/// Base32 alphabet, indexed by 5-bit value.
const ALPHABET: &[u8; 32] = b"0123456789bcdfghjklmnpqrstuvwxyz";

/// Map an ASCII character to its 5-bit value.
fn char_value(c: u8) -> Option<u32> {
    ALPHABET
        .iter()
        .position(|&a| a == c.to_ascii_lowercase())
        .map(|p| p as u32)
}

/// Decode a base32 string into bytes.
pub fn decode_base32(input: &str) -> Result<Vec<u8>, IdentityError> {
    let mut output = Vec::with_capacity(input.len() * 5 / 8);
    let mut next_byte: u32 = 0;
    let mut bits: u32 = 0;

    for c in input.bytes() {
        let value = char_value(c).ok_or(IdentityError::InvalidBase32Char(c as char))?;
        next_byte |= value << bits;
        bits += 5;

        if bits >= 8 {
            output.push((next_byte & 0xff) as u8);
            bits -= 8;
            next_byte >>= 8;
        }
    }

    if bits >= 5 || next_byte != 0 {
        return Err(IdentityError::TrailingBits);
    }

    Ok(output)
}

/// Encode bytes as a base32 string.
pub fn encode_base32(input: &[u8]) -> String {
    let mut output = String::with_capacity((input.len() * 8 + 4) / 5);
    let mut work: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in input {
        work |= u32::from(byte) << bits;
        bits += 8;
        while bits >= 5 {
            output.push(ALPHABET[(work & 31) as usize] as char);
            work >>= 5;
            bits -= 5;
        }
    }

    if bits > 0 {
        output.push(ALPHABET[(work & 31) as usize] as char);
    }

    output
}

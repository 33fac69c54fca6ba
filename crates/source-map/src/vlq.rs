//! Base64 VLQ as used by the `mappings` field of a v3 position map.

use crate::error::{MapError, Result};

const BASE64_CHARS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const VLQ_SHIFT: u32 = 5;
const VLQ_CONTINUATION: u8 = 0b10_0000;
const VLQ_MASK: u8 = 0b1_1111;

fn base64_value(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Append the VLQ encoding of `value` to `out`.
pub fn encode(value: i64, out: &mut String) {
    let mut rest: u64 = if value < 0 {
        (value.unsigned_abs() << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = (rest & u64::from(VLQ_MASK)) as u8;
        rest >>= VLQ_SHIFT;
        if rest > 0 {
            digit |= VLQ_CONTINUATION;
        }
        out.push(BASE64_CHARS[digit as usize] as char);
        if rest == 0 {
            break;
        }
    }
}

/// Decode one VLQ value from `input` starting at `*pos`, advancing `*pos` past it.
pub fn decode(input: &[u8], pos: &mut usize) -> Result<i64> {
    let mut accum: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let Some(&byte) = input.get(*pos) else {
            return Err(MapError::invalid_vlq("unexpected end of segment"));
        };
        let digit = base64_value(byte).ok_or_else(|| {
            MapError::invalid_vlq(format!("invalid base64 character '{}'", byte as char))
        })?;
        *pos += 1;

        if shift >= 60 {
            return Err(MapError::invalid_vlq("value overflows 64 bits"));
        }
        accum |= u64::from(digit & VLQ_MASK) << shift;
        shift += VLQ_SHIFT;

        if digit & VLQ_CONTINUATION == 0 {
            break;
        }
    }

    let negative = accum & 1 == 1;
    let magnitude = (accum >> 1) as i64;
    Ok(if negative { -magnitude } else { magnitude })
}

//! Positional base62 encoding of link identifiers.
//!
//! Identifiers are rendered most-significant digit first over [`ALPHABET`],
//! so distinct identifiers always produce distinct tokens and no collision
//! check against storage is needed.

use crate::error::CoreError;

/// Digit symbols in value order: `a` is 0, `9` is 61.
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of symbols in [`ALPHABET`].
pub const BASE: u64 = ALPHABET.len() as u64;

/// Longest token [`encode`] can produce (`u64::MAX` needs 11 digits).
pub const MAX_ENCODED_LEN: usize = 11;

/// Encodes `n` as a base62 string.
///
/// Zero is rendered as the single symbol `a` rather than an empty string.
pub fn encode(mut n: u64) -> String {
    if n == 0 {
        return char::from(ALPHABET[0]).to_string();
    }

    let mut buf = [0u8; MAX_ENCODED_LEN];
    let mut pos = buf.len();
    while n > 0 {
        pos -= 1;
        buf[pos] = ALPHABET[(n % BASE) as usize];
        n /= BASE;
    }

    buf[pos..].iter().map(|&b| char::from(b)).collect()
}

/// Decodes a base62 string back into the identifier it encodes.
///
/// Fails with [`CoreError::InvalidToken`] for empty input, symbols outside
/// [`ALPHABET`], or values that do not fit in a `u64`.
pub fn decode(token: &str) -> Result<u64, CoreError> {
    if token.is_empty() {
        return Err(CoreError::InvalidToken("token cannot be empty".to_string()));
    }

    token.chars().try_fold(0u64, |acc, c| {
        let digit = digit_value(c).ok_or_else(|| {
            CoreError::InvalidToken(format!("'{token}' contains invalid character '{c}'"))
        })?;

        acc.checked_mul(BASE)
            .and_then(|value| value.checked_add(digit))
            .ok_or_else(|| CoreError::InvalidToken(format!("'{token}' is out of range")))
    })
}

/// Returns true if every character of `token` is a base62 symbol.
pub fn is_alphabet(token: &str) -> bool {
    token.chars().all(|c| digit_value(c).is_some())
}

fn digit_value(c: char) -> Option<u64> {
    let value = match c {
        'a'..='z' => c as u32 - 'a' as u32,
        'A'..='Z' => c as u32 - 'A' as u32 + 26,
        '0'..='9' => c as u32 - '0' as u32 + 52,
        _ => return None,
    };
    Some(u64::from(value))
}

//! Identifier encoding and small matching helpers

use crate::error::ValidationError;
use bech32::{Bech32m, Hrp};
use uuid7::uuid7;

// construct a time-ordered uuid then encode it using bech32m under the given prefix
pub fn new_uuid_to_bech32(hrp: &'static str) -> Result<String, ValidationError> {
    let malformed = |reason: String| ValidationError::MalformedId { kind: hrp, reason };

    let parsed = Hrp::parse(hrp).map_err(|e| malformed(e.to_string()))?;
    bech32::encode::<Bech32m>(parsed, uuid7().as_bytes()).map_err(|e| malformed(e.to_string()))
}

/// Checks that `raw` is a bech32 string carrying a 16 byte payload under the
/// `hrp` prefix and returns its canonical lower-case form.
pub fn decode_bech32_id(hrp: &'static str, raw: &str) -> Result<String, ValidationError> {
    let malformed = |reason: String| ValidationError::MalformedId { kind: hrp, reason };

    if raw.is_empty() {
        return Err(malformed("identifier is empty".into()));
    }

    let (found, payload) = bech32::decode(raw).map_err(|e| malformed(e.to_string()))?;
    if !found.to_string().eq_ignore_ascii_case(hrp) {
        return Err(malformed(format!("expected prefix `{hrp}`, got `{found}`")));
    }
    if payload.len() != 16 {
        return Err(malformed(format!(
            "payload must be 16 bytes, got {}",
            payload.len()
        )));
    }

    Ok(raw.to_ascii_lowercase())
}

/// SQL `LIKE` style matching: `%` matches any run of characters, `_` exactly
/// one, everything else matches itself (case-sensitive).
pub fn like_match(pattern: &str, value: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let value: Vec<char> = value.chars().collect();

    let (mut p, mut v) = (0, 0);
    // position of the last `%` seen and the value index it was tried against
    let mut backtrack: Option<(usize, usize)> = None;

    while v < value.len() {
        match pattern.get(p) {
            Some(&'%') => {
                backtrack = Some((p, v));
                p += 1;
            }
            Some(&c) if c == '_' || c == value[v] => {
                p += 1;
                v += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    v = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

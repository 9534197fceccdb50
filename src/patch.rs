//! In-place, same-length byte patching.
//!
//! The patcher knows nothing about what a payload means. It finds a literal
//! byte pattern (never a regex) and overwrites exactly that range, so the
//! buffer length and the offsets of every other byte stay fixed.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("pattern not found")]
    NotFound,

    #[error("pattern found {0} times")]
    Ambiguous(usize),

    #[error("payload is {payload} bytes, pattern is {pattern} bytes")]
    LengthMismatch { pattern: usize, payload: usize },
}

/// Offsets of every occurrence of `pattern` in `haystack`, overlapping
/// ones included.
pub fn find_all(haystack: &[u8], pattern: &[u8]) -> Vec<usize> {
    if pattern.is_empty() || pattern.len() > haystack.len() {
        return Vec::new();
    }

    haystack
        .windows(pattern.len())
        .enumerate()
        .filter(|(_, window)| *window == pattern)
        .map(|(pos, _)| pos)
        .collect()
}

/// Replace the single occurrence of `pattern` in `buffer` with `payload`.
///
/// Returns the offset that was patched. Nothing is written unless the
/// pattern occurs exactly once and `payload` has the same length.
pub fn replace(buffer: &mut [u8], pattern: &[u8], payload: &[u8]) -> Result<usize, PatchError> {
    if payload.len() != pattern.len() {
        return Err(PatchError::LengthMismatch {
            pattern: pattern.len(),
            payload: payload.len(),
        });
    }

    let hits = find_all(buffer, pattern);
    let offset = match hits.as_slice() {
        [] => return Err(PatchError::NotFound),
        [offset] => *offset,
        many => return Err(PatchError::Ambiguous(many.len())),
    };

    buffer[offset..offset + payload.len()].copy_from_slice(payload);
    Ok(offset)
}

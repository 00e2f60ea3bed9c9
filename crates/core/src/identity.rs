//! Deterministic identifiers for catalog entities.
//!
//! Ids are a 32-bit xxHash of stable attributes, rendered as `<prefix>-<decimal>`.
//! The hash is seeded with a constant so ids survive restarts. Collisions are
//! possible and accepted.

use std::hash::Hasher as _;

use thiserror::Error;
use twox_hash::XxHash32;

const SEED: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("cannot derive {kind} id from empty {field}")]
    EmptyInput {
        kind: &'static str,
        field: &'static str,
    },
}

/// Raw 32-bit fingerprint of a byte sequence.
pub fn fingerprint(bytes: &[u8]) -> u32 {
    let mut hasher = XxHash32::with_seed(SEED);
    hasher.write(bytes);
    hasher.finish() as u32
}

fn prefixed(prefix: &str, input: &str) -> String {
    format!("{prefix}-{}", fingerprint(input.as_bytes()))
}

pub fn folder_id(path: &str) -> Result<String, IdentityError> {
    if path.is_empty() {
        return Err(IdentityError::EmptyInput {
            kind: "folder",
            field: "path",
        });
    }
    Ok(prefixed("f", path))
}

/// Video ids cover size and duration too, so a file whose content changed
/// shows up as a new video rather than an update of the old one.
pub fn video_id(
    size_bytes: i64,
    duration_ms: i64,
    file_path: &str,
) -> Result<String, IdentityError> {
    if file_path.is_empty() {
        return Err(IdentityError::EmptyInput {
            kind: "video",
            field: "file path",
        });
    }
    Ok(prefixed(
        "v",
        &format!("[{size_bytes} {{{duration_ms}}}] {file_path}"),
    ))
}

pub fn picture_id(file_path: &str) -> Result<String, IdentityError> {
    if file_path.is_empty() {
        return Err(IdentityError::EmptyInput {
            kind: "picture",
            field: "file path",
        });
    }
    Ok(prefixed("p", file_path))
}

pub fn page_id(url: &str) -> Result<String, IdentityError> {
    if url.is_empty() {
        return Err(IdentityError::EmptyInput {
            kind: "page",
            field: "url",
        });
    }
    Ok(prefixed("page", url))
}

//! Composite `(string, value)` keys and their fixed-width encoding.

use std::cmp::Ordering;
use std::fmt;

use crate::common::{Error, Result};

/// A tree entry: a string key paired with an `i32` value.
///
/// Keys order by string first (bytewise), then by value. Two entries with
/// the same string but different values are distinct keys, which is how one
/// string maps to many values.
///
/// # Encoding
/// ```text
/// ┌──────────────────────────────┬──────────┐
/// │ text bytes, NUL padded       │ value    │
/// │ (max_key_len bytes)          │ (i32 LE) │
/// └──────────────────────────────┴──────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    text: String,
    value: i32,
}

impl Key {
    /// Build a key, validating the string against `max_key_len`.
    ///
    /// # Errors
    /// - `Error::KeyTooLong` if the string is longer than `max_key_len` bytes
    /// - `Error::InvalidKey` if the string contains a NUL byte
    pub fn new(text: &str, value: i32, max_key_len: usize) -> Result<Self> {
        if text.len() > max_key_len {
            return Err(Error::KeyTooLong {
                len: text.len(),
                max: max_key_len,
            });
        }
        if text.as_bytes().contains(&0) {
            return Err(Error::InvalidKey(format!("{:?} contains a NUL byte", text)));
        }
        Ok(Self {
            text: text.to_owned(),
            value,
        })
    }

    /// The smallest key with the given string.
    ///
    /// Descending with this key lands on the leftmost leaf that can hold
    /// entries for `text`.
    pub fn lowest(text: &str, max_key_len: usize) -> Result<Self> {
        Self::new(text, i32::MIN, max_key_len)
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn value(&self) -> i32 {
        self.value
    }

    /// Whether this key's string equals `text`.
    #[inline]
    pub fn matches(&self, text: &str) -> bool {
        self.text == text
    }

    /// Encoded width of a key for a given `max_key_len`.
    #[inline]
    pub const fn encoded_len(max_key_len: usize) -> usize {
        max_key_len + 4
    }

    /// Write this key into `buf` (exactly `encoded_len(max_key_len)` bytes).
    pub fn encode(&self, buf: &mut [u8], max_key_len: usize) {
        debug_assert_eq!(buf.len(), Self::encoded_len(max_key_len));
        let bytes = self.text.as_bytes();
        buf[..bytes.len()].copy_from_slice(bytes);
        buf[bytes.len()..max_key_len].fill(0);
        buf[max_key_len..].copy_from_slice(&self.value.to_le_bytes());
    }

    /// Read a key from `buf` (exactly `encoded_len(max_key_len)` bytes).
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if the string bytes are not UTF-8.
    pub fn decode(buf: &[u8], max_key_len: usize) -> Result<Self> {
        debug_assert_eq!(buf.len(), Self::encoded_len(max_key_len));
        let raw = &buf[..max_key_len];
        let len = raw.iter().position(|&b| b == 0).unwrap_or(max_key_len);
        let text = std::str::from_utf8(&raw[..len])
            .map_err(|e| Error::Corrupted(format!("key is not UTF-8: {}", e)))?;
        let value = i32::from_le_bytes([
            buf[max_key_len],
            buf[max_key_len + 1],
            buf[max_key_len + 2],
            buf[max_key_len + 3],
        ]);
        Ok(Self {
            text: text.to_owned(),
            value,
        })
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text
            .as_bytes()
            .cmp(other.text.as_bytes())
            .then(self.value.cmp(&other.value))
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.text, self.value)
    }
}

//! Info-hash computation for `.torrent` payloads.
//!
//! The info-hash is the SHA-1 of the exact bytes of the bencoded `info` dictionary, so the
//! payload is scanned (validated) rather than decoded and re-encoded.

use std::ops::Range;

use sha1::{Digest, Sha1};
use thiserror::Error;

use crate::info_hash::InfoHash;

/// Deepest list/dictionary nesting accepted before the payload is rejected.
const MAX_DEPTH: usize = 64;

/// Errors raised while validating a `.torrent` payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetainfoError {
    /// The payload contained no bytes.
    #[error("torrent payload is empty")]
    Empty,
    /// The payload was not valid bencode.
    #[error("malformed bencode")]
    Malformed {
        /// Byte offset where scanning failed.
        offset: usize,
        /// Static description of the failure.
        reason: &'static str,
    },
    /// Lists or dictionaries were nested deeper than the scanner allows.
    #[error("bencode nesting too deep")]
    TooDeep {
        /// Byte offset of the offending container.
        offset: usize,
    },
    /// The top-level value was not a dictionary.
    #[error("torrent payload is not a dictionary")]
    NotADictionary,
    /// The top-level dictionary had no `info` dictionary.
    #[error("torrent payload has no info dictionary")]
    MissingInfo,
    /// Bytes remained after the top-level dictionary.
    #[error("trailing data after torrent payload")]
    TrailingData {
        /// Offset of the first unexpected byte.
        offset: usize,
    },
}

/// Compute the info-hash of a `.torrent` payload.
///
/// # Errors
///
/// Returns a [`MetainfoError`] when the payload is not a bencoded dictionary with an `info`
/// dictionary.
pub fn info_hash_from_torrent(bytes: &[u8]) -> Result<InfoHash, MetainfoError> {
    let span = info_span(bytes)?;
    let digest = Sha1::digest(&bytes[span]);
    Ok(InfoHash::from_digest(&digest))
}

fn info_span(bytes: &[u8]) -> Result<Range<usize>, MetainfoError> {
    if bytes.is_empty() {
        return Err(MetainfoError::Empty);
    }
    let mut scanner = Scanner { bytes, pos: 0 };
    if scanner.peek()? != b'd' {
        return Err(MetainfoError::NotADictionary);
    }
    scanner.pos += 1;

    let mut info = None;
    while scanner.peek()? != b'e' {
        let key = scanner.read_string()?;
        let start = scanner.pos;
        let is_dict = scanner.peek()? == b'd';
        scanner.skip_value(1)?;
        if key == b"info" {
            if !is_dict {
                return Err(MetainfoError::Malformed {
                    offset: start,
                    reason: "info is not a dictionary",
                });
            }
            info.get_or_insert(start..scanner.pos);
        }
    }
    scanner.pos += 1;

    if scanner.pos != bytes.len() {
        return Err(MetainfoError::TrailingData {
            offset: scanner.pos,
        });
    }
    info.ok_or(MetainfoError::MissingInfo)
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn peek(&self) -> Result<u8, MetainfoError> {
        self.bytes
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.malformed("unexpected end of input"))
    }

    const fn malformed(&self, reason: &'static str) -> MetainfoError {
        MetainfoError::Malformed {
            offset: self.pos,
            reason,
        }
    }

    fn skip_value(&mut self, depth: usize) -> Result<(), MetainfoError> {
        if depth > MAX_DEPTH {
            return Err(MetainfoError::TooDeep { offset: self.pos });
        }
        match self.peek()? {
            b'i' => self.skip_integer(),
            b'l' => {
                self.pos += 1;
                while self.peek()? != b'e' {
                    self.skip_value(depth + 1)?;
                }
                self.pos += 1;
                Ok(())
            }
            b'd' => {
                self.pos += 1;
                while self.peek()? != b'e' {
                    self.read_string()?;
                    self.skip_value(depth + 1)?;
                }
                self.pos += 1;
                Ok(())
            }
            b'0'..=b'9' => self.read_string().map(|_| ()),
            _ => Err(self.malformed("unexpected token")),
        }
    }

    fn skip_integer(&mut self) -> Result<(), MetainfoError> {
        self.pos += 1;
        let negative = self.peek()? == b'-';
        if negative {
            self.pos += 1;
        }
        let digits = self.take_digits();
        if digits.is_empty() {
            return Err(self.malformed("integer without digits"));
        }
        if (digits.len() > 1 && digits[0] == b'0') || (negative && digits == b"0") {
            return Err(self.malformed("non-canonical integer"));
        }
        if self.peek()? != b'e' {
            return Err(self.malformed("unterminated integer"));
        }
        self.pos += 1;
        Ok(())
    }

    fn read_string(&mut self) -> Result<&'a [u8], MetainfoError> {
        let digits = self.take_digits();
        if digits.is_empty() {
            return Err(self.malformed("expected string length"));
        }
        let len = digits.iter().try_fold(0_usize, |acc, digit| {
            acc.checked_mul(10)?.checked_add(usize::from(digit - b'0'))
        });
        let len = len.ok_or_else(|| self.malformed("string length overflow"))?;
        if self.peek()? != b':' {
            return Err(self.malformed("expected ':' after string length"));
        }
        self.pos += 1;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| self.malformed("string exceeds payload"))?;
        let bytes = self.bytes;
        let value = &bytes[self.pos..end];
        self.pos = end;
        Ok(value)
    }

    fn take_digits(&mut self) -> &'a [u8] {
        let bytes = self.bytes;
        let start = self.pos;
        while bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        &bytes[start..self.pos]
    }
}

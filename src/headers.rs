//! This module contains the [`HeaderTable`] type, an ordered collection of
//! HTTP header fields, along with the parser that populates one from the
//! header block of a message.
//!
//! [`HeaderTable`]: struct.HeaderTable.html

use indexmap::IndexMap;
use std::io::Write;
use super::{
    error::Error,
    find_crlf,
    ParseStatus,
    CRLF,
};

// These are the characters, beyond letters and digits, that may appear in an
// HTTP token such as a header field name (RFC 9110 section 5.6.2).
const TOKEN_PUNCTUATION: &[u8] = b"!#$%&'*+-.^_`|~";

fn is_token(name: &str) -> bool {
    !name.is_empty()
    && name.bytes().all(|c| {
        c.is_ascii_alphanumeric() || TOKEN_PUNCTUATION.contains(&c)
    })
}

fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// A case-insensitive mapping from header field name to value which
/// remembers the order in which fields were first added.
///
/// Names are stored lower-cased.  Adding a field which is already present
/// with [`set`](#method.set) appends the new value to the old one, separated
/// by `", "`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HeaderTable {
    fields: IndexMap<String, String>,
}

impl HeaderTable {
    #[must_use]
    pub fn contains<N>(&self, name: N) -> bool
        where N: AsRef<str>
    {
        self.fields.contains_key(&name.as_ref().to_ascii_lowercase())
    }

    /// Remove the named field, returning its value if it was present.  The
    /// remaining fields keep their relative order.
    pub fn delete<N>(&mut self, name: N) -> Option<String>
        where N: AsRef<str>
    {
        self.fields.shift_remove(&name.as_ref().to_ascii_lowercase())
    }

    /// Serialize the table as header lines followed by the blank line which
    /// ends a header block.
    #[must_use]
    pub fn generate(&self) -> Vec<u8> {
        let mut output = Vec::new();
        for (name, value) in &self.fields {
            output.extend_from_slice(name.as_bytes());
            output.extend_from_slice(b": ");
            output.extend_from_slice(value.as_bytes());
            output.extend_from_slice(CRLF.as_bytes());
        }
        output.extend_from_slice(CRLF.as_bytes());
        output
    }

    #[must_use]
    pub fn get<N>(&self, name: N) -> Option<&str>
        where N: AsRef<str>
    {
        self.fields.get(&name.as_ref().to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value of the named field, or add it at the end if it is
    /// not present.  An existing field keeps its position.
    pub fn overwrite<N, V>(&mut self, name: N, value: V)
        where N: AsRef<str>, V: Into<String>
    {
        self.fields.insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Parse at most one header line from the front of `raw_message`.
    ///
    /// * `(Incomplete, 0)` means no complete line is available yet.
    /// * `(Incomplete, n)` means one field was parsed from `n` bytes.
    /// * `(Complete, 2)` means the blank line ending the block was found.
    pub fn parse<T>(
        &mut self,
        raw_message: T
    ) -> Result<(ParseStatus, usize), Error>
        where T: AsRef<[u8]>
    {
        let raw_message = raw_message.as_ref();
        let line_end = match find_crlf(raw_message) {
            Some(line_end) => line_end,
            None => return Ok((ParseStatus::Incomplete, 0)),
        };
        if line_end == 0 {
            return Ok((ParseStatus::Complete, CRLF.len()));
        }
        let line = &raw_message[..line_end];
        let colon = line.iter().position(|&c| c == b':')
            .ok_or_else(|| {
                Error::HeaderLineMissingColon(String::from_utf8_lossy(line).into())
            })?;
        let name = &line[..colon];
        if name.last().map_or(false, |&c| is_whitespace(char::from(c))) {
            return Err(Error::InvalidHeaderName(String::from_utf8_lossy(name).into()));
        }
        let name = String::from_utf8_lossy(name);
        let name = name.trim_start_matches(is_whitespace);
        if !is_token(name) {
            return Err(Error::InvalidHeaderName(name.into()));
        }
        // Values may carry obs-text, which is kept rather than rejected.
        let value = String::from_utf8_lossy(&line[colon + 1..]);
        self.set(name, value.trim_matches(is_whitespace));
        Ok((ParseStatus::Incomplete, line_end + CRLF.len()))
    }

    /// Add a field, merging with any existing value of the same name as
    /// `"<old>, <new>"`.
    pub fn set<N, V>(&mut self, name: N, value: V)
        where N: AsRef<str>, V: AsRef<str>
    {
        let value = value.as_ref();
        self.fields.entry(name.as_ref().to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    pub fn write_to<W>(&self, sink: &mut W) -> std::io::Result<()>
        where W: Write + ?Sized
    {
        sink.write_all(&self.generate())
    }
}

//! Header fields and the line-at-a-time header parser.

use std::fmt;

use crate::{Error, Result};

const CRLF: &[u8] = b"\r\n";

/// An ordered map of header names to values.
///
/// Names are unique and compared case-sensitively: `Host` and `host` are two
/// different fields. Inserting an existing name replaces its value in place.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    fields: Vec<(String, String)>,
}

/// The result of parsing a single header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parsed {
    /// No complete line is buffered yet; nothing was consumed.
    Partial,
    /// One field line was parsed and inserted.
    Field(usize),
    /// The blank line ending the header block was consumed.
    End(usize),
}

impl Parsed {
    /// Number of bytes consumed from the input.
    pub fn consumed(self) -> usize {
        match self {
            Parsed::Partial => 0,
            Parsed::Field(n) | Parsed::End(n) => n,
        }
    }
}

impl HeaderMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of a header.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Insert a header, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Remove a header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.fields.iter().position(|(key, _)| key == name)?;
        Some(self.fields.remove(idx).1)
    }

    /// Whether a header is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the map has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Parse the next CRLF-terminated line of `data` into the map.
    ///
    /// A line starting at offset zero ends the header block. Otherwise the line
    /// is split at its first colon, the value is trimmed and upserted. At most
    /// one line is consumed per call.
    pub fn parse(&mut self, data: &[u8]) -> Result<Parsed> {
        let idx = match find_crlf(data) {
            Some(idx) => idx,
            None => return Ok(Parsed::Partial),
        };
        if idx == 0 {
            return Ok(Parsed::End(CRLF.len()));
        }

        let line = std::str::from_utf8(&data[..idx])
            .map_err(|_| Error::MalformedHeaderField(String::from_utf8_lossy(&data[..idx]).into()))?;
        let line = line.trim();

        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| Error::MalformedHeaderField(line.to_owned()))?;
        if key.ends_with(char::is_whitespace) {
            return Err(Error::MalformedHeaderKey(key.to_owned()));
        }

        self.insert(key, value.trim());
        Ok(Parsed::Field(idx + CRLF.len()))
    }
}

impl fmt::Debug for HeaderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = HeaderMap::new();
        headers.extend(iter);
        headers
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for HeaderMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// Position of the first CRLF in `data`.
pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|window| window == CRLF)
}

//! Body handling: the single-use [`RawBody`] stream and JSON helpers.

use std::fmt;
use std::io::{self, Read};

use bytes::{Buf, Bytes};

use crate::Result;

/// Raw HTTP response body.
///
/// A `RawBody` is a single-owner stream: reading it consumes `self`, so it
/// cannot be read twice. The underlying reader is dropped (and whatever it
/// holds released) as soon as the read returns, whether it succeeded or not.
pub struct RawBody {
    reader: Box<dyn Read + Send>,
}

impl RawBody {
    /// Wrap any reader.
    #[must_use]
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            reader: Box::new(reader),
        }
    }

    /// An empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::from(Bytes::new())
    }

    /// Limit the body to at most `limit` bytes; anything past it is never read.
    #[must_use]
    pub fn take(self, limit: u64) -> Self {
        Self::new(self.reader.take(limit))
    }

    /// Read the whole stream, consuming the body.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if reading fails.
    pub fn read_to_end(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for RawBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBody").finish_non_exhaustive()
    }
}

impl Default for RawBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for RawBody {
    fn from(bytes: Bytes) -> Self {
        Self::new(bytes.reader())
    }
}

impl From<Vec<u8>> for RawBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl From<String> for RawBody {
    fn from(text: String) -> Self {
        Self::from(Bytes::from(text))
    }
}

impl From<&'static str> for RawBody {
    fn from(text: &'static str) -> Self {
        Self::from(Bytes::from_static(text.as_bytes()))
    }
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// Uses `serde_path_to_error` so the error names the exact field that failed
/// (e.g. `data.tasks[0].id`).
///
/// # Errors
///
/// Returns [`crate::Error::JsonDeserialization`] if the bytes do not match `T`.
///
/// # Example
///
/// ```
/// use cloudconvert_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct Job { id: String }
///
/// let job: Job = from_json(br#"{"id":"6559c281"}"#).expect("deserialize");
/// assert_eq!(job, Job { id: "6559c281".to_string() });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

//! Cover request keys.
//!
//! The UI identifies a cover with a single string made of three
//! percent-encoded fields joined by `|`:
//!
//! ```text
//! <local cache path>|<cover URL>|<page URL>
//! ```
//!
//! The UI writes the literal `undefined` for fields it doesn't know yet;
//! such requests are rejected outright.

use std::fmt;
use std::path::PathBuf;

/// Separator between the three key fields
pub const KEY_SEPARATOR: char = '|';

/// Placeholder the UI emits for a missing field
pub const UNDEFINED: &str = "undefined";

/// A parsed cover request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    /// Where the raw cover bytes are cached on disk
    pub local_path: PathBuf,
    /// Direct image URL from the feed
    pub cover_url: String,
    /// Page URL that may point at a better cover (e.g. a video channel)
    pub page_url: String,
}

/// Why a request key was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("expected 3 fields separated by '|', found {0}")]
    FieldCount(usize),

    #[error("{field} is not valid percent-encoded UTF-8")]
    Encoding { field: &'static str },

    #[error("{field} is undefined")]
    Undefined { field: &'static str },
}

impl RequestKey {
    pub fn new(
        local_path: impl Into<PathBuf>,
        cover_url: impl Into<String>,
        page_url: impl Into<String>,
    ) -> Self {
        Self {
            local_path: local_path.into(),
            cover_url: cover_url.into(),
            page_url: page_url.into(),
        }
    }

    /// Parse a request id as handed over by the UI.
    pub fn parse(id: &str) -> Result<Self, KeyError> {
        let segments: Vec<&str> = id.split(KEY_SEPARATOR).collect();
        let [local, cover, page] = segments.as_slice() else {
            return Err(KeyError::FieldCount(segments.len()));
        };

        let local_path = decode_field(local, "local path")?;
        let cover_url = decode_field(cover, "cover URL")?;
        let page_url = decode_field(page, "page URL")?;

        Ok(Self {
            local_path: PathBuf::from(local_path),
            cover_url,
            page_url,
        })
    }

    /// Encode back into the `local|cover|page` request id form.
    pub fn encode(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            urlencoding::encode(&self.local_path.to_string_lossy()),
            urlencoding::encode(&self.cover_url),
            urlencoding::encode(&self.page_url),
            sep = KEY_SEPARATOR,
        )
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn decode_field(segment: &str, field: &'static str) -> Result<String, KeyError> {
    let decoded = urlencoding::decode(segment).map_err(|_| KeyError::Encoding { field })?;
    if decoded == UNDEFINED {
        return Err(KeyError::Undefined { field });
    }
    Ok(decoded.into_owned())
}

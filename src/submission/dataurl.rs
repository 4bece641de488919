//! `data:` URL encoding for image payloads.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Errors raised while parsing a data URL.
#[derive(Debug, Error)]
pub enum DataUrlError {
    /// Header is not `data:<mime>;base64`.
    #[error("data url header must look like 'data:<mime>;base64'")]
    InvalidHeader,
    /// Payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A decoded data URL.
///
/// Parsing accepts either the full `data:<mime>;base64,<payload>` form or a
/// bare base64 payload, in which case the MIME type is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime: Option<String>,
    bytes: Vec<u8>,
}

impl DataUrl {
    /// Encodes `bytes` as `data:<mime>;base64,<payload>`.
    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
    }

    /// Parses a data URL or bare base64 payload.
    pub fn parse(input: &str) -> Result<Self, DataUrlError> {
        let input = input.trim();
        let (mime, payload) = match input.split_once(',') {
            Some((header, payload)) => {
                let mime = header
                    .strip_prefix("data:")
                    .and_then(|rest| rest.strip_suffix(";base64"))
                    .ok_or(DataUrlError::InvalidHeader)?;
                (Some(mime.to_string()), payload)
            }
            None => (None, input),
        };

        Ok(Self {
            mime,
            bytes: STANDARD.decode(payload)?,
        })
    }

    /// MIME type from the header, if one was present.
    pub fn mime_type(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    /// Decoded payload.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the URL and returns its payload.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

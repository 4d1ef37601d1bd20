//! Portable resume codes.
//!
//! A code is `R1.` followed by the URL-safe base64 (no padding) of the
//! DEFLATE-compressed canonical JSON of a [`ProgressState`]. Decoding always runs
//! the payload through [`sanitize`], so a parseable-but-odd payload still yields
//! a usable state.

use std::fmt;
use std::io::{Read, Write};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::model::{ProgressState, SectionId, sanitize};

/// Literal version marker every resume code starts with.
pub const RESUME_PREFIX: &str = "R1.";

/// Query (or fragment) parameter carrying a resume code in a shareable link.
pub const RESUME_PARAM: &str = "resume";

/// Upper bound on decompressed payload size; anything larger is rejected.
const MAX_PAYLOAD_BYTES: u64 = 1 << 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    #[error("resume code does not start with `R1.`")]
    MissingVersion,

    #[error("resume code has no payload")]
    EmptyPayload,

    #[error("resume code is not valid url-safe base64")]
    Encoding,

    #[error("resume code payload could not be decompressed")]
    Compression,

    #[error("resume code payload is not valid JSON")]
    Payload,

    #[error("resume code payload is not a progress record")]
    Structure,

    #[error("progress could not be serialized: {0}")]
    Serialize(String),
}

/// A versioned, transport-safe progress code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResumeCode(String);

impl ResumeCode {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResumeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResumeCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encodes `state` into a resume code. Deterministic for a given state.
///
/// # Errors
///
/// Returns `CodecError::Serialize` if the state cannot be written out.
pub fn encode(state: &ProgressState) -> Result<ResumeCode, CodecError> {
    let json = serde_json::to_vec(state).map_err(|err| CodecError::Serialize(err.to_string()))?;

    let mut encoder = DeflateEncoder::new(Vec::with_capacity(json.len() / 2), Compression::best());
    encoder
        .write_all(&json)
        .map_err(|err| CodecError::Serialize(err.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|err| CodecError::Serialize(err.to_string()))?;

    Ok(ResumeCode(format!(
        "{RESUME_PREFIX}{}",
        URL_SAFE_NO_PAD.encode(compressed)
    )))
}

/// Decodes a resume code back into a sanitized state.
///
/// Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns a `CodecError` naming the stage that failed; nothing is partially applied.
pub fn decode(code: &str, entry: &SectionId) -> Result<ProgressState, CodecError> {
    let payload = code
        .trim()
        .strip_prefix(RESUME_PREFIX)
        .ok_or(CodecError::MissingVersion)?;
    if payload.is_empty() {
        return Err(CodecError::EmptyPayload);
    }

    let compressed = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| CodecError::Encoding)?;

    let mut json = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .take(MAX_PAYLOAD_BYTES + 1)
        .read_to_end(&mut json)
        .map_err(|_| CodecError::Compression)?;
    if json.len() as u64 > MAX_PAYLOAD_BYTES {
        return Err(CodecError::Compression);
    }

    let value: Value = serde_json::from_slice(&json).map_err(|_| CodecError::Payload)?;
    if !value.is_object() {
        return Err(CodecError::Structure);
    }

    Ok(sanitize(&value, entry))
}

/// Returns `base` with the code set as its `resume` query parameter.
///
/// Any existing `resume` parameter is replaced; other parameters are kept in order.
#[must_use]
pub fn build_shareable_link(base: &Url, code: &ResumeCode) -> Url {
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != RESUME_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut link = base.clone();
    link.set_query(None);
    {
        let mut pairs = link.query_pairs_mut();
        pairs.extend_pairs(retained);
        pairs.append_pair(RESUME_PARAM, code.as_str());
    }
    link
}

/// Splits a resume code off a link.
///
/// Looks at the `resume` query parameter first, then a `#resume=` fragment. Returns
/// the code (if any) and the link with the parameter stripped.
#[must_use]
pub fn take_code_from_link(link: &Url) -> (Option<String>, Url) {
    let mut code = None;
    let mut retained = Vec::new();
    for (key, value) in link.query_pairs() {
        if key == RESUME_PARAM {
            if code.is_none() {
                code = Some(value.into_owned());
            }
        } else {
            retained.push((key.into_owned(), value.into_owned()));
        }
    }

    let mut stripped = link.clone();
    stripped.set_query(None);
    if !retained.is_empty() {
        stripped.query_pairs_mut().extend_pairs(retained);
    }

    if code.is_none() {
        let fragment_code = link
            .fragment()
            .and_then(|fragment| fragment.strip_prefix("resume="))
            .map(str::to_owned);
        if fragment_code.is_some() {
            stripped.set_fragment(None);
            code = fragment_code;
        }
    }

    (code.filter(|code| !code.trim().is_empty()), stripped)
}

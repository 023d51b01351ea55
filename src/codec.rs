//! Versioned encoding of the profile payload stored next to the score columns.
//!
//! Labels, flags, zones and warnings travel together in a single JSON
//! document tagged with `format_version`. Maps are `BTreeMap`s keyed by
//! ordered enums, so equal details always encode to identical bytes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ProfileDetail;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("profile payload format {found} is not supported (expected {FORMAT_VERSION})")]
    UnsupportedVersion { found: u32 },

    #[error("profile payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    #[serde(flatten)]
    detail: &'a ProfileDetail,
}

#[derive(Deserialize)]
struct Header {
    format_version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(flatten)]
    detail: ProfileDetail,
}

pub fn encode(detail: &ProfileDetail) -> Result<String, CodecError> {
    let envelope = EnvelopeRef {
        format_version: FORMAT_VERSION,
        detail,
    };
    Ok(serde_json::to_string(&envelope)?)
}

pub fn decode(payload: &str) -> Result<ProfileDetail, CodecError> {
    let header: Header = serde_json::from_str(payload)?;
    if header.format_version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: header.format_version,
        });
    }
    let envelope: Envelope = serde_json::from_str(payload)?;
    Ok(envelope.detail)
}

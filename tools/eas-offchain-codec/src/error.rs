use eas_offchain_types::UnsupportedVersion;

/// Errors surfaced by compaction, decompaction and the text codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    UnsupportedVersion(#[from] UnsupportedVersion),

    #[error("compact attestation must have {min} to {max} slots, got {got}")]
    Arity { got: usize, min: usize, max: usize },

    #[error("invalid compact slot {index} ({name}): {reason}")]
    InvalidSlot { index: usize, name: &'static str, reason: String },

    #[error("base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("deflate stream error: {0}")]
    Deflate(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decompressed payload exceeds {max} bytes")]
    PayloadTooLarge { max: usize },

    #[error("share url has no `attestation` parameter")]
    MissingAttestationParam,

    #[error("share url parameter is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

pub type Result<T, E = CodecError> = std::result::Result<T, E>;

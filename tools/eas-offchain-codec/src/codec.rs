//! Text codec for compact attestations and the shareable URL built on top of it.
//!
//! `tuple -> JSON -> zlib (best compression) -> URL-safe base64 (no padding)`

use std::io::{Read, Write};

use base64::Engine;
use eas_offchain_types::AttestationPackage;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::compact::{compact, CompactAttestation};
use crate::decompact::decompact;
use crate::error::{CodecError, Result};

/// Path the share fragment is attached to.
pub const SHARE_URL_PATH: &str = "/offchain/url/";

/// Fragment parameter carrying the encoded attestation.
pub const SHARE_URL_PARAM: &str = "attestation";

/// Upper bound on the tuple JSON, enforced when zipping and when unzipping.
pub const MAX_DECOMPRESSED_SIZE: usize = 1024 * 1024;

/// Characters `encodeURIComponent` leaves untouched.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Serialize, compress and base64url-encode a compact tuple.
///
/// Fails with [`CodecError::PayloadTooLarge`] when [`unzip`] would refuse the result.
pub fn zip(compact: &CompactAttestation) -> Result<String> {
    let json = serde_json::to_vec(compact)?;
    if json.len() > MAX_DECOMPRESSED_SIZE {
        return Err(CodecError::PayloadTooLarge { max: MAX_DECOMPRESSED_SIZE });
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    tracing::trace!(json_len = json.len(), compressed_len = compressed.len(), "zipped compact attestation");
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(compressed))
}

/// Inverse of [`zip`]. Also accepts the standard base64 alphabet, with or without padding.
pub fn unzip(text: &str) -> Result<CompactAttestation> {
    let normalized: String = text
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let compressed = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(normalized)?;

    let mut json = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .take(MAX_DECOMPRESSED_SIZE as u64 + 1)
        .read_to_end(&mut json)?;
    if json.len() > MAX_DECOMPRESSED_SIZE {
        return Err(CodecError::PayloadTooLarge { max: MAX_DECOMPRESSED_SIZE });
    }

    let slots: Vec<Value> = serde_json::from_slice(&json)?;
    tracing::trace!(compressed_len = compressed.len(), slots = slots.len(), "unzipped compact attestation");
    CompactAttestation::from_slots(&slots)
}

/// Compact and zip a package.
pub fn encode_to_text(package: &AttestationPackage) -> Result<String> {
    zip(&compact(package))
}

/// Unzip and decompact a package.
pub fn decode_from_text(text: &str) -> Result<AttestationPackage> {
    decompact(&unzip(text)?)
}

/// Relative share URL: `/offchain/url/#attestation=<percent-encoded text>`.
pub fn build_share_url(package: &AttestationPackage) -> Result<String> {
    let text = encode_to_text(package)?;
    Ok(format!(
        "{SHARE_URL_PATH}#{SHARE_URL_PARAM}={}",
        utf8_percent_encode(&text, URI_COMPONENT)
    ))
}

/// [`build_share_url`] prefixed with an origin such as `https://sepolia.easscan.org`.
pub fn build_share_url_with_base(base: &str, package: &AttestationPackage) -> Result<String> {
    Ok(format!("{}{}", base.trim_end_matches('/'), build_share_url(package)?))
}

/// Decode a package from a share URL (absolute, relative, or just its fragment).
pub fn parse_share_url(url: &str) -> Result<AttestationPackage> {
    let fragment = url.split_once('#').map_or(url, |(_, fragment)| fragment);
    let encoded = fragment
        .split('&')
        .find_map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| *key == SHARE_URL_PARAM)
                .map(|(_, value)| value)
        })
        .ok_or(CodecError::MissingAttestationParam)?;

    let text = percent_decode_str(encoded).decode_utf8()?;
    decode_from_text(&text)
}

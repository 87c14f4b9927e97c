//! Compaction and shareable-link encoding for EAS off-chain attestations.
//!
//! Encode: [`legacy`] normalization -> [`compact`] -> [`codec::zip`].
//! Decode: [`codec::unzip`] -> [`decompact`].

pub mod codec;
pub mod compact;
pub mod decompact;
pub mod error;
pub mod legacy;


pub use codec::{
    build_share_url, build_share_url_with_base, decode_from_text, encode_to_text,
    parse_share_url, unzip, zip,
};
pub use compact::{compact, compact_shareable, CompactAttestation, ZeroOr};
pub use decompact::decompact;
pub use error::{CodecError, Result};
pub use legacy::{is_legacy_flat_signature, FlatSignedOffchainAttestation, ShareablePackage, SignatureShape};

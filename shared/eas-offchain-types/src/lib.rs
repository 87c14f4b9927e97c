//! Shared types for EAS off-chain attestation packages: version registry, typed-data fields,
//! package model and well-known sentinels.

pub mod constants;
pub mod package;
pub mod serde_num;
pub mod version;

pub use constants::{DOMAIN_NAME, ZERO_ADDRESS, ZERO_HASH};
pub use package::{
    AttestationMessage, AttestationPackage, Signature, SignedOffchainAttestation, TypedDataDomain,
    TypedDataTypes,
};
pub use version::{AttestationVersion, TypedDataField, UnsupportedVersion};

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::version::{AttestationVersion, TypedDataField, UnsupportedVersion};

/// Struct name -> ordered field list, as carried in EIP-712 typed data.
pub type TypedDataTypes = BTreeMap<String, Vec<TypedDataField>>;

/// EIP-712 signing domain of an off-chain attestation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataDomain {
    pub name: String,
    pub version: String,
    #[serde(with = "crate::serde_num::u256_string")]
    pub chain_id: U256,
    pub verifying_contract: Address,
}

/// Recoverable ECDSA signature split into its components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

/// The signed `Attest` message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationMessage {
    /// Absent for Legacy attestations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u16>,
    pub schema: B256,
    pub recipient: Address,
    #[serde(with = "crate::serde_num::u64_number")]
    pub time: u64,
    /// Unix seconds, 0 = never expires.
    #[serde(with = "crate::serde_num::u64_number")]
    pub expiration_time: u64,
    pub revocable: bool,
    #[serde(rename = "refUID")]
    pub ref_uid: B256,
    pub data: Bytes,
    /// Present from V2 onward.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<B256>,
}

/// Signature-bearing typed-data object in the current nested shape.
///
/// When the top-level `version` key is missing it is taken from `message.version`, and from
/// there defaults to Legacy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SignedOffchainAttestationRepr")]
pub struct SignedOffchainAttestation {
    pub version: AttestationVersion,
    pub domain: TypedDataDomain,
    pub primary_type: String,
    pub types: TypedDataTypes,
    pub signature: Signature,
    pub uid: B256,
    pub message: AttestationMessage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedOffchainAttestationRepr {
    #[serde(default)]
    version: Option<AttestationVersion>,
    domain: TypedDataDomain,
    primary_type: String,
    types: TypedDataTypes,
    signature: Signature,
    uid: B256,
    message: AttestationMessage,
}

impl TryFrom<SignedOffchainAttestationRepr> for SignedOffchainAttestation {
    type Error = UnsupportedVersion;

    fn try_from(repr: SignedOffchainAttestationRepr) -> Result<Self, Self::Error> {
        let version = match repr.version {
            Some(version) => version,
            None => AttestationVersion::resolve(repr.message.version)?,
        };
        Ok(SignedOffchainAttestation {
            version,
            domain: repr.domain,
            primary_type: repr.primary_type,
            types: repr.types,
            signature: repr.signature,
            uid: repr.uid,
            message: repr.message,
        })
    }
}

impl SignedOffchainAttestation {
    /// The `types` map containing only the struct definition `version` dictates.
    pub fn canonical_types(version: AttestationVersion) -> TypedDataTypes {
        let mut types = TypedDataTypes::new();
        types.insert(version.primary_type().to_string(), version.fields());
        types
    }

    /// Whether `primary_type` and `types` are exactly what the version tag dictates.
    pub fn has_canonical_types(&self) -> bool {
        self.primary_type == self.version.primary_type()
            && self.types == Self::canonical_types(self.version)
    }
}

/// A signed attestation together with the address that produced the signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationPackage {
    pub sig: SignedOffchainAttestation,
    pub signer: Address,
}

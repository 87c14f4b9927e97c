//! Legacy flat-signature adapter.
//!
//! Early V1 packages carried `r`, `s` and `v` beside `domain`/`message`/`uid` instead of a
//! nested `signature` object. Both shapes are accepted on input; only the nested one leaves this
//! module.

use alloy_primitives::{Address, B256};
use eas_offchain_types::{
    AttestationMessage, AttestationPackage, AttestationVersion, Signature,
    SignedOffchainAttestation, TypedDataDomain, TypedDataTypes,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Flat V1 signature object: `r`/`s`/`v` at top level, no `version`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatSignedOffchainAttestation {
    pub domain: TypedDataDomain,
    pub primary_type: String,
    pub types: TypedDataTypes,
    pub message: AttestationMessage,
    pub uid: B256,
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

impl FlatSignedOffchainAttestation {
    /// Nest the signature and tag the result V1. Every other field is kept as is.
    pub fn upgrade(self) -> SignedOffchainAttestation {
        tracing::debug!(uid = %self.uid, "upgrading flat signature to nested V1 shape");
        SignedOffchainAttestation {
            version: AttestationVersion::V1,
            domain: self.domain,
            primary_type: self.primary_type,
            types: self.types,
            signature: Signature { v: self.v, r: self.r, s: self.s },
            uid: self.uid,
            message: self.message,
        }
    }
}

/// Either signature shape. Any object exposing top-level `v`, `r` and `s` is read as flat; field
/// errors are reported against the shape that was picked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SignatureShape {
    Flat(FlatSignedOffchainAttestation),
    Nested(SignedOffchainAttestation),
}

impl<'de> Deserialize<'de> for SignatureShape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let shape = if is_legacy_flat_signature(&value) {
            serde_json::from_value(value)
                .map(SignatureShape::Flat)
                .map_err(|e| format!("flat signature object: {e}"))
        } else {
            serde_json::from_value(value)
                .map(SignatureShape::Nested)
                .map_err(|e| format!("signature object: {e}"))
        };
        shape.map_err(serde::de::Error::custom)
    }
}

impl SignatureShape {
    pub fn is_legacy_flat(&self) -> bool {
        matches!(self, SignatureShape::Flat(_))
    }

    pub fn into_current(self) -> SignedOffchainAttestation {
        match self {
            SignatureShape::Flat(flat) => flat.upgrade(),
            SignatureShape::Nested(sig) => sig,
        }
    }
}

impl From<SignatureShape> for SignedOffchainAttestation {
    fn from(shape: SignatureShape) -> Self {
        shape.into_current()
    }
}

/// Package as handed over by the signing side, in either signature shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareablePackage {
    pub sig: SignatureShape,
    pub signer: Address,
}

impl From<ShareablePackage> for AttestationPackage {
    fn from(package: ShareablePackage) -> Self {
        AttestationPackage { sig: package.sig.into_current(), signer: package.signer }
    }
}

impl From<AttestationPackage> for ShareablePackage {
    fn from(package: AttestationPackage) -> Self {
        ShareablePackage { sig: SignatureShape::Nested(package.sig), signer: package.signer }
    }
}

/// Raw-object check for callers holding untyped JSON: true iff `v`, `r` and `s` are all
/// top-level keys.
pub fn is_legacy_flat_signature(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| ["v", "r", "s"].iter().all(|key| obj.contains_key(*key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, bytes, U256};
    use serde_json::json;

    fn flat() -> FlatSignedOffchainAttestation {
        FlatSignedOffchainAttestation {
            domain: TypedDataDomain {
                name: eas_offchain_types::DOMAIN_NAME.to_string(),
                version: "0.26".to_string(),
                chain_id: U256::from(1u64),
                verifying_contract: address!("A1207F3BBa224E2c9c3c6D5aF63D0eb1582Ce587"),
            },
            primary_type: "Attest".to_string(),
            types: SignedOffchainAttestation::canonical_types(AttestationVersion::V1),
            message: AttestationMessage {
                version: Some(1),
                schema: b256!("4444444444444444444444444444444444444444444444444444444444444444"),
                recipient: address!("00000000000000000000000000000000000000aa"),
                time: 1_690_000_000,
                expiration_time: 0,
                revocable: false,
                ref_uid: B256::ZERO,
                data: bytes!("00"),
                salt: None,
            },
            uid: b256!("5555555555555555555555555555555555555555555555555555555555555555"),
            v: 27,
            r: b256!("6666666666666666666666666666666666666666666666666666666666666666"),
            s: b256!("7777777777777777777777777777777777777777777777777777777777777777"),
        }
    }

    #[test]
    fn test_upgrade_nests_signature_and_tags_v1() {
        let original = flat();
        let sig = original.clone().upgrade();
        assert_eq!(sig.version, AttestationVersion::V1);
        assert_eq!(sig.signature, Signature { v: 27, r: original.r, s: original.s });
        assert_eq!(sig.domain, original.domain);
        assert_eq!(sig.message, original.message);
        assert_eq!(sig.uid, original.uid);
        assert_eq!(sig.types, original.types);
        assert_eq!(sig.primary_type, original.primary_type);
    }

    #[test]
    fn test_flat_json_deserializes_as_flat() {
        let value = serde_json::to_value(flat()).unwrap();
        assert!(is_legacy_flat_signature(&value));

        let shape: SignatureShape = serde_json::from_value(value).unwrap();
        assert!(shape.is_legacy_flat());
        assert_eq!(shape.into_current().version, AttestationVersion::V1);
    }

    #[test]
    fn test_nested_json_passes_through() {
        let nested = flat().upgrade();
        let value = serde_json::to_value(&nested).unwrap();
        assert!(!is_legacy_flat_signature(&value));

        let shape: SignatureShape = serde_json::from_value(value).unwrap();
        assert!(!shape.is_legacy_flat());
        assert_eq!(shape.into_current(), nested);
    }

    #[test]
    fn test_predicate_requires_all_three_keys() {
        assert!(is_legacy_flat_signature(&json!({ "v": 27, "r": "0x", "s": "0x" })));
        assert!(!is_legacy_flat_signature(&json!({ "v": 27, "r": "0x" })));
        assert!(!is_legacy_flat_signature(&json!({ "signature": { "v": 27, "r": "0x", "s": "0x" } })));
        assert!(!is_legacy_flat_signature(&json!(["v", "r", "s"])));
    }

    #[test]
    fn test_shape_errors_name_the_missing_field() {
        let mut value = serde_json::to_value(flat()).unwrap();
        value.as_object_mut().unwrap().remove("uid");
        let err = serde_json::from_value::<SignatureShape>(value).unwrap_err().to_string();
        assert!(err.contains("flat signature object"), "{err}");
        assert!(err.contains("missing field `uid`"), "{err}");

        let mut value = serde_json::to_value(flat().upgrade()).unwrap();
        value.as_object_mut().unwrap().remove("signature");
        let err = serde_json::from_value::<SignatureShape>(value).unwrap_err().to_string();
        assert!(err.contains("missing field `signature`"), "{err}");
        assert!(!err.contains("untagged"), "{err}");
    }

    #[test]
    fn test_shareable_package_normalizes() {
        let signer = address!("00000000000000000000000000000000000000bb");
        let shareable = ShareablePackage { sig: SignatureShape::Flat(flat()), signer };
        let json = serde_json::to_string(&shareable).unwrap();

        let parsed: ShareablePackage = serde_json::from_str(&json).unwrap();
        let package = AttestationPackage::from(parsed);
        assert_eq!(package.signer, signer);
        assert_eq!(package.sig.version, AttestationVersion::V1);
        assert_eq!(package.sig.signature.v, 27);
    }
}

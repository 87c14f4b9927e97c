use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::constants::{PRIMARY_TYPE_ATTEST, PRIMARY_TYPE_LEGACY};

/// A version tag outside {Legacy, V1, V2}. Carries the offending value as text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unsupported offchain attestation version: {0}")]
pub struct UnsupportedVersion(pub String);

/// Generation of the signed `Attest` message shape.
///
/// The tag alone decides which typed-data field list a package is verified against:
/// - `Legacy`: base fields, primary type `Attestation`.
/// - `V1`: leading `uint16 version` + base fields.
/// - `V2`: leading `uint16 version` + base fields + trailing `bytes32 salt`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
#[repr(u16)]
pub enum AttestationVersion {
    #[default]
    Legacy = 0,
    V1 = 1,
    V2 = 2,
}

/// One `{ name, type }` entry of an EIP-712 struct definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedDataField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl TypedDataField {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self { name: name.into(), ty: ty.into() }
    }
}

const VERSION_FIELD: (&str, &str) = ("version", "uint16");
const SALT_FIELD: (&str, &str) = ("salt", "bytes32");

/// Fields shared by every generation, in signing order.
const BASE_FIELDS: [(&str, &str); 7] = [
    ("schema", "bytes32"),
    ("recipient", "address"),
    ("time", "uint64"),
    ("expirationTime", "uint64"),
    ("revocable", "bool"),
    ("refUID", "bytes32"),
    ("data", "bytes"),
];

impl AttestationVersion {
    pub const ALL: [AttestationVersion; 3] =
        [AttestationVersion::Legacy, AttestationVersion::V1, AttestationVersion::V2];

    /// Resolve the tag carried in a compact tuple. A missing or zero tag means `Legacy`.
    pub fn resolve(tag: Option<u16>) -> Result<Self, UnsupportedVersion> {
        match tag {
            None | Some(0) => Ok(AttestationVersion::Legacy),
            Some(tag) => Self::try_from(tag),
        }
    }

    /// Tag written into the compact tuple; `None` for `Legacy`, which predates the slot.
    pub fn tag(self) -> Option<u16> {
        match self {
            AttestationVersion::Legacy => None,
            other => Some(other as u16),
        }
    }

    pub fn primary_type(self) -> &'static str {
        match self {
            AttestationVersion::Legacy => PRIMARY_TYPE_LEGACY,
            AttestationVersion::V1 | AttestationVersion::V2 => PRIMARY_TYPE_ATTEST,
        }
    }

    /// Ordered field list of the signed message struct.
    pub fn fields(self) -> Vec<TypedDataField> {
        let layout: Vec<(&str, &str)> = match self {
            AttestationVersion::Legacy => BASE_FIELDS.to_vec(),
            AttestationVersion::V1 => {
                let mut fields = Vec::with_capacity(BASE_FIELDS.len() + 1);
                fields.push(VERSION_FIELD);
                fields.extend_from_slice(&BASE_FIELDS);
                fields
            }
            AttestationVersion::V2 => {
                let mut fields = Vec::with_capacity(BASE_FIELDS.len() + 2);
                fields.push(VERSION_FIELD);
                fields.extend_from_slice(&BASE_FIELDS);
                fields.push(SALT_FIELD);
                fields
            }
        };
        layout.into_iter().map(|(name, ty)| TypedDataField::new(name, ty)).collect()
    }

    /// EIP-712 `encodeType` string, e.g. `Attest(uint16 version,bytes32 schema,...)`.
    pub fn encode_type(self) -> String {
        let members: Vec<String> =
            self.fields().iter().map(|f| format!("{} {}", f.ty, f.name)).collect();
        format!("{}({})", self.primary_type(), members.join(","))
    }

    /// keccak256 of [`encode_type`](Self::encode_type).
    pub fn type_hash(self) -> B256 {
        let mut h = Keccak256::new();
        h.update(self.encode_type().as_bytes());
        let out = h.finalize();
        B256::from_slice(out.as_slice())
    }
}

impl TryFrom<u16> for AttestationVersion {
    type Error = UnsupportedVersion;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AttestationVersion::Legacy),
            1 => Ok(AttestationVersion::V1),
            2 => Ok(AttestationVersion::V2),
            other => Err(UnsupportedVersion(other.to_string())),
        }
    }
}

impl From<AttestationVersion> for u16 {
    fn from(version: AttestationVersion) -> Self {
        version as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(version: AttestationVersion) -> Vec<String> {
        version.fields().into_iter().map(|f| f.name).collect()
    }

    #[test]
    fn test_legacy_uses_base_fields() {
        assert_eq!(
            names(AttestationVersion::Legacy),
            ["schema", "recipient", "time", "expirationTime", "revocable", "refUID", "data"]
        );
        assert_eq!(AttestationVersion::Legacy.primary_type(), "Attestation");
    }

    #[test]
    fn test_v1_prepends_version() {
        let fields = AttestationVersion::V1.fields();
        assert_eq!(fields.len(), 8);
        assert_eq!(fields[0], TypedDataField::new("version", "uint16"));
        assert_eq!(fields[1].name, "schema");
        assert_eq!(fields[7].name, "data");
        assert_eq!(AttestationVersion::V1.primary_type(), "Attest");
    }

    #[test]
    fn test_v2_prepends_version_and_appends_salt() {
        let fields = AttestationVersion::V2.fields();
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[0].name, "version");
        assert_eq!(fields[8], TypedDataField::new("salt", "bytes32"));
        assert_eq!(AttestationVersion::V2.primary_type(), "Attest");
    }

    #[test]
    fn test_resolve() {
        assert_eq!(AttestationVersion::resolve(None), Ok(AttestationVersion::Legacy));
        assert_eq!(AttestationVersion::resolve(Some(0)), Ok(AttestationVersion::Legacy));
        assert_eq!(AttestationVersion::resolve(Some(1)), Ok(AttestationVersion::V1));
        assert_eq!(AttestationVersion::resolve(Some(2)), Ok(AttestationVersion::V2));

        let err = AttestationVersion::resolve(Some(99)).unwrap_err();
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn test_tag() {
        assert_eq!(AttestationVersion::Legacy.tag(), None);
        assert_eq!(AttestationVersion::V1.tag(), Some(1));
        assert_eq!(AttestationVersion::V2.tag(), Some(2));
    }

    #[test]
    fn test_encode_type() {
        assert_eq!(
            AttestationVersion::Legacy.encode_type(),
            "Attestation(bytes32 schema,address recipient,uint64 time,uint64 expirationTime,bool revocable,bytes32 refUID,bytes data)"
        );
        assert_eq!(
            AttestationVersion::V2.encode_type(),
            "Attest(uint16 version,bytes32 schema,address recipient,uint64 time,uint64 expirationTime,bool revocable,bytes32 refUID,bytes data,bytes32 salt)"
        );
    }

    #[test]
    fn test_type_hashes_are_distinct() {
        let hashes: Vec<B256> = AttestationVersion::ALL.iter().map(|v| v.type_hash()).collect();
        assert_ne!(hashes[0], hashes[1]);
        assert_ne!(hashes[1], hashes[2]);
        assert_ne!(hashes[0], hashes[2]);
    }

    #[test]
    fn test_serde_as_number() {
        assert_eq!(serde_json::to_string(&AttestationVersion::V2).unwrap(), "2");
        let v: AttestationVersion = serde_json::from_str("1").unwrap();
        assert_eq!(v, AttestationVersion::V1);
        assert!(serde_json::from_str::<AttestationVersion>("7").is_err());
    }
}

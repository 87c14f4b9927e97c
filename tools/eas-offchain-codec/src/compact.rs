//! Fixed 18-slot compact tuple and the compactor.
//!
//! Slot layout (never reordered; new generations only give meaning to trailing slots):
//!
//! | #  | slot                         | #  | slot                          |
//! |----|------------------------------|----|-------------------------------|
//! | 0  | domain.version               | 9  | recipient, `"0"` = zero addr  |
//! | 1  | domain.chainId (decimal str) | 10 | time                          |
//! | 2  | domain.verifyingContract     | 11 | expirationTime                |
//! | 3  | signature.r                  | 12 | refUID, `"0"` = zero hash     |
//! | 4  | signature.s                  | 13 | revocable                     |
//! | 5  | signature.v                  | 14 | data                          |
//! | 6  | signer                       | 15 | reserved, always 0            |
//! | 7  | uid                          | 16 | version tag (null for Legacy) |
//! | 8  | schema                       | 17 | salt (null unless present)    |

use std::str::FromStr;

use alloy_primitives::{Address, Bytes, B256, U256};
use eas_offchain_types::{serde_num, AttestationPackage, UnsupportedVersion, ZERO_ADDRESS, ZERO_HASH};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{CodecError, Result};
use crate::legacy::ShareablePackage;

/// Total slot count of the wire tuple.
pub const COMPACT_SLOTS: usize = 18;
/// Slots every tuple must carry; the version tag and salt may be absent.
pub const MIN_COMPACT_SLOTS: usize = 16;
/// Value always written to the reserved slot.
pub const RESERVED_SLOT_VALUE: u64 = 0;
/// Largest integer a double represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

const ZERO_SENTINEL: &str = "0";

static ABSENT: Value = Value::Null;

pub mod slot {
    pub const DOMAIN_VERSION: usize = 0;
    pub const CHAIN_ID: usize = 1;
    pub const VERIFYING_CONTRACT: usize = 2;
    pub const R: usize = 3;
    pub const S: usize = 4;
    pub const V: usize = 5;
    pub const SIGNER: usize = 6;
    pub const UID: usize = 7;
    pub const SCHEMA: usize = 8;
    pub const RECIPIENT: usize = 9;
    pub const TIME: usize = 10;
    pub const EXPIRATION_TIME: usize = 11;
    pub const REF_UID: usize = 12;
    pub const REVOCABLE: usize = 13;
    pub const DATA: usize = 14;
    pub const RESERVED: usize = 15;
    pub const VERSION: usize = 16;
    pub const SALT: usize = 17;
}

/// A word that is written as the literal `"0"` when it equals its type's zero value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZeroOr<T> {
    Zero,
    Value(T),
}

impl ZeroOr<Address> {
    pub fn from_address(address: Address) -> Self {
        if address == ZERO_ADDRESS {
            ZeroOr::Zero
        } else {
            ZeroOr::Value(address)
        }
    }

    pub fn into_address(self) -> Address {
        match self {
            ZeroOr::Zero => ZERO_ADDRESS,
            ZeroOr::Value(address) => address,
        }
    }
}

impl ZeroOr<B256> {
    pub fn from_hash(hash: B256) -> Self {
        if hash == ZERO_HASH {
            ZeroOr::Zero
        } else {
            ZeroOr::Value(hash)
        }
    }

    pub fn into_hash(self) -> B256 {
        match self {
            ZeroOr::Zero => ZERO_HASH,
            ZeroOr::Value(hash) => hash,
        }
    }
}

impl<T: Serialize> Serialize for ZeroOr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ZeroOr::Zero => serializer.serialize_str(ZERO_SENTINEL),
            ZeroOr::Value(value) => value.serialize(serializer),
        }
    }
}

/// Positional wire form of an [`AttestationPackage`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactAttestation {
    pub domain_version: String,
    pub chain_id: U256,
    pub verifying_contract: Address,
    pub r: B256,
    pub s: B256,
    pub v: u8,
    pub signer: Address,
    pub uid: B256,
    pub schema: B256,
    pub recipient: ZeroOr<Address>,
    pub time: u64,
    pub expiration_time: u64,
    pub ref_uid: ZeroOr<B256>,
    pub revocable: bool,
    pub data: Bytes,
    /// Whatever the reader found in slot 15. Never written back; the slot is always emitted as 0.
    pub reserved: u64,
    pub version: Option<u16>,
    pub salt: Option<B256>,
}

/// Map a canonical package onto the compact tuple.
pub fn compact(package: &AttestationPackage) -> CompactAttestation {
    let sig = &package.sig;
    let msg = &sig.message;

    CompactAttestation {
        domain_version: sig.domain.version.clone(),
        chain_id: sig.domain.chain_id,
        verifying_contract: sig.domain.verifying_contract,
        r: sig.signature.r,
        s: sig.signature.s,
        v: sig.signature.v,
        signer: package.signer,
        uid: sig.uid,
        schema: msg.schema,
        recipient: ZeroOr::from_address(msg.recipient),
        time: msg.time,
        expiration_time: msg.expiration_time,
        ref_uid: ZeroOr::from_hash(msg.ref_uid),
        revocable: msg.revocable,
        data: msg.data.clone(),
        reserved: RESERVED_SLOT_VALUE,
        // The message tag is authoritative; upgraded flat packages may only carry the outer one.
        version: msg.version.or_else(|| sig.version.tag()),
        salt: msg.salt,
    }
}

/// Normalize a package in either signature shape, then compact it.
pub fn compact_shareable(package: ShareablePackage) -> CompactAttestation {
    compact(&AttestationPackage::from(package))
}

/// Integer that stays a JSON number while a double can hold it exactly.
struct SafeInteger(u64);

impl Serialize for SafeInteger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 <= MAX_SAFE_INTEGER {
            serializer.serialize_u64(self.0)
        } else {
            serializer.collect_str(&self.0)
        }
    }
}

impl Serialize for CompactAttestation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut t = serializer.serialize_tuple(COMPACT_SLOTS)?;
        t.serialize_element(&self.domain_version)?;
        t.serialize_element(&self.chain_id.to_string())?;
        t.serialize_element(&self.verifying_contract)?;
        t.serialize_element(&self.r)?;
        t.serialize_element(&self.s)?;
        t.serialize_element(&self.v)?;
        t.serialize_element(&self.signer)?;
        t.serialize_element(&self.uid)?;
        t.serialize_element(&self.schema)?;
        t.serialize_element(&self.recipient)?;
        t.serialize_element(&SafeInteger(self.time))?;
        t.serialize_element(&SafeInteger(self.expiration_time))?;
        t.serialize_element(&self.ref_uid)?;
        t.serialize_element(&self.revocable)?;
        t.serialize_element(&self.data)?;
        t.serialize_element(&RESERVED_SLOT_VALUE)?;
        t.serialize_element(&self.version)?;
        t.serialize_element(&self.salt)?;
        t.end()
    }
}

impl<'de> Deserialize<'de> for CompactAttestation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let slots = Vec::<Value>::deserialize(deserializer)?;
        CompactAttestation::from_slots(&slots).map_err(serde::de::Error::custom)
    }
}

impl CompactAttestation {
    /// Read a tuple from raw JSON slots, checking arity and each slot's type.
    pub fn from_slots(slots: &[Value]) -> Result<Self> {
        if !(MIN_COMPACT_SLOTS..=COMPACT_SLOTS).contains(&slots.len()) {
            return Err(CodecError::Arity {
                got: slots.len(),
                min: MIN_COMPACT_SLOTS,
                max: COMPACT_SLOTS,
            });
        }
        let at = SlotReader(slots);

        Ok(CompactAttestation {
            domain_version: at.string(slot::DOMAIN_VERSION, "domain.version")?.to_string(),
            chain_id: at.u256(slot::CHAIN_ID, "domain.chainId")?,
            verifying_contract: at.parsed(slot::VERIFYING_CONTRACT, "domain.verifyingContract")?,
            r: at.parsed(slot::R, "signature.r")?,
            s: at.parsed(slot::S, "signature.s")?,
            v: at.v(slot::V, "signature.v")?,
            signer: at.parsed(slot::SIGNER, "signer")?,
            uid: at.parsed(slot::UID, "uid")?,
            schema: at.parsed(slot::SCHEMA, "message.schema")?,
            recipient: at.zero_or(slot::RECIPIENT, "message.recipient")?,
            time: at.u64(slot::TIME, "message.time")?,
            expiration_time: at.u64(slot::EXPIRATION_TIME, "message.expirationTime")?,
            ref_uid: at.zero_or(slot::REF_UID, "message.refUID")?,
            revocable: at.bool(slot::REVOCABLE, "message.revocable")?,
            data: at.parsed(slot::DATA, "message.data")?,
            reserved: at.u64(slot::RESERVED, "reserved")?,
            version: at.version_tag(slot::VERSION)?,
            salt: at.optional_parsed(slot::SALT, "message.salt")?,
        })
    }
}

struct SlotReader<'a>(&'a [Value]);

impl<'a> SlotReader<'a> {
    fn get(&self, index: usize) -> &'a Value {
        self.0.get(index).unwrap_or(&ABSENT)
    }

    fn invalid(index: usize, name: &'static str, reason: impl Into<String>) -> CodecError {
        CodecError::InvalidSlot { index, name, reason: reason.into() }
    }

    fn string(&self, index: usize, name: &'static str) -> Result<&'a str> {
        self.get(index)
            .as_str()
            .ok_or_else(|| Self::invalid(index, name, format!("expected string, got {}", self.get(index))))
    }

    fn parsed<T>(&self, index: usize, name: &'static str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.string(index, name)?;
        raw.parse::<T>()
            .map_err(|e| Self::invalid(index, name, format!("{raw:?}: {e}")))
    }

    fn optional_parsed<T>(&self, index: usize, name: &'static str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(index) {
            Value::Null => Ok(None),
            _ => self.parsed(index, name).map(Some),
        }
    }

    fn zero_or<T>(&self, index: usize, name: &'static str) -> Result<ZeroOr<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        if self.string(index, name)? == ZERO_SENTINEL {
            Ok(ZeroOr::Zero)
        } else {
            self.parsed(index, name).map(ZeroOr::Value)
        }
    }

    fn bool(&self, index: usize, name: &'static str) -> Result<bool> {
        self.get(index)
            .as_bool()
            .ok_or_else(|| Self::invalid(index, name, format!("expected bool, got {}", self.get(index))))
    }

    fn u64(&self, index: usize, name: &'static str) -> Result<u64> {
        let value = self.get(index);
        let parsed = match value {
            // JavaScript writers emit integral doubles such as `1e18` for huge numbers.
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(serde_num::integral_f64_to_u64)),
            Value::String(s) => serde_num::parse_u64(s),
            _ => None,
        };
        parsed.ok_or_else(|| Self::invalid(index, name, format!("expected unsigned integer, got {value}")))
    }

    fn u256(&self, index: usize, name: &'static str) -> Result<U256> {
        match self.get(index) {
            Value::Number(n) => n
                .as_u64()
                .map(U256::from)
                .ok_or_else(|| Self::invalid(index, name, format!("expected unsigned integer, got {n}"))),
            Value::String(s) => U256::from_str(s.trim())
                .map_err(|e| Self::invalid(index, name, format!("{s:?}: {e}"))),
            other => Err(Self::invalid(index, name, format!("expected integer or string, got {other}"))),
        }
    }

    fn v(&self, index: usize, name: &'static str) -> Result<u8> {
        let raw = self.u64(index, name)?;
        u8::try_from(raw).map_err(|_| Self::invalid(index, name, format!("{raw} does not fit in u8")))
    }

    /// Falsy values (absent, null, false, 0, "") mean Legacy. Any other non-u16 value is an
    /// unsupported version.
    fn version_tag(&self, index: usize) -> Result<Option<u16>> {
        let value = self.get(index);
        match value {
            Value::Null | Value::Bool(false) => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(None),
                Some(tag) => u16::try_from(tag)
                    .map(Some)
                    .map_err(|_| UnsupportedVersion(tag.to_string()).into()),
                None => Err(UnsupportedVersion(n.to_string()).into()),
            },
            other => Err(UnsupportedVersion(other.to_string()).into()),
        }
    }
}

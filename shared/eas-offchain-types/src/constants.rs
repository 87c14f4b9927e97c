//! Well-known values shared by the compactor and decompactor.

use alloy_primitives::{Address, B256};

/// EIP-712 domain name used by every EAS off-chain attestation.
pub const DOMAIN_NAME: &str = "EAS Attestation";

/// Recipient value meaning "no recipient".
pub const ZERO_ADDRESS: Address = Address::ZERO;

/// `refUID` value meaning "references nothing".
pub const ZERO_HASH: B256 = B256::ZERO;

/// Primary type name for pre-versioning (Legacy) attestations.
pub const PRIMARY_TYPE_LEGACY: &str = "Attestation";

/// Primary type name for V1 and later attestations.
pub const PRIMARY_TYPE_ATTEST: &str = "Attest";

use eas_offchain_types::{
    AttestationMessage, AttestationPackage, AttestationVersion, Signature,
    SignedOffchainAttestation, TypedDataDomain, DOMAIN_NAME,
};

use crate::compact::CompactAttestation;
use crate::error::Result;

/// Rebuild the canonical package from a compact tuple.
///
/// The version tag in slot 16 alone selects the typed-data field list and primary type; the
/// zero sentinels in slots 9 and 12 are expanded back to the zero address / zero hash.
pub fn decompact(compact: &CompactAttestation) -> Result<AttestationPackage> {
    let version = AttestationVersion::resolve(compact.version)?;
    tracing::debug!(?version, uid = %compact.uid, "resolved compact attestation version");

    let sig = SignedOffchainAttestation {
        version,
        domain: TypedDataDomain {
            name: DOMAIN_NAME.to_string(),
            version: compact.domain_version.clone(),
            chain_id: compact.chain_id,
            verifying_contract: compact.verifying_contract,
        },
        primary_type: version.primary_type().to_string(),
        types: SignedOffchainAttestation::canonical_types(version),
        signature: Signature { v: compact.v, r: compact.r, s: compact.s },
        uid: compact.uid,
        message: AttestationMessage {
            version: version.tag(),
            schema: compact.schema,
            recipient: compact.recipient.into_address(),
            time: compact.time,
            expiration_time: compact.expiration_time,
            revocable: compact.revocable,
            ref_uid: compact.ref_uid.into_hash(),
            data: compact.data.clone(),
            salt: compact.salt,
        },
    };

    Ok(AttestationPackage { sig, signer: compact.signer })
}

/// Ethereum personal message signature recovery
///
/// Recovers the signing address from a `personal_sign` (EIP-191 version 0x45)
/// message and its 65-byte `r || s || v` secp256k1 signature.

use crate::error::{GuildError, GuildResult};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Prefix prepended to every personal message before hashing
const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Length of an `r || s || v` signature in bytes
const SIGNATURE_LENGTH: usize = 65;

/// 20-byte account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derive the address from a secp256k1 public key
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        // Skip the 0x04 uncompressed tag
        let hash = keccak256(&point.as_bytes()[1..]);

        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        Self(address)
    }

    /// EIP-55 mixed-case checksum encoding
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = GuildError;

    fn from_str(s: &str) -> GuildResult<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() != 40 {
            return Err(GuildError::Validation(format!(
                "Address must be 20 bytes, got {} hex characters",
                digits.len()
            )));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| GuildError::Validation(format!("Invalid address hex: {}", e)))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

/// Keccak-256 digest
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

/// Hash a message using the personal message prefixing convention:
/// `keccak256("\x19Ethereum Signed Message:\n" || len || message)`
pub fn hash_personal_message(message: &str) -> [u8; 32] {
    let bytes = message.as_bytes();
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(bytes.len().to_string().as_bytes());
    hasher.update(bytes);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

/// Decode a hex `r || s || v` signature into its k256 parts.
///
/// High-s signatures are normalized and their recovery parity flipped, so
/// both encodings recover the same key.
fn decode_signature(signature: &str) -> GuildResult<(Signature, RecoveryId)> {
    let digits = signature.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);

    let bytes = hex::decode(digits)
        .map_err(|e| GuildError::Verification(format!("Signature is not valid hex: {}", e)))?;

    if bytes.len() != SIGNATURE_LENGTH {
        return Err(GuildError::Verification(format!(
            "Signature must be {} bytes, got {}",
            SIGNATURE_LENGTH,
            bytes.len()
        )));
    }

    let parity = match bytes[64] {
        0 | 27 => 0u8,
        1 | 28 => 1u8,
        v => {
            return Err(GuildError::Verification(format!(
                "Invalid recovery id: {}",
                v
            )))
        }
    };

    let sig = Signature::from_slice(&bytes[..64])
        .map_err(|_| GuildError::Verification("Invalid r or s component".to_string()))?;

    let (sig, parity) = match sig.normalize_s() {
        Some(normalized) => (normalized, parity ^ 1),
        None => (sig, parity),
    };

    let recovery_id = RecoveryId::from_byte(parity)
        .ok_or_else(|| GuildError::Verification("Invalid recovery id".to_string()))?;

    Ok((sig, recovery_id))
}

/// Recover the address that signed `message` with `signature`
pub fn recover_message_address(message: &str, signature: &str) -> GuildResult<Address> {
    let (sig, recovery_id) = decode_signature(signature)?;
    let prehash = hash_personal_message(message);

    let key = VerifyingKey::recover_from_prehash(&prehash, &sig, recovery_id)
        .map_err(|_| GuildError::Verification("Public key recovery failed".to_string()))?;

    Ok(Address::from_verifying_key(&key))
}

//! Keys, addresses and signature checks for ScroogeCoin

use crate::error::ChainError;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{COMPACT_SIGNATURE_SIZE, PUBLIC_KEY_SIZE},
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Recipient identity of an output: the owner's compressed public key.
///
/// Serialized as a hex string so pool and transaction files stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address(Vec<u8>);

impl Address {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parses a hex-encoded compressed public key.
    pub fn from_hex(hex_str: &str) -> Result<Self, ChainError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| ChainError::CryptoError(format!("Invalid hex address: {}", e)))?;
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(ChainError::CryptoError(format!(
                "Address must be {} bytes, got {}",
                PUBLIC_KEY_SIZE,
                bytes.len()
            )));
        }
        Ok(Address(bytes))
    }

    fn public_key(&self) -> Result<PublicKey, ChainError> {
        PublicKey::from_slice(&self.0)
            .map_err(|e| ChainError::CryptoError(format!("Address {} is not a public key: {}", self, e)))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_hex()
    }
}

impl TryFrom<String> for Address {
    type Error = ChainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::from_hex(&value)
    }
}

/// Signature verification capability consumed by the transaction handler.
///
/// `Sync` so that pre-checks may run across a rayon pool.
pub trait SignatureVerifier: Sync {
    fn verify(&self, address: &Address, message: &[u8], signature: &[u8]) -> bool;
}

/// Default verifier: ECDSA over secp256k1 with SHA-256 message digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Verifier;

impl SignatureVerifier for Secp256k1Verifier {
    fn verify(&self, address: &Address, message: &[u8], signature: &[u8]) -> bool {
        verify_signature(address, message, signature).is_ok()
    }
}

/// A signing key together with the address it controls.
#[derive(Debug, Clone)]
pub struct KeyPair {
    secret_key: SecretKey,
    address: Address,
}

impl KeyPair {
    /// Generates a fresh key from the OS random number generator.
    pub fn generate() -> Result<Self, ChainError> {
        let secret_key = SecretKey::new(&mut OsRng);
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);

        Ok(KeyPair {
            secret_key,
            address: Address(public_key.serialize().to_vec()),
        })
    }

    /// The address outputs paid to this key are locked to.
    pub fn address(&self) -> Address {
        self.address.clone()
    }

    /// Compact signature over the SHA-256 digest of `message`.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        SECP256K1_CONTEXT
            .sign_ecdsa(&digest(message), &self.secret_key)
            .serialize_compact()
            .to_vec()
    }
}

fn digest(message: &[u8]) -> Message {
    Message::from_digest(Sha256::digest(message).into())
}

/// Checks that `signature` is `address`'s compact signature over `message`.
pub fn verify_signature(
    address: &Address,
    message: &[u8],
    signature: &[u8],
) -> Result<(), ChainError> {
    if signature.len() != COMPACT_SIGNATURE_SIZE {
        return Err(ChainError::CryptoError(format!(
            "Signature must be {} bytes, got {}",
            COMPACT_SIGNATURE_SIZE,
            signature.len()
        )));
    }
    let public_key = address.public_key()?;
    let signature = Signature::from_compact(signature)
        .map_err(|e| ChainError::CryptoError(format!("Malformed signature: {}", e)))?;

    SECP256K1_CONTEXT
        .verify_ecdsa(&digest(message), &signature, &public_key)
        .map_err(|_| ChainError::CryptoError(format!("Signature does not match {}", address)))
}

//! Signed venue credentials
//!
//! A venue proves its identity by signing each log request with its
//! Ed25519 key. The digest is SHA-256 over canonical JSON of
//! `(venue, nonce, swaps)`; nonces must strictly increase per venue.

use dashmap::DashMap;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use types::ids::VenueId;
use types::swap::SwapRecord;

use crate::auth::Caller;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("No key registered for venue {0}")]
    UnknownVenue(VenueId),

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid signature encoding")]
    InvalidSignature,

    #[error("Signature verification failed for {0}")]
    VerificationFailed(VenueId),

    #[error("Nonce replay for {venue}: provided {provided}, last seen {last_seen}")]
    NonceReplay {
        venue: VenueId,
        provided: u64,
        last_seen: u64,
    },
}

/// A log request with its venue signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedLogRequest {
    pub venue: VenueId,
    pub nonce: u64,
    pub swaps: Vec<SwapRecord>,
    /// Ed25519 signature as hex string
    pub signature: String,
}

#[derive(Serialize)]
struct SignablePayload<'a> {
    venue: &'a VenueId,
    nonce: u64,
    swaps: &'a [SwapRecord],
}

/// SHA-256 digest of the canonical request payload.
pub fn request_digest(venue: &VenueId, nonce: u64, swaps: &[SwapRecord]) -> [u8; 32] {
    let payload = SignablePayload { venue, nonce, swaps };
    // Serializing plain structs, strings and f64 cannot fail.
    let bytes = serde_json::to_vec(&payload).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hasher.finalize().into()
}

impl SignedLogRequest {
    /// Sign a request with the venue's key.
    pub fn sign(venue: VenueId, nonce: u64, swaps: Vec<SwapRecord>, key: &SigningKey) -> Self {
        let digest = request_digest(&venue, nonce, &swaps);
        let signature = key.sign(&digest);
        Self {
            venue,
            nonce,
            swaps,
            signature: hex::encode(signature.to_bytes()),
        }
    }

    fn digest(&self) -> [u8; 32] {
        request_digest(&self.venue, self.nonce, &self.swaps)
    }
}

/// Registered venue keys plus per-venue nonce tracking.
#[derive(Debug, Default)]
pub struct CredentialVerifier {
    keys: DashMap<VenueId, VerifyingKey>,
    last_nonces: DashMap<VenueId, u64>,
}

impl CredentialVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, venue: VenueId, key: VerifyingKey) {
        self.keys.insert(venue, key);
    }

    /// Register a key given as hex-encoded 32 bytes.
    pub fn register_hex(&self, venue: VenueId, public_key: &str) -> Result<(), CredentialError> {
        let bytes: [u8; 32] = hex::decode(public_key)
            .map_err(|_| CredentialError::InvalidPublicKey)?
            .try_into()
            .map_err(|_| CredentialError::InvalidPublicKey)?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| CredentialError::InvalidPublicKey)?;
        self.register(venue, key);
        Ok(())
    }

    /// Verify the signature and advance the nonce; yields the venue caller.
    pub fn verify(&self, request: &SignedLogRequest) -> Result<Caller, CredentialError> {
        let key = self
            .keys
            .get(&request.venue)
            .map(|entry| *entry.value())
            .ok_or_else(|| CredentialError::UnknownVenue(request.venue.clone()))?;

        let sig_bytes: [u8; 64] = hex::decode(&request.signature)
            .map_err(|_| CredentialError::InvalidSignature)?
            .try_into()
            .map_err(|_| CredentialError::InvalidSignature)?;
        let signature = Signature::from_bytes(&sig_bytes);

        key.verify(&request.digest(), &signature)
            .map_err(|_| CredentialError::VerificationFailed(request.venue.clone()))?;

        let mut last = self.last_nonces.entry(request.venue.clone()).or_insert(0);
        if request.nonce <= *last {
            return Err(CredentialError::NonceReplay {
                venue: request.venue.clone(),
                provided: request.nonce,
                last_seen: *last,
            });
        }
        *last = request.nonce;

        Ok(Caller::Venue(request.venue.clone()))
    }
}

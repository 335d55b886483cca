//! Recoverable secp256k1 signatures over a proposal signing hash.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Length of the `R ‖ S ‖ V` encoding.
pub const SIGNATURE_LENGTH: usize = 65;

/// Offset added to the recovery id by Ethereum-style signers.
pub const V_OFFSET: u8 = 27;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid signature length: {0}")]
    InvalidLength(usize),
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
    #[error("failed to recover public key: {0}")]
    Recovery(String),
}

/// `{R, S, V}` signature triple.
///
/// `V` is stored as produced by the signer, either as a raw recovery id (0/1) or with the
/// Ethereum offset (27/28).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    #[serde(rename = "R")]
    pub r: B256,
    #[serde(rename = "S")]
    pub s: B256,
    #[serde(rename = "V")]
    pub v: u8,
}

impl Signature {
    /// Decodes a 65-byte `R ‖ S ‖ V` signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::InvalidLength(bytes.len()));
        }

        Ok(Self {
            r: B256::from_slice(&bytes[..32]),
            s: B256::from_slice(&bytes[32..64]),
            v: bytes[64],
        })
    }

    /// Encodes the signature as `R ‖ S ‖ V`.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(self.r.as_slice());
        out[32..64].copy_from_slice(self.s.as_slice());
        out[64] = self.v;
        out
    }

    /// Recovery id normalized to 0 or 1.
    pub fn recovery_id(&self) -> Result<u8, SignatureError> {
        let v = if self.v > 1 { self.v.wrapping_sub(V_OFFSET) } else { self.v };
        if v > 1 {
            return Err(SignatureError::InvalidRecoveryId(self.v));
        }
        Ok(v)
    }

    /// Recovers the address that signed `hash`.
    pub fn recover(&self, hash: B256) -> Result<Address, SignatureError> {
        let parity = self.recovery_id()? == 1;
        let signature = alloy_primitives::Signature::new(
            U256::from_be_bytes(self.r.0),
            U256::from_be_bytes(self.s.0),
            parity,
        );

        signature
            .recover_address_from_prehash(&hash)
            .map_err(|err| SignatureError::Recovery(err.to_string()))
    }
}

impl From<alloy_primitives::Signature> for Signature {
    fn from(signature: alloy_primitives::Signature) -> Self {
        Self {
            r: signature.r().to_be_bytes::<32>().into(),
            s: signature.s().to_be_bytes::<32>().into(),
            v: u8::from(signature.v()),
        }
    }
}

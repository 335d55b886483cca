//! Signing capability used to approve proposals.

use crate::SdkError;
use alloy_primitives::B256;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use mcms_primitives::Signature;

/// Produces a recoverable signature over a 32-byte hash.
///
/// The hash is signed as is; any message prefixing has already been applied by the caller.
#[async_trait::async_trait]
pub trait Signer: Send + Sync {
    async fn sign_hash(&self, hash: B256) -> Result<Signature, SdkError>;
}

#[async_trait::async_trait]
impl Signer for PrivateKeySigner {
    async fn sign_hash(&self, hash: B256) -> Result<Signature, SdkError> {
        let signature =
            SignerSync::sign_hash_sync(self, &hash).map_err(|err| SdkError::Signing(err.to_string()))?;
        Ok(signature.into())
    }
}

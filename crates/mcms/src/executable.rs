//! Setting roots and executing operations of a signed proposal.

use crate::{
    McmsError, Proposal,
    poll::cancellable,
    proposal::{signing_hash, to_nonce},
    signable::recover_signers,
};
use alloy_primitives::B256;
use mcms_merkle::MerkleTree;
use mcms_primitives::{ChainSelector, Signature, TransactionResult};
use mcms_sdk::{AdapterRegistry, ChainEncoder, Encoder, Executor};
use std::{collections::BTreeMap, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub type Executors = BTreeMap<ChainSelector, Arc<dyn Executor>>;

/// A signed proposal ready to be committed and executed.
///
/// Operations on one chain must be executed in op count order. Chains are independent.
pub struct Executable {
    proposal: Proposal,
    tree: MerkleTree,
    signing_hash: B256,
    encoders: BTreeMap<ChainSelector, ChainEncoder>,
    nonces: Vec<u64>,
    executors: Executors,
}

impl std::fmt::Debug for Executable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executable")
            .field("root", &self.tree.root())
            .field("operations", &self.proposal.operations.len())
            .field("chains", &self.executors.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Executable {
    pub fn new(proposal: Proposal, executors: Executors) -> Result<Self, McmsError> {
        let encoders = proposal.encoders()?;
        let tree = proposal.merkle_tree_with(&encoders)?;
        let nonces = proposal.transaction_nonces()?;
        let signing_hash = signing_hash(tree.root(), proposal.valid_until);

        Ok(Self { proposal, tree, signing_hash, encoders, nonces, executors })
    }

    /// Builds executors for every chain of the proposal from `registry`.
    pub fn from_registry(proposal: Proposal, registry: &AdapterRegistry) -> Result<Self, McmsError> {
        let executors = registry.executors(&proposal.encoders()?)?;
        Self::new(proposal, executors)
    }

    pub const fn proposal(&self) -> &Proposal {
        &self.proposal
    }

    pub const fn merkle_tree(&self) -> &MerkleTree {
        &self.tree
    }

    /// Op count the operation at `index` executes at.
    pub fn tx_nonce(&self, index: usize) -> Result<u64, McmsError> {
        self.nonces
            .get(index)
            .copied()
            .ok_or(McmsError::IndexOutOfRange { index, len: self.nonces.len() })
    }

    fn encoder(&self, selector: ChainSelector) -> Result<&ChainEncoder, McmsError> {
        self.encoders.get(&selector).ok_or(McmsError::EncoderNotFound(selector))
    }

    fn executor(&self, selector: ChainSelector) -> Result<&Arc<dyn Executor>, McmsError> {
        self.executors.get(&selector).ok_or(McmsError::ExecutorNotFound(selector))
    }

    /// Signatures ordered by recovered signer address, as the contracts require.
    ///
    /// Only the first signature of each signer is kept.
    pub fn sorted_signatures(&self) -> Result<Vec<Signature>, McmsError> {
        let signers = recover_signers(&self.proposal.signatures, self.signing_hash)?;
        let mut pairs: Vec<_> = signers.into_iter().zip(self.proposal.signatures.iter().copied()).collect();
        pairs.sort_by_key(|(signer, _)| *signer);
        pairs.dedup_by_key(|(signer, _)| *signer);
        Ok(pairs.into_iter().map(|(_, signature)| signature).collect())
    }

    /// Commits the merkle root on `selector`.
    pub async fn set_root(
        &self,
        selector: ChainSelector,
        cancel: &CancellationToken,
    ) -> Result<TransactionResult, McmsError> {
        let metadata = self.proposal.metadata(selector)?;
        let leaf = self.encoder(selector)?.hash_metadata(metadata).map_err(McmsError::chain(selector))?;
        let proof = self.tree.get_proof(leaf)?;
        let signatures = self.sorted_signatures()?;
        let executor = self.executor(selector)?;

        let result = cancellable(cancel, async {
            executor
                .set_root(metadata, &proof, self.tree.root(), self.proposal.valid_until, &signatures)
                .await
                .map_err(McmsError::chain(selector))
        })
        .await?;
        info!(chain_selector = %selector, root = %self.tree.root(), tx_hash = %result.hash, "Set root");

        Ok(result)
    }

    /// Executes the operation at `index`.
    pub async fn execute(
        &self,
        index: usize,
        cancel: &CancellationToken,
    ) -> Result<TransactionResult, McmsError> {
        let op = self
            .proposal
            .operations
            .get(index)
            .ok_or(McmsError::IndexOutOfRange { index, len: self.proposal.operations.len() })?;
        let selector = op.chain_selector;
        let metadata = self.proposal.metadata(selector)?;
        let nonce = to_nonce(self.tx_nonce(index)?)?;

        let leaf = self
            .encoder(selector)?
            .hash_operation(nonce, metadata, op)
            .map_err(McmsError::operation(index, selector))?;
        let proof = self.tree.get_proof(leaf)?;
        let executor = self.executor(selector)?;

        let result = cancellable(cancel, async {
            executor
                .execute_operation(metadata, nonce, &proof, op)
                .await
                .map_err(McmsError::operation(index, selector))
        })
        .await?;
        info!(index, chain_selector = %selector, nonce, tx_hash = %result.hash, "Executed operation");

        Ok(result)
    }
}

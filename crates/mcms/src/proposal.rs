//! Plain MCMS proposals and their merkle commitment.

use crate::{
    McmsError,
    validation::{validate_base, validate_transaction},
};
use alloy_primitives::{B256, U256, eip191_hash_message, keccak256};
use mcms_merkle::MerkleTree;
use mcms_primitives::{ChainMetadata, ChainSelector, Operation, ProposalKind, Signature};
use mcms_sdk::{ChainEncoder, Encoder, EncoderParams};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    io::{Read, Write},
};
use tracing::debug;

/// Fields shared by plain and timelock proposals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseProposal {
    pub version: String,
    pub kind: ProposalKind,
    #[serde(default)]
    pub description: String,
    /// Unix timestamp after which the root can no longer be set.
    pub valid_until: u32,
    /// Signatures in the order they were appended.
    #[serde(default)]
    pub signatures: Vec<Signature>,
    #[serde(default)]
    pub override_previous_root: bool,
    pub chain_metadata: BTreeMap<ChainSelector, ChainMetadata>,
    /// Hash EVM operations against the simulated backend chain id.
    #[serde(skip)]
    pub use_simulated_backend: bool,
}

impl BaseProposal {
    pub(crate) fn new(kind: ProposalKind) -> Self {
        Self {
            version: String::new(),
            kind,
            description: String::new(),
            valid_until: 0,
            signatures: Vec::new(),
            override_previous_root: false,
            chain_metadata: BTreeMap::new(),
            use_simulated_backend: false,
        }
    }

    /// Selectors of every chain the proposal targets, ascending.
    pub fn chain_selectors(&self) -> Vec<ChainSelector> {
        self.chain_metadata.keys().copied().collect()
    }

    /// Appends a signature without checking it.
    pub fn append_signature(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    pub(crate) fn metadata(&self, selector: ChainSelector) -> Result<&ChainMetadata, McmsError> {
        self.chain_metadata.get(&selector).ok_or(McmsError::ChainMetadataNotFound(selector))
    }
}

/// A set of operations approved together under one merkle root per chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Deref, derive_more::DerefMut)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    #[serde(flatten)]
    #[deref]
    #[deref_mut]
    pub base: BaseProposal,
    pub operations: Vec<Operation>,
}

impl Proposal {
    /// Reads a proposal from JSON and validates it.
    pub fn from_reader(reader: impl Read) -> Result<Self, McmsError> {
        let proposal: Self = serde_json::from_reader(reader)?;
        proposal.validate()?;
        Ok(proposal)
    }

    /// Writes the proposal as indented JSON.
    pub fn write_to(&self, mut writer: impl Write) -> Result<(), McmsError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), McmsError> {
        validate_base(&self.base, ProposalKind::Proposal)?;
        if self.operations.is_empty() {
            return Err(McmsError::NoOperations);
        }

        for (index, op) in self.operations.iter().enumerate() {
            self.metadata(op.chain_selector)?;
            validate_transaction(index, op.chain_selector, &op.transaction)?;
        }

        Ok(())
    }

    /// Number of operations per chain.
    pub fn transaction_counts(&self) -> BTreeMap<ChainSelector, u64> {
        let mut counts = BTreeMap::new();
        for op in &self.operations {
            *counts.entry(op.chain_selector).or_default() += 1;
        }
        counts
    }

    /// The op count each operation executes at: the chain's starting op count plus the
    /// operation's position among the operations of that chain.
    pub fn transaction_nonces(&self) -> Result<Vec<u64>, McmsError> {
        let mut local = BTreeMap::<ChainSelector, u64>::new();
        self.operations
            .iter()
            .map(|op| {
                let start = self.metadata(op.chain_selector)?.starting_op_count;
                let index = local.entry(op.chain_selector).or_default();
                let nonce = start.checked_add(*index).ok_or(McmsError::NonceOverflow(start))?;
                *index += 1;
                Ok(nonce)
            })
            .collect()
    }

    /// Encoders for every chain in the proposal.
    pub fn encoders(&self) -> Result<BTreeMap<ChainSelector, ChainEncoder>, McmsError> {
        let counts = self.transaction_counts();
        self.chain_metadata
            .keys()
            .map(|selector| {
                let params = EncoderParams {
                    tx_count: counts.get(selector).copied().unwrap_or_default(),
                    override_previous_root: self.override_previous_root,
                    simulated: self.use_simulated_backend,
                };
                let encoder =
                    ChainEncoder::new(*selector, params).map_err(McmsError::chain(*selector))?;
                Ok((*selector, encoder))
            })
            .collect()
    }

    /// Builds the merkle tree over every metadata and operation leaf of the proposal.
    pub fn merkle_tree(&self) -> Result<MerkleTree, McmsError> {
        let encoders = self.encoders()?;
        self.merkle_tree_with(&encoders)
    }

    pub(crate) fn merkle_tree_with(
        &self,
        encoders: &BTreeMap<ChainSelector, ChainEncoder>,
    ) -> Result<MerkleTree, McmsError> {
        let mut leaves = Vec::with_capacity(encoders.len() + self.operations.len());

        for (selector, metadata) in &self.chain_metadata {
            let encoder = encoders.get(selector).ok_or(McmsError::EncoderNotFound(*selector))?;
            leaves.push(encoder.hash_metadata(metadata).map_err(McmsError::chain(*selector))?);
        }

        for (index, (op, nonce)) in
            self.operations.iter().zip(self.transaction_nonces()?).enumerate()
        {
            let selector = op.chain_selector;
            let encoder = encoders.get(&selector).ok_or(McmsError::EncoderNotFound(selector))?;
            let leaf = encoder
                .hash_operation(to_nonce(nonce)?, self.metadata(selector)?, op)
                .map_err(McmsError::operation(index, selector))?;
            leaves.push(leaf);
        }

        let tree = MerkleTree::from_unsorted(leaves);
        debug!(root = %tree.root(), leaves = tree.leaves().len(), "Computed proposal merkle tree");
        Ok(tree)
    }

    /// Hash the signers approve: the EIP-191 message hash of `keccak256(root ‖ validUntil)`.
    pub fn signing_hash(&self) -> Result<B256, McmsError> {
        Ok(signing_hash(self.merkle_tree()?.root(), self.valid_until))
    }
}

/// Signing hash of `root` with `valid_until` encoded as a 32-byte big-endian word.
pub fn signing_hash(root: B256, valid_until: u32) -> B256 {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(root.as_slice());
    preimage[32..].copy_from_slice(&U256::from(valid_until).to_be_bytes::<32>());
    eip191_hash_message(keccak256(preimage))
}

pub(crate) fn to_nonce(nonce: u64) -> Result<u32, McmsError> {
    u32::try_from(nonce).map_err(|_| McmsError::NonceOverflow(nonce))
}

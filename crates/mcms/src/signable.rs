//! Collecting and checking approvals of a proposal.

use crate::{McmsError, Proposal, poll::cancellable, proposal::signing_hash, proposal::to_nonce};
use alloy_primitives::{Address, B256};
use futures::future::try_join_all;
use mcms_merkle::MerkleTree;
use mcms_primitives::{ChainSelector, Config, ConfigError, Signature};
use mcms_sdk::{ChainEncoder, Encoder, Inspector, Signer, Simulator};
use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub type Inspectors = BTreeMap<ChainSelector, Arc<dyn Inspector>>;
pub type Simulators = BTreeMap<ChainSelector, Arc<dyn Simulator>>;

/// A proposal being signed.
///
/// The merkle tree and signing hash are computed once. Signatures are appended under a lock so
/// that read-only checks may run while signers append.
pub struct Signable {
    proposal: RwLock<Proposal>,
    tree: MerkleTree,
    signing_hash: B256,
    encoders: BTreeMap<ChainSelector, ChainEncoder>,
    nonces: Vec<u64>,
    inspectors: Option<Inspectors>,
    simulators: Option<Simulators>,
    expected_configs: BTreeMap<ChainSelector, Config>,
}

impl std::fmt::Debug for Signable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signable")
            .field("root", &self.tree.root())
            .field("signing_hash", &self.signing_hash)
            .field("signatures", &self.proposal.read().signatures.len())
            .finish_non_exhaustive()
    }
}

impl Signable {
    pub fn new(proposal: Proposal) -> Result<Self, McmsError> {
        let encoders = proposal.encoders()?;
        let tree = proposal.merkle_tree_with(&encoders)?;
        let nonces = proposal.transaction_nonces()?;
        let signing_hash = signing_hash(tree.root(), proposal.valid_until);

        Ok(Self {
            proposal: RwLock::new(proposal),
            tree,
            signing_hash,
            encoders,
            nonces,
            inspectors: None,
            simulators: None,
            expected_configs: BTreeMap::new(),
        })
    }

    pub fn with_inspectors(mut self, inspectors: Inspectors) -> Self {
        self.inspectors = Some(inspectors);
        self
    }

    pub fn with_simulators(mut self, simulators: Simulators) -> Self {
        self.simulators = Some(simulators);
        self
    }

    /// Configs the live contracts are expected to hold, checked by [`Self::validate_configs`].
    pub fn with_expected_configs(mut self, configs: BTreeMap<ChainSelector, Config>) -> Self {
        self.expected_configs = configs;
        self
    }

    pub const fn signing_hash(&self) -> B256 {
        self.signing_hash
    }

    pub const fn merkle_tree(&self) -> &MerkleTree {
        &self.tree
    }

    /// Snapshot of the proposal with the signatures appended so far.
    pub fn proposal(&self) -> Proposal {
        self.proposal.read().clone()
    }

    pub fn into_proposal(self) -> Proposal {
        self.proposal.into_inner()
    }

    /// Signs the proposal without appending the signature.
    ///
    /// The signature is recovered before it is returned so that a faulty signer is caught
    /// here rather than on chain.
    pub async fn sign(&self, signer: &dyn Signer) -> Result<Signature, McmsError> {
        self.sign_recovered(signer).await.map(|(signature, _)| signature)
    }

    async fn sign_recovered(&self, signer: &dyn Signer) -> Result<(Signature, Address), McmsError> {
        self.proposal.read().validate()?;

        let signature = signer.sign_hash(self.signing_hash).await?;
        let index = self.proposal.read().signatures.len();
        let address = signature
            .recover(self.signing_hash)
            .map_err(|source| McmsError::SignatureRecovery { index, source })?;
        debug!(%address, hash = %self.signing_hash, "Signed proposal");

        Ok((signature, address))
    }

    /// Signs the proposal and appends the signature.
    ///
    /// Fails if the signer already approved the proposal.
    pub async fn sign_and_append(&self, signer: &dyn Signer) -> Result<Signature, McmsError> {
        let (signature, address) = self.sign_recovered(signer).await?;
        let mut proposal = self.proposal.write();
        if recover_signers(&proposal.signatures, self.signing_hash)?.contains(&address) {
            return Err(McmsError::DuplicateSignature(address));
        }
        proposal.append_signature(signature);
        info!(%address, signatures = proposal.signatures.len(), "Appended signature");
        Ok(signature)
    }

    /// Addresses recovered from every appended signature, in append order.
    pub fn recovered_signers(&self) -> Result<Vec<Address>, McmsError> {
        recover_signers(&self.proposal.read().signatures, self.signing_hash)
    }

    fn inspectors(&self) -> Result<&Inspectors, McmsError> {
        self.inspectors.as_ref().ok_or(McmsError::InspectorsNotProvided)
    }

    fn inspector(&self, selector: ChainSelector) -> Result<&Arc<dyn Inspector>, McmsError> {
        self.inspectors()?.get(&selector).ok_or(McmsError::InspectorNotFound(selector))
    }

    async fn live_config(&self, selector: ChainSelector) -> Result<Config, McmsError> {
        let mcm = self.proposal.read().metadata(selector)?.mcm_address.clone();
        self.inspector(selector)?.get_config(&mcm).await.map_err(McmsError::chain(selector))
    }

    /// Live configs of every chain in the proposal.
    pub async fn get_configs(
        &self,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<ChainSelector, Config>, McmsError> {
        self.inspectors()?;
        let selectors = self.proposal.read().chain_selectors();

        let fetch = try_join_all(selectors.into_iter().map(|selector| async move {
            Ok::<_, McmsError>((selector, self.live_config(selector).await?))
        }));
        Ok(cancellable(cancel, fetch).await?.into_iter().collect())
    }

    /// Whether the appended signatures reach the live quorum of `selector`.
    pub async fn check_quorum(
        &self,
        selector: ChainSelector,
        cancel: &CancellationToken,
    ) -> Result<bool, McmsError> {
        let recovered = self.recovered_signers()?;
        let config = cancellable(cancel, self.live_config(selector)).await?;

        let reached = config.can_set_root(&recovered).map_err(|err| match err {
            ConfigError::UnknownSigner(address) => McmsError::InvalidSignature(address),
            other => other.into(),
        })?;
        debug!(chain_selector = %selector, signers = recovered.len(), reached, "Checked quorum");

        Ok(reached)
    }

    /// Whether every chain of the proposal reached its quorum.
    pub async fn validate_signatures(&self, cancel: &CancellationToken) -> Result<bool, McmsError> {
        Ok(self.chain_without_quorum(cancel).await?.is_none())
    }

    /// Like [`Self::validate_signatures`], failing with the first chain below quorum.
    pub async fn require_quorum(&self, cancel: &CancellationToken) -> Result<(), McmsError> {
        match self.chain_without_quorum(cancel).await? {
            Some(selector) => Err(McmsError::QuorumNotReached(selector)),
            None => Ok(()),
        }
    }

    async fn chain_without_quorum(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<ChainSelector>, McmsError> {
        let selectors = self.proposal.read().chain_selectors();
        for selector in selectors {
            if !self.check_quorum(selector, cancel).await? {
                return Ok(Some(selector));
            }
        }
        Ok(None)
    }

    /// Checks the live configs against the expected ones and against each other.
    pub async fn validate_configs(&self, cancel: &CancellationToken) -> Result<(), McmsError> {
        let configs = self.get_configs(cancel).await?;

        for (selector, expected) in &self.expected_configs {
            if configs.get(selector).is_some_and(|live| live != expected) {
                return Err(McmsError::ConfigMismatch(*selector));
            }
        }

        let mut iter = configs.iter();
        if let Some((first, reference)) = iter.next() {
            for (selector, config) in iter {
                if config != reference {
                    return Err(McmsError::InconsistentConfigs { a: *selector, b: *first });
                }
            }
        }

        Ok(())
    }

    /// Current op count of every chain's MCMS contract.
    pub async fn get_current_op_counts(
        &self,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<ChainSelector, u64>, McmsError> {
        let inspectors = self.inspectors()?;
        let metadata = self.proposal.read().chain_metadata.clone();

        let fetch = try_join_all(metadata.into_iter().map(|(selector, metadata)| async move {
            let inspector =
                inspectors.get(&selector).ok_or(McmsError::InspectorNotFound(selector))?;
            let count = inspector
                .get_op_count(&metadata.mcm_address)
                .await
                .map_err(McmsError::chain(selector))?;
            Ok::<_, McmsError>((selector, count))
        }));
        Ok(cancellable(cancel, fetch).await?.into_iter().collect())
    }

    /// Dry-runs every operation of the proposal against the registered simulators.
    pub async fn simulate(&self, cancel: &CancellationToken) -> Result<(), McmsError> {
        let simulators = self.simulators.as_ref().ok_or(McmsError::SimulatorsNotProvided)?;
        let proposal = self.proposal();

        for (index, op) in proposal.operations.iter().enumerate() {
            let selector = op.chain_selector;
            let simulator = simulators.get(&selector).ok_or(McmsError::SimulatorNotFound(selector))?;
            let encoder = self.encoders.get(&selector).ok_or(McmsError::EncoderNotFound(selector))?;
            let metadata = proposal.metadata(selector)?;
            let nonce = to_nonce(self.nonces[index])?;

            let leaf = encoder
                .hash_operation(nonce, metadata, op)
                .map_err(McmsError::operation(index, selector))?;
            let proof = self.tree.get_proof(leaf)?;

            debug!(index, chain_selector = %selector, nonce, "Simulating operation");
            cancellable(cancel, async {
                simulator
                    .simulate_operation(metadata, nonce, &proof, op)
                    .await
                    .map_err(McmsError::operation(index, selector))
            })
            .await?;
        }

        Ok(())
    }
}

/// Recovers the signer of every signature over `hash`.
pub(crate) fn recover_signers(
    signatures: &[Signature],
    hash: B256,
) -> Result<Vec<Address>, McmsError> {
    signatures
        .iter()
        .enumerate()
        .map(|(index, signature)| {
            signature.recover(hash).map_err(|source| McmsError::SignatureRecovery { index, source })
        })
        .collect()
}

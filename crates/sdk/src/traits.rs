//! Capabilities every chain family implements.

use crate::SdkError;
use alloy_primitives::B256;
use mcms_primitives::{
    BatchOperation, ChainMetadata, Config, Delay, Operation, Signature, TimelockAction,
    TransactionResult,
};

/// Hashes operations and chain metadata into Merkle leaves.
///
/// Implementations are bound to one chain and one proposal: they carry the number of
/// operations the proposal has on that chain and its `overridePreviousRoot` flag.
pub trait Encoder: Send + Sync {
    /// Leaf of the operation executed at op count `nonce`.
    fn hash_operation(
        &self,
        nonce: u32,
        metadata: &ChainMetadata,
        op: &Operation,
    ) -> Result<B256, SdkError>;

    /// Leaf binding the op count range of the proposal on this chain.
    fn hash_metadata(&self, metadata: &ChainMetadata) -> Result<B256, SdkError>;
}

/// Reads MCMS contract state.
#[async_trait::async_trait]
pub trait Inspector: Send + Sync {
    async fn get_config(&self, mcm: &str) -> Result<Config, SdkError>;

    async fn get_op_count(&self, mcm: &str) -> Result<u64, SdkError>;

    /// Current root and its expiry.
    async fn get_root(&self, mcm: &str) -> Result<(B256, u32), SdkError>;

    async fn get_root_metadata(&self, mcm: &str) -> Result<ChainMetadata, SdkError>;
}

/// Submits `setRoot` and `execute` transactions to an MCMS contract.
#[async_trait::async_trait]
pub trait Executor: Inspector {
    async fn execute_operation(
        &self,
        metadata: &ChainMetadata,
        nonce: u32,
        proof: &[B256],
        op: &Operation,
    ) -> Result<TransactionResult, SdkError>;

    async fn set_root(
        &self,
        metadata: &ChainMetadata,
        proof: &[B256],
        root: B256,
        valid_until: u32,
        sorted_signatures: &[Signature],
    ) -> Result<TransactionResult, SdkError>;
}

/// Dry-runs executor calls without submitting them.
#[async_trait::async_trait]
pub trait Simulator: Send + Sync {
    async fn simulate_set_root(
        &self,
        metadata: &ChainMetadata,
        proof: &[B256],
        root: B256,
        valid_until: u32,
        sorted_signatures: &[Signature],
    ) -> Result<(), SdkError>;

    async fn simulate_operation(
        &self,
        metadata: &ChainMetadata,
        nonce: u32,
        proof: &[B256],
        op: &Operation,
    ) -> Result<(), SdkError>;
}

/// Replaces the signer configuration of an MCMS contract.
#[async_trait::async_trait]
pub trait Configurer: Send + Sync {
    async fn set_config(
        &self,
        mcm: &str,
        config: &Config,
        clear_root: bool,
    ) -> Result<TransactionResult, SdkError>;
}

/// Turns a batch into the MCMS operation that schedules, cancels or bypasses it.
pub trait TimelockConverter: Send + Sync {
    /// Returns the converted operations and the timelock operation id of the batch.
    #[allow(clippy::too_many_arguments)]
    fn convert_batch_to_chain_operations(
        &self,
        metadata: &ChainMetadata,
        batch: &BatchOperation,
        timelock_address: &str,
        mcm_address: &str,
        delay: Delay,
        action: TimelockAction,
        predecessor: B256,
        salt: B256,
    ) -> Result<(Vec<Operation>, B256), SdkError>;
}

/// Executes a scheduled batch on the timelock once it is ready.
#[async_trait::async_trait]
pub trait TimelockExecutor: TimelockInspector {
    async fn execute(
        &self,
        batch: &BatchOperation,
        timelock_address: &str,
        predecessor: B256,
        salt: B256,
    ) -> Result<TransactionResult, SdkError>;
}

/// Reads timelock roles and operation status.
#[async_trait::async_trait]
pub trait TimelockInspector: Send + Sync {
    async fn get_proposers(&self, timelock: &str) -> Result<Vec<String>, SdkError>;

    async fn get_executors(&self, timelock: &str) -> Result<Vec<String>, SdkError>;

    async fn get_bypassers(&self, timelock: &str) -> Result<Vec<String>, SdkError>;

    async fn get_cancellers(&self, timelock: &str) -> Result<Vec<String>, SdkError>;

    async fn is_operation(&self, timelock: &str, id: B256) -> Result<bool, SdkError>;

    async fn is_operation_pending(&self, timelock: &str, id: B256) -> Result<bool, SdkError>;

    async fn is_operation_ready(&self, timelock: &str, id: B256) -> Result<bool, SdkError>;

    async fn is_operation_done(&self, timelock: &str, id: B256) -> Result<bool, SdkError>;
}

use super::{EvmAdapter, EvmEncoder, encoder::to_contract_signature, parse_address};
use crate::{Executor, Inspector, SdkError, Simulator};
use alloy_primitives::B256;
use alloy_sol_types::SolCall;
use mcms_contracts::IManyChainMultiSig;
use mcms_primitives::{ChainMetadata, Config, Operation, Signature, TransactionResult};
use tracing::info;

/// Submits and simulates `setRoot`/`execute` on an EVM `ManyChainMultiSig`.
///
/// The encoder must be the one used to build the proposal's tree, otherwise the proofs do not
/// match the submitted leaves.
#[derive(Debug, Clone)]
pub struct EvmExecutor {
    adapter: EvmAdapter,
    encoder: EvmEncoder,
}

impl EvmExecutor {
    pub const fn new(adapter: EvmAdapter, encoder: EvmEncoder) -> Self {
        Self { adapter, encoder }
    }

    pub const fn encoder(&self) -> &EvmEncoder {
        &self.encoder
    }

    fn execute_call(
        &self,
        metadata: &ChainMetadata,
        nonce: u32,
        proof: &[B256],
        op: &Operation,
    ) -> Result<IManyChainMultiSig::executeCall, SdkError> {
        Ok(IManyChainMultiSig::executeCall {
            op: self.encoder.to_op(nonce, metadata, op)?,
            proof: proof.to_vec(),
        })
    }

    fn set_root_call(
        &self,
        metadata: &ChainMetadata,
        proof: &[B256],
        root: B256,
        valid_until: u32,
        sorted_signatures: &[Signature],
    ) -> Result<IManyChainMultiSig::setRootCall, SdkError> {
        Ok(IManyChainMultiSig::setRootCall {
            root,
            validUntil: valid_until,
            metadata: self.encoder.to_root_metadata(metadata)?,
            metadataProof: proof.to_vec(),
            signatures: sorted_signatures.iter().map(to_contract_signature).collect(),
        })
    }
}

#[async_trait::async_trait]
impl Inspector for EvmExecutor {
    async fn get_config(&self, mcm: &str) -> Result<Config, SdkError> {
        self.adapter.get_config(mcm).await
    }

    async fn get_op_count(&self, mcm: &str) -> Result<u64, SdkError> {
        self.adapter.get_op_count(mcm).await
    }

    async fn get_root(&self, mcm: &str) -> Result<(B256, u32), SdkError> {
        self.adapter.get_root(mcm).await
    }

    async fn get_root_metadata(&self, mcm: &str) -> Result<ChainMetadata, SdkError> {
        self.adapter.get_root_metadata(mcm).await
    }
}

#[async_trait::async_trait]
impl Executor for EvmExecutor {
    async fn execute_operation(
        &self,
        metadata: &ChainMetadata,
        nonce: u32,
        proof: &[B256],
        op: &Operation,
    ) -> Result<TransactionResult, SdkError> {
        let call = self.execute_call(metadata, nonce, proof, op)?;
        let result = self.adapter.send(parse_address(&metadata.mcm_address)?, call).await?;

        info!(mcm = %metadata.mcm_address, nonce, to = %op.transaction.to, tx_hash = %result.hash, "Executed operation");
        Ok(result)
    }

    async fn set_root(
        &self,
        metadata: &ChainMetadata,
        proof: &[B256],
        root: B256,
        valid_until: u32,
        sorted_signatures: &[Signature],
    ) -> Result<TransactionResult, SdkError> {
        let call = self.set_root_call(metadata, proof, root, valid_until, sorted_signatures)?;
        let result = self.adapter.send(parse_address(&metadata.mcm_address)?, call).await?;

        info!(mcm = %metadata.mcm_address, %root, valid_until, tx_hash = %result.hash, "Set root");
        Ok(result)
    }
}

#[async_trait::async_trait]
impl Simulator for EvmExecutor {
    async fn simulate_set_root(
        &self,
        metadata: &ChainMetadata,
        proof: &[B256],
        root: B256,
        valid_until: u32,
        sorted_signatures: &[Signature],
    ) -> Result<(), SdkError> {
        let call = self.set_root_call(metadata, proof, root, valid_until, sorted_signatures)?;
        self.adapter
            .client()
            .call(parse_address(&metadata.mcm_address)?, call.abi_encode().into())
            .await?;
        Ok(())
    }

    async fn simulate_operation(
        &self,
        metadata: &ChainMetadata,
        nonce: u32,
        proof: &[B256],
        op: &Operation,
    ) -> Result<(), SdkError> {
        let call = self.execute_call(metadata, nonce, proof, op)?;
        self.adapter
            .client()
            .call(parse_address(&metadata.mcm_address)?, call.abi_encode().into())
            .await?;
        Ok(())
    }
}


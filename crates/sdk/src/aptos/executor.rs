use super::{
    AptosAdapter, AptosAdditionalFields, AptosAddress, AptosEncoder, EntryFunctionCall,
    MCMS_EXECUTOR_MODULE, MCMS_MODULE, bcs_arg,
};
use crate::{Executor, Inspector, SdkError};
use alloy_primitives::{B256, U256};
use mcms_primitives::{
    ChainMetadata, Config, Operation, Signature, TransactionResult, signature::V_OFFSET,
};
use tracing::{debug, info};

/// Submits `set_root` and `execute` to the Aptos `mcms` module.
///
/// Payloads larger than [`AptosOptions::chunk_size`](super::AptosOptions) are staged through
/// `mcms_executor::stage_data` before the final `stage_data_and_execute`.
#[derive(Debug, Clone)]
pub struct AptosExecutor {
    adapter: AptosAdapter,
    encoder: AptosEncoder,
}

/// `u256` arguments are 32 little-endian bytes in BCS.
fn u256_arg(value: u64) -> [u8; 32] {
    U256::from(value).to_le_bytes::<32>()
}

fn proof_arg(proof: &[B256]) -> Vec<Vec<u8>> {
    proof.iter().map(|hash| hash.to_vec()).collect()
}

impl AptosExecutor {
    pub const fn new(adapter: AptosAdapter, encoder: AptosEncoder) -> Self {
        Self { adapter, encoder }
    }

    pub const fn encoder(&self) -> &AptosEncoder {
        &self.encoder
    }

    /// Arguments shared by `execute` and `stage_data_and_execute`, with `data` as the payload.
    fn execute_args(
        &self,
        mcm: AptosAddress,
        nonce: u32,
        op: &Operation,
        fields: &AptosAdditionalFields,
        data: &[u8],
        proof: &[B256],
    ) -> Result<Vec<Vec<u8>>, SdkError> {
        let to: AptosAddress = op.transaction.to.parse()?;
        Ok(vec![
            bcs_arg("chain id", &u256_arg(self.encoder.chain_id()?))?,
            bcs_arg("multisig", &mcm)?,
            bcs_arg("nonce", &u64::from(nonce))?,
            bcs_arg("to", &to)?,
            bcs_arg("module name", &fields.module_name)?,
            bcs_arg("function", &fields.function)?,
            bcs_arg("data", &data.to_vec())?,
            bcs_arg("proof", &proof_arg(proof))?,
        ])
    }

    async fn execute_chunked(
        &self,
        mcm: AptosAddress,
        nonce: u32,
        op: &Operation,
        fields: &AptosAdditionalFields,
        proof: &[B256],
    ) -> Result<TransactionResult, SdkError> {
        let chunks: Vec<&[u8]> = op.transaction.data.chunks(self.adapter.options().chunk_size.max(1)).collect();
        let total = chunks.len();

        let client = self.adapter.client();
        let start = client.sequence_number(client.sender()).await?;
        debug!(%mcm, nonce, chunks = total, start_sequence_number = start, "Staging operation data");

        let mut result = None;
        for (index, chunk) in chunks.into_iter().enumerate() {
            let sequence_number = Some(start + index as u64);
            let chunk_error = |stage: &'static str| {
                move |source: SdkError| SdkError::Chunk { stage, index, total, source: Box::new(source) }
            };

            if index + 1 == total {
                let args = self
                    .execute_args(mcm, nonce, op, fields, chunk, proof)
                    .map_err(chunk_error("executing"))?;
                let call =
                    EntryFunctionCall::new(mcm, MCMS_EXECUTOR_MODULE, "stage_data_and_execute", args);
                result = Some(
                    self.adapter.submit(call, sequence_number).await.map_err(chunk_error("executing"))?,
                );
            } else {
                let args = vec![
                    bcs_arg("data chunk", &chunk.to_vec()).map_err(chunk_error("staging"))?,
                    bcs_arg("partial proofs", &Vec::<Vec<u8>>::new()).map_err(chunk_error("staging"))?,
                ];
                let call = EntryFunctionCall::new(mcm, MCMS_EXECUTOR_MODULE, "stage_data", args);
                self.adapter.submit(call, sequence_number).await.map_err(chunk_error("staging"))?;
            }
        }

        result.ok_or(SdkError::Unsupported("executing an empty chunk list"))
    }
}

#[async_trait::async_trait]
impl Inspector for AptosExecutor {
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
impl Executor for AptosExecutor {
    async fn execute_operation(
        &self,
        metadata: &ChainMetadata,
        nonce: u32,
        proof: &[B256],
        op: &Operation,
    ) -> Result<TransactionResult, SdkError> {
        let mcm: AptosAddress = metadata.mcm_address.parse()?;
        let fields = AptosAdditionalFields::from_json(&op.transaction.additional_fields)?;

        if op.transaction.data.len() > self.adapter.options().chunk_size {
            return self.execute_chunked(mcm, nonce, op, &fields, proof).await;
        }

        let args = self.execute_args(mcm, nonce, op, &fields, &op.transaction.data, proof)?;
        let result = self.adapter.submit(EntryFunctionCall::new(mcm, MCMS_MODULE, "execute", args), None).await?;

        info!(%mcm, nonce, to = %op.transaction.to, tx_hash = %result.hash, "Executed operation");
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
        let mcm: AptosAddress = metadata.mcm_address.parse()?;
        let pre = metadata.starting_op_count;
        let post = pre
            .checked_add(self.encoder.tx_count)
            .ok_or_else(|| SdkError::OutOfRange(format!("post op count {pre} + {}", self.encoder.tx_count)))?;

        let signatures: Vec<Vec<u8>> = sorted_signatures
            .iter()
            .map(|signature| {
                let v = if signature.v < 2 { signature.v + V_OFFSET } else { signature.v };
                Signature { v, ..*signature }.to_bytes().to_vec()
            })
            .collect();

        let args = vec![
            bcs_arg("root", &root.to_vec())?,
            bcs_arg("valid until", &u64::from(valid_until))?,
            bcs_arg("chain id", &u256_arg(self.encoder.chain_id()?))?,
            bcs_arg("multisig", &mcm)?,
            bcs_arg("pre op count", &pre)?,
            bcs_arg("post op count", &post)?,
            bcs_arg("override previous root", &self.encoder.override_previous_root)?,
            bcs_arg("metadata proof", &proof_arg(proof))?,
            bcs_arg("signatures", &signatures)?,
        ];

        let result =
            self.adapter.submit(EntryFunctionCall::new(mcm, MCMS_MODULE, "set_root", args), None).await?;
        info!(%mcm, %root, valid_until, tx_hash = %result.hash, "Set root");
        Ok(result)
    }
}

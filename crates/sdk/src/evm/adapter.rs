use super::{EvmAdditionalFields, EvmClient, parse_address};
use crate::{Configurer, Inspector, SdkError, TimelockExecutor, TimelockInspector};
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolCall;
use mcms_contracts::{IManyChainMultiSig, IRBACTimelock, rbac_timelock};
use mcms_primitives::{
    BatchOperation, ChainFamily, ChainMetadata, Config, FlatConfig, FlatSigner, TransactionResult,
};
use std::{fmt, sync::Arc};
use tracing::{debug, info};

/// Reads and configures `ManyChainMultiSig` and `RBACTimelock` contracts through an
/// [`EvmClient`].
#[derive(Clone)]
pub struct EvmAdapter {
    client: Arc<dyn EvmClient>,
}

impl fmt::Debug for EvmAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmAdapter").finish_non_exhaustive()
    }
}

impl EvmAdapter {
    pub fn new(client: Arc<dyn EvmClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn EvmClient> {
        &self.client
    }

    /// Executes a view call and decodes its return value.
    pub(crate) async fn call<C>(&self, to: Address, call: C) -> Result<C::Return, SdkError>
    where
        C: SolCall + Send,
    {
        let output = self.client.call(to, call.abi_encode().into()).await?;
        C::abi_decode_returns(&output).map_err(|err| SdkError::decode(C::SIGNATURE, err))
    }

    /// Submits a call and wraps the resulting hash.
    pub(crate) async fn send<C>(&self, to: Address, call: C) -> Result<TransactionResult, SdkError>
    where
        C: SolCall + Send,
    {
        let hash = self.client.send(to, call.abi_encode().into(), U256::ZERO).await?;
        Ok(TransactionResult::new(hash.to_string(), ChainFamily::Evm))
    }

    async fn role_members(&self, timelock: &str, role: B256) -> Result<Vec<String>, SdkError> {
        let timelock = parse_address(timelock)?;
        let count = self.call(timelock, IRBACTimelock::getRoleMemberCountCall { role }).await?;
        let count = u64::try_from(count)
            .map_err(|_| SdkError::OutOfRange(format!("role member count {count}")))?;

        let mut members = Vec::with_capacity(count as usize);
        for index in 0..count {
            let member = self
                .call(timelock, IRBACTimelock::getRoleMemberCall { role, index: U256::from(index) })
                .await?;
            members.push(member.to_checksum(None));
        }

        debug!(%timelock, %role, members = members.len(), "Fetched role members");
        Ok(members)
    }
}

/// Converts the on-chain config into the flat form.
pub(crate) fn flat_config(config: IManyChainMultiSig::Config) -> FlatConfig {
    FlatConfig {
        signers: config
            .signers
            .into_iter()
            .map(|signer| FlatSigner { address: signer.addr, index: signer.index, group: signer.group })
            .collect(),
        group_quorums: config.groupQuorums,
        group_parents: config.groupParents,
    }
}

#[async_trait::async_trait]
impl Inspector for EvmAdapter {
    async fn get_config(&self, mcm: &str) -> Result<Config, SdkError> {
        let config = self.call(parse_address(mcm)?, IManyChainMultiSig::getConfigCall {}).await?;
        Ok(flat_config(config).to_config()?)
    }

    async fn get_op_count(&self, mcm: &str) -> Result<u64, SdkError> {
        let count = self.call(parse_address(mcm)?, IManyChainMultiSig::getOpCountCall {}).await?;
        Ok(count.to::<u64>())
    }

    async fn get_root(&self, mcm: &str) -> Result<(B256, u32), SdkError> {
        let root = self.call(parse_address(mcm)?, IManyChainMultiSig::getRootCall {}).await?;
        Ok((root.root, root.validUntil))
    }

    async fn get_root_metadata(&self, mcm: &str) -> Result<ChainMetadata, SdkError> {
        let metadata =
            self.call(parse_address(mcm)?, IManyChainMultiSig::getRootMetadataCall {}).await?;
        Ok(ChainMetadata::new(metadata.preOpCount.to::<u64>(), metadata.multiSig.to_checksum(None)))
    }
}

#[async_trait::async_trait]
impl Configurer for EvmAdapter {
    async fn set_config(
        &self,
        mcm: &str,
        config: &Config,
        clear_root: bool,
    ) -> Result<TransactionResult, SdkError> {
        let flat = config.to_flat()?;
        let call = IManyChainMultiSig::setConfigCall {
            signerAddresses: flat.signers.iter().map(|signer| signer.address).collect(),
            signerGroups: flat.signers.iter().map(|signer| signer.group).collect(),
            groupQuorums: flat.group_quorums,
            groupParents: flat.group_parents,
            clearRoot: clear_root,
        };

        let result = self.send(parse_address(mcm)?, call).await?;
        info!(
            %mcm,
            signers = flat.signers.len(),
            groups = flat.group_quorums.iter().filter(|q| **q > 0).count(),
            clear_root,
            tx_hash = %result.hash,
            "Set MCMS config"
        );
        Ok(result)
    }
}

#[async_trait::async_trait]
impl TimelockInspector for EvmAdapter {
    async fn get_proposers(&self, timelock: &str) -> Result<Vec<String>, SdkError> {
        self.role_members(timelock, rbac_timelock::PROPOSER_ROLE).await
    }

    async fn get_executors(&self, timelock: &str) -> Result<Vec<String>, SdkError> {
        self.role_members(timelock, rbac_timelock::EXECUTOR_ROLE).await
    }

    async fn get_bypassers(&self, timelock: &str) -> Result<Vec<String>, SdkError> {
        self.role_members(timelock, rbac_timelock::BYPASSER_ROLE).await
    }

    async fn get_cancellers(&self, timelock: &str) -> Result<Vec<String>, SdkError> {
        self.role_members(timelock, rbac_timelock::CANCELLER_ROLE).await
    }

    async fn is_operation(&self, timelock: &str, id: B256) -> Result<bool, SdkError> {
        self.call(parse_address(timelock)?, IRBACTimelock::isOperationCall { id }).await
    }

    async fn is_operation_pending(&self, timelock: &str, id: B256) -> Result<bool, SdkError> {
        self.call(parse_address(timelock)?, IRBACTimelock::isOperationPendingCall { id }).await
    }

    async fn is_operation_ready(&self, timelock: &str, id: B256) -> Result<bool, SdkError> {
        self.call(parse_address(timelock)?, IRBACTimelock::isOperationReadyCall { id }).await
    }

    async fn is_operation_done(&self, timelock: &str, id: B256) -> Result<bool, SdkError> {
        self.call(parse_address(timelock)?, IRBACTimelock::isOperationDoneCall { id }).await
    }
}

/// Timelock calls of a batch, in batch order.
pub(crate) fn timelock_calls(batch: &BatchOperation) -> Result<Vec<IRBACTimelock::Call>, SdkError> {
    batch
        .transactions
        .iter()
        .map(|tx| {
            Ok(IRBACTimelock::Call {
                target: parse_address(&tx.to)?,
                value: EvmAdditionalFields::from_json(&tx.additional_fields)?.value,
                data: tx.data.clone(),
            })
        })
        .collect()
}

#[async_trait::async_trait]
impl TimelockExecutor for EvmAdapter {
    async fn execute(
        &self,
        batch: &BatchOperation,
        timelock_address: &str,
        predecessor: B256,
        salt: B256,
    ) -> Result<TransactionResult, SdkError> {
        let calls = timelock_calls(batch)?;
        let count = calls.len();
        let result = self
            .send(
                parse_address(timelock_address)?,
                IRBACTimelock::executeBatchCall { calls, predecessor, salt },
            )
            .await?;

        info!(timelock = %timelock_address, calls = count, tx_hash = %result.hash, "Executed timelock batch");
        Ok(result)
    }
}

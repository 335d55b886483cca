use super::{AptosAdditionalFields, AptosAddress, MCMS_MODULE, bcs_arg};
use crate::{SdkError, TimelockConverter};
use alloy_primitives::{B256, keccak256};
use mcms_primitives::{
    BatchOperation, ChainMetadata, Delay, Operation, TimelockAction, Transaction,
};

/// Contract type attached to converted timelock operations.
pub const TIMELOCK_CONTRACT_TYPE: &str = "MCMSTimelock";

/// Column-wise view of a batch as taken by the timelock entry functions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BatchCalls {
    pub(crate) targets: Vec<AptosAddress>,
    pub(crate) module_names: Vec<String>,
    pub(crate) function_names: Vec<String>,
    pub(crate) datas: Vec<Vec<u8>>,
}

impl BatchCalls {
    pub(crate) fn from_batch(batch: &BatchOperation) -> Result<Self, SdkError> {
        let mut calls = Self::default();
        for tx in &batch.transactions {
            let fields = AptosAdditionalFields::from_json(&tx.additional_fields)?;
            calls.targets.push(tx.to.parse()?);
            calls.module_names.push(fields.module_name);
            calls.function_names.push(fields.function);
            calls.datas.push(tx.data.to_vec());
        }
        Ok(calls)
    }

    /// The four `vector` arguments shared by the timelock entry functions.
    pub(crate) fn encode_args(&self) -> Result<Vec<Vec<u8>>, SdkError> {
        Ok(vec![
            bcs_arg("targets", &self.targets)?,
            bcs_arg("module names", &self.module_names)?,
            bcs_arg("function names", &self.function_names)?,
            bcs_arg("datas", &self.datas)?,
        ])
    }

    /// Operation id over the BCS encoding of the calls, predecessor and salt.
    pub(crate) fn operation_id(&self, predecessor: B256, salt: B256) -> Result<B256, SdkError> {
        let calls: Vec<_> = self
            .targets
            .iter()
            .zip(&self.module_names)
            .zip(&self.function_names)
            .zip(&self.datas)
            .map(|(((target, module), function), data)| (target, module, function, data))
            .collect();

        let encoded = bcs::to_bytes(&(calls, predecessor.0, salt.0))
            .map_err(|err| SdkError::encode("operation batch", err))?;
        Ok(keccak256(encoded))
    }
}

/// Operation id of a batch as computed by the Move timelock.
pub fn hash_operation_batch(
    batch: &BatchOperation,
    predecessor: B256,
    salt: B256,
) -> Result<B256, SdkError> {
    BatchCalls::from_batch(batch)?.operation_id(predecessor, salt)
}

/// Wraps batches into `timelock_schedule_batch`, `timelock_cancel` or
/// `timelock_bypasser_execute_batch` calls on the MCMS module.
#[derive(Debug, Clone, Copy, Default)]
pub struct AptosTimelockConverter;

impl TimelockConverter for AptosTimelockConverter {
    fn convert_batch_to_chain_operations(
        &self,
        _metadata: &ChainMetadata,
        batch: &BatchOperation,
        _timelock_address: &str,
        mcm_address: &str,
        delay: Delay,
        action: TimelockAction,
        predecessor: B256,
        salt: B256,
    ) -> Result<(Vec<Operation>, B256), SdkError> {
        let mcm: AptosAddress = mcm_address.parse()?;
        let calls = BatchCalls::from_batch(batch)?;
        let id = calls.operation_id(predecessor, salt)?;

        let (function, args) = match action {
            TimelockAction::Schedule => {
                let mut args = calls.encode_args()?;
                args.push(bcs_arg("predecessor", &predecessor.to_vec())?);
                args.push(bcs_arg("salt", &salt.to_vec())?);
                args.push(bcs_arg("delay", &delay.as_secs())?);
                ("timelock_schedule_batch", args)
            }
            TimelockAction::Bypass => ("timelock_bypasser_execute_batch", calls.encode_args()?),
            TimelockAction::Cancel => ("timelock_cancel", vec![bcs_arg("id", &id.to_vec())?]),
        };

        let tags = batch.transactions.iter().flat_map(|tx| tx.metadata.tags.iter().cloned());
        let transaction = Transaction::new(
            mcm.to_string(),
            args.concat(),
            AptosAdditionalFields::new(MCMS_MODULE, MCMS_MODULE, function).to_json(),
        )
        .with_contract_type(TIMELOCK_CONTRACT_TYPE)
        .with_tags(tags);

        Ok((vec![Operation { chain_selector: batch.chain_selector, transaction }], id))
    }
}

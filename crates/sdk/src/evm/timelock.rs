use super::{adapter::timelock_calls, parse_address};
use crate::{SdkError, TimelockConverter};
use alloy_primitives::{B256, U256, keccak256};
use alloy_sol_types::{SolCall, SolValue};
use mcms_contracts::IRBACTimelock;
use mcms_primitives::{
    BatchOperation, ChainMetadata, Delay, Operation, TimelockAction, Transaction,
};
use serde_json::json;

/// Contract type attached to converted timelock operations.
pub const TIMELOCK_CONTRACT_TYPE: &str = "RBACTimelock";

/// Operation id of a batch, as computed by `RBACTimelock.hashOperationBatch`.
pub fn hash_operation_batch(calls: &[IRBACTimelock::Call], predecessor: B256, salt: B256) -> B256 {
    keccak256((calls.to_vec(), predecessor, salt).abi_encode_params())
}

/// Wraps batches into `scheduleBatch`, `cancel` or `bypasserExecuteBatch` calls on an
/// `RBACTimelock`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvmTimelockConverter;

impl TimelockConverter for EvmTimelockConverter {
    fn convert_batch_to_chain_operations(
        &self,
        _metadata: &ChainMetadata,
        batch: &BatchOperation,
        timelock_address: &str,
        _mcm_address: &str,
        delay: Delay,
        action: TimelockAction,
        predecessor: B256,
        salt: B256,
    ) -> Result<(Vec<Operation>, B256), SdkError> {
        let timelock = parse_address(timelock_address)?;
        let calls = timelock_calls(batch)?;
        let id = hash_operation_batch(&calls, predecessor, salt);

        let data = match action {
            TimelockAction::Schedule => IRBACTimelock::scheduleBatchCall {
                calls,
                predecessor,
                salt,
                delay: U256::from(delay.as_secs()),
            }
            .abi_encode(),
            TimelockAction::Cancel => IRBACTimelock::cancelCall { id }.abi_encode(),
            TimelockAction::Bypass => IRBACTimelock::bypasserExecuteBatchCall { calls }.abi_encode(),
        };

        let tags = batch.transactions.iter().flat_map(|tx| tx.metadata.tags.iter().cloned());
        let transaction = Transaction::new(timelock.to_checksum(None), data, json!({ "value": 0 }))
            .with_contract_type(TIMELOCK_CONTRACT_TYPE)
            .with_tags(tags);

        Ok((vec![Operation { chain_selector: batch.chain_selector, transaction }], id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, address};
    use mcms_primitives::ChainSelector;
    use serde_json::Value;
    use test_case::test_case;

    const TIMELOCK: Address = address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512");
    const TARGET: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

    fn batch() -> BatchOperation {
        BatchOperation {
            chain_selector: ChainSelector::ETHEREUM_TESTNET_SEPOLIA,
            transactions: vec![
                Transaction::new(TARGET.to_string(), vec![0x01], Value::Null).with_tags(["a"]),
                Transaction::new(TARGET.to_string(), vec![0x02], json!({ "value": 5 }))
                    .with_tags(["b", "c"]),
            ],
        }
    }

    fn convert(action: TimelockAction, salt: B256) -> (Vec<Operation>, B256) {
        EvmTimelockConverter
            .convert_batch_to_chain_operations(
                &ChainMetadata::default(),
                &batch(),
                &TIMELOCK.to_string(),
                "",
                Delay::from_secs(3_600),
                action,
                B256::ZERO,
                salt,
            )
            .unwrap()
    }

    #[test_case(TimelockAction::Schedule; "schedule")]
    #[test_case(TimelockAction::Cancel; "cancel")]
    #[test_case(TimelockAction::Bypass; "bypass")]
    fn test_id_does_not_depend_on_action(action: TimelockAction) {
        let salt = B256::repeat_byte(9);
        let (_, id) = convert(action, salt);
        assert_eq!(id, convert(TimelockAction::Schedule, salt).1);
    }

    #[test]
    fn test_id_depends_on_salt() {
        assert_ne!(
            convert(TimelockAction::Schedule, B256::ZERO).1,
            convert(TimelockAction::Schedule, B256::repeat_byte(1)).1
        );
    }

    #[test]
    fn test_schedule_call() {
        let (ops, id) = convert(TimelockAction::Schedule, B256::ZERO);
        assert_eq!(ops.len(), 1);

        let tx = &ops[0].transaction;
        assert_eq!(tx.to, TIMELOCK.to_checksum(None));
        assert_eq!(tx.additional_fields, json!({ "value": 0 }));
        assert_eq!(tx.metadata.contract_type, TIMELOCK_CONTRACT_TYPE);
        assert_eq!(tx.metadata.tags, vec!["a", "b", "c"]);

        let call = IRBACTimelock::scheduleBatchCall::abi_decode(&tx.data).unwrap();
        assert_eq!(call.calls.len(), 2);
        assert_eq!(call.calls[1].value, U256::from(5u64));
        assert_eq!(call.delay, U256::from(3_600u64));
        assert_eq!(hash_operation_batch(&call.calls, call.predecessor, call.salt), id);
    }

    #[test]
    fn test_cancel_call_carries_id() {
        let (ops, id) = convert(TimelockAction::Cancel, B256::ZERO);
        let call = IRBACTimelock::cancelCall::abi_decode(&ops[0].transaction.data).unwrap();
        assert_eq!(call.id, id);
    }

    #[test]
    fn test_bypass_call() {
        let (ops, _) = convert(TimelockAction::Bypass, B256::ZERO);
        let call =
            IRBACTimelock::bypasserExecuteBatchCall::abi_decode(&ops[0].transaction.data).unwrap();
        assert_eq!(call.calls.len(), 2);
        assert_eq!(call.calls[0].target, TARGET);
    }
}

//! Proposals whose operations are routed through a timelock.

use crate::{
    BaseProposal, McmsError, Proposal,
    validation::{unix_now, validate_base, validate_transaction},
};
use alloy_primitives::B256;
use mcms_primitives::{
    BatchOperation, ChainMetadata, ChainSelector, Delay, ProposalKind, TimelockAction,
};
use mcms_sdk::TimelockConverter;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    io::{Read, Write},
    sync::Arc,
    time::Duration,
};
use tracing::debug;

/// Lifetime given to proposals derived from a schedule proposal.
pub const DEFAULT_VALID_UNTIL: Duration = Duration::from_secs(72 * 60 * 60);

/// Timelock converters keyed by chain.
pub type Converters = BTreeMap<ChainSelector, Arc<dyn TimelockConverter>>;

/// A proposal that schedules, cancels or bypasses batches on per-chain timelocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Deref, derive_more::DerefMut)]
#[serde(rename_all = "camelCase")]
pub struct TimelockProposal {
    #[serde(flatten)]
    #[deref]
    #[deref_mut]
    pub base: BaseProposal,
    pub action: TimelockAction,
    #[serde(default)]
    pub delay: Delay,
    pub timelock_addresses: BTreeMap<ChainSelector, String>,
    pub operations: Vec<BatchOperation>,
    #[serde(rename = "salt", default, skip_serializing_if = "Option::is_none")]
    pub salt_override: Option<B256>,
}

/// Result of converting a timelock proposal into a plain proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedProposal {
    /// One MCMS operation per batch, calling the timelock.
    pub proposal: Proposal,
    /// Timelock predecessor of every batch: the id of the previous batch on the same chain.
    pub predecessors: Vec<B256>,
    /// Timelock operation id of every batch.
    pub operation_ids: Vec<B256>,
}

impl TimelockProposal {
    pub fn from_reader(reader: impl Read) -> Result<Self, McmsError> {
        let proposal: Self = serde_json::from_reader(reader)?;
        proposal.validate()?;
        Ok(proposal)
    }

    pub fn write_to(&self, mut writer: impl Write) -> Result<(), McmsError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// The salt override, or `validUntil` big-endian in the first four bytes.
    pub fn salt(&self) -> B256 {
        self.salt_override.unwrap_or_else(|| {
            let mut salt = B256::ZERO;
            salt[..4].copy_from_slice(&self.valid_until.to_be_bytes());
            salt
        })
    }

    /// Number of calls per chain across all batches.
    pub fn transaction_counts(&self) -> BTreeMap<ChainSelector, u64> {
        let mut counts = BTreeMap::new();
        for batch in &self.operations {
            *counts.entry(batch.chain_selector).or_default() += batch.transactions.len() as u64;
        }
        counts
    }

    pub fn validate(&self) -> Result<(), McmsError> {
        validate_base(&self.base, ProposalKind::TimelockProposal)?;
        if self.operations.is_empty() {
            return Err(McmsError::NoOperations);
        }

        for (index, batch) in self.operations.iter().enumerate() {
            let selector = batch.chain_selector;
            self.metadata(selector)?;
            self.timelock_address(selector)?;
            if batch.transactions.is_empty() {
                return Err(McmsError::NoTransactionsInBatch { index, chain_selector: selector });
            }
            for tx in &batch.transactions {
                validate_transaction(index, selector, tx)?;
            }
        }

        Ok(())
    }

    pub(crate) fn timelock_address(&self, selector: ChainSelector) -> Result<&str, McmsError> {
        self.timelock_addresses
            .get(&selector)
            .map(String::as_str)
            .ok_or(McmsError::TimelockAddressNotFound(selector))
    }

    /// Derives a proposal cancelling this scheduled proposal.
    ///
    /// The batches and salt are kept so the cancelled operation ids match the scheduled ones.
    pub fn derive_cancellation_proposal(
        &self,
        metadata: &BTreeMap<ChainSelector, ChainMetadata>,
    ) -> Result<Self, McmsError> {
        self.derive(TimelockAction::Cancel, metadata)
    }

    /// Derives a proposal executing this scheduled proposal's batches through the bypasser role.
    pub fn derive_bypass_proposal(
        &self,
        metadata: &BTreeMap<ChainSelector, ChainMetadata>,
    ) -> Result<Self, McmsError> {
        self.derive(TimelockAction::Bypass, metadata)
    }

    fn derive(
        &self,
        action: TimelockAction,
        metadata: &BTreeMap<ChainSelector, ChainMetadata>,
    ) -> Result<Self, McmsError> {
        if self.action != TimelockAction::Schedule {
            return Err(McmsError::NotScheduleAction { action: self.action, derived: action });
        }

        let now = unix_now()?;
        let valid_until = now
            .checked_add(DEFAULT_VALID_UNTIL.as_secs() as u32)
            .ok_or(McmsError::TimestampOverflow(u64::from(now)))?;

        let mut derived = self.clone();
        derived.signatures.clear();
        derived.valid_until = valid_until;
        derived.salt_override = Some(self.salt());
        derived.action = action;
        for (selector, chain_metadata) in &mut derived.base.chain_metadata {
            *chain_metadata = metadata
                .get(selector)
                .cloned()
                .ok_or(McmsError::ReplacementMetadataNotFound(*selector))?;
        }

        Ok(derived)
    }

    /// Converters of every chain family in the proposal.
    pub fn timelock_converters(&self) -> Result<Converters, McmsError> {
        self.chain_metadata
            .keys()
            .map(|selector| {
                let converter =
                    mcms_sdk::timelock_converter(*selector).map_err(McmsError::chain(*selector))?;
                Ok((*selector, converter))
            })
            .collect()
    }

    /// Converts every batch into the MCMS operation that performs the proposal's action on it.
    ///
    /// Batches on the same chain are chained: each batch's predecessor is the operation id of
    /// the batch before it.
    pub fn convert(&self, converters: &Converters) -> Result<ConvertedProposal, McmsError> {
        let mut base = self.base.clone();
        base.kind = ProposalKind::Proposal;

        let salt = self.salt();
        let mut last_ids = BTreeMap::<ChainSelector, B256>::new();
        let mut predecessors = Vec::with_capacity(self.operations.len());
        let mut operation_ids = Vec::with_capacity(self.operations.len());
        let mut operations = Vec::with_capacity(self.operations.len());

        for (index, batch) in self.operations.iter().enumerate() {
            let selector = batch.chain_selector;
            let converter =
                converters.get(&selector).ok_or(McmsError::ConverterNotFound(selector))?;
            let metadata = self.metadata(selector)?;
            let predecessor = last_ids.get(&selector).copied().unwrap_or_default();

            let (converted, id) = converter
                .convert_batch_to_chain_operations(
                    metadata,
                    batch,
                    self.timelock_address(selector)?,
                    &metadata.mcm_address,
                    self.delay,
                    self.action,
                    predecessor,
                    salt,
                )
                .map_err(McmsError::operation(index, selector))?;
            debug!(index, chain_selector = %selector, %predecessor, operation_id = %id, "Converted batch");

            operations.extend(converted);
            predecessors.push(predecessor);
            operation_ids.push(id);
            last_ids.insert(selector, id);
        }

        Ok(ConvertedProposal { proposal: Proposal { base, operations }, predecessors, operation_ids })
    }

    /// Number of MCMS operations per chain once the proposal is converted.
    pub fn converted_operation_counts(&self) -> Result<BTreeMap<ChainSelector, u64>, McmsError> {
        let mut counts = self.transaction_counts();
        let converted = self.convert(&self.timelock_converters()?)?;
        for (selector, count) in converted.proposal.transaction_counts() {
            counts.insert(selector, count);
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimelockProposalBuilder;
    use alloy_primitives::{Address, address};
    use alloy_sol_types::SolCall;
    use mcms_contracts::IRBACTimelock;
    use mcms_primitives::Transaction;
    use mcms_sdk::evm::{TIMELOCK_CONTRACT_TYPE, hash_operation_batch};
    use serde_json::json;

    const VALID_UNTIL: u32 = 2004259681;
    const MCM: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
    const TIMELOCK: Address = address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512");

    fn batch(data: &[u8]) -> BatchOperation {
        BatchOperation {
            chain_selector: ChainSelector::GETH_TESTNET,
            transactions: vec![Transaction::new(
                "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
                data.to_vec(),
                json!({ "value": 0 }),
            )],
        }
    }

    fn proposal() -> TimelockProposal {
        TimelockProposalBuilder::new()
            .set_version("v1")
            .set_valid_until(VALID_UNTIL)
            .set_action(TimelockAction::Schedule)
            .set_delay(Delay::from_secs(3_600))
            .add_chain_metadata(ChainSelector::GETH_TESTNET, ChainMetadata::new(0, MCM.to_string()))
            .add_timelock_address(ChainSelector::GETH_TESTNET, TIMELOCK.to_string())
            .add_operation(batch(&[1]))
            .add_operation(batch(&[2]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_salt() {
        let proposal = proposal();
        let salt = proposal.salt();
        assert_eq!(&salt[..4], &VALID_UNTIL.to_be_bytes());
        assert!(salt[4..].iter().all(|b| *b == 0));

        let mut overridden = proposal;
        overridden.salt_override = Some(B256::repeat_byte(7));
        assert_eq!(overridden.salt(), B256::repeat_byte(7));
    }

    #[test]
    fn test_convert_chains_predecessors() {
        let proposal = proposal();
        let converted = proposal.convert(&proposal.timelock_converters().unwrap()).unwrap();

        assert_eq!(converted.proposal.kind, ProposalKind::Proposal);
        assert_eq!(converted.proposal.operations.len(), 2);
        assert_eq!(converted.predecessors[0], B256::ZERO);
        assert_eq!(converted.predecessors[1], converted.operation_ids[0]);

        let call = IRBACTimelock::scheduleBatchCall::abi_decode(
            &converted.proposal.operations[1].transaction.data,
        )
        .unwrap();
        assert_eq!(call.predecessor, converted.operation_ids[0]);
        assert_eq!(
            converted.operation_ids[1],
            hash_operation_batch(&call.calls, call.predecessor, proposal.salt())
        );

        for op in &converted.proposal.operations {
            assert_eq!(op.transaction.to, TIMELOCK.to_checksum(None));
            assert_eq!(op.transaction.metadata.contract_type, TIMELOCK_CONTRACT_TYPE);
        }
        assert_eq!(
            proposal.converted_operation_counts().unwrap(),
            BTreeMap::from([(ChainSelector::GETH_TESTNET, 2)])
        );
    }

    #[test]
    fn test_cancellation_keeps_operation_ids() {
        let proposal = proposal();
        let canceller = BTreeMap::from([(
            ChainSelector::GETH_TESTNET,
            ChainMetadata::new(3, "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0"),
        )]);
        let cancellation = proposal.derive_cancellation_proposal(&canceller).unwrap();

        assert_eq!(cancellation.action, TimelockAction::Cancel);
        assert_eq!(cancellation.salt(), proposal.salt());
        assert_eq!(cancellation.chain_metadata, canceller);
        assert!(cancellation.signatures.is_empty());
        assert!(cancellation.valid_until > unix_now().unwrap());

        let scheduled = proposal.convert(&proposal.timelock_converters().unwrap()).unwrap();
        let cancelled =
            cancellation.convert(&cancellation.timelock_converters().unwrap()).unwrap();
        assert_eq!(scheduled.operation_ids, cancelled.operation_ids);
        assert_ne!(
            scheduled.proposal.operations[0].transaction.data,
            cancelled.proposal.operations[0].transaction.data
        );
    }

    #[test]
    fn test_derive_requires_schedule() {
        let proposal = proposal();
        let metadata = proposal.chain_metadata.clone();
        let bypass = proposal.derive_bypass_proposal(&metadata).unwrap();
        assert_eq!(bypass.action, TimelockAction::Bypass);

        assert!(matches!(
            bypass.derive_cancellation_proposal(&metadata),
            Err(McmsError::NotScheduleAction {
                action: TimelockAction::Bypass,
                derived: TimelockAction::Cancel
            })
        ));
        assert!(matches!(
            proposal.derive_cancellation_proposal(&BTreeMap::new()),
            Err(McmsError::ReplacementMetadataNotFound(ChainSelector::GETH_TESTNET))
        ));
    }

    #[test]
    fn test_validate_batches() {
        let mut empty = proposal();
        empty.operations[1].transactions.clear();
        assert!(matches!(
            empty.validate(),
            Err(McmsError::NoTransactionsInBatch { index: 1, .. })
        ));

        let mut no_timelock = proposal();
        no_timelock.timelock_addresses.clear();
        assert!(matches!(
            no_timelock.validate(),
            Err(McmsError::TimelockAddressNotFound(ChainSelector::GETH_TESTNET))
        ));

        let mut wrong_kind = proposal();
        wrong_kind.kind = ProposalKind::Proposal;
        assert!(matches!(wrong_kind.validate(), Err(McmsError::InvalidProposalKind { .. })));
    }

    #[test]
    fn test_json_round_trip() {
        let proposal = proposal();
        let mut buf = Vec::new();
        proposal.write_to(&mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["kind"], "TimelockProposal");
        assert_eq!(value["action"], "schedule");
        assert_eq!(value["delay"], "1h0m0s");
        assert!(value.get("salt").is_none());

        assert_eq!(TimelockProposal::from_reader(buf.as_slice()).unwrap(), proposal);
    }
}

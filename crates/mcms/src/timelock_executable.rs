//! Executing scheduled timelock batches once their delay has passed.

use crate::{
    McmsError, TimelockProposal,
    poll::{PollOptions, cancellable, poll_until},
    timelock_proposal::Converters,
};
use alloy_primitives::B256;
use mcms_primitives::{ChainSelector, TimelockAction, TransactionResult};
use mcms_sdk::{AdapterRegistry, TimelockExecutor};
use std::{collections::BTreeMap, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub type TimelockExecutors = BTreeMap<ChainSelector, Arc<dyn TimelockExecutor>>;

/// A scheduled timelock proposal whose batches can be executed after the delay.
pub struct TimelockExecutable {
    proposal: TimelockProposal,
    converters: Converters,
    predecessors: Vec<B256>,
    operation_ids: Vec<B256>,
    executors: TimelockExecutors,
    poll_options: PollOptions,
}

impl std::fmt::Debug for TimelockExecutable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelockExecutable")
            .field("operation_ids", &self.operation_ids)
            .field("predecessors", &self.predecessors)
            .field("poll_options", &self.poll_options)
            .finish_non_exhaustive()
    }
}

impl TimelockExecutable {
    /// Fails unless `proposal` schedules its batches.
    pub fn new(proposal: TimelockProposal, executors: TimelockExecutors) -> Result<Self, McmsError> {
        if proposal.action != TimelockAction::Schedule {
            return Err(McmsError::ExecutableRequiresSchedule(proposal.action));
        }

        let converters = proposal.timelock_converters()?;
        let converted = proposal.convert(&converters)?;

        Ok(Self {
            proposal,
            converters,
            predecessors: converted.predecessors,
            operation_ids: converted.operation_ids,
            executors,
            poll_options: PollOptions::default(),
        })
    }

    pub fn from_registry(
        proposal: TimelockProposal,
        registry: &AdapterRegistry,
    ) -> Result<Self, McmsError> {
        let executors = registry.timelock_executors(proposal.chain_selectors())?;
        Self::new(proposal, executors)
    }

    pub const fn with_poll_options(mut self, poll_options: PollOptions) -> Self {
        self.poll_options = poll_options;
        self
    }

    pub const fn proposal(&self) -> &TimelockProposal {
        &self.proposal
    }

    pub fn predecessors(&self) -> &[B256] {
        &self.predecessors
    }

    fn check_index(&self, index: usize) -> Result<(), McmsError> {
        let len = self.proposal.operations.len();
        if index >= len {
            return Err(McmsError::IndexOutOfRange { index, len });
        }
        Ok(())
    }

    fn executor(&self, selector: ChainSelector) -> Result<&Arc<dyn TimelockExecutor>, McmsError> {
        self.executors.get(&selector).ok_or(McmsError::ExecutorNotFound(selector))
    }

    /// Recomputes the timelock operation id of the batch at `index`.
    pub fn get_op_id(&self, index: usize) -> Result<B256, McmsError> {
        self.check_index(index)?;
        let batch = &self.proposal.operations[index];
        let selector = batch.chain_selector;
        let metadata = self.proposal.metadata(selector)?;
        let converter =
            self.converters.get(&selector).ok_or(McmsError::ConverterNotFound(selector))?;

        let (_, id) = converter
            .convert_batch_to_chain_operations(
                metadata,
                batch,
                self.proposal.timelock_address(selector)?,
                &metadata.mcm_address,
                self.proposal.delay,
                self.proposal.action,
                self.predecessors[index],
                self.proposal.salt(),
            )
            .map_err(McmsError::operation(index, selector))?;
        Ok(id)
    }

    /// Succeeds when every batch is ready for execution.
    ///
    /// Read only, safe to call repeatedly.
    pub async fn is_ready(&self, cancel: &CancellationToken) -> Result<(), McmsError> {
        for (index, batch) in self.proposal.operations.iter().enumerate() {
            let selector = batch.chain_selector;
            let timelock = self.proposal.timelock_address(selector)?;
            let id = self.operation_ids[index];
            let executor = self.executor(selector)?;

            let ready = cancellable(cancel, async {
                executor
                    .is_operation_ready(timelock, id)
                    .await
                    .map_err(McmsError::operation(index, selector))
            })
            .await?;
            debug!(index, chain_selector = %selector, operation_id = %id, ready, "Checked operation");

            if !ready {
                return Err(McmsError::OperationNotReady { index, chain_selector: selector });
            }
        }

        Ok(())
    }

    /// Polls [`Self::is_ready`] with backoff until every batch is ready.
    pub async fn wait_until_ready(&self, cancel: &CancellationToken) -> Result<(), McmsError> {
        poll_until("timelock readiness", &self.poll_options, cancel, || self.is_ready(cancel)).await
    }

    /// Executes the scheduled batch at `index` on its timelock.
    pub async fn execute(
        &self,
        index: usize,
        cancel: &CancellationToken,
    ) -> Result<TransactionResult, McmsError> {
        self.check_index(index)?;
        let batch = &self.proposal.operations[index];
        let selector = batch.chain_selector;
        let timelock = self.proposal.timelock_address(selector)?;
        let executor = self.executor(selector)?;
        let predecessor = self.predecessors[index];

        let result = cancellable(cancel, async {
            executor
                .execute(batch, timelock, predecessor, self.proposal.salt())
                .await
                .map_err(McmsError::operation(index, selector))
        })
        .await?;
        info!(index, chain_selector = %selector, tx_hash = %result.hash, "Executed timelock batch");

        Ok(result)
    }
}

//! Fluent builders for proposals.

use crate::{BaseProposal, McmsError, Proposal, TimelockProposal};
use mcms_primitives::{
    BatchOperation, ChainMetadata, ChainSelector, Delay, Operation, ProposalKind, Signature,
    TimelockAction,
};
use std::collections::BTreeMap;

/// Setters for the [`BaseProposal`] fields, shared by both builders.
macro_rules! base_setters {
    () => {
        pub fn set_version(mut self, version: impl Into<String>) -> Self {
            self.base.version = version.into();
            self
        }

        pub fn set_valid_until(mut self, valid_until: u32) -> Self {
            self.base.valid_until = valid_until;
            self
        }

        pub fn set_description(mut self, description: impl Into<String>) -> Self {
            self.base.description = description.into();
            self
        }

        pub fn set_override_previous_root(mut self, override_previous_root: bool) -> Self {
            self.base.override_previous_root = override_previous_root;
            self
        }

        pub fn add_signature(mut self, signature: Signature) -> Self {
            self.base.signatures.push(signature);
            self
        }

        pub fn add_chain_metadata(mut self, selector: ChainSelector, metadata: ChainMetadata) -> Self {
            self.base.chain_metadata.insert(selector, metadata);
            self
        }

        pub fn set_chain_metadata(
            mut self,
            metadata: BTreeMap<ChainSelector, ChainMetadata>,
        ) -> Self {
            self.base.chain_metadata = metadata;
            self
        }

        /// Hash EVM operations against the simulated backend chain id.
        pub fn use_simulated_backend(mut self, simulated: bool) -> Self {
            self.base.use_simulated_backend = simulated;
            self
        }
    };
}

/// Builds a [`Proposal`].
#[derive(Debug, Clone)]
pub struct ProposalBuilder {
    base: BaseProposal,
    operations: Vec<Operation>,
}

impl Default for ProposalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalBuilder {
    pub fn new() -> Self {
        Self { base: BaseProposal::new(ProposalKind::Proposal), operations: Vec::new() }
    }

    base_setters!();

    pub fn add_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn set_operations(mut self, operations: Vec<Operation>) -> Self {
        self.operations = operations;
        self
    }

    /// Builds and validates the proposal.
    pub fn build(self) -> Result<Proposal, McmsError> {
        let proposal = Proposal { base: self.base, operations: self.operations };
        proposal.validate()?;
        Ok(proposal)
    }
}

/// Builds a [`TimelockProposal`].
#[derive(Debug, Clone)]
pub struct TimelockProposalBuilder {
    base: BaseProposal,
    action: TimelockAction,
    delay: Delay,
    timelock_addresses: BTreeMap<ChainSelector, String>,
    operations: Vec<BatchOperation>,
}

impl Default for TimelockProposalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelockProposalBuilder {
    pub fn new() -> Self {
        Self {
            base: BaseProposal::new(ProposalKind::TimelockProposal),
            action: TimelockAction::Schedule,
            delay: Delay::ZERO,
            timelock_addresses: BTreeMap::new(),
            operations: Vec::new(),
        }
    }

    base_setters!();

    pub fn set_action(mut self, action: TimelockAction) -> Self {
        self.action = action;
        self
    }

    pub fn set_delay(mut self, delay: Delay) -> Self {
        self.delay = delay;
        self
    }

    pub fn add_timelock_address(mut self, selector: ChainSelector, address: impl Into<String>) -> Self {
        self.timelock_addresses.insert(selector, address.into());
        self
    }

    pub fn set_timelock_addresses(mut self, addresses: BTreeMap<ChainSelector, String>) -> Self {
        self.timelock_addresses = addresses;
        self
    }

    pub fn add_operation(mut self, operation: BatchOperation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn set_operations(mut self, operations: Vec<BatchOperation>) -> Self {
        self.operations = operations;
        self
    }

    /// Builds and validates the proposal.
    pub fn build(self) -> Result<TimelockProposal, McmsError> {
        let proposal = TimelockProposal {
            base: self.base,
            action: self.action,
            delay: self.delay,
            timelock_addresses: self.timelock_addresses,
            operations: self.operations,
            salt_override: None,
        };
        proposal.validate()?;
        Ok(proposal)
    }
}

use alloy_primitives::Address;
use mcms_merkle::MerkleError;
use mcms_primitives::{ChainSelector, ConfigError, ProposalKind, SignatureError, TimelockAction};
use mcms_sdk::SdkError;

/// Errors raised while building, signing and executing proposals.
#[derive(Debug, thiserror::Error)]
pub enum McmsError {
    #[error("invalid proposal kind: {provided}, value accepted is {accepted}")]
    InvalidProposalKind { provided: ProposalKind, accepted: ProposalKind },

    #[error("proposal version is required")]
    MissingVersion,

    #[error("invalid valid until: {0}")]
    InvalidValidUntil(u32),

    #[error("proposal has no chain metadata")]
    NoChainMetadata,

    #[error("proposal has no operations")]
    NoOperations,

    #[error("no transactions in batch {index} for chain {chain_selector}")]
    NoTransactionsInBatch { index: usize, chain_selector: ChainSelector },

    #[error("missing metadata for chain {0}")]
    ChainMetadataNotFound(ChainSelector),

    #[error("missing timelock address for chain {0}")]
    TimelockAddressNotFound(ChainSelector),

    #[error("encoder not provided for chain selector {0}")]
    EncoderNotFound(ChainSelector),

    #[error("inspectors not provided")]
    InspectorsNotProvided,

    #[error("inspector not found for chain {0}")]
    InspectorNotFound(ChainSelector),

    #[error("simulators not provided")]
    SimulatorsNotProvided,

    #[error("simulator not found for chain {0}")]
    SimulatorNotFound(ChainSelector),

    #[error("executor not found for chain {0}")]
    ExecutorNotFound(ChainSelector),

    #[error("unable to find converter for chain selector {0}")]
    ConverterNotFound(ChainSelector),

    #[error("inconsistent configs for chains {a} and {b}")]
    InconsistentConfigs { a: ChainSelector, b: ChainSelector },

    #[error("on-chain config of chain {0} does not match the expected config")]
    ConfigMismatch(ChainSelector),

    #[error("quorum not reached for chain {0}")]
    QuorumNotReached(ChainSelector),

    #[error(
        "invalid signature: received signature for address {0} is not a valid signer in the MCMS proposal"
    )]
    InvalidSignature(Address),

    #[error("duplicate signature from signer {0}")]
    DuplicateSignature(Address),

    #[error("failed to recover signature {index}: {source}")]
    SignatureRecovery {
        index: usize,
        #[source]
        source: SignatureError,
    },

    #[error("index out of range: {index} >= {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("nonce {0} does not fit in 32 bits")]
    NonceOverflow(u64),

    #[error("system time {0} does not fit in a 32-bit timestamp")]
    TimestampOverflow(u64),

    #[error("cannot derive a {derived} proposal from a {action} proposal, action must be schedule")]
    NotScheduleAction { action: TimelockAction, derived: TimelockAction },

    #[error("timelock executable requires a schedule proposal, got {0}")]
    ExecutableRequiresSchedule(TimelockAction),

    #[error("cannot replace chain metadata, missing metadata for chain {0}")]
    ReplacementMetadataNotFound(ChainSelector),

    #[error("operation {index} on chain {chain_selector} is not ready")]
    OperationNotReady { index: usize, chain_selector: ChainSelector },

    #[error("operations not ready after {attempts} attempts: {source}")]
    PollExhausted {
        attempts: usize,
        #[source]
        source: Box<Self>,
    },

    #[error("operation canceled")]
    Cancelled,

    #[error("merkle tree generation error: {0}")]
    Merkle(#[from] MerkleError),

    /// A chain adapter failed while serving one chain.
    #[error("chain {chain_selector}: {source}")]
    Chain {
        chain_selector: ChainSelector,
        #[source]
        source: SdkError,
    },

    /// A chain adapter failed while serving one operation of the proposal.
    #[error("operation {index} on chain {chain_selector}: {source}")]
    Operation {
        index: usize,
        chain_selector: ChainSelector,
        #[source]
        source: SdkError,
    },

    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl McmsError {
    pub(crate) fn chain(chain_selector: ChainSelector) -> impl FnOnce(SdkError) -> Self {
        move |source| Self::Chain { chain_selector, source }
    }

    pub(crate) fn operation(
        index: usize,
        chain_selector: ChainSelector,
    ) -> impl FnOnce(SdkError) -> Self {
        move |source| Self::Operation { index, chain_selector, source }
    }

    /// Whether the error comes from a cancelled token.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

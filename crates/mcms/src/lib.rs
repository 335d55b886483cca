//! Cross-chain MCMS proposals.
//!
//! A [`Proposal`] carries operations for several chains. Its operations and per-chain metadata
//! are committed to one merkle root that signers approve through [`Signable`]. Once quorum is
//! reached, [`Executable`] sets the root on each chain and executes the operations in op count
//! order.
//!
//! A [`TimelockProposal`] wraps batches of calls in timelock schedule, cancel or bypass calls.
//! It converts into a plain [`Proposal`], and scheduled batches are later executed through
//! [`TimelockExecutable`].

#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
pub use builder::{ProposalBuilder, TimelockProposalBuilder};

mod error;
pub use error::McmsError;

mod executable;
pub use executable::{Executable, Executors};

pub mod poll;
pub use poll::PollOptions;

mod proposal;
pub use proposal::{BaseProposal, Proposal, signing_hash};

mod signable;
pub use signable::{Inspectors, Signable, Simulators};

mod timelock_executable;
pub use timelock_executable::{TimelockExecutable, TimelockExecutors};

mod timelock_proposal;
pub use timelock_proposal::{
    ConvertedProposal, Converters, DEFAULT_VALID_UNTIL, TimelockProposal,
};

pub mod validation;

pub use mcms_primitives as primitives;
pub use mcms_sdk as sdk;
pub use tokio_util::sync::CancellationToken;

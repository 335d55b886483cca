//! MCMS primitive types.
//!
//! Chain-agnostic building blocks shared by the merkle builder, the chain adapters and the
//! proposal engine: chain selectors, the hierarchical quorum [`Config`], recoverable
//! [`Signature`]s and the operation/metadata records that proposals are made of.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod chain_selector;
pub use chain_selector::{ChainFamily, ChainSelector, ChainSelectorError};

pub mod config;
pub use config::{Config, ConfigError, FlatConfig, FlatSigner, MAX_GROUPS, MAX_SIGNERS};

pub mod operation;
pub use operation::{
    BatchOperation, ChainMetadata, Operation, OperationMetadata, Transaction, TransactionResult,
};

pub mod signature;
pub use signature::{Signature, SignatureError};

pub mod timelock;
pub use timelock::{Delay, DelayParseError, ProposalKind, TimelockAction};

pub use alloy_primitives::{Address, B256, Bytes, U256};

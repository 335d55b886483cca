//! Chain-family adapters for MCMS.
//!
//! The proposal engine only talks to chains through the capability traits in this crate
//! ([`Encoder`], [`Inspector`], [`Executor`], ...). Each supported family implements them over a
//! small client trait ([`evm::EvmClient`], [`aptos::AptosClient`]), and the
//! [`AdapterRegistry`] hands out the implementation matching a chain selector.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod aptos;
pub mod evm;

mod error;
pub use error::SdkError;

pub mod registry;
pub use registry::{
    AdapterRegistry, ChainClient, ChainEncoder, EncoderParams, timelock_converter,
    validate_additional_fields, validate_chain_metadata,
};

mod signer;
pub use signer::Signer;

mod traits;
pub use traits::{
    Configurer, Encoder, Executor, Inspector, Simulator, TimelockConverter, TimelockExecutor,
    TimelockInspector,
};

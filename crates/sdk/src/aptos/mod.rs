//! Aptos family: the `mcms` Move package.
//!
//! Leaves use fixed-width preimages rather than ABI encoding and entry function arguments are
//! BCS encoded. The chain is reached through the [`AptosClient`] boundary trait.

mod adapter;
pub use adapter::AptosAdapter;

mod address;
pub use address::AptosAddress;

mod client;
pub use client::{AptosClient, EntryFunctionCall};

mod encoder;
pub use encoder::{AptosEncoder, METADATA_DOMAIN_SEPARATOR, OP_DOMAIN_SEPARATOR};

mod executor;
pub use executor::AptosExecutor;

mod fields;
pub use fields::{
    AptosAdditionalFields, AptosChainMetadataFields, TimelockRole, role_from_action,
};

mod timelock;
pub use timelock::{AptosTimelockConverter, TIMELOCK_CONTRACT_TYPE, hash_operation_batch};

use serde::{Deserialize, Serialize};

/// Name of the package and module holding the MCMS entry functions.
pub const MCMS_MODULE: &str = "mcms";

/// Module holding the chunked staging entry functions.
pub const MCMS_EXECUTOR_MODULE: &str = "mcms_executor";

/// Largest payload sent in a single `execute` transaction.
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

/// Tuning of the Aptos adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AptosOptions {
    /// Payloads above this size are staged in chunks.
    pub chunk_size: usize,
    /// Role whose config `set_config` replaces.
    pub role: TimelockRole,
    /// Return the encoded `set_config` transaction instead of submitting it.
    pub skip_send: bool,
}

impl Default for AptosOptions {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, role: TimelockRole::Proposer, skip_send: false }
    }
}

/// Validates the `additionalFields` of an Aptos transaction.
pub fn validate_additional_fields(fields: &serde_json::Value) -> Result<(), crate::SdkError> {
    AptosAdditionalFields::from_json(fields).map(|_| ())
}

/// Validates the `additionalFields` of Aptos chain metadata.
pub fn validate_chain_metadata(fields: &serde_json::Value) -> Result<(), crate::SdkError> {
    AptosChainMetadataFields::from_json(fields).map(|_| ())
}

/// BCS encodes a single entry function argument.
pub(crate) fn bcs_arg<T: Serialize + ?Sized>(what: &'static str, value: &T) -> Result<Vec<u8>, crate::SdkError> {
    bcs::to_bytes(value).map_err(|err| crate::SdkError::encode(what, err))
}

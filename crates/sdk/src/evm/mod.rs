//! EVM family: the `ManyChainMultiSig` and `RBACTimelock` contracts.

mod adapter;
pub use adapter::EvmAdapter;

mod client;
pub use client::{AlloyEvmClient, EvmClient};

mod encoder;
pub use encoder::{
    EvmAdditionalFields, EvmEncoder, METADATA_DOMAIN_SEPARATOR, OP_DOMAIN_SEPARATOR,
    SIMULATED_CHAIN_ID,
};

mod executor;
pub use executor::EvmExecutor;

mod timelock;
pub use timelock::{EvmTimelockConverter, TIMELOCK_CONTRACT_TYPE, hash_operation_batch};

use crate::SdkError;
use alloy_primitives::Address;

pub(crate) fn parse_address(address: &str) -> Result<Address, SdkError> {
    address.parse().map_err(|err| SdkError::invalid_address(address, err))
}

/// Validates the `additionalFields` of an EVM transaction.
pub fn validate_additional_fields(fields: &serde_json::Value) -> Result<(), SdkError> {
    EvmAdditionalFields::from_json(fields).map(|_| ())
}

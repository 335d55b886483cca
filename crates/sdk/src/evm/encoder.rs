use super::parse_address;
use crate::{Encoder, SdkError};
use alloy_primitives::{B256, U256, aliases::U40, b256, keccak256};
use alloy_sol_types::SolValue;
use mcms_contracts::IManyChainMultiSig;
use mcms_primitives::{ChainMetadata, ChainSelector, Operation, Signature};
use serde_json::Value;
use std::str::FromStr;

/// `keccak256("MANY_CHAIN_MULTI_SIG_DOMAIN_SEPARATOR_OP")`
pub const OP_DOMAIN_SEPARATOR: B256 =
    b256!("0x08d275622006c4ca82d03f498e90163cafd53c663a48470c3b52ac8bfbd9f52c");

/// `keccak256("MANY_CHAIN_MULTI_SIG_DOMAIN_SEPARATOR_METADATA")`
pub const METADATA_DOMAIN_SEPARATOR: B256 =
    b256!("0xe6b82be989101b4eb519770114b997b97b3c8707515286748a871717f0e4ea1c");

/// Chain id reported by simulated backends.
pub const SIMULATED_CHAIN_ID: u64 = 1337;

const MAX_OP_COUNT: u64 = (1 << 40) - 1;

/// Family-specific fields of an EVM transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvmAdditionalFields {
    /// Native value sent with the call.
    pub value: U256,
}

impl EvmAdditionalFields {
    /// Parses `{"value": ...}`. A missing or null value is zero; numbers and decimal or hex
    /// strings are accepted.
    pub fn from_json(fields: &Value) -> Result<Self, SdkError> {
        let value = match fields {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map.get("value").unwrap_or(&Value::Null),
            other => {
                return Err(SdkError::InvalidAdditionalFields(format!(
                    "expected an object, got {other}"
                )));
            }
        };

        let value = match value {
            Value::Null => U256::ZERO,
            Value::Number(number) => number.as_u64().map(U256::from).ok_or_else(|| {
                SdkError::InvalidAdditionalFields(format!(
                    "value must be a non-negative integer, got {number}"
                ))
            })?,
            Value::String(s) => U256::from_str(s).map_err(|err| {
                SdkError::InvalidAdditionalFields(format!("invalid value {s:?}: {err}"))
            })?,
            other => {
                return Err(SdkError::InvalidAdditionalFields(format!(
                    "value must be a number or a string, got {other}"
                )));
            }
        };

        Ok(Self { value })
    }
}

/// Leaf encoder of the EVM `ManyChainMultiSig` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvmEncoder {
    pub chain_selector: ChainSelector,
    /// Number of operations the proposal carries for this chain.
    pub tx_count: u64,
    pub override_previous_root: bool,
    /// Use [`SIMULATED_CHAIN_ID`] instead of the selector's chain id.
    pub simulated: bool,
}

impl EvmEncoder {
    pub const fn new(
        chain_selector: ChainSelector,
        tx_count: u64,
        override_previous_root: bool,
        simulated: bool,
    ) -> Self {
        Self { chain_selector, tx_count, override_previous_root, simulated }
    }

    pub fn chain_id(&self) -> Result<u64, SdkError> {
        if self.simulated {
            return Ok(SIMULATED_CHAIN_ID);
        }
        Ok(self.chain_selector.evm_chain_id()?)
    }

    /// Builds the contract-level op executed at op count `nonce`.
    pub fn to_op(
        &self,
        nonce: u32,
        metadata: &ChainMetadata,
        op: &Operation,
    ) -> Result<IManyChainMultiSig::Op, SdkError> {
        let fields = EvmAdditionalFields::from_json(&op.transaction.additional_fields)?;

        Ok(IManyChainMultiSig::Op {
            chainId: U256::from(self.chain_id()?),
            multiSig: parse_address(&metadata.mcm_address)?,
            nonce: U40::from(nonce),
            to: parse_address(&op.transaction.to)?,
            value: fields.value,
            data: op.transaction.data.clone(),
        })
    }

    /// Builds the root metadata covering `[startingOpCount, startingOpCount + tx_count)`.
    pub fn to_root_metadata(
        &self,
        metadata: &ChainMetadata,
    ) -> Result<IManyChainMultiSig::RootMetadata, SdkError> {
        let pre = metadata.starting_op_count;
        let post = pre
            .checked_add(self.tx_count)
            .filter(|post| *post <= MAX_OP_COUNT)
            .ok_or_else(|| SdkError::OutOfRange(format!("post op count {pre} + {}", self.tx_count)))?;

        Ok(IManyChainMultiSig::RootMetadata {
            chainId: U256::from(self.chain_id()?),
            multiSig: parse_address(&metadata.mcm_address)?,
            preOpCount: U40::from(pre),
            postOpCount: U40::from(post),
            overridePreviousRoot: self.override_previous_root,
        })
    }
}

impl Encoder for EvmEncoder {
    fn hash_operation(
        &self,
        nonce: u32,
        metadata: &ChainMetadata,
        op: &Operation,
    ) -> Result<B256, SdkError> {
        let op = self.to_op(nonce, metadata, op)?;
        Ok(keccak256((OP_DOMAIN_SEPARATOR, op).abi_encode_params()))
    }

    fn hash_metadata(&self, metadata: &ChainMetadata) -> Result<B256, SdkError> {
        let metadata = self.to_root_metadata(metadata)?;
        Ok(keccak256((METADATA_DOMAIN_SEPARATOR, metadata).abi_encode_params()))
    }
}

/// Signature as expected by `setRoot`, with `V` in the 27/28 form.
pub(crate) fn to_contract_signature(signature: &Signature) -> IManyChainMultiSig::Signature {
    let v = if signature.v < 2 { signature.v + mcms_primitives::signature::V_OFFSET } else { signature.v };
    IManyChainMultiSig::Signature { v, r: signature.r, s: signature.s }
}

//! Operations, batches and per-chain metadata carried by proposals.

use crate::{ChainFamily, ChainSelector};
use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Observability metadata attached to a transaction. Not part of any hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationMetadata {
    #[serde(default)]
    pub contract_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A single call on a target chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Destination in the family's native address format.
    pub to: String,
    /// Opaque call payload.
    #[serde(default)]
    pub data: Bytes,
    /// Family-specific fields, e.g. the call value on EVM or the module and function on Aptos.
    #[serde(default)]
    pub additional_fields: Value,
    #[serde(flatten)]
    pub metadata: OperationMetadata,
}

impl Transaction {
    pub fn new(to: impl Into<String>, data: impl Into<Bytes>, additional_fields: Value) -> Self {
        Self { to: to.into(), data: data.into(), additional_fields, metadata: Default::default() }
    }

    pub fn with_contract_type(mut self, contract_type: impl Into<String>) -> Self {
        self.metadata.contract_type = contract_type.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// A transaction bound to the chain it runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub chain_selector: ChainSelector,
    pub transaction: Transaction,
}

/// Calls that are scheduled and executed atomically as one timelock operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOperation {
    pub chain_selector: ChainSelector,
    pub transactions: Vec<Transaction>,
}

/// Per-chain proposal metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainMetadata {
    /// Op count of the MCMS contract when the proposal was built.
    pub starting_op_count: u64,
    /// Address of the MCMS contract on the chain.
    pub mcm_address: String,
    /// Family-specific fields, e.g. the timelock role on Aptos.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub additional_fields: Value,
}

impl ChainMetadata {
    pub fn new(starting_op_count: u64, mcm_address: impl Into<String>) -> Self {
        Self { starting_op_count, mcm_address: mcm_address.into(), additional_fields: Value::Null }
    }

    pub fn with_additional_fields(mut self, additional_fields: Value) -> Self {
        self.additional_fields = additional_fields;
        self
    }
}

/// Outcome of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub hash: String,
    pub chain_family: ChainFamily,
    /// Family-specific raw receipt or response.
    #[serde(default)]
    pub raw_data: Value,
}

impl TransactionResult {
    pub fn new(hash: impl Into<String>, chain_family: ChainFamily) -> Self {
        Self { hash: hash.into(), chain_family, raw_data: Value::Null }
    }

    pub fn with_raw_data(mut self, raw_data: Value) -> Self {
        self.raw_data = raw_data;
        self
    }
}

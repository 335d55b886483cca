use alloy_primitives::{Bytes, FixedBytes};
use mcms_contracts::ManyChainMultiSigError;
use mcms_primitives::{ChainFamily, ChainSelector, ChainSelectorError, ConfigError, SignatureError};

/// Errors raised by the chain-family adapters.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("unsupported chain family {family} for selector {selector}")]
    UnsupportedChainFamily { selector: ChainSelector, family: ChainFamily },

    #[error("missing client for selector {0}")]
    MissingClient(ChainSelector),

    #[error(transparent)]
    ChainSelector(#[from] ChainSelectorError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("invalid additional fields: {0}")]
    InvalidAdditionalFields(String),

    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid timelock role: {0}")]
    InvalidRole(u8),

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    #[error("failed to encode {what}: {reason}")]
    Encode { what: &'static str, reason: String },

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("transaction {0} failed on chain")]
    TransactionFailed(String),

    /// The call reverted and the revert data could be attributed.
    #[error("execution reverted with {name} (selector {selector})")]
    Reverted { selector: FixedBytes<4>, name: String, data: Bytes },

    /// A chunk of a large payload could not be submitted. Chunks before `index` stay staged.
    #[error("{stage} data chunk {index} of {total} failed: {source}")]
    Chunk {
        stage: &'static str,
        index: usize,
        total: usize,
        #[source]
        source: Box<Self>,
    },

    #[error("{0} is not supported by this chain family")]
    Unsupported(&'static str),
}

impl SdkError {
    pub(crate) fn decode(what: &'static str, reason: impl ToString) -> Self {
        Self::Decode { what, reason: reason.to_string() }
    }

    pub(crate) fn encode(what: &'static str, reason: impl ToString) -> Self {
        Self::Encode { what, reason: reason.to_string() }
    }

    pub(crate) fn invalid_address(address: &str, reason: impl ToString) -> Self {
        Self::InvalidAddress { address: address.to_string(), reason: reason.to_string() }
    }

    /// Attributes EVM revert data to a contract error where possible.
    ///
    /// `CallReverted(bytes)` is unwrapped one level so the reason of the inner call is reported.
    pub fn from_revert_data(data: Bytes) -> Self {
        if data.len() < 4 {
            return Self::Rpc(format!("execution reverted with data {data}"));
        }

        let selector = FixedBytes::<4>::from_slice(&data[..4]);
        let name = match <ManyChainMultiSigError as alloy_sol_types::SolInterface>::abi_decode(&data) {
            Ok(ManyChainMultiSigError::CallReverted(inner)) => {
                match alloy_sol_types::decode_revert_reason(&inner.error) {
                    Some(reason) => format!("CallReverted({reason})"),
                    None => format!("CallReverted({})", inner.error),
                }
            }
            Ok(err) => error_name(&err),
            Err(_) => alloy_sol_types::decode_revert_reason(&data)
                .unwrap_or_else(|| "unknown error".to_string()),
        };

        Self::Reverted { selector, name, data }
    }
}

/// Variant name of a decoded contract error.
fn error_name(err: &ManyChainMultiSigError) -> String {
    let debug = format!("{err:?}");
    debug.split(['(', ' ', '{']).next().unwrap_or_default().to_string()
}

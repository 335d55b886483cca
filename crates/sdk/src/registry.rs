//! Closed registry mapping chain selectors to family adapters.

use crate::{
    Configurer, Encoder, Executor, Inspector, SdkError, Simulator, TimelockConverter,
    TimelockExecutor, TimelockInspector,
    aptos::{
        self, AptosAdapter, AptosClient, AptosEncoder, AptosExecutor, AptosOptions,
        AptosTimelockConverter,
    },
    evm::{self, EvmAdapter, EvmClient, EvmEncoder, EvmExecutor, EvmTimelockConverter},
};
use alloy_primitives::B256;
use mcms_primitives::{ChainFamily, ChainMetadata, ChainSelector, Operation};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, sync::Arc};

/// Per-chain inputs of an encoder, derived from a proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderParams {
    /// Number of operations the proposal carries for the chain.
    pub tx_count: u64,
    pub override_previous_root: bool,
    pub simulated: bool,
}

fn unsupported(selector: ChainSelector, family: ChainFamily) -> SdkError {
    SdkError::UnsupportedChainFamily { selector, family }
}

/// Encoder of any supported family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEncoder {
    Evm(EvmEncoder),
    Aptos(AptosEncoder),
}

impl ChainEncoder {
    pub fn new(selector: ChainSelector, params: EncoderParams) -> Result<Self, SdkError> {
        match selector.family()? {
            ChainFamily::Evm => Ok(Self::Evm(EvmEncoder::new(
                selector,
                params.tx_count,
                params.override_previous_root,
                params.simulated,
            ))),
            ChainFamily::Aptos => Ok(Self::Aptos(AptosEncoder::new(
                selector,
                params.tx_count,
                params.override_previous_root,
            ))),
            family @ (ChainFamily::Solana | ChainFamily::Sui) => Err(unsupported(selector, family)),
        }
    }
}

impl Encoder for ChainEncoder {
    fn hash_operation(
        &self,
        nonce: u32,
        metadata: &ChainMetadata,
        op: &Operation,
    ) -> Result<B256, SdkError> {
        match self {
            Self::Evm(encoder) => encoder.hash_operation(nonce, metadata, op),
            Self::Aptos(encoder) => encoder.hash_operation(nonce, metadata, op),
        }
    }

    fn hash_metadata(&self, metadata: &ChainMetadata) -> Result<B256, SdkError> {
        match self {
            Self::Evm(encoder) => encoder.hash_metadata(metadata),
            Self::Aptos(encoder) => encoder.hash_metadata(metadata),
        }
    }
}

/// Chain client of any supported family.
#[derive(Clone)]
pub enum ChainClient {
    Evm(Arc<dyn EvmClient>),
    Aptos(Arc<dyn AptosClient>),
}

impl ChainClient {
    pub const fn family(&self) -> ChainFamily {
        match self {
            Self::Evm(_) => ChainFamily::Evm,
            Self::Aptos(_) => ChainFamily::Aptos,
        }
    }
}

impl fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ChainClient").field(&self.family()).finish()
    }
}

/// Builds the capability objects of each chain from its registered client.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    clients: BTreeMap<ChainSelector, ChainClient>,
    aptos_options: AptosOptions,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aptos_options(mut self, options: AptosOptions) -> Self {
        self.aptos_options = options;
        self
    }

    /// Registers a client, checking that it matches the selector's family.
    pub fn with_client(mut self, selector: ChainSelector, client: ChainClient) -> Result<Self, SdkError> {
        let family = selector.family()?;
        if family != client.family() {
            return Err(unsupported(selector, family));
        }
        self.clients.insert(selector, client);
        Ok(self)
    }

    pub fn with_evm_client(
        self,
        selector: ChainSelector,
        client: Arc<dyn EvmClient>,
    ) -> Result<Self, SdkError> {
        self.with_client(selector, ChainClient::Evm(client))
    }

    pub fn with_aptos_client(
        self,
        selector: ChainSelector,
        client: Arc<dyn AptosClient>,
    ) -> Result<Self, SdkError> {
        self.with_client(selector, ChainClient::Aptos(client))
    }

    /// Selectors with a registered client, ascending.
    pub fn selectors(&self) -> impl Iterator<Item = ChainSelector> + '_ {
        self.clients.keys().copied()
    }

    fn client(&self, selector: ChainSelector) -> Result<&ChainClient, SdkError> {
        let family = selector.family()?;
        if matches!(family, ChainFamily::Solana | ChainFamily::Sui) {
            return Err(unsupported(selector, family));
        }
        self.clients.get(&selector).ok_or(SdkError::MissingClient(selector))
    }

    fn evm_adapter(client: &Arc<dyn EvmClient>) -> EvmAdapter {
        EvmAdapter::new(Arc::clone(client))
    }

    fn aptos_adapter(&self, client: &Arc<dyn AptosClient>) -> AptosAdapter {
        AptosAdapter::new(Arc::clone(client), self.aptos_options)
    }

    pub fn inspector(&self, selector: ChainSelector) -> Result<Arc<dyn Inspector>, SdkError> {
        Ok(match self.client(selector)? {
            ChainClient::Evm(client) => Arc::new(Self::evm_adapter(client)),
            ChainClient::Aptos(client) => Arc::new(self.aptos_adapter(client)),
        })
    }

    /// Executor bound to `encoder`, which must be the encoder the proposal was hashed with.
    pub fn executor(
        &self,
        selector: ChainSelector,
        encoder: &ChainEncoder,
    ) -> Result<Arc<dyn Executor>, SdkError> {
        Ok(match (self.client(selector)?, encoder) {
            (ChainClient::Evm(client), ChainEncoder::Evm(encoder)) => {
                Arc::new(EvmExecutor::new(Self::evm_adapter(client), *encoder))
            }
            (ChainClient::Aptos(client), ChainEncoder::Aptos(encoder)) => {
                Arc::new(AptosExecutor::new(self.aptos_adapter(client), *encoder))
            }
            (client, _) => return Err(unsupported(selector, client.family())),
        })
    }

    pub fn simulator(
        &self,
        selector: ChainSelector,
        encoder: &ChainEncoder,
    ) -> Result<Arc<dyn Simulator>, SdkError> {
        match (self.client(selector)?, encoder) {
            (ChainClient::Evm(client), ChainEncoder::Evm(encoder)) => {
                Ok(Arc::new(EvmExecutor::new(Self::evm_adapter(client), *encoder)))
            }
            (ChainClient::Aptos(_), _) => Err(SdkError::Unsupported("simulation")),
            (client, _) => Err(unsupported(selector, client.family())),
        }
    }

    pub fn configurer(&self, selector: ChainSelector) -> Result<Arc<dyn Configurer>, SdkError> {
        Ok(match self.client(selector)? {
            ChainClient::Evm(client) => Arc::new(Self::evm_adapter(client)),
            ChainClient::Aptos(client) => Arc::new(self.aptos_adapter(client)),
        })
    }

    pub fn timelock_inspector(
        &self,
        selector: ChainSelector,
    ) -> Result<Arc<dyn TimelockInspector>, SdkError> {
        Ok(match self.client(selector)? {
            ChainClient::Evm(client) => Arc::new(Self::evm_adapter(client)),
            ChainClient::Aptos(client) => Arc::new(self.aptos_adapter(client)),
        })
    }

    pub fn timelock_executor(
        &self,
        selector: ChainSelector,
    ) -> Result<Arc<dyn TimelockExecutor>, SdkError> {
        Ok(match self.client(selector)? {
            ChainClient::Evm(client) => Arc::new(Self::evm_adapter(client)),
            ChainClient::Aptos(client) => Arc::new(self.aptos_adapter(client)),
        })
    }

    /// Converters need no client and are available for every supported family.
    pub fn timelock_converter(
        &self,
        selector: ChainSelector,
    ) -> Result<Arc<dyn TimelockConverter>, SdkError> {
        timelock_converter(selector)
    }

    /// Inspectors for every selector in `selectors`.
    pub fn inspectors(
        &self,
        selectors: impl IntoIterator<Item = ChainSelector>,
    ) -> Result<BTreeMap<ChainSelector, Arc<dyn Inspector>>, SdkError> {
        selectors.into_iter().map(|selector| Ok((selector, self.inspector(selector)?))).collect()
    }

    /// Executors for every encoder, keyed by selector.
    pub fn executors(
        &self,
        encoders: &BTreeMap<ChainSelector, ChainEncoder>,
    ) -> Result<BTreeMap<ChainSelector, Arc<dyn Executor>>, SdkError> {
        encoders
            .iter()
            .map(|(selector, encoder)| Ok((*selector, self.executor(*selector, encoder)?)))
            .collect()
    }

    pub fn timelock_executors(
        &self,
        selectors: impl IntoIterator<Item = ChainSelector>,
    ) -> Result<BTreeMap<ChainSelector, Arc<dyn TimelockExecutor>>, SdkError> {
        selectors
            .into_iter()
            .map(|selector| Ok((selector, self.timelock_executor(selector)?)))
            .collect()
    }
}

/// Timelock converter of the selector's family.
pub fn timelock_converter(selector: ChainSelector) -> Result<Arc<dyn TimelockConverter>, SdkError> {
    match selector.family()? {
        ChainFamily::Evm => Ok(Arc::new(EvmTimelockConverter)),
        ChainFamily::Aptos => Ok(Arc::new(AptosTimelockConverter)),
        family => Err(unsupported(selector, family)),
    }
}

/// Validates the family-specific `additionalFields` of a transaction.
///
/// Solana and Sui have no registered schema and are accepted as is.
pub fn validate_additional_fields(selector: ChainSelector, fields: &Value) -> Result<(), SdkError> {
    match selector.family()? {
        ChainFamily::Evm => evm::validate_additional_fields(fields),
        ChainFamily::Aptos => aptos::validate_additional_fields(fields),
        ChainFamily::Solana | ChainFamily::Sui => Ok(()),
    }
}

/// Validates the family-specific `additionalFields` of chain metadata.
///
/// Aptos metadata may omit the fields; when present they must carry a valid role.
pub fn validate_chain_metadata(selector: ChainSelector, metadata: &ChainMetadata) -> Result<(), SdkError> {
    match selector.family()? {
        ChainFamily::Aptos if !metadata.additional_fields.is_null() => {
            aptos::validate_chain_metadata(&metadata.additional_fields)
        }
        _ => Ok(()),
    }
}

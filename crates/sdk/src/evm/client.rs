use crate::SdkError;
use alloy::{providers::Provider, rpc::types::TransactionRequest, transports::TransportError};
use alloy_primitives::{Address, B256, Bytes, U256};
use tracing::{debug, info};

/// Minimal EVM access needed by the adapter.
#[async_trait::async_trait]
pub trait EvmClient: Send + Sync {
    /// Executes a read-only call and returns the output.
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, SdkError>;

    /// Submits a transaction, waits for its receipt and returns its hash.
    async fn send(&self, to: Address, input: Bytes, value: U256) -> Result<B256, SdkError>;
}

/// [`EvmClient`] backed by an alloy provider.
///
/// Sending requires the provider to carry a wallet filler.
#[derive(Debug, Clone)]
pub struct AlloyEvmClient<P> {
    provider: P,
}

impl<P> AlloyEvmClient<P> {
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait::async_trait]
impl<P> EvmClient for AlloyEvmClient<P>
where
    P: Provider + Send + Sync,
{
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, SdkError> {
        let tx = TransactionRequest::default().to(to).input(input.into());
        self.provider.call(tx).await.map_err(rpc_error)
    }

    async fn send(&self, to: Address, input: Bytes, value: U256) -> Result<B256, SdkError> {
        let tx = TransactionRequest::default().to(to).input(input.into()).value(value);

        debug!(%to, %value, "Sending transaction");
        let pending = self.provider.send_transaction(tx).await.map_err(rpc_error)?;
        let receipt = pending.get_receipt().await.map_err(|err| SdkError::Rpc(err.to_string()))?;

        if !receipt.status() {
            return Err(SdkError::TransactionFailed(receipt.transaction_hash.to_string()));
        }

        info!(tx_hash = %receipt.transaction_hash, %to, "Transaction confirmed");
        Ok(receipt.transaction_hash)
    }
}

fn rpc_error(err: TransportError) -> SdkError {
    match err.as_error_resp().and_then(|payload| payload.as_revert_data()) {
        Some(data) => SdkError::from_revert_data(data),
        None => SdkError::Rpc(err.to_string()),
    }
}

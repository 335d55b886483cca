use super::AptosAddress;
use crate::SdkError;
use serde_json::Value;

/// Entry function call with BCS encoded arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFunctionCall {
    pub module_address: AptosAddress,
    pub module_name: String,
    pub function: String,
    pub args: Vec<Vec<u8>>,
}

impl EntryFunctionCall {
    pub fn new(
        module_address: AptosAddress,
        module_name: impl Into<String>,
        function: impl Into<String>,
        args: Vec<Vec<u8>>,
    ) -> Self {
        Self { module_address, module_name: module_name.into(), function: function.into(), args }
    }

    /// Fully qualified `address::module::function` name.
    pub fn function_id(&self) -> String {
        format!("{}::{}::{}", self.module_address, self.module_name, self.function)
    }
}

/// Minimal Aptos node access needed by the adapter.
#[async_trait::async_trait]
pub trait AptosClient: Send + Sync {
    /// Account that signs submitted transactions.
    fn sender(&self) -> AptosAddress;

    async fn sequence_number(&self, account: AptosAddress) -> Result<u64, SdkError>;

    /// Calls a view function given as `address::module::function`.
    ///
    /// Arguments and results use the node's JSON encoding: `u64` as decimal strings and
    /// `vector<u8>` as hex strings.
    async fn view(&self, function: &str, args: Vec<Value>) -> Result<Vec<Value>, SdkError>;

    /// Signs and submits an entry function call and returns the transaction hash.
    ///
    /// An explicit sequence number lets callers submit several transactions without waiting
    /// for each to be confirmed.
    async fn submit(
        &self,
        call: EntryFunctionCall,
        sequence_number: Option<u64>,
    ) -> Result<String, SdkError>;
}

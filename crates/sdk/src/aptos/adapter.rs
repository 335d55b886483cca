use super::{
    AptosAdditionalFields, AptosAddress, AptosClient, AptosOptions, EntryFunctionCall, MCMS_MODULE,
    bcs_arg, timelock::BatchCalls,
};
use crate::{Configurer, Inspector, SdkError, TimelockExecutor, TimelockInspector};
use alloy_primitives::{Address, B256};
use mcms_primitives::{
    BatchOperation, ChainFamily, ChainMetadata, Config, FlatConfig, FlatSigner, MAX_GROUPS,
    Transaction, TransactionResult,
};
use serde_json::{Value, json};
use std::{fmt, sync::Arc};
use tracing::{debug, info};

/// Reads and configures the Aptos `mcms` module through an [`AptosClient`].
///
/// The timelock lives inside the MCMS package, so timelock addresses are MCMS addresses.
#[derive(Clone)]
pub struct AptosAdapter {
    client: Arc<dyn AptosClient>,
    options: AptosOptions,
}

impl fmt::Debug for AptosAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AptosAdapter").field("options", &self.options).finish_non_exhaustive()
    }
}

impl AptosAdapter {
    pub fn new(client: Arc<dyn AptosClient>, options: AptosOptions) -> Self {
        Self { client, options }
    }

    pub fn client(&self) -> &Arc<dyn AptosClient> {
        &self.client
    }

    pub const fn options(&self) -> &AptosOptions {
        &self.options
    }

    pub(crate) async fn view(
        &self,
        mcm: &str,
        function: &str,
        args: Vec<Value>,
    ) -> Result<Vec<Value>, SdkError> {
        let mcm: AptosAddress = mcm.parse()?;
        let function = format!("{mcm}::{MCMS_MODULE}::{function}");
        debug!(%function, "Calling view function");
        self.client.view(&function, args).await
    }

    pub(crate) async fn submit(
        &self,
        call: EntryFunctionCall,
        sequence_number: Option<u64>,
    ) -> Result<TransactionResult, SdkError> {
        let function = call.function_id();
        let hash = self.client.submit(call, sequence_number).await?;
        info!(%function, tx_hash = %hash, "Submitted Aptos transaction");
        Ok(TransactionResult::new(hash, ChainFamily::Aptos))
    }

    async fn view_bool(&self, mcm: &str, function: &str, id: B256) -> Result<bool, SdkError> {
        let result = self.view(mcm, function, vec![json!(id.to_string())]).await?;
        first(&result, function)?
            .as_bool()
            .ok_or_else(|| SdkError::decode("view result", format!("{function} did not return a bool")))
    }
}

fn first<'a>(values: &'a [Value], function: &str) -> Result<&'a Value, SdkError> {
    values
        .first()
        .ok_or_else(|| SdkError::decode("view result", format!("{function} returned no values")))
}

/// Reads a JSON integer encoded either as a number or as a decimal string.
pub(crate) fn json_u64(value: &Value, what: &'static str) -> Result<u64, SdkError> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| SdkError::decode(what, format!("expected an unsigned integer, got {value}")))
}

fn json_u8(value: &Value, what: &'static str) -> Result<u8, SdkError> {
    u8::try_from(json_u64(value, what)?).map_err(|err| SdkError::decode(what, err))
}

/// Reads a `vector<u8>` encoded as a hex string.
pub(crate) fn json_bytes(value: &Value, what: &'static str) -> Result<Vec<u8>, SdkError> {
    let s = value
        .as_str()
        .ok_or_else(|| SdkError::decode(what, format!("expected a hex string, got {value}")))?;
    const_hex::decode(s).map_err(|err| SdkError::decode(what, err))
}

fn json_fixed<const N: usize>(value: &Value, what: &'static str) -> Result<[u8; N], SdkError> {
    let bytes = json_bytes(value, what)?;
    <[u8; N]>::try_from(bytes.as_slice())
        .map_err(|_| SdkError::decode(what, format!("expected {N} bytes, got {}", bytes.len())))
}

fn field<'a>(value: &'a Value, key: &str, what: &'static str) -> Result<&'a Value, SdkError> {
    value.get(key).ok_or_else(|| SdkError::decode(what, format!("missing field {key}")))
}

/// Decodes the JSON form of the Move `Config` struct.
fn decode_config(value: &Value) -> Result<FlatConfig, SdkError> {
    let signers = field(value, "signers", "config")?
        .as_array()
        .ok_or_else(|| SdkError::decode("config", "signers is not an array"))?
        .iter()
        .map(|signer| {
            let addr = json_fixed::<20>(field(signer, "addr", "signer")?, "signer address")?;
            Ok(FlatSigner {
                address: Address::from(addr),
                index: json_u8(field(signer, "index", "signer")?, "signer index")?,
                group: json_u8(field(signer, "group", "signer")?, "signer group")?,
            })
        })
        .collect::<Result<Vec<_>, SdkError>>()?;

    Ok(FlatConfig {
        signers,
        group_quorums: json_fixed::<MAX_GROUPS>(field(value, "group_quorums", "config")?, "group quorums")?,
        group_parents: json_fixed::<MAX_GROUPS>(field(value, "group_parents", "config")?, "group parents")?,
    })
}

#[async_trait::async_trait]
impl Inspector for AptosAdapter {
    async fn get_config(&self, mcm: &str) -> Result<Config, SdkError> {
        let result = self.view(mcm, "get_config", vec![]).await?;
        Ok(decode_config(first(&result, "get_config")?)?.to_config()?)
    }

    async fn get_op_count(&self, mcm: &str) -> Result<u64, SdkError> {
        let result = self.view(mcm, "get_op_count", vec![]).await?;
        json_u64(first(&result, "get_op_count")?, "op count")
    }

    async fn get_root(&self, mcm: &str) -> Result<(B256, u32), SdkError> {
        let result = self.view(mcm, "get_root", vec![]).await?;
        let [root, valid_until] = result.as_slice() else {
            return Err(SdkError::decode("root", format!("expected 2 values, got {}", result.len())));
        };

        let valid_until = u32::try_from(json_u64(valid_until, "valid until")?)
            .map_err(|err| SdkError::decode("valid until", err))?;
        Ok((B256::from(json_fixed::<32>(root, "root")?), valid_until))
    }

    async fn get_root_metadata(&self, mcm: &str) -> Result<ChainMetadata, SdkError> {
        let result = self.view(mcm, "get_root_metadata", vec![]).await?;
        let metadata = first(&result, "get_root_metadata")?;

        let multisig = field(metadata, "multisig", "root metadata")?
            .as_str()
            .ok_or_else(|| SdkError::decode("root metadata", "multisig is not a string"))?
            .parse::<AptosAddress>()?;
        let pre = json_u64(field(metadata, "pre_op_count", "root metadata")?, "pre op count")?;

        Ok(ChainMetadata::new(pre, multisig.to_string()))
    }
}

#[async_trait::async_trait]
impl Configurer for AptosAdapter {
    async fn set_config(
        &self,
        mcm: &str,
        config: &Config,
        clear_root: bool,
    ) -> Result<TransactionResult, SdkError> {
        let mcm_address: AptosAddress = mcm.parse()?;
        let flat = config.to_flat()?;

        let signers: Vec<Vec<u8>> = flat.signers.iter().map(|s| s.address.to_vec()).collect();
        let groups: Vec<u8> = flat.signers.iter().map(|s| s.group).collect();
        let args = vec![
            bcs_arg("role", &self.options.role.byte())?,
            bcs_arg("signer addresses", &signers)?,
            bcs_arg("signer groups", &groups)?,
            bcs_arg("group quorums", &flat.group_quorums.to_vec())?,
            bcs_arg("group parents", &flat.group_parents.to_vec())?,
            bcs_arg("clear root", &clear_root)?,
        ];
        let call = EntryFunctionCall::new(mcm_address, MCMS_MODULE, "set_config", args);

        if self.options.skip_send {
            let transaction = Transaction::new(
                mcm_address.to_string(),
                call.args.concat(),
                AptosAdditionalFields::new(MCMS_MODULE, MCMS_MODULE, "set_config").to_json(),
            );
            let raw = serde_json::to_value(&transaction)
                .map_err(|err| SdkError::encode("set_config transaction", err))?;
            return Ok(TransactionResult::new("", ChainFamily::Aptos).with_raw_data(raw));
        }

        let result = self.submit(call, None).await?;
        info!(%mcm, role = %self.options.role, signers = flat.signers.len(), clear_root, "Set MCMS config");
        Ok(result)
    }
}

#[async_trait::async_trait]
impl TimelockInspector for AptosAdapter {
    async fn get_proposers(&self, _timelock: &str) -> Result<Vec<String>, SdkError> {
        Ok(Vec::new())
    }

    async fn get_executors(&self, _timelock: &str) -> Result<Vec<String>, SdkError> {
        Ok(Vec::new())
    }

    async fn get_bypassers(&self, _timelock: &str) -> Result<Vec<String>, SdkError> {
        Ok(Vec::new())
    }

    async fn get_cancellers(&self, _timelock: &str) -> Result<Vec<String>, SdkError> {
        Ok(Vec::new())
    }

    async fn is_operation(&self, timelock: &str, id: B256) -> Result<bool, SdkError> {
        self.view_bool(timelock, "timelock_is_operation", id).await
    }

    async fn is_operation_pending(&self, timelock: &str, id: B256) -> Result<bool, SdkError> {
        self.view_bool(timelock, "timelock_is_operation_pending", id).await
    }

    async fn is_operation_ready(&self, timelock: &str, id: B256) -> Result<bool, SdkError> {
        self.view_bool(timelock, "timelock_is_operation_ready", id).await
    }

    async fn is_operation_done(&self, timelock: &str, id: B256) -> Result<bool, SdkError> {
        self.view_bool(timelock, "timelock_is_operation_done", id).await
    }
}

#[async_trait::async_trait]
impl TimelockExecutor for AptosAdapter {
    async fn execute(
        &self,
        batch: &BatchOperation,
        timelock_address: &str,
        predecessor: B256,
        salt: B256,
    ) -> Result<TransactionResult, SdkError> {
        let mcm: AptosAddress = timelock_address.parse()?;
        let calls = BatchCalls::from_batch(batch)?;

        let mut args = calls.encode_args()?;
        args.push(bcs_arg("predecessor", &predecessor.to_vec())?);
        args.push(bcs_arg("salt", &salt.to_vec())?);

        let call = EntryFunctionCall::new(mcm, MCMS_MODULE, "timelock_execute_batch", args);
        self.submit(call, None).await
    }
}

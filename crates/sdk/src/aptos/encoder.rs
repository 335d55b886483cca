use super::{AptosAdditionalFields, AptosAddress};
use crate::{Encoder, SdkError};
use alloy_primitives::{B256, b256, keccak256};
use mcms_primitives::{ChainMetadata, ChainSelector, Operation};

/// `keccak256("MANY_CHAIN_MULTI_SIG_DOMAIN_SEPARATOR_OP_APTOS")`
pub const OP_DOMAIN_SEPARATOR: B256 =
    b256!("0xe5a6d1256b00d7ec22512b6b60a3f4d75c559745d2dbf309f77b8b756caabe14");

/// `keccak256("MANY_CHAIN_MULTI_SIG_DOMAIN_SEPARATOR_METADATA_APTOS")`
pub const METADATA_DOMAIN_SEPARATOR: B256 =
    b256!("0xa71d47b6c00b64ee21af96a1d424cb2dcbbed12becdcd3b4e6c7fc4c2f80a697");

/// Leaf encoder of the Aptos `mcms` module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AptosEncoder {
    pub chain_selector: ChainSelector,
    pub tx_count: u64,
    pub override_previous_root: bool,
}

/// Appends `bytes` left-padded with zeros to `width`.
fn put_left_padded(out: &mut Vec<u8>, bytes: &[u8], width: usize) {
    out.extend(std::iter::repeat_n(0u8, width.saturating_sub(bytes.len())));
    out.extend_from_slice(bytes);
}

impl AptosEncoder {
    pub const fn new(chain_selector: ChainSelector, tx_count: u64, override_previous_root: bool) -> Self {
        Self { chain_selector, tx_count, override_previous_root }
    }

    pub fn chain_id(&self) -> Result<u64, SdkError> {
        Ok(self.chain_selector.aptos_chain_id()?)
    }

    /// Preimage of the operation leaf at op count `nonce`.
    pub fn operation_preimage(
        &self,
        nonce: u32,
        metadata: &ChainMetadata,
        op: &Operation,
    ) -> Result<Vec<u8>, SdkError> {
        let mcm: AptosAddress = metadata.mcm_address.parse()?;
        let to: AptosAddress = op.transaction.to.parse()?;
        let fields = AptosAdditionalFields::from_json(&op.transaction.additional_fields)?;
        let data = &op.transaction.data;

        let mut preimage = Vec::with_capacity(32 * 6 + 64 * 2 + data.len());
        preimage.extend_from_slice(OP_DOMAIN_SEPARATOR.as_slice());
        put_left_padded(&mut preimage, &self.chain_id()?.to_be_bytes(), 32);
        preimage.extend_from_slice(mcm.as_bytes());
        put_left_padded(&mut preimage, &nonce.to_be_bytes(), 32);
        preimage.extend_from_slice(to.as_bytes());
        put_left_padded(&mut preimage, fields.module_name.as_bytes(), 64);
        put_left_padded(&mut preimage, fields.function.as_bytes(), 64);
        // always padded, a full word of zeros when already aligned
        preimage.extend_from_slice(data);
        preimage.extend(std::iter::repeat_n(0u8, 32 - data.len() % 32));

        Ok(preimage)
    }

    /// Preimage of the metadata leaf.
    pub fn metadata_preimage(&self, metadata: &ChainMetadata) -> Result<Vec<u8>, SdkError> {
        let mcm: AptosAddress = metadata.mcm_address.parse()?;
        let pre = metadata.starting_op_count;
        let post = pre
            .checked_add(self.tx_count)
            .ok_or_else(|| SdkError::OutOfRange(format!("post op count {pre} + {}", self.tx_count)))?;

        let mut preimage = Vec::with_capacity(32 * 6);
        preimage.extend_from_slice(METADATA_DOMAIN_SEPARATOR.as_slice());
        put_left_padded(&mut preimage, &self.chain_id()?.to_be_bytes(), 32);
        preimage.extend_from_slice(mcm.as_bytes());
        put_left_padded(&mut preimage, &pre.to_be_bytes(), 32);
        put_left_padded(&mut preimage, &post.to_be_bytes(), 32);
        put_left_padded(&mut preimage, &[u8::from(self.override_previous_root)], 32);

        Ok(preimage)
    }
}

impl Encoder for AptosEncoder {
    fn hash_operation(
        &self,
        nonce: u32,
        metadata: &ChainMetadata,
        op: &Operation,
    ) -> Result<B256, SdkError> {
        Ok(keccak256(self.operation_preimage(nonce, metadata, op)?))
    }

    fn hash_metadata(&self, metadata: &ChainMetadata) -> Result<B256, SdkError> {
        Ok(keccak256(self.metadata_preimage(metadata)?))
    }
}

//! Checks shared by plain and timelock proposals.

use crate::{BaseProposal, McmsError};
use mcms_primitives::{ChainSelector, ProposalKind, Transaction};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time as the 32-bit timestamp the contracts use.
pub(crate) fn unix_now() -> Result<u32, McmsError> {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default();
    u32::try_from(secs).map_err(|_| McmsError::TimestampOverflow(secs))
}

/// Fails unless `valid_until` lies strictly in the future.
pub fn validate_valid_until(valid_until: u32) -> Result<(), McmsError> {
    if valid_until <= unix_now()? {
        return Err(McmsError::InvalidValidUntil(valid_until));
    }
    Ok(())
}

/// Validates the fields every proposal kind carries.
pub(crate) fn validate_base(base: &BaseProposal, accepted: ProposalKind) -> Result<(), McmsError> {
    if base.kind != accepted {
        return Err(McmsError::InvalidProposalKind { provided: base.kind, accepted });
    }
    if base.version.is_empty() {
        return Err(McmsError::MissingVersion);
    }
    if base.chain_metadata.is_empty() {
        return Err(McmsError::NoChainMetadata);
    }

    for (selector, metadata) in &base.chain_metadata {
        mcms_sdk::validate_chain_metadata(*selector, metadata)
            .map_err(McmsError::chain(*selector))?;
    }

    validate_valid_until(base.valid_until)
}

/// Validates the family-specific fields of a transaction bound for `selector`.
pub(crate) fn validate_transaction(
    index: usize,
    selector: ChainSelector,
    tx: &Transaction,
) -> Result<(), McmsError> {
    mcms_sdk::validate_additional_fields(selector, &tx.additional_fields)
        .map_err(McmsError::operation(index, selector))
}

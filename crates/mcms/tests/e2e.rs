//! Signing, committing and executing a proposal against an in-memory MCMS.

mod common;

use alloy_primitives::U256;
use common::*;
use mcms::{
    CancellationToken, Executable, McmsError, Proposal, ProposalBuilder, Signable,
    primitives::{ChainMetadata, Operation, Transaction},
    sdk::{ChainEncoder, Encoder, EncoderParams, Inspector, SdkError},
};
use serde_json::json;
use std::{collections::BTreeMap, sync::Arc};

fn operation(data: &[u8]) -> Operation {
    Operation {
        chain_selector: SELECTOR,
        transaction: Transaction::new(TARGET.to_string(), data.to_vec(), json!({ "value": 0 })),
    }
}

fn proposal(starting_op_count: u64, ops: usize) -> Proposal {
    (0..ops)
        .fold(
            ProposalBuilder::new()
                .set_version("v1")
                .set_description("e2e")
                .set_valid_until(VALID_UNTIL)
                .add_chain_metadata(SELECTOR, ChainMetadata::new(starting_op_count, MCM.to_string())),
            |builder, i| builder.add_operation(operation(&[i as u8 + 1])),
        )
        .build()
        .unwrap()
}

async fn signed(chain: &Arc<FakeChain>, proposal: Proposal) -> Proposal {
    let inspectors = chain.registry().inspectors([SELECTOR]).unwrap();
    let signable = Signable::new(proposal).unwrap().with_inspectors(inspectors);
    signable.sign_and_append(&signer_1()).await.unwrap();
    signable.sign_and_append(&signer_2()).await.unwrap();
    signable.into_proposal()
}

#[tokio::test]
async fn test_quorum_needs_every_group() {
    let chain = FakeChain::new(config());
    let cancel = CancellationToken::new();
    let inspectors = chain.registry().inspectors([SELECTOR]).unwrap();
    let signable = Signable::new(proposal(0, 1))
        .unwrap()
        .with_inspectors(inspectors)
        .with_expected_configs(BTreeMap::from([(SELECTOR, config())]));

    signable.validate_configs(&cancel).await.unwrap();
    assert!(!signable.validate_signatures(&cancel).await.unwrap());

    signable.sign_and_append(&signer_2()).await.unwrap();
    assert!(!signable.validate_signatures(&cancel).await.unwrap());
    assert!(matches!(
        signable.require_quorum(&cancel).await,
        Err(McmsError::QuorumNotReached(selector)) if selector == SELECTOR
    ));

    signable.sign_and_append(&signer_1()).await.unwrap();
    assert!(signable.validate_signatures(&cancel).await.unwrap());
    signable.require_quorum(&cancel).await.unwrap();
    assert_eq!(signable.recovered_signers().unwrap(), vec![SIGNER_2, SIGNER_1]);
}

#[tokio::test]
async fn test_unknown_signer_is_rejected() {
    let chain = FakeChain::new(config());
    let inspectors = chain.registry().inspectors([SELECTOR]).unwrap();
    let signable = Signable::new(proposal(0, 1)).unwrap().with_inspectors(inspectors);

    let outsider = outsider();
    signable.sign_and_append(&outsider).await.unwrap();

    let err = signable.validate_signatures(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, McmsError::InvalidSignature(address) if address == outsider.address()));
}

#[tokio::test]
async fn test_expected_config_mismatch() {
    let chain = FakeChain::new(config());
    let inspectors = chain.registry().inspectors([SELECTOR]).unwrap();
    let expected = mcms::primitives::Config::new(1, vec![SIGNER_1], vec![]).unwrap();
    let signable = Signable::new(proposal(0, 1))
        .unwrap()
        .with_inspectors(inspectors)
        .with_expected_configs(BTreeMap::from([(SELECTOR, expected)]));

    let err = signable.validate_configs(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, McmsError::ConfigMismatch(selector) if selector == SELECTOR));
}

#[tokio::test]
async fn test_set_root_and_execute_in_order() {
    let chain = FakeChain::new(config());
    let cancel = CancellationToken::new();
    let proposal = signed(&chain, proposal(0, 2)).await;

    let executable = Executable::from_registry(proposal, &chain.registry()).unwrap();
    executable.set_root(SELECTOR, &cancel).await.unwrap();
    assert_eq!(chain.root(), executable.merkle_tree().root());

    executable.execute(0, &cancel).await.unwrap();
    executable.execute(1, &cancel).await.unwrap();
    assert_eq!(chain.op_count(), 2);

    let executed = chain.executed();
    assert_eq!(executed.len(), 2);
    assert_eq!(executed[0].to, TARGET);
    assert_eq!(executed[0].value, U256::ZERO);
    assert_eq!(executed[1].data[..], [2]);

    let inspector = chain.registry().inspector(SELECTOR).unwrap();
    assert_eq!(inspector.get_op_count(&MCM.to_string()).await.unwrap(), 2);
    let (root, valid_until) = inspector.get_root(&MCM.to_string()).await.unwrap();
    assert_eq!(root, executable.merkle_tree().root());
    assert_eq!(valid_until, VALID_UNTIL);
}

#[tokio::test]
async fn test_reexecution_reverts_after_last_op() {
    let chain = FakeChain::new(config());
    let cancel = CancellationToken::new();
    let executable =
        Executable::from_registry(signed(&chain, proposal(0, 1)).await, &chain.registry()).unwrap();

    executable.set_root(SELECTOR, &cancel).await.unwrap();
    executable.execute(0, &cancel).await.unwrap();

    let err = executable.execute(0, &cancel).await.unwrap_err();
    match err {
        McmsError::Operation { index, chain_selector, source: SdkError::Reverted { name, .. } } => {
            assert_eq!(index, 0);
            assert_eq!(chain_selector, SELECTOR);
            assert_eq!(name, "PostOpCountReached");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn test_out_of_order_execution_reverts() {
    let chain = FakeChain::new(config());
    let cancel = CancellationToken::new();
    let executable =
        Executable::from_registry(signed(&chain, proposal(0, 2)).await, &chain.registry()).unwrap();

    executable.set_root(SELECTOR, &cancel).await.unwrap();
    let err = executable.execute(1, &cancel).await.unwrap_err();
    assert!(matches!(
        err,
        McmsError::Operation { source: SdkError::Reverted { ref name, .. }, .. } if name == "WrongNonce"
    ));
    assert_eq!(chain.op_count(), 0);
}

#[tokio::test]
async fn test_set_root_twice_reverts() {
    let chain = FakeChain::new(config());
    let cancel = CancellationToken::new();
    let executable =
        Executable::from_registry(signed(&chain, proposal(0, 1)).await, &chain.registry()).unwrap();

    executable.set_root(SELECTOR, &cancel).await.unwrap();
    let err = executable.set_root(SELECTOR, &cancel).await.unwrap_err();
    assert!(matches!(
        err,
        McmsError::Chain { source: SdkError::Reverted { ref name, .. }, .. }
            if name == "SignedHashAlreadySeen"
    ));
}

#[tokio::test]
async fn test_stale_starting_op_count_reverts() {
    let chain = FakeChain::new(config());
    let cancel = CancellationToken::new();
    let executable =
        Executable::from_registry(signed(&chain, proposal(3, 1)).await, &chain.registry()).unwrap();

    assert_eq!(executable.tx_nonce(0).unwrap(), 3);
    let err = executable.set_root(SELECTOR, &cancel).await.unwrap_err();
    assert!(matches!(
        err,
        McmsError::Chain { source: SdkError::Reverted { ref name, .. }, .. } if name == "WrongPreOpCount"
    ));
}

#[tokio::test]
async fn test_single_signature_is_insufficient_on_chain() {
    let chain = FakeChain::new(config());
    let inspectors = chain.registry().inspectors([SELECTOR]).unwrap();
    let signable = Signable::new(proposal(0, 1)).unwrap().with_inspectors(inspectors);
    signable.sign_and_append(&signer_1()).await.unwrap();

    let executable = Executable::from_registry(signable.into_proposal(), &chain.registry()).unwrap();
    let err = executable.set_root(SELECTOR, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(
        err,
        McmsError::Chain { source: SdkError::Reverted { ref name, .. }, .. }
            if name == "InsufficientSigners"
    ));
}

#[tokio::test]
async fn test_signatures_are_sorted_by_signer() {
    let chain = FakeChain::new(config());
    let inspectors = chain.registry().inspectors([SELECTOR]).unwrap();
    let signable = Signable::new(proposal(0, 1)).unwrap().with_inspectors(inspectors);
    // SIGNER_2 sorts before SIGNER_1
    signable.sign_and_append(&signer_1()).await.unwrap();
    signable.sign_and_append(&signer_2()).await.unwrap();
    let hash = signable.signing_hash();

    let executable = Executable::from_registry(signable.into_proposal(), &chain.registry()).unwrap();
    let sorted = executable.sorted_signatures().unwrap();
    assert_eq!(sorted[0].recover(hash).unwrap(), SIGNER_2);
    assert_eq!(sorted[1].recover(hash).unwrap(), SIGNER_1);

    executable.set_root(SELECTOR, &CancellationToken::new()).await.unwrap();
}

#[tokio::test]
async fn test_cancelled_token_aborts_submission() {
    let chain = FakeChain::new(config());
    let executable =
        Executable::from_registry(signed(&chain, proposal(0, 1)).await, &chain.registry()).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = executable.set_root(SELECTOR, &cancel).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(chain.root(), alloy_primitives::B256::ZERO);
}

#[tokio::test]
async fn test_simulate_against_live_state() {
    let chain = FakeChain::new(config());
    let registry = chain.registry();
    let proposal = signed(&chain, proposal(0, 1)).await;

    let executable = Executable::from_registry(proposal.clone(), &registry).unwrap();
    executable.set_root(SELECTOR, &CancellationToken::new()).await.unwrap();

    let encoders = proposal.encoders().unwrap();
    let simulator = registry.simulator(SELECTOR, &encoders[&SELECTOR]).unwrap();
    let signable = Signable::new(proposal)
        .unwrap()
        .with_simulators(BTreeMap::from([(SELECTOR, simulator)]));
    signable.simulate(&CancellationToken::new()).await.unwrap();
    assert_eq!(chain.op_count(), 0);
}

#[test]
fn test_index_out_of_range() {
    let executable = Executable::new(proposal(0, 1), BTreeMap::new()).unwrap();
    assert!(matches!(
        executable.tx_nonce(5),
        Err(McmsError::IndexOutOfRange { index: 5, len: 1 })
    ));
}

#[tokio::test]
async fn test_two_of_two_flat_config() {
    let config = mcms::primitives::Config::new(2, vec![SIGNER_1, SIGNER_2], vec![]).unwrap();
    let chain = FakeChain::new(config);
    let cancel = CancellationToken::new();
    let inspectors = chain.registry().inspectors([SELECTOR]).unwrap();
    let signable = Signable::new(proposal(0, 1)).unwrap().with_inspectors(inspectors);

    signable.sign_and_append(&signer_1()).await.unwrap();
    assert!(!signable.validate_signatures(&cancel).await.unwrap());
    signable.sign_and_append(&signer_2()).await.unwrap();
    assert!(signable.validate_signatures(&cancel).await.unwrap());

    let executable = Executable::from_registry(signable.into_proposal(), &chain.registry()).unwrap();
    executable.set_root(SELECTOR, &cancel).await.unwrap();
    executable.execute(0, &cancel).await.unwrap();

    let inspector = chain.registry().inspector(SELECTOR).unwrap();
    assert_eq!(inspector.get_op_count(&MCM.to_string()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_signer_is_rejected() {
    let chain = FakeChain::new(config());
    let cancel = CancellationToken::new();
    let inspectors = chain.registry().inspectors([SELECTOR]).unwrap();
    let signable = Signable::new(proposal(0, 1)).unwrap().with_inspectors(inspectors);

    signable.sign_and_append(&signer_1()).await.unwrap();
    let err = signable.sign_and_append(&signer_1()).await.unwrap_err();
    assert!(matches!(err, McmsError::DuplicateSignature(address) if address == SIGNER_1));
    assert_eq!(signable.proposal().signatures.len(), 1);
    assert!(!signable.validate_signatures(&cancel).await.unwrap());

    signable.sign_and_append(&signer_2()).await.unwrap();
    assert!(signable.validate_signatures(&cancel).await.unwrap());
}

#[tokio::test]
async fn test_repeated_signature_is_submitted_once() {
    let chain = FakeChain::new(config());
    let signable = Signable::new(proposal(0, 1)).unwrap();
    let repeated = signable.sign_and_append(&signer_1()).await.unwrap();
    signable.sign_and_append(&signer_2()).await.unwrap();

    let mut proposal = signable.into_proposal();
    proposal.append_signature(repeated);
    assert_eq!(proposal.signatures.len(), 3);

    let executable = Executable::from_registry(proposal, &chain.registry()).unwrap();
    assert_eq!(executable.sorted_signatures().unwrap().len(), 2);
    executable.set_root(SELECTOR, &CancellationToken::new()).await.unwrap();
    assert_eq!(chain.root(), executable.merkle_tree().root());
}

#[test]
fn test_simulated_backend_hashes_the_same_everywhere() {
    let chain = FakeChain::new(config());
    let mut proposal = proposal(0, 1);
    proposal.use_simulated_backend = true;

    let params = EncoderParams { tx_count: 1, override_previous_root: false, simulated: true };
    let leaf = ChainEncoder::new(SELECTOR, params)
        .unwrap()
        .hash_metadata(&proposal.chain_metadata[&SELECTOR])
        .unwrap();

    let executable = Executable::from_registry(proposal.clone(), &chain.registry()).unwrap();
    assert!(executable.merkle_tree().leaves().contains(&leaf));
    assert_eq!(Signable::new(proposal).unwrap().merkle_tree(), executable.merkle_tree());
}

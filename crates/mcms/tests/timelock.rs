//! Scheduling, waiting for and executing timelock batches through an in-memory MCMS.

mod common;

use common::*;
use mcms::{
    CancellationToken, ConvertedProposal, Executable, McmsError, PollOptions, Signable,
    TimelockExecutable, TimelockProposal, TimelockProposalBuilder,
    primitives::{BatchOperation, ChainMetadata, Delay, TimelockAction, Transaction},
};
use serde_json::json;
use std::{collections::BTreeMap, sync::Arc, time::Duration};

fn batch(data: &[u8]) -> BatchOperation {
    BatchOperation {
        chain_selector: SELECTOR,
        transactions: vec![
            Transaction::new(TARGET.to_string(), data.to_vec(), json!({ "value": 0 })),
            Transaction::new(TARGET.to_string(), [data, data].concat(), json!({ "value": "0x0" })),
        ],
    }
}

fn timelock_proposal() -> TimelockProposal {
    TimelockProposalBuilder::new()
        .set_version("v1")
        .set_description("timelock")
        .set_valid_until(VALID_UNTIL)
        .set_action(TimelockAction::Schedule)
        .set_delay(Delay::from_secs(3_600))
        .add_chain_metadata(SELECTOR, ChainMetadata::new(0, MCM.to_string()))
        .add_timelock_address(SELECTOR, TIMELOCK.to_string())
        .add_operation(batch(&[1]))
        .add_operation(batch(&[2]))
        .build()
        .unwrap()
}

/// Converts, signs, commits and executes `proposal` on `chain`.
async fn run_through_mcms(chain: &Arc<FakeChain>, proposal: &TimelockProposal) -> ConvertedProposal {
    let converted = proposal.convert(&proposal.timelock_converters().unwrap()).unwrap();
    let cancel = CancellationToken::new();

    let signable = Signable::new(converted.proposal.clone()).unwrap();
    signable.sign_and_append(&signer_1()).await.unwrap();
    signable.sign_and_append(&signer_2()).await.unwrap();

    let executable = Executable::from_registry(signable.into_proposal(), &chain.registry()).unwrap();
    executable.set_root(SELECTOR, &cancel).await.unwrap();
    for index in 0..executable.proposal().operations.len() {
        executable.execute(index, &cancel).await.unwrap();
    }

    converted
}

#[tokio::test(start_paused = true)]
async fn test_schedule_wait_and_execute() {
    let chain = FakeChain::new(config());
    chain.set_readiness_checks(3);
    let proposal = timelock_proposal();

    let converted = run_through_mcms(&chain, &proposal).await;
    assert_eq!(chain.op_count(), 2);
    for id in &converted.operation_ids {
        assert!(matches!(chain.operation(*id), Some(OperationState::Pending(3))));
    }

    let executable = TimelockExecutable::from_registry(proposal, &chain.registry())
        .unwrap()
        .with_poll_options(PollOptions {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            max_attempts: 10,
        });
    let cancel = CancellationToken::new();

    assert_eq!(executable.predecessors(), &[alloy_primitives::B256::ZERO, converted.operation_ids[0]]);
    assert_eq!(executable.get_op_id(1).unwrap(), converted.operation_ids[1]);

    let err = executable.is_ready(&cancel).await.unwrap_err();
    assert!(matches!(err, McmsError::OperationNotReady { index: 0, .. }));

    executable.wait_until_ready(&cancel).await.unwrap();

    executable.execute(0, &cancel).await.unwrap();
    executable.execute(1, &cancel).await.unwrap();
    for id in &converted.operation_ids {
        assert_eq!(chain.operation(*id), Some(OperationState::Done));
    }
}

#[tokio::test(start_paused = true)]
async fn test_wait_gives_up_after_max_attempts() {
    let chain = FakeChain::new(config());
    chain.set_readiness_checks(100);
    let proposal = timelock_proposal();
    run_through_mcms(&chain, &proposal).await;

    let executable = TimelockExecutable::from_registry(proposal, &chain.registry())
        .unwrap()
        .with_poll_options(PollOptions {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
            max_attempts: 3,
        });

    let err = executable.wait_until_ready(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, McmsError::PollExhausted { attempts: 3, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_wait_stops_when_cancelled() {
    let chain = FakeChain::new(config());
    chain.set_readiness_checks(100);
    let proposal = timelock_proposal();
    run_through_mcms(&chain, &proposal).await;

    let executable = TimelockExecutable::from_registry(proposal, &chain.registry()).unwrap();
    let cancel = CancellationToken::new();
    let waiter = cancel.clone();
    let wait = async move { executable.wait_until_ready(&waiter).await };

    let (result, ()) = tokio::join!(wait, async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        cancel.cancel();
    });
    assert!(result.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn test_execute_before_ready_reverts() {
    let chain = FakeChain::new(config());
    chain.set_readiness_checks(1);
    let proposal = timelock_proposal();
    run_through_mcms(&chain, &proposal).await;

    let executable = TimelockExecutable::from_registry(proposal, &chain.registry()).unwrap();
    let err = executable.execute(0, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, McmsError::Operation { index: 0, .. }));
    assert!(err.to_string().contains("operation is not ready"), "{err}");
}

#[tokio::test]
async fn test_cancellation_removes_scheduled_batches() {
    let chain = FakeChain::new(config());
    chain.set_readiness_checks(10);
    let proposal = timelock_proposal();
    let scheduled = run_through_mcms(&chain, &proposal).await;

    let metadata = BTreeMap::from([(SELECTOR, ChainMetadata::new(chain.op_count(), MCM.to_string()))]);
    let cancellation = proposal.derive_cancellation_proposal(&metadata).unwrap();
    assert_eq!(cancellation.action, TimelockAction::Cancel);
    assert!(cancellation.signatures.is_empty());
    assert_eq!(cancellation.salt(), proposal.salt());

    let cancelled = run_through_mcms(&chain, &cancellation).await;
    assert_eq!(cancelled.operation_ids, scheduled.operation_ids);
    assert_eq!(chain.op_count(), 4);
    for id in &scheduled.operation_ids {
        assert_eq!(chain.operation(*id), None);
    }
}

#[tokio::test]
async fn test_bypass_executes_through_mcms() {
    let chain = FakeChain::new(config());
    let proposal = timelock_proposal();

    let metadata = BTreeMap::from([(SELECTOR, ChainMetadata::new(0, MCM.to_string()))]);
    let bypass = proposal.derive_bypass_proposal(&metadata).unwrap();
    run_through_mcms(&chain, &bypass).await;

    assert_eq!(chain.bypassed(), 2);
    assert!(TimelockExecutable::from_registry(bypass, &chain.registry()).is_err());
}

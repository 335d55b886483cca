//! In-memory `ManyChainMultiSig` and `RBACTimelock` behind an [`EvmClient`].

#![allow(dead_code, unreachable_pub)]

use alloy_primitives::{Address, B256, Bytes, U256, address, aliases::U40, keccak256};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{Revert, SolCall, SolError, SolValue};
use mcms::{
    primitives::{ChainSelector, Config, Signature},
    sdk::{
        AdapterRegistry, SdkError,
        evm::{EvmClient, METADATA_DOMAIN_SEPARATOR, OP_DOMAIN_SEPARATOR, hash_operation_batch},
    },
};
use mcms_contracts::{IManyChainMultiSig, IRBACTimelock, ManyChainMultiSigError};
use mcms_merkle::verify_proof;

use parking_lot::Mutex;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

pub const SELECTOR: ChainSelector = ChainSelector::GETH_TESTNET;
pub const VALID_UNTIL: u32 = 2004259681;
pub const MCM: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
pub const TIMELOCK: Address = address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512");
pub const TARGET: Address = address!("0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0");

pub const SIGNER_1: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
pub const SIGNER_2: Address = address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");
const KEY_1: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
const KEY_2: &str = "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";
const OUTSIDER_KEY: &str = "0x7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6";

pub fn signer_1() -> PrivateKeySigner {
    KEY_1.parse().unwrap()
}

pub fn signer_2() -> PrivateKeySigner {
    KEY_2.parse().unwrap()
}

pub fn outsider() -> PrivateKeySigner {
    OUTSIDER_KEY.parse().unwrap()
}

/// Root group needs both its direct signer and its single child group.
pub fn config() -> Config {
    Config::new(2, vec![SIGNER_1], vec![Config::new(1, vec![SIGNER_2], vec![]).unwrap()]).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Scheduled, ready after this many more readiness checks.
    Pending(usize),
    Ready,
    Done,
}

struct State {
    config: Config,
    flat: IManyChainMultiSig::Config,
    op_count: u64,
    root: B256,
    valid_until: u32,
    metadata: Option<IManyChainMultiSig::RootMetadata>,
    seen_hashes: HashSet<B256>,
    executed: Vec<IManyChainMultiSig::Op>,
    operations: HashMap<B256, OperationState>,
    readiness_checks: usize,
    bypassed: usize,
    tx_count: u8,
}

/// A single EVM chain holding one MCMS and one timelock.
pub struct FakeChain {
    state: Mutex<State>,
}

fn revert(err: ManyChainMultiSigError) -> SdkError {
    SdkError::from_revert_data(alloy_sol_types::SolInterface::abi_encode(&err).into())
}

fn timelock_revert(reason: &str) -> SdkError {
    SdkError::from_revert_data(Revert { reason: reason.to_string() }.abi_encode().into())
}

impl FakeChain {
    pub fn new(config: Config) -> Arc<Self> {
        let flat = config.to_flat().unwrap();
        let flat = IManyChainMultiSig::Config {
            signers: flat
                .signers
                .iter()
                .map(|signer| IManyChainMultiSig::Signer {
                    addr: signer.address,
                    index: signer.index,
                    group: signer.group,
                })
                .collect(),
            groupQuorums: flat.group_quorums,
            groupParents: flat.group_parents,
        };

        Arc::new(Self {
            state: Mutex::new(State {
                config,
                flat,
                op_count: 0,
                root: B256::ZERO,
                valid_until: 0,
                metadata: None,
                seen_hashes: HashSet::new(),
                executed: Vec::new(),
                operations: HashMap::new(),
                readiness_checks: 0,
                bypassed: 0,
                tx_count: 0,
            }),
        })
    }

    /// Newly scheduled operations become ready after `checks` readiness queries.
    pub fn set_readiness_checks(&self, checks: usize) {
        self.state.lock().readiness_checks = checks;
    }

    pub fn op_count(&self) -> u64 {
        self.state.lock().op_count
    }

    pub fn root(&self) -> B256 {
        self.state.lock().root
    }

    pub fn executed(&self) -> Vec<IManyChainMultiSig::Op> {
        self.state.lock().executed.clone()
    }

    pub fn operation(&self, id: B256) -> Option<OperationState> {
        self.state.lock().operations.get(&id).copied()
    }

    pub fn bypassed(&self) -> usize {
        self.state.lock().bypassed
    }

    pub fn registry(self: &Arc<Self>) -> AdapterRegistry {
        let client: Arc<dyn EvmClient> = self.clone();
        AdapterRegistry::new().with_evm_client(SELECTOR, client).unwrap()
    }

    fn set_root(state: &mut State, input: &[u8]) -> Result<(), SdkError> {
        let call = IManyChainMultiSig::setRootCall::abi_decode(input).unwrap();
        let hash = mcms::signing_hash(call.root, call.validUntil);
        if state.seen_hashes.contains(&hash) {
            return Err(revert(ManyChainMultiSigError::signed_hash_already_seen()));
        }

        let members: HashSet<_> = state.config.all_signers().into_iter().collect();
        let mut previous = Address::ZERO;
        let mut approvals = HashSet::new();
        for signature in &call.signatures {
            let signature = Signature { r: signature.r, s: signature.s, v: signature.v };
            let signer = signature
                .recover(hash)
                .map_err(|_| revert(ManyChainMultiSigError::invalid_signer()))?;
            if !members.contains(&signer) {
                return Err(revert(ManyChainMultiSigError::invalid_signer()));
            }
            if signer <= previous {
                return Err(revert(
                    ManyChainMultiSigError::signers_addresses_must_be_strictly_increasing(),
                ));
            }
            previous = signer;
            approvals.insert(signer);
        }
        if !state.config.evaluate(&approvals) {
            return Err(revert(ManyChainMultiSigError::insufficient_signers()));
        }

        let leaf = keccak256((METADATA_DOMAIN_SEPARATOR, call.metadata.clone()).abi_encode_params());
        if !verify_proof(leaf, &call.metadataProof, call.root) {
            return Err(revert(ManyChainMultiSigError::proof_cannot_be_verified()));
        }
        if call.metadata.multiSig != MCM {
            return Err(revert(ManyChainMultiSigError::wrong_multi_sig()));
        }
        if call.metadata.preOpCount != U40::from(state.op_count) {
            return Err(revert(ManyChainMultiSigError::wrong_pre_op_count()));
        }

        state.seen_hashes.insert(hash);
        state.root = call.root;
        state.valid_until = call.validUntil;
        state.metadata = Some(call.metadata);
        Ok(())
    }

    fn execute(state: &mut State, input: &[u8]) -> Result<(), SdkError> {
        let call = IManyChainMultiSig::executeCall::abi_decode(input).unwrap();
        let post_op_count = state.metadata.as_ref().map(|m| m.postOpCount).unwrap_or_default();
        if U40::from(state.op_count) >= post_op_count {
            return Err(revert(ManyChainMultiSigError::post_op_count_reached()));
        }
        if call.op.nonce != U40::from(state.op_count) {
            return Err(revert(ManyChainMultiSigError::wrong_nonce()));
        }

        let leaf = keccak256((OP_DOMAIN_SEPARATOR, call.op.clone()).abi_encode_params());
        if !verify_proof(leaf, &call.proof, state.root) {
            return Err(revert(ManyChainMultiSigError::proof_cannot_be_verified()));
        }

        if call.op.to == TIMELOCK {
            Self::timelock_from_mcm(state, &call.op.data)?;
        }

        state.op_count += 1;
        state.executed.push(call.op);
        Ok(())
    }

    fn timelock_from_mcm(state: &mut State, data: &[u8]) -> Result<(), SdkError> {
        let selector: [u8; 4] = data[..4].try_into().unwrap();
        match selector {
            IRBACTimelock::scheduleBatchCall::SELECTOR => {
                let call = IRBACTimelock::scheduleBatchCall::abi_decode(data).unwrap();
                let id = hash_operation_batch(&call.calls, call.predecessor, call.salt);
                if state.operations.contains_key(&id) {
                    return Err(timelock_revert("RBACTimelock: operation already scheduled"));
                }
                let checks = state.readiness_checks;
                let op = if checks == 0 { OperationState::Ready } else { OperationState::Pending(checks) };
                state.operations.insert(id, op);
            }
            IRBACTimelock::cancelCall::SELECTOR => {
                let call = IRBACTimelock::cancelCall::abi_decode(data).unwrap();
                if state.operations.remove(&call.id).is_none() {
                    return Err(timelock_revert("RBACTimelock: operation cannot be cancelled"));
                }
            }
            IRBACTimelock::bypasserExecuteBatchCall::SELECTOR => state.bypassed += 1,
            _ => return Err(timelock_revert("RBACTimelock: unknown call")),
        }
        Ok(())
    }

    fn execute_batch(state: &mut State, input: &[u8]) -> Result<(), SdkError> {
        let call = IRBACTimelock::executeBatchCall::abi_decode(input).unwrap();
        let id = hash_operation_batch(&call.calls, call.predecessor, call.salt);
        match state.operations.get_mut(&id) {
            Some(op @ OperationState::Ready) => {
                *op = OperationState::Done;
                Ok(())
            }
            _ => Err(timelock_revert("RBACTimelock: operation is not ready")),
        }
    }
}

#[async_trait::async_trait]
impl EvmClient for FakeChain {
    async fn call(&self, _to: Address, input: Bytes) -> Result<Bytes, SdkError> {
        let mut state = self.state.lock();
        let selector: [u8; 4] = input[..4].try_into().unwrap();

        let output = match selector {
            IManyChainMultiSig::getConfigCall::SELECTOR => {
                IManyChainMultiSig::getConfigCall::abi_encode_returns(&state.flat)
            }
            IManyChainMultiSig::getOpCountCall::SELECTOR => {
                IManyChainMultiSig::getOpCountCall::abi_encode_returns(&U40::from(state.op_count))
            }
            IManyChainMultiSig::getRootCall::SELECTOR => {
                IManyChainMultiSig::getRootCall::abi_encode_returns(
                    &IManyChainMultiSig::getRootReturn {
                        root: state.root,
                        validUntil: state.valid_until,
                    },
                )
            }
            IManyChainMultiSig::setRootCall::SELECTOR => {
                Self::set_root(&mut state.clone_for_simulation(), &input)?;
                Vec::new()
            }
            IManyChainMultiSig::executeCall::SELECTOR => {
                Self::execute(&mut state.clone_for_simulation(), &input)?;
                Vec::new()
            }
            IRBACTimelock::isOperationReadyCall::SELECTOR => {
                let call = IRBACTimelock::isOperationReadyCall::abi_decode(&input).unwrap();
                let ready = match state.operations.get_mut(&call.id) {
                    Some(OperationState::Ready) => true,
                    Some(op @ OperationState::Pending(1)) => {
                        *op = OperationState::Ready;
                        false
                    }
                    Some(OperationState::Pending(n)) => {
                        *n -= 1;
                        false
                    }
                    _ => false,
                };
                IRBACTimelock::isOperationReadyCall::abi_encode_returns(&ready)
            }
            IRBACTimelock::isOperationDoneCall::SELECTOR => {
                let call = IRBACTimelock::isOperationDoneCall::abi_decode(&input).unwrap();
                let done = state.operations.get(&call.id) == Some(&OperationState::Done);
                IRBACTimelock::isOperationDoneCall::abi_encode_returns(&done)
            }
            _ => panic!("unexpected view call {}", Bytes::copy_from_slice(&selector)),
        };
        Ok(output.into())
    }

    async fn send(&self, to: Address, input: Bytes, _value: U256) -> Result<B256, SdkError> {
        let mut state = self.state.lock();
        let selector: [u8; 4] = input[..4].try_into().unwrap();

        if to == MCM && selector == IManyChainMultiSig::setRootCall::SELECTOR {
            Self::set_root(&mut state, &input)?;
        } else if to == MCM && selector == IManyChainMultiSig::executeCall::SELECTOR {
            Self::execute(&mut state, &input)?;
        } else if to == TIMELOCK && selector == IRBACTimelock::executeBatchCall::SELECTOR {
            Self::execute_batch(&mut state, &input)?;
        } else {
            panic!("unexpected transaction to {to}");
        }

        state.tx_count += 1;
        Ok(B256::with_last_byte(state.tx_count))
    }
}

impl State {
    /// Copy used to dry-run a transaction without touching the real state.
    fn clone_for_simulation(&self) -> Self {
        Self {
            config: self.config.clone(),
            flat: self.flat.clone(),
            op_count: self.op_count,
            root: self.root,
            valid_until: self.valid_until,
            metadata: self.metadata.clone(),
            seen_hashes: self.seen_hashes.clone(),
            executed: Vec::new(),
            operations: self.operations.clone(),
            readiness_checks: self.readiness_checks,
            bypassed: self.bypassed,
            tx_count: self.tx_count,
        }
    }
}

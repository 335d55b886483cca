//! Solidity bindings for the contracts driven by the EVM adapter.

#![cfg_attr(not(feature = "std"), no_std)]

pub(crate) use alloy_sol_types::sol;

pub mod many_chain_multi_sig;
pub use many_chain_multi_sig::{IManyChainMultiSig, ManyChainMultiSigError, ManyChainMultiSigEvent};

pub mod rbac_timelock;
pub use rbac_timelock::{IRBACTimelock, RBACTimelockEvent};

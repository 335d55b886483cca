//! Chain selectors and their chain families.

use serde::{Deserialize, Deserializer, Serialize, de};
use std::fmt;

/// Opaque identifier of a target chain.
///
/// Every selector resolves to exactly one [`ChainFamily`]. When used as a JSON map key the
/// selector is written as a decimal string.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct ChainSelector(pub u64);

/// Accepts both a JSON number and a decimal string, so selectors read back as map keys even
/// when the map sits inside a flattened struct.
impl<'de> Deserialize<'de> for ChainSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SelectorVisitor;

        impl de::Visitor<'_> for SelectorVisitor {
            type Value = ChainSelector;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a chain selector as an unsigned integer or decimal string")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(ChainSelector(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                u64::try_from(value).map(ChainSelector).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                value.parse().map(ChainSelector).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SelectorVisitor)
    }
}

/// Chain families understood by the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    #[display("evm")]
    Evm,
    #[display("solana")]
    Solana,
    #[display("aptos")]
    Aptos,
    #[display("sui")]
    Sui,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainSelectorError {
    #[error("chain family not found for selector {0}")]
    ChainFamilyNotFound(ChainSelector),
    #[error("invalid chain ID: {0}")]
    InvalidChainId(ChainSelector),
}

/// Static description of a known chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainDetails {
    pub selector: ChainSelector,
    pub family: ChainFamily,
    /// Numeric chain id for families that have one (EVM, Aptos).
    pub chain_id: Option<u64>,
    pub name: &'static str,
}

impl ChainSelector {
    pub const ETHEREUM_MAINNET: Self = Self(5009297550715157269);
    pub const ETHEREUM_TESTNET_SEPOLIA: Self = Self(16015286601757825753);
    pub const ETHEREUM_TESTNET_SEPOLIA_BASE_1: Self = Self(10344971235874465080);
    pub const POLYGON_MAINNET: Self = Self(4051577828743386545);
    pub const ARBITRUM_MAINNET: Self = Self(4949039107694359620);
    pub const OPTIMISM_MAINNET: Self = Self(3734403246176062136);
    pub const BASE_MAINNET: Self = Self(15971525489660198786);
    pub const GETH_TESTNET: Self = Self(3379446385462418246);
    pub const GETH_DEVNET_2: Self = Self(12922642891491394802);

    pub const SOLANA_MAINNET: Self = Self(124615329519749607);
    pub const SOLANA_TESTNET: Self = Self(6302590918974934319);
    pub const SOLANA_DEVNET: Self = Self(16423721717087811551);

    pub const APTOS_MAINNET: Self = Self(4741433654826277614);
    pub const APTOS_TESTNET: Self = Self(743186221051783445);
    pub const APTOS_LOCALNET: Self = Self(4457093679053095497);

    pub const SUI_MAINNET: Self = Self(17529533435026248318);
    pub const SUI_TESTNET: Self = Self(9762610643973837292);

    /// Raw selector value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Looks up the static chain details for this selector.
    pub fn details(self) -> Option<&'static ChainDetails> {
        KNOWN_CHAINS.iter().find(|chain| chain.selector == self)
    }

    /// Resolves the chain family of this selector.
    pub fn family(self) -> Result<ChainFamily, ChainSelectorError> {
        self.details()
            .map(|chain| chain.family)
            .ok_or(ChainSelectorError::ChainFamilyNotFound(self))
    }

    /// EVM chain id of this selector.
    pub fn evm_chain_id(self) -> Result<u64, ChainSelectorError> {
        self.chain_id_for(ChainFamily::Evm)
    }

    /// Aptos chain id of this selector.
    pub fn aptos_chain_id(self) -> Result<u64, ChainSelectorError> {
        self.chain_id_for(ChainFamily::Aptos)
    }

    fn chain_id_for(self, family: ChainFamily) -> Result<u64, ChainSelectorError> {
        self.details()
            .filter(|chain| chain.family == family)
            .and_then(|chain| chain.chain_id)
            .ok_or(ChainSelectorError::InvalidChainId(self))
    }
}

const fn chain(
    selector: ChainSelector,
    family: ChainFamily,
    chain_id: Option<u64>,
    name: &'static str,
) -> ChainDetails {
    ChainDetails { selector, family, chain_id, name }
}

/// Chains known to this crate.
pub static KNOWN_CHAINS: &[ChainDetails] = &[
    chain(ChainSelector::ETHEREUM_MAINNET, ChainFamily::Evm, Some(1), "ethereum-mainnet"),
    chain(
        ChainSelector::ETHEREUM_TESTNET_SEPOLIA,
        ChainFamily::Evm,
        Some(11155111),
        "ethereum-testnet-sepolia",
    ),
    chain(
        ChainSelector::ETHEREUM_TESTNET_SEPOLIA_BASE_1,
        ChainFamily::Evm,
        Some(84532),
        "ethereum-testnet-sepolia-base-1",
    ),
    chain(ChainSelector::POLYGON_MAINNET, ChainFamily::Evm, Some(137), "polygon-mainnet"),
    chain(
        ChainSelector::ARBITRUM_MAINNET,
        ChainFamily::Evm,
        Some(42161),
        "ethereum-mainnet-arbitrum-1",
    ),
    chain(
        ChainSelector::OPTIMISM_MAINNET,
        ChainFamily::Evm,
        Some(10),
        "ethereum-mainnet-optimism-1",
    ),
    chain(ChainSelector::BASE_MAINNET, ChainFamily::Evm, Some(8453), "ethereum-mainnet-base-1"),
    chain(ChainSelector::GETH_TESTNET, ChainFamily::Evm, Some(1337), "geth-testnet"),
    chain(ChainSelector::GETH_DEVNET_2, ChainFamily::Evm, Some(2337), "geth-devnet-2"),
    chain(ChainSelector::SOLANA_MAINNET, ChainFamily::Solana, None, "solana-mainnet"),
    chain(ChainSelector::SOLANA_TESTNET, ChainFamily::Solana, None, "solana-testnet"),
    chain(ChainSelector::SOLANA_DEVNET, ChainFamily::Solana, None, "solana-devnet"),
    chain(ChainSelector::APTOS_MAINNET, ChainFamily::Aptos, Some(1), "aptos-mainnet"),
    chain(ChainSelector::APTOS_TESTNET, ChainFamily::Aptos, Some(2), "aptos-testnet"),
    chain(ChainSelector::APTOS_LOCALNET, ChainFamily::Aptos, Some(4), "aptos-localnet"),
    chain(ChainSelector::SUI_MAINNET, ChainFamily::Sui, None, "sui-mainnet"),
    chain(ChainSelector::SUI_TESTNET, ChainFamily::Sui, None, "sui-testnet"),
];

pub use IManyChainMultiSig::{
    IManyChainMultiSigErrors as ManyChainMultiSigError,
    IManyChainMultiSigEvents as ManyChainMultiSigEvent,
};

crate::sol! {
    /// ManyChainMultiSig interface
    ///
    /// A multisig whose signers approve a Merkle root of operations spanning several chains.
    /// Each chain executes its own operations in nonce order once the root is set.
    #[derive(Debug, PartialEq, Eq)]
    #[sol(abi)]
    interface IManyChainMultiSig {
        struct Signer {
            address addr;
            uint8 index;
            uint8 group;
        }

        struct Config {
            Signer[] signers;
            uint8[32] groupQuorums;
            uint8[32] groupParents;
        }

        struct RootMetadata {
            uint256 chainId;
            address multiSig;
            uint40 preOpCount;
            uint40 postOpCount;
            bool overridePreviousRoot;
        }

        struct Op {
            uint256 chainId;
            address multiSig;
            uint40 nonce;
            address to;
            uint256 value;
            bytes data;
        }

        struct Signature {
            uint8 v;
            bytes32 r;
            bytes32 s;
        }

        /// Sets a new expiring root.
        ///
        /// @param root The new root
        /// @param validUntil Unix timestamp after which the root can no longer be used
        /// @param metadata Metadata of the root, its leaf is proven by `metadataProof`
        /// @param metadataProof Merkle proof of the metadata leaf
        /// @param signatures Signatures over the root, sorted by signer address
        function setRoot(
            bytes32 root,
            uint32 validUntil,
            RootMetadata calldata metadata,
            bytes32[] calldata metadataProof,
            Signature[] calldata signatures
        ) external;

        /// Executes the op at the current op count against the current root.
        function execute(Op calldata op, bytes32[] calldata proof) external payable;

        /// Replaces the signer configuration.
        ///
        /// @param signerAddresses Signers sorted strictly increasing
        /// @param signerGroups Group of each signer
        /// @param groupQuorums Quorum of each group, zero for unused groups
        /// @param groupParents Parent of each group, the root is its own parent
        /// @param clearRoot Whether to invalidate the current root
        function setConfig(
            address[] calldata signerAddresses,
            uint8[] calldata signerGroups,
            uint8[32] calldata groupQuorums,
            uint8[32] calldata groupParents,
            bool clearRoot
        ) external;

        function getConfig() external view returns (Config memory);
        function getOpCount() external view returns (uint40);
        function getRoot() external view returns (bytes32 root, uint32 validUntil);
        function getRootMetadata() external view returns (RootMetadata memory);

        // Events
        event NewRoot(bytes32 indexed root, uint32 validUntil, RootMetadata metadata);
        event ConfigSet(Config config, bool isRootCleared);
        event OpExecuted(uint40 indexed nonce, address to, bytes data, uint256 value);

        // Errors
        error CallReverted(bytes error);
        error GroupTreeNotWellFormed();
        error InsufficientSigners();
        error InvalidSigner();
        error MissingConfig();
        error OutOfBoundsGroup();
        error OutOfBoundsGroupQuorum();
        error OutOfBoundsNumOfSigners();
        error PendingOps();
        error PostOpCountReached();
        error ProofCannotBeVerified();
        error RootExpired();
        error SignedHashAlreadySeen();
        error SignerGroupsLengthMismatch();
        error SignerInDisabledGroup();
        error SignersAddressesMustBeStrictlyIncreasing();
        error ValidUntilHasAlreadyPassed();
        error WrongChainId();
        error WrongMultiSig();
        error WrongNonce();
        error WrongPostOpCount();
        error WrongPreOpCount();
    }
}

impl ManyChainMultiSigError {
    pub const fn insufficient_signers() -> Self {
        Self::InsufficientSigners(IManyChainMultiSig::InsufficientSigners {})
    }

    pub const fn invalid_signer() -> Self {
        Self::InvalidSigner(IManyChainMultiSig::InvalidSigner {})
    }

    pub const fn missing_config() -> Self {
        Self::MissingConfig(IManyChainMultiSig::MissingConfig {})
    }

    pub const fn post_op_count_reached() -> Self {
        Self::PostOpCountReached(IManyChainMultiSig::PostOpCountReached {})
    }

    pub const fn proof_cannot_be_verified() -> Self {
        Self::ProofCannotBeVerified(IManyChainMultiSig::ProofCannotBeVerified {})
    }

    pub const fn root_expired() -> Self {
        Self::RootExpired(IManyChainMultiSig::RootExpired {})
    }

    pub const fn signed_hash_already_seen() -> Self {
        Self::SignedHashAlreadySeen(IManyChainMultiSig::SignedHashAlreadySeen {})
    }

    pub const fn signers_addresses_must_be_strictly_increasing() -> Self {
        Self::SignersAddressesMustBeStrictlyIncreasing(
            IManyChainMultiSig::SignersAddressesMustBeStrictlyIncreasing {},
        )
    }

    pub const fn valid_until_has_already_passed() -> Self {
        Self::ValidUntilHasAlreadyPassed(IManyChainMultiSig::ValidUntilHasAlreadyPassed {})
    }

    pub const fn wrong_chain_id() -> Self {
        Self::WrongChainId(IManyChainMultiSig::WrongChainId {})
    }

    pub const fn wrong_multi_sig() -> Self {
        Self::WrongMultiSig(IManyChainMultiSig::WrongMultiSig {})
    }

    pub const fn wrong_nonce() -> Self {
        Self::WrongNonce(IManyChainMultiSig::WrongNonce {})
    }

    pub const fn wrong_pre_op_count() -> Self {
        Self::WrongPreOpCount(IManyChainMultiSig::WrongPreOpCount {})
    }

    pub const fn wrong_post_op_count() -> Self {
        Self::WrongPostOpCount(IManyChainMultiSig::WrongPostOpCount {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
    use alloy_sol_types::{SolCall, SolError, SolInterface, SolValue};

    #[test]
    fn test_error_selectors_match_signatures() {
        assert_eq!(
            IManyChainMultiSig::CallReverted::SELECTOR,
            keccak256("CallReverted(bytes)")[..4]
        );
        assert_eq!(
            IManyChainMultiSig::WrongNonce::SELECTOR,
            keccak256("WrongNonce()")[..4]
        );
    }

    #[test]
    fn test_errors_roundtrip_through_interface() {
        let encoded = ManyChainMultiSigError::wrong_nonce().abi_encode();
        assert_eq!(
            ManyChainMultiSigError::abi_decode(&encoded).unwrap(),
            ManyChainMultiSigError::wrong_nonce()
        );

        let reverted = ManyChainMultiSigError::CallReverted(IManyChainMultiSig::CallReverted {
            error: Bytes::from_static(b"boom"),
        });
        assert_eq!(ManyChainMultiSigError::abi_decode(&reverted.abi_encode()).unwrap(), reverted);
    }

    #[test]
    fn test_set_config_call_encoding() {
        let call = IManyChainMultiSig::setConfigCall {
            signerAddresses: vec![Address::repeat_byte(1), Address::repeat_byte(2)],
            signerGroups: vec![0, 1],
            groupQuorums: [1; 32],
            groupParents: [0; 32],
            clearRoot: true,
        };
        let decoded = IManyChainMultiSig::setConfigCall::abi_decode(&call.abi_encode()).unwrap();
        assert_eq!(decoded.signerAddresses, call.signerAddresses);
        assert!(decoded.clearRoot);
    }

    #[test]
    fn test_op_struct_encoding_is_static_head_plus_dynamic_tail() {
        let op = IManyChainMultiSig::Op {
            chainId: U256::from(1337),
            multiSig: Address::repeat_byte(0xaa),
            nonce: alloy_primitives::aliases::U40::from(0),
            to: Address::repeat_byte(0xbb),
            value: U256::ZERO,
            data: Bytes::from_static(&[1, 2, 3]),
        };

        // (bytes32, Op) head: separator + offset; Op: 6 words head + length + one data word
        let encoded = (B256::ZERO, op).abi_encode_params();
        assert_eq!(encoded.len(), 32 * 2 + 32 * 6 + 32 + 32);
    }
}

use alloy_primitives::{B256, b256};

pub use IRBACTimelock::IRBACTimelockEvents as RBACTimelockEvent;

/// `keccak256("ADMIN_ROLE")`
pub const ADMIN_ROLE: B256 =
    b256!("0xa49807205ce4d355092ef5a8a18f56e8913cf4a201fbe287825b095693c21775");
/// `keccak256("PROPOSER_ROLE")`
pub const PROPOSER_ROLE: B256 =
    b256!("0xb09aa5aeb3702cfd50b6b62bc4532604938f21248a27a1d5ca736082b6819cc1");
/// `keccak256("EXECUTOR_ROLE")`
pub const EXECUTOR_ROLE: B256 =
    b256!("0xd8aa0f3194971a2a116679f7c2090f6939c8d4e01a2a8d7e41d55e5351469e63");
/// `keccak256("CANCELLER_ROLE")`
pub const CANCELLER_ROLE: B256 =
    b256!("0xfd643c72710c63c0180259aba6b2d05451e3591a24e58b62239378085726f783");
/// `keccak256("BYPASSER_ROLE")`
pub const BYPASSER_ROLE: B256 =
    b256!("0xa1b2b8005de234c4b8ce8cd0be058239056e0d54f6097825b5117101469d5a8d");

crate::sol! {
    /// RBACTimelock interface
    ///
    /// Timelock controller with separate proposer, executor, canceller and bypasser roles.
    /// Scheduled batches are identified by `hashOperationBatch(calls, predecessor, salt)`.
    #[derive(Debug, PartialEq, Eq)]
    #[sol(abi)]
    interface IRBACTimelock {
        struct Call {
            address target;
            uint256 value;
            bytes data;
        }

        /// Schedules a batch that becomes executable after `delay` seconds.
        function scheduleBatch(
            Call[] calldata calls,
            bytes32 predecessor,
            bytes32 salt,
            uint256 delay
        ) external;

        /// Cancels a pending operation.
        function cancel(bytes32 id) external;

        /// Executes a ready batch.
        function executeBatch(
            Call[] calldata calls,
            bytes32 predecessor,
            bytes32 salt
        ) external payable;

        /// Executes a batch immediately, skipping the delay.
        function bypasserExecuteBatch(Call[] calldata calls) external payable;

        function hashOperationBatch(
            Call[] calldata calls,
            bytes32 predecessor,
            bytes32 salt
        ) external pure returns (bytes32);

        function isOperation(bytes32 id) external view returns (bool);
        function isOperationPending(bytes32 id) external view returns (bool);
        function isOperationReady(bytes32 id) external view returns (bool);
        function isOperationDone(bytes32 id) external view returns (bool);
        function getMinDelay() external view returns (uint256);

        function getRoleMember(bytes32 role, uint256 index) external view returns (address);
        function getRoleMemberCount(bytes32 role) external view returns (uint256);

        // Events
        event CallScheduled(
            bytes32 indexed id,
            uint256 indexed index,
            address target,
            uint256 value,
            bytes data,
            bytes32 predecessor,
            bytes32 salt,
            uint256 delay
        );
        event CallExecuted(bytes32 indexed id, uint256 indexed index, address target, uint256 value, bytes data);
        event BypasserCallExecuted(uint256 indexed index, address target, uint256 value, bytes data);
        event Cancelled(bytes32 indexed id);
    }
}

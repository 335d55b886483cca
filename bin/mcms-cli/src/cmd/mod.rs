pub(crate) mod check_quorum;
pub(crate) mod execute;
pub(crate) mod root;
pub(crate) mod set_config;
pub(crate) mod set_root;
pub(crate) mod sign;

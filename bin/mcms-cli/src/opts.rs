use crate::cmd::{
    check_quorum::CheckQuorumArgs, execute::ExecuteArgs, root::RootArgs, set_config::SetConfigArgs,
    set_root::SetRootArgs, sign::SignArgs,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mcms")]
#[command(version, about = "CLI for signing, committing and executing MCMS proposals", long_about = None)]
pub(crate) struct McmsCli {
    #[command(subcommand)]
    pub(crate) cmd: McmsSubcommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum McmsSubcommand {
    /// Print the merkle root and signing hash of a proposal
    Root(RootArgs),

    /// Sign a proposal with a private key and append the signature to the file
    Sign(SignArgs),

    /// Check whether the appended signatures reach the quorum of a chain
    CheckQuorum(CheckQuorumArgs),

    /// Commit the proposal root on a chain
    SetRoot(SetRootArgs),

    /// Execute the proposal operations of a chain
    Execute(ExecuteArgs),

    /// Replace the signer configuration of an MCMS contract
    SetConfig(SetConfigArgs),
}

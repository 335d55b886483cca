use crate::args::{ChainArgs, KeyArgs, ProposalArgs, interrupt_token, require_chain};
use clap::Parser;
use eyre::Result;
use mcms::{Executable, sdk::AdapterRegistry};
use std::collections::BTreeMap;

#[derive(Parser, Debug)]
pub(crate) struct SetRootArgs {
    #[command(flatten)]
    proposal: ProposalArgs,

    #[command(flatten)]
    chain: ChainArgs,

    #[command(flatten)]
    key: KeyArgs,
}

impl SetRootArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let proposal = self.proposal.load()?.to_mcms_proposal()?;
        let selector = self.chain.selector();
        require_chain(&proposal, selector)?;

        let registry = self.chain.registry(Some(self.key.signer()?)).await?;
        let executable = chain_executable(proposal, &registry, selector)?;

        let result = executable.set_root(selector, &interrupt_token()).await?;
        println!("Root {} set on chain {selector}: {}", executable.merkle_tree().root(), result.hash);

        Ok(())
    }
}

/// Executable able to submit to `selector` only.
pub(crate) fn chain_executable(
    proposal: mcms::Proposal,
    registry: &AdapterRegistry,
    selector: mcms::primitives::ChainSelector,
) -> Result<Executable> {
    let encoders = proposal.encoders()?;
    let mut executors = BTreeMap::new();
    if let Some(encoder) = encoders.get(&selector) {
        executors.insert(selector, registry.executor(selector, encoder)?);
    }
    Ok(Executable::new(proposal, executors)?)
}

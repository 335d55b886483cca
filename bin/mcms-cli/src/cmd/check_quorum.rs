use crate::args::{ChainArgs, ProposalArgs, interrupt_token, require_chain};
use clap::Parser;
use eyre::{Result, bail};
use mcms::Signable;

#[derive(Parser, Debug)]
pub(crate) struct CheckQuorumArgs {
    #[command(flatten)]
    proposal: ProposalArgs,

    #[command(flatten)]
    chain: ChainArgs,
}

impl CheckQuorumArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let proposal = self.proposal.load()?.to_mcms_proposal()?;
        let selector = self.chain.selector();
        require_chain(&proposal, selector)?;

        let registry = self.chain.registry(None).await?;
        let signable = Signable::new(proposal)?.with_inspectors(registry.inspectors([selector])?);
        let cancel = interrupt_token();

        for signer in signable.recovered_signers()? {
            println!("  signed by {signer}");
        }

        if !signable.check_quorum(selector, &cancel).await? {
            bail!("quorum not reached on chain {selector}");
        }
        println!("Quorum reached on chain {selector}");

        Ok(())
    }
}

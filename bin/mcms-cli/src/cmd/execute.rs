use crate::{
    args::{ChainArgs, KeyArgs, ProposalArgs, interrupt_token, require_chain},
    cmd::set_root::chain_executable,
};
use clap::Parser;
use eyre::{Result, bail};
use mcms::sdk::Inspector;
use tracing::info;

#[derive(Parser, Debug)]
pub(crate) struct ExecuteArgs {
    #[command(flatten)]
    proposal: ProposalArgs,

    #[command(flatten)]
    chain: ChainArgs,

    #[command(flatten)]
    key: KeyArgs,

    /// Index of the operation to execute. Every pending operation of the chain when omitted
    #[arg(long)]
    index: Option<usize>,
}

impl ExecuteArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let proposal = self.proposal.load()?.to_mcms_proposal()?;
        let selector = self.chain.selector();
        require_chain(&proposal, selector)?;

        let registry = self.chain.registry(Some(self.key.signer()?)).await?;
        let mcm = proposal.chain_metadata[&selector].mcm_address.clone();
        let chain_indices: Vec<usize> = proposal
            .operations
            .iter()
            .enumerate()
            .filter(|(_, op)| op.chain_selector == selector)
            .map(|(index, _)| index)
            .collect();
        let executable = chain_executable(proposal, &registry, selector)?;
        let cancel = interrupt_token();

        let indices = match self.index {
            Some(index) if !chain_indices.contains(&index) => {
                bail!("operation {index} does not run on chain {selector}")
            }
            Some(index) => vec![index],
            None => {
                let op_count = registry.inspector(selector)?.get_op_count(&mcm).await?;
                let mut pending = Vec::new();
                for index in chain_indices {
                    if executable.tx_nonce(index)? >= op_count {
                        pending.push(index);
                    }
                }
                info!(chain_selector = %selector, op_count, pending = pending.len(), "Executing pending operations");
                pending
            }
        };

        for index in indices {
            let result = executable.execute(index, &cancel).await?;
            println!("Executed operation {index} on chain {selector}: {}", result.hash);
        }

        Ok(())
    }
}

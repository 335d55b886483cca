use crate::args::ProposalArgs;
use clap::Parser;
use eyre::Result;

#[derive(Parser, Debug)]
pub(crate) struct RootArgs {
    #[command(flatten)]
    proposal: ProposalArgs,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

impl RootArgs {
    pub(crate) fn run(self) -> Result<()> {
        let proposal = self.proposal.load()?.to_mcms_proposal()?;
        let tree = proposal.merkle_tree()?;
        let signing_hash = proposal.signing_hash()?;
        let counts = proposal.transaction_counts();

        if self.json {
            let data = serde_json::json!({
                "root": tree.root(),
                "signingHash": signing_hash,
                "validUntil": proposal.valid_until,
                "operations": counts,
            });
            println!("{}", serde_json::to_string_pretty(&data)?);
            return Ok(());
        }

        println!("Merkle root:   {}", tree.root());
        println!("Signing hash:  {signing_hash}");
        println!("Valid until:   {}", proposal.valid_until);
        println!("Signatures:    {}", proposal.signatures.len());
        println!();
        println!("Operations per chain:");
        for (selector, metadata) in &proposal.chain_metadata {
            println!(
                "  {selector}: {} (op count {} to {})",
                counts.get(selector).copied().unwrap_or_default(),
                metadata.starting_op_count,
                metadata.starting_op_count + counts.get(selector).copied().unwrap_or_default(),
            );
        }

        Ok(())
    }
}

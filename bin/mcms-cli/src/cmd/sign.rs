use crate::args::{KeyArgs, ProposalArgs};
use clap::Parser;
use eyre::Result;
use mcms::Signable;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
pub(crate) struct SignArgs {
    #[command(flatten)]
    proposal: ProposalArgs,

    #[command(flatten)]
    key: KeyArgs,

    /// Write the signed proposal here instead of overwriting the input
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl SignArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let signer = self.key.signer()?;
        let mut file = self.proposal.load()?;

        let signable = Signable::new(file.to_mcms_proposal()?)?;
        let signature = signable.sign(&signer).await?;
        file.append_signature(signature);

        let output = self.output.as_ref().unwrap_or(&self.proposal.proposal);
        file.save(output)?;
        info!(signer = %signer.address(), hash = %signable.signing_hash(), path = %output.display(), "Signed proposal");

        Ok(())
    }
}

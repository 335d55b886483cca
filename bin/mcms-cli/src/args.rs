//! Arguments and loading shared by the subcommands.

use alloy::{
    network::EthereumWallet, providers::ProviderBuilder, signers::local::PrivateKeySigner,
};
use clap::Args;
use eyre::{Result, WrapErr, eyre};
use mcms::{
    CancellationToken, Proposal, TimelockProposal,
    primitives::{ChainSelector, ProposalKind},
    sdk::{
        AdapterRegistry,
        evm::{AlloyEvmClient, EvmClient},
    },
};
use serde::Deserialize;
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, warn};

#[derive(Args, Debug)]
pub(crate) struct ProposalArgs {
    /// Path to the proposal file
    #[arg(short, long)]
    pub(crate) proposal: PathBuf,

    /// Hash EVM leaves with the simulated backend chain id
    #[arg(long)]
    pub(crate) simulated: bool,
}

impl ProposalArgs {
    pub(crate) fn load(&self) -> Result<ProposalFile> {
        ProposalFile::load(&self.proposal, self.simulated)
    }
}

#[derive(Args, Debug)]
pub(crate) struct ChainArgs {
    /// Chain selector of the target chain
    #[arg(long)]
    pub(crate) chain: u64,

    /// RPC URL of the target chain
    #[arg(long, env = "MCMS_RPC_URL")]
    pub(crate) rpc_url: String,
}

#[derive(Args, Debug)]
pub(crate) struct KeyArgs {
    /// Hex encoded private key used to sign or to send transactions
    #[arg(long, env = "MCMS_PRIVATE_KEY", hide_env_values = true)]
    pub(crate) private_key: String,
}

impl KeyArgs {
    pub(crate) fn signer(&self) -> Result<PrivateKeySigner> {
        self.private_key.trim().parse().wrap_err("invalid private key")
    }
}

impl ChainArgs {
    pub(crate) const fn selector(&self) -> ChainSelector {
        ChainSelector(self.chain)
    }

    /// Registry holding a client for the target chain, sending from `signer` when given.
    pub(crate) async fn registry(&self, signer: Option<PrivateKeySigner>) -> Result<AdapterRegistry> {
        let client: Arc<dyn EvmClient> = match signer {
            Some(signer) => {
                info!(sender = %signer.address(), rpc_url = %self.rpc_url, "Connecting");
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect(&self.rpc_url)
                    .await
                    .wrap_err_with(|| format!("failed to connect to {}", self.rpc_url))?;
                Arc::new(AlloyEvmClient::new(provider))
            }
            None => {
                let provider = ProviderBuilder::new()
                    .connect(&self.rpc_url)
                    .await
                    .wrap_err_with(|| format!("failed to connect to {}", self.rpc_url))?;
                Arc::new(AlloyEvmClient::new(provider))
            }
        };

        Ok(AdapterRegistry::new().with_evm_client(self.selector(), client)?)
    }
}

/// A proposal file of either kind.
#[derive(Debug)]
pub(crate) enum ProposalFile {
    Plain(Proposal),
    Timelock(TimelockProposal),
}

#[derive(Deserialize)]
struct KindHeader {
    kind: ProposalKind,
}

impl ProposalFile {
    pub(crate) fn load(path: &Path, simulated: bool) -> Result<Self> {
        let open = || {
            File::open(path)
                .map(BufReader::new)
                .wrap_err_with(|| format!("failed to open {}", path.display()))
        };

        let header: KindHeader = serde_json::from_reader(open()?)
            .wrap_err_with(|| format!("failed to read the kind of {}", path.display()))?;
        let mut file = match header.kind {
            ProposalKind::Proposal => Self::Plain(Proposal::from_reader(open()?)?),
            ProposalKind::TimelockProposal => Self::Timelock(TimelockProposal::from_reader(open()?)?),
        };
        match &mut file {
            Self::Plain(proposal) => proposal.use_simulated_backend = simulated,
            Self::Timelock(proposal) => proposal.use_simulated_backend = simulated,
        }
        Ok(file)
    }

    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).wrap_err_with(|| format!("failed to create {}", path.display()))?;
        match self {
            Self::Plain(proposal) => proposal.write_to(file)?,
            Self::Timelock(proposal) => proposal.write_to(file)?,
        }
        Ok(())
    }

    /// The MCMS proposal the signers approve. Timelock proposals are converted first.
    pub(crate) fn to_mcms_proposal(&self) -> Result<Proposal> {
        match self {
            Self::Plain(proposal) => Ok(proposal.clone()),
            Self::Timelock(proposal) => {
                let converted = proposal.convert(&proposal.timelock_converters()?)?;
                Ok(converted.proposal)
            }
        }
    }

    pub(crate) fn append_signature(&mut self, signature: mcms::primitives::Signature) {
        match self {
            Self::Plain(proposal) => proposal.append_signature(signature),
            Self::Timelock(proposal) => proposal.append_signature(signature),
        }
    }
}

/// Token cancelled on ctrl-c.
pub(crate) fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            cancel.cancel();
        }
    });
    token
}

/// Fails unless the proposal covers `selector`.
pub(crate) fn require_chain(proposal: &Proposal, selector: ChainSelector) -> Result<()> {
    if proposal.chain_metadata.contains_key(&selector) {
        Ok(())
    } else {
        Err(eyre!("proposal has no metadata for chain {selector}"))
    }
}

use crate::args::{ChainArgs, KeyArgs, interrupt_token};
use clap::Parser;
use eyre::{Result, WrapErr, eyre};
use mcms::{primitives::Config, sdk::Configurer};
use std::{fs::File, io::BufReader, path::PathBuf};

#[derive(Parser, Debug)]
pub(crate) struct SetConfigArgs {
    #[command(flatten)]
    chain: ChainArgs,

    #[command(flatten)]
    key: KeyArgs,

    /// Address of the MCMS contract
    #[arg(long)]
    mcm: String,

    /// Path to the JSON quorum config
    #[arg(long)]
    config: PathBuf,

    /// Invalidate the current root
    #[arg(long)]
    clear_root: bool,
}

impl SetConfigArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let file = File::open(&self.config)
            .wrap_err_with(|| format!("failed to open {}", self.config.display()))?;
        let config: Config = serde_json::from_reader(BufReader::new(file))
            .wrap_err_with(|| format!("failed to parse {}", self.config.display()))?;
        config.validate()?;

        let selector = self.chain.selector();
        let configurer = self.chain.registry(Some(self.key.signer()?)).await?.configurer(selector)?;

        let cancel = interrupt_token();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(eyre!("cancelled")),
            result = configurer.set_config(&self.mcm, &config, self.clear_root) => result?,
        };
        println!("Config set on chain {selector}: {}", result.hash);

        Ok(())
    }
}

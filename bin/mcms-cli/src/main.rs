use clap::Parser;
use opts::{McmsCli, McmsSubcommand};

mod args;
mod cmd;
mod opts;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = McmsCli::parse();

    match args.cmd {
        McmsSubcommand::Root(cmd) => cmd.run(),
        McmsSubcommand::Sign(cmd) => cmd.run().await,
        McmsSubcommand::CheckQuorum(cmd) => cmd.run().await,
        McmsSubcommand::SetRoot(cmd) => cmd.run().await,
        McmsSubcommand::Execute(cmd) => cmd.run().await,
        McmsSubcommand::SetConfig(cmd) => cmd.run().await,
    }
}

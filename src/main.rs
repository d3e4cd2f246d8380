use anyhow::Context;
use dart_gateway::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::Cli::run().await.context("dart-gateway failed")
}

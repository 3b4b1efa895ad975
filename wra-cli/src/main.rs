//! WRA CLI - Command line tool for weather risk analysis.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "wra-cli",
    version,
    about = "Probability that the weather crosses a threshold, day by day"
)]
struct Cli {
    #[command(subcommand)]
    command: wra_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    wra_cmd::run(cli.command).await
}

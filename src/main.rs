// serialsh - Serial console automation for embedded devices
use anyhow::Context;
use clap::Parser;
use serialsh::cli::{execute_command, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let succeeded = execute_command(args).await.context("serialsh failed")?;
    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

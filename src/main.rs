use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod generator;
mod llm;
mod types;

use crate::generator::workflow::launch;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let config = args.to_config();
    let request = args.to_request()?;

    let outcome = launch(&config, &request).await?;

    if !outcome.success {
        eprintln!("❌ {}", outcome.message);
        std::process::exit(1);
    }

    println!(
        "✅ 行程生成完成，耗时{:.2}秒",
        outcome.processing_time
    );
    Ok(())
}

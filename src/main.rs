use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    shelfscrape::logging::init().context("init logging")?;

    let cli = shelfscrape::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        shelfscrape::cli::Command::Run(args) => {
            shelfscrape::pipeline::run(args).await.context("run")?;
        }
        shelfscrape::cli::Command::Parse(args) => {
            shelfscrape::extract::run(args).context("parse")?;
        }
        shelfscrape::cli::Command::Rating(args) => {
            shelfscrape::rating::run(args).context("rating")?;
        }
        shelfscrape::cli::Command::Prompt(args) => {
            shelfscrape::prompt::run(args).context("prompt")?;
        }
    }

    Ok(())
}

//! corpuslint CLI: lint a tree of course lessons and READMEs.
//!
//! Reports broken relative links, malformed front-matter, and README counts
//! that disagree with the files on disk.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    let code = commands::run(cli).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

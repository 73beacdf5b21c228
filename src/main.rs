use anyhow::Result;
use clap::Parser;

use hello_parallel::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}

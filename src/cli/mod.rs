//! Command-line interface for hello-parallel
//!
//! The program takes no required arguments. Flags only adjust team size and
//! diagnostics, which are written to stderr so stdout carries nothing but greetings.

use anyhow::Result;
use clap::Parser;

use crate::config::HelloConfig;
use crate::greeter;
use crate::parallel::TeamSize;

#[derive(Parser, Debug)]
#[command(
    name = "hello-parallel",
    version = env!("CARGO_PKG_VERSION"),
    about = "Print a greeting from every thread of a parallel team",
    long_about = "Forks a team of worker threads sized to the machine (or to --threads, \
                  the configuration, or OMP_NUM_THREADS). Each worker prints \
                  'Hello from thread <index>' inside a critical section."
)]
pub struct Cli {
    /// Number of worker threads (overrides configuration and OMP_NUM_THREADS)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(usize))]
    pub threads: Option<usize>,

    /// Increase diagnostic verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all diagnostics
    #[arg(short, long)]
    pub quiet: bool,

    /// Use custom configuration file instead of ./hello-parallel.toml
    #[arg(long, value_name = "FILE", env = "HELLO_PARALLEL_CONFIG")]
    pub config: Option<String>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);

        let config = HelloConfig::load(self.config.as_deref())?;
        let team = TeamSize::resolve(self.threads, &config.team);
        let report = greeter::greet_stdout(team)?;

        tracing::debug!(
            "Region finished: {} workers, {:?}",
            report.workers,
            report.strategy
        );
        Ok(())
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

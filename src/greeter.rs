//! The parallel greeting: every worker of the team prints one line with its index

use anyhow::Result;
use std::io::Write;

use crate::parallel::{Critical, ExecutionStrategy, TeamSize};

/// Summary of a completed greeting region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreetReport {
    pub workers: usize,
    pub strategy: ExecutionStrategy,
}

/// Line printed by the worker with index `thread_num`
pub fn greeting(thread_num: usize) -> String {
    format!("Hello from thread {thread_num}")
}

/// Run one parallel region in which each worker writes its greeting to `out`
///
/// Line order across workers is unspecified. Returns once every worker has rejoined.
pub fn greet<W: Write + Send>(strategy: ExecutionStrategy, out: &Critical<W>) -> Result<GreetReport> {
    strategy.run(|ctx| out.write_line(&greeting(ctx.thread_num())))?;

    Ok(GreetReport {
        workers: strategy.workers(),
        strategy,
    })
}

/// Greet from a team of the resolved size, writing to standard output
pub fn greet_stdout(team: TeamSize) -> Result<GreetReport> {
    tracing::info!("Team size {} ({})", team.workers, team.source);
    let strategy = ExecutionStrategy::for_team(team.workers);
    let stdout = Critical::new(std::io::stdout());
    greet(strategy, &stdout)
}

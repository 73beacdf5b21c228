use anyhow::{Context, Result, anyhow};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use super::context::{BarrierBroken, TeamBarrier, WorkerContext};
use crate::config::TeamConfig;

/// Environment variable the team runtime honors for its default size
pub const RUNTIME_THREADS_ENV: &str = "OMP_NUM_THREADS";

/// Where a team size came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSource {
    /// `--threads` on the command line
    Cli,
    /// `team.num_threads` from a config file or `HELLO_PARALLEL_` variables
    Config,
    /// `OMP_NUM_THREADS`
    RuntimeEnv,
    /// Detected CPU cores
    Hardware,
    /// Parallel execution disabled
    Fallback,
}

impl fmt::Display for SizeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SizeSource::Cli => "command line",
            SizeSource::Config => "configuration",
            SizeSource::RuntimeEnv => RUNTIME_THREADS_ENV,
            SizeSource::Hardware => "hardware",
            SizeSource::Fallback => "parallelism disabled",
        };
        f.write_str(label)
    }
}

/// Resolved number of workers for a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamSize {
    pub workers: usize,
    pub source: SizeSource,
}

impl TeamSize {
    /// Resolve the team size, reading `OMP_NUM_THREADS` from the process environment
    pub fn resolve(cli_threads: Option<usize>, team: &TeamConfig) -> Self {
        let runtime_env = std::env::var(RUNTIME_THREADS_ENV).ok();
        Self::resolve_with(cli_threads, team, runtime_env.as_deref())
    }

    /// Resolve the team size from explicit inputs
    ///
    /// # Precedence
    /// ```text
    /// team.parallel == false  → 1 (Fallback)
    /// --threads N             → N (Cli)
    /// team.num_threads > 0    → team.num_threads (Config)
    /// OMP_NUM_THREADS valid   → its first entry (RuntimeEnv)
    /// otherwise               → calculate_optimal_workers(...) (Hardware)
    /// ```
    pub fn resolve_with(
        cli_threads: Option<usize>,
        team: &TeamConfig,
        runtime_env: Option<&str>,
    ) -> Self {
        if !team.parallel {
            return Self {
                workers: 1,
                source: SizeSource::Fallback,
            };
        }

        if let Some(workers) = cli_threads.filter(|n| *n > 0) {
            return Self {
                workers,
                source: SizeSource::Cli,
            };
        }

        if team.num_threads > 0 {
            return Self {
                workers: team.num_threads,
                source: SizeSource::Config,
            };
        }

        if let Some(raw) = runtime_env {
            match parse_runtime_threads(raw) {
                Some(workers) => {
                    return Self {
                        workers,
                        source: SizeSource::RuntimeEnv,
                    };
                }
                None => tracing::warn!("Ignoring invalid {}={:?}", RUNTIME_THREADS_ENV, raw),
            }
        }

        Self {
            workers: ExecutionStrategy::calculate_optimal_workers(
                team.max_threads,
                team.thread_percentage,
            ),
            source: SizeSource::Hardware,
        }
    }
}

/// Parse an `OMP_NUM_THREADS` value
///
/// The variable may hold a comma-separated list for nested regions; only the
/// outermost (first) entry applies here. Zero and non-numeric values are rejected.
pub fn parse_runtime_threads(value: &str) -> Option<usize> {
    value
        .split(',')
        .next()?
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
}

/// Breaks the team barrier when a worker leaves without finishing its body
struct Departure<'b> {
    barrier: &'b TeamBarrier,
    armed: bool,
}

impl Drop for Departure<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.barrier.break_barrier();
        }
    }
}

/// How a parallel region is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// One worker (index 0) on the calling thread
    Sequential,
    /// `workers` scoped threads, joined before the region returns
    Parallel { workers: usize },
}

impl ExecutionStrategy {
    /// Pick the strategy for a team of `size` workers
    ///
    /// ```rust
    /// use hello_parallel::parallel::ExecutionStrategy;
    ///
    /// assert_eq!(ExecutionStrategy::for_team(1), ExecutionStrategy::Sequential);
    /// assert_eq!(ExecutionStrategy::for_team(0), ExecutionStrategy::Sequential);
    /// assert_eq!(
    ///     ExecutionStrategy::for_team(4),
    ///     ExecutionStrategy::Parallel { workers: 4 }
    /// );
    /// ```
    pub fn for_team(size: usize) -> Self {
        if size > 1 {
            ExecutionStrategy::Parallel { workers: size }
        } else {
            ExecutionStrategy::Sequential
        }
    }

    /// Number of workers the region will run
    pub fn workers(&self) -> usize {
        match self {
            ExecutionStrategy::Sequential => 1,
            ExecutionStrategy::Parallel { workers } => *workers,
        }
    }

    /// Run `body` once on every worker of the team and wait for all of them
    ///
    /// Every worker rejoins before this returns. A worker that returns an error or
    /// panics breaks the team barrier so teammates waiting in
    /// [`WorkerContext::barrier`] are released instead of hanging. The reported error
    /// is the first root cause; [`BarrierBroken`] errors of released teammates are
    /// only reported when nothing else failed.
    pub fn run<F>(&self, body: F) -> Result<()>
    where
        F: Fn(&WorkerContext<'_>) -> Result<()> + Sync,
    {
        match *self {
            ExecutionStrategy::Sequential => {
                tracing::debug!("Running region sequentially");
                panic::catch_unwind(AssertUnwindSafe(|| body(&WorkerContext::sequential())))
                    .unwrap_or_else(|_| Err(anyhow!("Worker 0 panicked")))
            }
            ExecutionStrategy::Parallel { workers } => Self::fork_join(workers, &body),
        }
    }

    fn fork_join<F>(workers: usize, body: &F) -> Result<()>
    where
        F: Fn(&WorkerContext<'_>) -> Result<()> + Sync,
    {
        tracing::debug!("Forking team of {} workers", workers);
        let barrier = TeamBarrier::new(workers);
        let barrier = &barrier;

        crossbeam::thread::scope(|s| -> Result<()> {
            let mut handles = Vec::with_capacity(workers);
            for thread_num in 0..workers {
                let spawned = s
                    .builder()
                    .name(format!("worker-{thread_num}"))
                    .spawn(move |_| {
                        tracing::trace!("Worker {} started", thread_num);
                        let mut departure = Departure {
                            barrier,
                            armed: true,
                        };
                        let result = body(&WorkerContext::new(thread_num, workers, Some(barrier)));
                        departure.armed = result.is_err();
                        result
                    });

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        // Workers already running would wait for this one forever
                        barrier.break_barrier();
                        return Err(e).with_context(|| format!("Failed to spawn worker {thread_num}"));
                    }
                }
            }

            // Join barrier: every worker rejoins before the region ends
            let mut first_error: Option<anyhow::Error> = None;
            for (thread_num, handle) in handles.into_iter().enumerate() {
                let outcome = match handle.join() {
                    Ok(result) => result,
                    Err(_) => Err(anyhow!("Worker {thread_num} panicked")),
                };
                if let Err(e) = outcome {
                    tracing::debug!("Worker {} failed: {:#}", thread_num, e);
                    let replace = match &first_error {
                        None => true,
                        Some(current) => current.is::<BarrierBroken>() && !e.is::<BarrierBroken>(),
                    };
                    if replace {
                        first_error = Some(e);
                    }
                }
            }

            tracing::debug!("Team of {} workers joined", workers);
            first_error.map_or(Ok(()), Err)
        })
        .map_err(|_| anyhow!("Thread panic occurred during parallel region"))?
    }

    /// Calculate the team size from system resources and configuration limits
    ///
    /// # Algorithm
    /// ```text
    /// 1. Detect available CPU cores: num_cpus::get()
    /// 2. Apply percentage: cores * thread_percentage / 100
    /// 3. Apply config limit: min(max_threads_config, percentage_result) if max_threads_config > 0
    /// 4. Ensure minimum: max(1, final_result)
    /// ```
    ///
    /// ```rust
    /// use hello_parallel::parallel::ExecutionStrategy;
    ///
    /// let workers = ExecutionStrategy::calculate_optimal_workers(0, 100);
    /// assert!(workers >= 1);
    ///
    /// let workers = ExecutionStrategy::calculate_optimal_workers(2, 100);
    /// assert!(workers <= 2);
    /// ```
    pub fn calculate_optimal_workers(max_threads_config: usize, thread_percentage: u8) -> usize {
        let available_cores = num_cpus::get();
        let percentage = thread_percentage.clamp(1, 100) as usize;

        let workers_by_percentage = std::cmp::max(1, (available_cores * percentage) / 100);

        if max_threads_config > 0 {
            std::cmp::min(max_threads_config, workers_by_percentage)
        } else {
            workers_by_percentage
        }
    }
}

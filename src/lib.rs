//! # hello-parallel - a greeting from every thread
//!
//! Forks a team of worker threads, lets each one look up its own index and print
//! `Hello from thread <index>` inside a critical section, then joins the team
//! and exits.
//!
//! ## Quick Start
//!
//! ```bash
//! # One line per CPU core
//! hello-parallel
//!
//! # Fixed team size
//! hello-parallel --threads 4
//! OMP_NUM_THREADS=4 hello-parallel
//! HELLO_PARALLEL_TEAM__NUM_THREADS=4 hello-parallel
//! ```
//!
//! ## Library Usage
//!
//! ```rust
//! use hello_parallel::greeter::greet;
//! use hello_parallel::parallel::{Critical, ExecutionStrategy};
//!
//! let out = Critical::new(Vec::new());
//! let report = greet(ExecutionStrategy::for_team(3), &out)?;
//! assert_eq!(report.workers, 3);
//!
//! let text = String::from_utf8(out.into_inner()?)?;
//! assert_eq!(text.lines().count(), 3);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod greeter;
pub mod parallel;

pub use cli::Cli;
pub use config::HelloConfig;

/// Result type alias for hello-parallel operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

//! Fork/join thread teams
//!
//! This module provides the parallel region the greeter runs in: a team of workers
//! that all execute the same block once, each with its own index, and that all
//! rejoin before the region returns.
//!
//! # Architecture Responsibilities
//!
//! ## What This Module Does:
//! - **Resource Discovery**: Detects available CPU cores using `num_cpus::get()`
//! - **Team Sizing**: Applies CLI, configuration and runtime overrides to pick a team size
//! - **Execution Strategy**: Sequential (single worker, calling thread) vs Parallel (scoped threads)
//! - **Mutual Exclusion**: A critical section around a shared writer
//!
//! ## What This Module Does NOT Do:
//! - **Work Distribution**: Every worker runs the same block; nothing is split or queued
//! - **Pool Reuse**: Threads live exactly as long as one region
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │   Client        │    │   Parallel       │    │   System        │
//! │   (Greeter)     │───▶│   Module         │───▶│   Resources     │
//! │                 │    │                  │    │                 │
//! │ • Per-worker    │    │ • Team size      │    │ • CPU cores     │
//! │   body          │    │ • Fork / join    │    │ • OMP_NUM_      │
//! │ • Output text   │    │ • Critical       │    │   THREADS       │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use hello_parallel::parallel::{Critical, ExecutionStrategy};
//!
//! let out = Critical::new(Vec::new());
//! let strategy = ExecutionStrategy::Parallel { workers: 4 };
//! strategy
//!     .run(|ctx| out.write_line(&format!("worker {}", ctx.thread_num())))
//!     .unwrap();
//!
//! let text = String::from_utf8(out.into_inner().unwrap()).unwrap();
//! assert_eq!(text.lines().count(), 4);
//! ```

pub mod context;
pub mod core;
pub mod critical;

pub use context::{BarrierBroken, WorkerContext};
pub use self::core::{ExecutionStrategy, SizeSource, TeamSize};
pub use critical::Critical;

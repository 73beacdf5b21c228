use anyhow::{Result, anyhow};
use std::fmt;
use std::sync::{Condvar, Mutex};

/// Returned by [`WorkerContext::barrier`] when a teammate left the region early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierBroken;

impl fmt::Display for BarrierBroken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Team barrier broken: a worker left the region before reaching it")
    }
}

impl std::error::Error for BarrierBroken {}

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    broken: bool,
}

/// Reusable barrier for one team that can be broken when a worker fails
///
/// Once broken, every current and future `wait` returns [`BarrierBroken`].
pub(crate) struct TeamBarrier {
    size: usize,
    state: Mutex<BarrierState>,
    released: Condvar,
}

impl TeamBarrier {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            size,
            state: Mutex::new(BarrierState::default()),
            released: Condvar::new(),
        }
    }

    pub(crate) fn wait(&self) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("Team barrier poisoned"))?;
        if state.broken {
            return Err(BarrierBroken.into());
        }

        state.arrived += 1;
        if state.arrived == self.size {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.released.notify_all();
            return Ok(());
        }

        let generation = state.generation;
        let state = self
            .released
            .wait_while(state, |s| s.generation == generation && !s.broken)
            .map_err(|_| anyhow!("Team barrier poisoned"))?;

        // Released by the last arrival, unless the barrier broke first
        if state.generation == generation {
            return Err(BarrierBroken.into());
        }
        Ok(())
    }

    /// Release every waiter with an error
    pub(crate) fn break_barrier(&self) {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !state.broken {
            tracing::debug!("Breaking team barrier");
            state.broken = true;
        }
        self.released.notify_all();
    }
}

/// A worker's view of the region it is running in
pub struct WorkerContext<'r> {
    thread_num: usize,
    num_threads: usize,
    barrier: Option<&'r TeamBarrier>,
}

impl<'r> WorkerContext<'r> {
    pub(crate) fn new(
        thread_num: usize,
        num_threads: usize,
        barrier: Option<&'r TeamBarrier>,
    ) -> Self {
        Self {
            thread_num,
            num_threads,
            barrier,
        }
    }

    /// Context for the lone worker of a sequential region
    pub(crate) fn sequential() -> Self {
        Self::new(0, 1, None)
    }

    /// Zero-based index of this worker within the team
    pub fn thread_num(&self) -> usize {
        self.thread_num
    }

    /// Number of workers in the team
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Whether this is the worker with index 0
    pub fn is_master(&self) -> bool {
        self.thread_num == 0
    }

    /// Block until every worker of the region has reached this point
    ///
    /// Every worker must call it the same number of times. If a teammate returns an
    /// error or panics instead of arriving, waiting workers are released with
    /// [`BarrierBroken`].
    pub fn barrier(&self) -> Result<()> {
        match self.barrier {
            Some(barrier) => barrier.wait(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_sequential_context() {
        let ctx = WorkerContext::sequential();
        assert_eq!(ctx.thread_num(), 0);
        assert_eq!(ctx.num_threads(), 1);
        assert!(ctx.is_master());

        // No barrier in a sequential region, must not block
        ctx.barrier().unwrap();
    }

    #[test]
    fn test_non_master_context() {
        let barrier = TeamBarrier::new(1);
        let ctx = WorkerContext::new(3, 4, Some(&barrier));
        assert_eq!(ctx.thread_num(), 3);
        assert_eq!(ctx.num_threads(), 4);
        assert!(!ctx.is_master());

        // A barrier sized for one returns immediately
        ctx.barrier().unwrap();
    }

    #[test]
    fn test_barrier_is_reusable() {
        let barrier = TeamBarrier::new(3);
        let passed = AtomicUsize::new(0);

        crossbeam::thread::scope(|s| {
            for _ in 0..3 {
                s.spawn(|_| {
                    for round in 1..=5 {
                        barrier.wait().unwrap();
                        passed.fetch_add(1, Ordering::SeqCst);
                        barrier.wait().unwrap();
                        assert_eq!(passed.load(Ordering::SeqCst), round * 3);
                    }
                });
            }
        })
        .unwrap();
    }

    #[test]
    fn test_breaking_releases_waiters() {
        let barrier = TeamBarrier::new(3);

        crossbeam::thread::scope(|s| {
            let waiters: Vec<_> = (0..2).map(|_| s.spawn(|_| barrier.wait())).collect();

            // The third member never arrives
            std::thread::sleep(std::time::Duration::from_millis(50));
            barrier.break_barrier();

            for waiter in waiters {
                let err = waiter.join().unwrap().unwrap_err();
                assert!(err.is::<BarrierBroken>());
            }
        })
        .unwrap();

        // Later arrivals fail immediately
        assert!(barrier.wait().unwrap_err().is::<BarrierBroken>());
    }
}

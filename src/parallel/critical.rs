use anyhow::{Context, Result, anyhow};
use std::io::Write;
use std::sync::Mutex;

/// A writer that at most one worker can use at a time
///
/// Every access goes through [`Critical::with`], so whatever a worker writes inside
/// one call reaches the underlying writer without bytes from another worker in between.
pub struct Critical<W> {
    inner: Mutex<W>,
}

impl<W: Write> Critical<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }

    /// Run `f` while holding exclusive access to the writer
    pub fn with<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut W) -> Result<T>,
    {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("Critical section poisoned by a panicking worker"))?;
        f(&mut guard)
    }

    /// Write `line` plus a newline and flush, all inside the critical section
    pub fn write_line(&self, line: &str) -> Result<()> {
        self.with(|w| {
            writeln!(w, "{line}").context("Failed to write line")?;
            w.flush().context("Failed to flush output")
        })
    }

    /// Take the writer back once no worker holds a reference
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|_| anyhow!("Critical section poisoned by a panicking worker"))
    }
}

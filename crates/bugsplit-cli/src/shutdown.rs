use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tracing::info;

/// Stop flag for the poll loop.
///
/// Waits on this signal return as soon as it is triggered, so the loop does
/// not have to sit out the rest of its interval on Ctrl+C.
pub struct ShutdownSignal {
    shutdown: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            shutdown: AtomicBool::new(false),
            condvar: Condvar::new(),
            mutex: Mutex::new(()),
        }
    }

    /// Create a signal that Ctrl+C triggers
    pub fn install() -> anyhow::Result<Arc<Self>> {
        let shutdown = Arc::new(Self::new());
        let shutdown_ctrlc = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            info!("Received shutdown signal, stopping...");
            shutdown_ctrlc.trigger();
        })?;
        Ok(shutdown)
    }

    /// Trigger the signal, waking all waiters.
    pub fn trigger(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.condvar.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` or until triggered.
    ///
    /// Returns `true` if the signal was triggered.
    pub fn wait(&self, duration: Duration) -> bool {
        if self.is_shutdown() {
            return true;
        }

        let Ok(guard) = self.mutex.lock() else {
            // Poisoned
            return true;
        };
        match self
            .condvar
            .wait_timeout_while(guard, duration, |_| !self.is_shutdown())
        {
            Ok((_, timeout)) => !timeout.timed_out(),
            Err(_) => true,
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

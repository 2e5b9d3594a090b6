//! Per-chain lifecycle: the shutdown broadcast and the fatal-error path
//! that replaces "panic on unrecoverable ledger divergence" with an
//! orderly, observable abort.

use std::sync::Mutex;
use tokio::sync::watch;
use tracing::error;

pub struct Lifecycle {
    shutdown: watch::Sender<bool>,
    fatal: Mutex<Option<String>>,
    abort: Box<dyn Fn(&str) + Send + Sync>,
}

impl Lifecycle {
    /// The default abort hook only logs; a node binary installs one that
    /// exits the process.
    pub fn new() -> Lifecycle {
        Lifecycle::with_abort_hook(Box::new(|reason| error!("fatal: {}", reason)))
    }

    pub fn with_abort_hook(abort: Box<dyn Fn(&str) + Send + Sync>) -> Lifecycle {
        let (shutdown, _) = watch::channel(false);
        Lifecycle { shutdown, fatal: Mutex::new(None), abort }
    }

    /// Fires the shutdown signal. Idempotent: returns `true` only for the
    /// call that actually performed the shutdown.
    pub fn halt(&self) -> bool {
        self.shutdown.send_if_modified(|halted| {
            if *halted {
                false
            } else {
                *halted = true;
                true
            }
        })
    }

    pub fn is_halted(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// A receiver whose `changed()` resolves exactly once, at halt.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Records an unrecoverable failure, halts the chain and invokes the
    /// abort hook.
    pub fn fatal(&self, reason: String) {
        {
            let mut fatal = self.fatal.lock().unwrap();
            if fatal.is_none() {
                *fatal = Some(reason.clone());
            }
        }
        self.halt();
        (self.abort)(&reason);
    }

    pub fn fatal_reason(&self) -> Option<String> {
        self.fatal.lock().unwrap().clone()
    }
}

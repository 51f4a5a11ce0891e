//! The foreground process slot.
//!
//! The launcher owns the child for the duration of one execution and
//! registers a weak reference here. Anything holding a clone of the registry
//! (a signal task, a UI key handler) can then interrupt it from another
//! thread without owning it.

use std::process::Child;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

/// The launcher's handle on a running child.
pub(crate) type SharedChild = Arc<Mutex<Child>>;

const DEFAULT_GRACE: Duration = Duration::from_millis(200);
const GRACE_POLL: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct Slot {
    current: Mutex<Option<Weak<Mutex<Child>>>>,
    grace: Duration,
}

/// Shared single-slot registry of the running foreground process.
#[derive(Clone, Debug)]
pub struct ProcessRegistry {
    slot: Arc<Slot>,
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::with_grace_period(DEFAULT_GRACE)
    }

    /// A registry whose `interrupt()` waits `grace` for a graceful exit
    /// before killing.
    pub fn with_grace_period(grace: Duration) -> Self {
        Self {
            slot: Arc::new(Slot {
                current: Mutex::new(None),
                grace,
            }),
        }
    }

    pub(crate) fn register(&self, child: &SharedChild) {
        let mut current = self.lock_slot();
        if current.as_ref().and_then(Weak::upgrade).is_some() {
            warn!("Replacing a foreground process that is still registered");
        }
        *current = Some(Arc::downgrade(child));
    }

    pub(crate) fn clear(&self) {
        self.lock_slot().take();
    }

    /// Whether a foreground process is registered.
    pub fn is_active(&self) -> bool {
        self.current().is_some()
    }

    /// PID of the registered process, if any.
    pub fn pid(&self) -> Option<u32> {
        self.current().map(|child| lock_child(&child).id())
    }

    /// Terminate the foreground process.
    ///
    /// Asks politely first (SIGTERM on Unix) and escalates to a kill if the
    /// process is still alive after the grace period. Returns `true` if a
    /// live process was signalled.
    pub fn interrupt(&self) -> bool {
        let Some(child) = self.current() else {
            debug!("Interrupt requested with no foreground process");
            return false;
        };
        let mut child = lock_child(&child);

        match child.try_wait() {
            Ok(Some(_)) => return false,
            Ok(None) => {}
            Err(e) => warn!("Failed to poll foreground process before interrupt: {}", e),
        }

        let pid = child.id();
        info!(pid, "Interrupting foreground process");

        if request_termination(pid) {
            let deadline = Instant::now() + self.slot.grace;
            while Instant::now() < deadline {
                if let Ok(Some(_)) = child.try_wait() {
                    debug!(pid, "Foreground process exited after termination request");
                    return true;
                }
                thread::sleep(GRACE_POLL);
            }
            debug!(pid, "Grace period expired, killing");
        }

        if let Err(e) = child.kill() {
            warn!(pid, "Failed to kill foreground process: {}", e);
        }
        true
    }

    fn current(&self) -> Option<SharedChild> {
        self.lock_slot().as_ref().and_then(Weak::upgrade)
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<Weak<Mutex<Child>>>> {
        self.slot.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn lock_child(child: &Mutex<Child>) -> MutexGuard<'_, Child> {
    child.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Send SIGTERM. Returns whether the signal was delivered.
#[cfg(unix)]
fn request_termination(pid: u32) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => true,
        Err(e) => {
            warn!(pid, "Failed to send SIGTERM: {}", e);
            false
        }
    }
}

#[cfg(not(unix))]
fn request_termination(_pid: u32) -> bool {
    false
}

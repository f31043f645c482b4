use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Debug, Default)]
struct GuardState {
    in_flight: bool,
    last_started: Option<Instant>,
}

/// At-most-one-concurrent-run guard with a cooldown window measured from the
/// start of the last run. Absorbs duplicate triggers from re-entrant UI
/// mounts and rapid manual clicks. Best-effort and single-process; it is not
/// a distributed lock.
#[derive(Debug)]
pub struct SyncGuard {
    state: Mutex<GuardState>,
    cooldown: Duration,
}

impl SyncGuard {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: Mutex::new(GuardState::default()),
            cooldown,
        }
    }

    /// Returns a run permit, or `None` when a run is in flight or the
    /// cooldown has not elapsed. Rejection is a silent no-op for the caller,
    /// never an error.
    pub fn try_acquire(&self) -> Option<RunPermit<'_>> {
        let mut state = self.state.lock().expect("sync guard poisoned");
        if state.in_flight {
            debug!("sync trigger rejected: run already in flight");
            return None;
        }
        if let Some(last) = state.last_started {
            if last.elapsed() < self.cooldown {
                debug!("sync trigger rejected: within cooldown window");
                return None;
            }
        }
        state.in_flight = true;
        state.last_started = Some(Instant::now());
        Some(RunPermit { guard: self })
    }

    fn release(&self) {
        let mut state = self.state.lock().expect("sync guard poisoned");
        state.in_flight = false;
    }
}

/// Held for the duration of a run; releasing is automatic on drop so a
/// failed run can still be retried after the cooldown.
#[derive(Debug)]
pub struct RunPermit<'a> {
    guard: &'a SyncGuard,
}

impl Drop for RunPermit<'_> {
    fn drop(&mut self) {
        self.guard.release();
    }
}

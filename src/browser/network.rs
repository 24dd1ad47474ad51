use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// In-flight request bookkeeping fed by CDP network events.
///
/// The page is idle once nothing is in flight and nothing has started or
/// finished for a quiet window.
#[derive(Debug)]
pub struct NetworkTracker {
    state: Mutex<TrackerState>,
}

#[derive(Debug)]
struct TrackerState {
    inflight: HashSet<String>,
    last_change: Instant,
}

impl NetworkTracker {
    pub fn new(now: Instant) -> Self {
        Self {
            state: Mutex::new(TrackerState {
                inflight: HashSet::new(),
                last_change: now,
            }),
        }
    }

    pub fn started(&self, request_id: &str, now: Instant) {
        let mut state = self.lock();
        state.inflight.insert(request_id.to_string());
        state.last_change = now;
    }

    /// Finished or failed. Unknown ids (requests sent before attaching) are ignored.
    pub fn finished(&self, request_id: &str, now: Instant) {
        let mut state = self.lock();
        if state.inflight.remove(request_id) {
            state.last_change = now;
        }
    }

    pub fn inflight(&self) -> usize {
        self.lock().inflight.len()
    }

    pub fn is_idle(&self, now: Instant, quiet: Duration) -> bool {
        let state = self.lock();
        state.inflight.is_empty() && now.saturating_duration_since(state.last_change) >= quiet
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        // a poisoned lock still holds consistent bookkeeping
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

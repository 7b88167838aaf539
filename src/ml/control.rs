// ============================================================
// Layer 5 — Training Run Control (pause / resume)
// ============================================================
// Run state machine shared between the training worker and
// whoever drives it (CLI stdin listener, tests):
//
//   Idle ──begin──▶ Running ◀──resume── Paused
//                     │  └────pause────▶  ▲
//                     ▼                   │
//              Completed | Aborted   (worker blocks here)
//
// The worker calls `wait_while_paused` exactly once before each
// training example. Pausing never interrupts an example that is
// already being processed; it only holds back the next one.
//
// A single parking_lot Mutex guards the state, and one Condvar
// wakes both the blocked worker and anyone waiting for a state.

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::error::{RbmError, RbmResult};

/// Lifecycle of one training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Completed,
    Aborted,
}

impl RunState {
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Running | RunState::Paused)
    }
}

#[derive(Debug)]
struct ControlState {
    run:             RunState,
    /// Pause asked for before the run started
    pause_requested: bool,
    /// Pause once this many examples have been processed
    pause_at:        Option<u64>,
    processed:       u64,
}

#[derive(Debug)]
struct Shared {
    state:   Mutex<ControlState>,
    changed: Condvar,
}

/// Cloneable handle to the pause/resume signal of a training run.
#[derive(Debug, Clone)]
pub struct TrainingControl {
    inner: Arc<Shared>,
}

impl Default for TrainingControl {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingControl {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Shared {
                state: Mutex::new(ControlState {
                    run:             RunState::Idle,
                    pause_requested: false,
                    pause_at:        None,
                    processed:       0,
                }),
                changed: Condvar::new(),
            }),
        }
    }

    pub fn state(&self) -> RunState {
        self.inner.state.lock().run
    }

    /// Examples processed so far in the current run.
    pub fn examples_processed(&self) -> u64 {
        self.inner.state.lock().processed
    }

    /// Hold back the next example. Before a run starts, the run
    /// begins paused. No effect once the run has finished.
    pub fn pause(&self) {
        let mut s = self.inner.state.lock();
        match s.run {
            RunState::Running => {
                s.run = RunState::Paused;
                tracing::info!("Training paused after {} examples", s.processed);
                self.inner.changed.notify_all();
            }
            RunState::Idle => s.pause_requested = true,
            _ => {}
        }
    }

    /// Let a paused run continue with its next example.
    pub fn resume(&self) {
        let mut s = self.inner.state.lock();
        s.pause_requested = false;
        if s.run == RunState::Paused {
            s.run = RunState::Running;
            tracing::info!("Training resumed at example {}", s.processed + 1);
            self.inner.changed.notify_all();
        }
    }

    /// Pause automatically once `n` examples of the run have been
    /// processed (checked at the same suspension point as `pause`).
    pub fn pause_after_examples(&self, n: u64) {
        self.inner.state.lock().pause_at = Some(n);
    }

    /// Block until the run reaches `target` or `timeout` elapses.
    /// Returns whether the state was reached.
    pub fn wait_for_state(&self, target: RunState, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut s = self.inner.state.lock();
        while s.run != target {
            if self.inner.changed.wait_until(&mut s, deadline).timed_out() {
                return s.run == target;
            }
        }
        true
    }

    // ── Worker side ───────────────────────────────────────────────────────────

    /// Enter Running (or Paused if a pause was requested while Idle).
    pub(crate) fn begin(&self) -> RbmResult<()> {
        let mut s = self.inner.state.lock();
        if s.run.is_active() {
            return Err(RbmError::AlreadyRunning);
        }
        s.processed = 0;
        s.run = if s.pause_requested { RunState::Paused } else { RunState::Running };
        s.pause_requested = false;
        self.inner.changed.notify_all();
        Ok(())
    }

    /// The single suspension point: called once before every example.
    pub fn wait_while_paused(&self) {
        let mut s = self.inner.state.lock();
        let due = matches!(s.pause_at, Some(n) if s.processed >= n);
        if due && s.run == RunState::Running {
            s.pause_at = None;
            s.run = RunState::Paused;
            tracing::info!("Training paused after {} examples", s.processed);
            self.inner.changed.notify_all();
        }
        while s.run == RunState::Paused {
            self.inner.changed.wait(&mut s);
        }
    }

    pub(crate) fn example_done(&self) {
        self.inner.state.lock().processed += 1;
    }

    pub(crate) fn finish(&self, outcome: RunState) {
        let mut s = self.inner.state.lock();
        s.run = outcome;
        s.pause_at = None;
        self.inner.changed.notify_all();
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_starts_idle() {
        let c = TrainingControl::new();
        assert_eq!(c.state(), RunState::Idle);
        assert_eq!(c.examples_processed(), 0);
    }

    #[test]
    fn test_pause_and_resume_toggle_state() {
        let c = TrainingControl::new();
        c.begin().unwrap();
        c.pause();
        assert_eq!(c.state(), RunState::Paused);
        c.resume();
        assert_eq!(c.state(), RunState::Running);
    }

    #[test]
    fn test_pause_before_begin_starts_paused() {
        let c = TrainingControl::new();
        c.pause();
        assert_eq!(c.state(), RunState::Idle);
        c.begin().unwrap();
        assert_eq!(c.state(), RunState::Paused);
    }

    #[test]
    fn test_second_begin_rejected() {
        let c = TrainingControl::new();
        c.begin().unwrap();
        assert!(matches!(c.begin(), Err(RbmError::AlreadyRunning)));
        c.finish(RunState::Completed);
        assert!(c.begin().is_ok());
    }

    #[test]
    fn test_pause_after_finish_is_ignored() {
        let c = TrainingControl::new();
        c.begin().unwrap();
        c.finish(RunState::Completed);
        c.pause();
        assert_eq!(c.state(), RunState::Completed);
    }

    #[test]
    fn test_worker_blocks_until_resumed() {
        let c = TrainingControl::new();
        c.begin().unwrap();
        c.pause();

        let worker = {
            let c = c.clone();
            thread::spawn(move || {
                c.wait_while_paused();
                c.example_done();
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(c.examples_processed(), 0);
        c.resume();
        worker.join().unwrap();
        assert_eq!(c.examples_processed(), 1);
    }

    #[test]
    fn test_scheduled_pause() {
        let c = TrainingControl::new();
        c.begin().unwrap();
        c.pause_after_examples(2);
        for _ in 0..2 {
            c.wait_while_paused();
            c.example_done();
        }
        let worker = {
            let c = c.clone();
            thread::spawn(move || c.wait_while_paused())
        };
        assert!(c.wait_for_state(RunState::Paused, Duration::from_secs(5)));
        assert_eq!(c.examples_processed(), 2);
        c.resume();
        worker.join().unwrap();
    }

    #[test]
    fn test_wait_for_state_times_out() {
        let c = TrainingControl::new();
        assert!(!c.wait_for_state(RunState::Completed, Duration::from_millis(10)));
    }
}

//! Timer capability
//!
//! The controller never sleeps. It asks a [`Scheduler`] for the native
//! text track poll interval and the live playlist reload timer, and the
//! owner of the controller calls back into it when they fire.

use std::time::Duration;
use tokio::time::Instant;

pub trait Scheduler {
    /// Start (or restart) the native text track poll interval
    fn start_polling(&mut self, every: Duration);

    fn stop_polling(&mut self);

    /// Arm the one-shot reload timer, replacing a pending one
    fn schedule_reload(&mut self, after: Duration);

    fn cancel_reload(&mut self);
}

/// Timer requests recorded for the async runtime loop
#[derive(Debug, Default)]
pub struct TimerState {
    poll_every: Option<Duration>,
    poll_epoch: u64,
    reload_at: Option<Instant>,
}

impl TimerState {
    pub fn poll_every(&self) -> Option<Duration> {
        self.poll_every
    }

    /// Bumped on every poll start/stop so the loop knows to rebuild its interval
    pub fn poll_epoch(&self) -> u64 {
        self.poll_epoch
    }

    pub fn reload_deadline(&self) -> Option<Instant> {
        self.reload_at
    }
}

impl Scheduler for TimerState {
    fn start_polling(&mut self, every: Duration) {
        self.poll_every = Some(every);
        self.poll_epoch += 1;
    }

    fn stop_polling(&mut self) {
        if self.poll_every.take().is_some() {
            self.poll_epoch += 1;
        }
    }

    fn schedule_reload(&mut self, after: Duration) {
        self.reload_at = Some(Instant::now() + after);
    }

    fn cancel_reload(&mut self) {
        self.reload_at = None;
    }
}

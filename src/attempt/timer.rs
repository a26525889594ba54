// src/attempt/timer.rs

use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Outcome of a single countdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Decremented; this many seconds remain.
    Running(u32),
    /// This step reached zero.
    Expired,
    /// Already expired earlier; nothing happened.
    Finished,
}

/// Countdown state without any scheduling attached.
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: u32,
    expired: bool,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Self {
            remaining: seconds,
            expired: false,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Decrements once. Reports `Expired` on exactly one call, then `Finished` forever.
    /// A countdown created with zero seconds expires on its first step.
    pub fn tick(&mut self) -> Tick {
        if self.expired {
            return Tick::Finished;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            Tick::Expired
        } else {
            Tick::Running(self.remaining)
        }
    }
}

/// Once-per-second countdown running on the tokio timer.
///
/// `on_tick` receives the remaining seconds after every decrement (including the
/// final `0`); `on_expire` runs right after that final tick, at most once.
/// Dropping the timer stops it.
#[derive(Debug, Default)]
pub struct Timer {
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    pub fn start<T, E>(initial_seconds: u32, on_tick: T, on_expire: E) -> Self
    where
        T: FnMut(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        Self::start_with_period(initial_seconds, TICK_PERIOD, on_tick, on_expire)
    }

    pub fn start_with_period<T, E>(
        initial_seconds: u32,
        period: Duration,
        mut on_tick: T,
        on_expire: E,
    ) -> Self
    where
        T: FnMut(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut countdown = Countdown::new(initial_seconds);
            let mut on_expire = Some(on_expire);
            let mut interval = interval_at(Instant::now() + period, period);
            // Missed ticks are delivered back to back so the countdown tracks wall time.
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

            loop {
                interval.tick().await;
                match countdown.tick() {
                    Tick::Running(remaining) => on_tick(remaining),
                    Tick::Expired => {
                        on_tick(0);
                        if let Some(expire) = on_expire.take() {
                            expire();
                        }
                        break;
                    }
                    Tick::Finished => break,
                }
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    /// Cancels future ticks. Safe to call repeatedly and after expiry.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}

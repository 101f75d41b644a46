// src/quiz/timer.rs

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;

use tokio::{
    runtime::Handle,
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

const TICK: Duration = Duration::from_secs(1);

/// A once-per-second counter running on its own task.
///
/// The task is aborted when the timer is dropped, so whoever owns the timer
/// owns its lifetime.
pub struct TickTimer {
    value: Arc<AtomicU64>,
    handle: JoinHandle<()>,
}

impl TickTimer {
    /// Counts seconds up from zero. `None` outside a tokio runtime.
    pub fn count_up() -> Option<Self> {
        let Ok(runtime) = Handle::try_current() else {
            tracing::debug!("No tokio runtime, question clock disabled");
            return None;
        };
        let value = Arc::new(AtomicU64::new(0));
        let counter = value.clone();
        let handle = runtime.spawn(async move {
            let mut ticks = interval_at(Instant::now() + TICK, TICK);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });
        Some(Self { value, handle })
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Whole-quiz countdown. Flips its watch channel to `true` when time is up.
pub struct Countdown {
    remaining: Arc<AtomicU64>,
    expired: watch::Receiver<bool>,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Starts counting down from `seconds`. `None` outside a tokio runtime.
    pub fn start(seconds: u64) -> Option<Self> {
        let Ok(runtime) = Handle::try_current() else {
            tracing::debug!("No tokio runtime, quiz countdown disabled");
            return None;
        };
        let remaining = Arc::new(AtomicU64::new(seconds));
        let (tx, expired) = watch::channel(seconds == 0);
        let counter = remaining.clone();
        let handle = runtime.spawn(async move {
            if seconds == 0 {
                return;
            }
            let mut ticks = interval_at(Instant::now() + TICK, TICK);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let left = counter.fetch_sub(1, Ordering::Relaxed) - 1;
                if left == 0 {
                    tracing::debug!("Quiz countdown expired");
                    let _ = tx.send(true);
                    break;
                }
            }
        });
        Some(Self {
            remaining,
            expired,
            handle,
        })
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Relaxed)
    }

    pub fn is_expired(&self) -> bool {
        *self.expired.borrow()
    }

    /// A receiver that turns `true` once time runs out.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.expired.clone()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn counts_up_once_per_second() {
        let timer = TickTimer::count_up().unwrap();
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(timer.value(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_stops_the_task() {
        let timer = TickTimer::count_up().unwrap();
        let value = timer.value.clone();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        drop(timer);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(value.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_signals_expiry() {
        let countdown = Countdown::start(2).unwrap();
        let mut expired = countdown.subscribe();
        assert!(!countdown.is_expired());

        tokio::time::sleep(Duration::from_millis(1_200)).await;
        assert_eq!(countdown.remaining(), 1);

        expired.wait_for(|done| *done).await.unwrap();
        assert_eq!(countdown.remaining(), 0);
        assert!(countdown.is_expired());
    }

    #[test]
    fn timers_need_a_runtime() {
        assert!(TickTimer::count_up().is_none());
        assert!(Countdown::start(10).is_none());
    }
}

//! Change notification coalescer
//!
//! Two independent trailing-debounce timers batch registry mutations:
//! a "data changed" timer (labels, descriptions, toggles, user buttons) and a
//! faster "value changed" timer (fader/pan values and value text).
//!
//! # Debouncing Strategy
//!
//! Each timer is a deadline, not a framework timer. Scheduling a change moves
//! the deadline to `now + window`; a periodic tick fires every timer whose
//! deadline has passed and clears it. A burst of N mutations inside the window
//! therefore produces exactly one notification, `window` after the last one.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::trace;

/// Default quiet period for the "data changed" timer
pub const DEFAULT_DATA_DEBOUNCE_MS: u64 = 50;

/// Default quiet period for the "value changed" timer
pub const DEFAULT_VALUE_DEBOUNCE_MS: u64 = 20;

/// Notification classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Labels, descriptions, property toggles, user labels/values
    Data,
    /// Fader/pan value and value text
    Value,
}

type Listener = Arc<dyn Fn(ChangeKind) + Send + Sync>;

/// Single-shot trailing debounce expressed as a deadline
#[derive(Debug, Clone)]
pub struct Debounce {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Push the deadline out to `now + window`
    pub fn restart(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Returns true exactly once per armed deadline, once `now` has reached it
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Process-wide pair of debounce timers with subscriber fan-out
pub struct ChangeCoalescer {
    data: Mutex<Debounce>,
    value: Mutex<Debounce>,
    listeners: RwLock<Vec<Listener>>,
}

impl ChangeCoalescer {
    /// Create a coalescer with explicit windows
    pub fn new(data_window: Duration, value_window: Duration) -> Self {
        Self {
            data: Mutex::new(Debounce::new(data_window)),
            value: Mutex::new(Debounce::new(value_window)),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Schedule a notification of the given class
    pub fn schedule(&self, kind: ChangeKind) {
        self.schedule_at(kind, Instant::now());
    }

    /// Schedule relative to an explicit instant (used by the tick loop and tests)
    pub fn schedule_at(&self, kind: ChangeKind, now: Instant) {
        self.timer(kind).lock().restart(now);
    }

    pub fn is_pending(&self, kind: ChangeKind) -> bool {
        self.timer(kind).lock().is_pending()
    }

    /// Register a listener invoked on every fired notification
    ///
    /// Listeners run on the tick task and must not block.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(ChangeKind) + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Fire every expired timer and return what fired
    pub fn tick(&self, now: Instant) -> Vec<ChangeKind> {
        let mut fired = Vec::with_capacity(2);
        for kind in [ChangeKind::Data, ChangeKind::Value] {
            // Lock is released before listeners run
            let expired = self.timer(kind).lock().poll(now);
            if expired {
                fired.push(kind);
            }
        }

        if !fired.is_empty() {
            let listeners: Vec<Listener> = self.listeners.read().clone();
            for kind in &fired {
                trace!("Change notification fired: {:?}", kind);
                for listener in &listeners {
                    listener(*kind);
                }
            }
        }

        fired
    }

    /// Spawn the tick loop on the current Tokio runtime
    pub fn spawn_ticker(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let coalescer = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                coalescer.tick(Instant::now());
            }
        })
    }

    fn timer(&self, kind: ChangeKind) -> &Mutex<Debounce> {
        match kind {
            ChangeKind::Data => &self.data,
            ChangeKind::Value => &self.value,
        }
    }
}

impl Default for ChangeCoalescer {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_DATA_DEBOUNCE_MS),
            Duration::from_millis(DEFAULT_VALUE_DEBOUNCE_MS),
        )
    }
}

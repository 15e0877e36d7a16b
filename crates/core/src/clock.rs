//! Session clock - the per-question answer countdown
//!
//! A countdown runs as a tokio task that posts one [`ClockEvent::Tick`] per
//! second and a single [`ClockEvent::Expired`] when the time runs out. Every
//! countdown is stamped with a generation number; events from a cancelled or
//! replaced countdown are discarded by [`SessionClock::next_event`], so
//! nothing leaks out after `cancel()` even if it was already queued.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::trace;

/// Seconds allowed per question
pub const QUESTION_SECONDS: u32 = 10;

const TICK: Duration = Duration::from_secs(1);

/// Event produced by a running countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// Seconds left on the countdown
    Tick { remaining: u32 },
    /// The countdown reached zero
    Expired,
}

/// Something that can run a single answer countdown.
///
/// Starting a countdown replaces any countdown already running.
pub trait Countdown {
    fn start(&mut self, seconds: u32);
    fn cancel(&mut self);
    fn is_running(&self) -> bool;
}

struct Stamped {
    generation: u64,
    event: ClockEvent,
}

/// Tokio-backed countdown timer
pub struct SessionClock {
    tx: mpsc::UnboundedSender<Stamped>,
    rx: mpsc::UnboundedReceiver<Stamped>,
    task: Option<JoinHandle<()>>,
    generation: u64,
    running: bool,
    deadline: Option<Instant>,
}

impl SessionClock {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            task: None,
            generation: 0,
            running: false,
            deadline: None,
        }
    }

    /// When the running countdown expires
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Wait for the next event of the current countdown.
    ///
    /// Pending forever while no countdown is running. Cancel-safe, so it can
    /// sit in a `tokio::select!` loop.
    pub async fn next_event(&mut self) -> ClockEvent {
        loop {
            // The clock holds its own sender, so the channel never closes
            let Some(stamped) = self.rx.recv().await else {
                return std::future::pending().await;
            };

            if stamped.generation != self.generation || !self.running {
                trace!(generation = stamped.generation, "Discarding stale clock event");
                continue;
            }

            if stamped.event == ClockEvent::Expired {
                self.running = false;
                self.deadline = None;
                self.task = None;
            }
            return stamped.event;
        }
    }

    fn stop_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown for SessionClock {
    fn start(&mut self, seconds: u32) {
        self.stop_task();
        self.generation += 1;
        self.running = true;
        self.deadline = Some(Instant::now() + TICK * seconds);

        trace!(generation = self.generation, seconds, "Countdown started");
        self.task = Some(tokio::spawn(countdown(
            self.generation,
            seconds,
            self.tx.clone(),
        )));
    }

    fn cancel(&mut self) {
        if self.running {
            trace!(generation = self.generation, "Countdown cancelled");
        }
        self.stop_task();
        self.running = false;
        self.deadline = None;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        self.stop_task();
    }
}

/// Countdown task body
async fn countdown(generation: u64, seconds: u32, tx: mpsc::UnboundedSender<Stamped>) {
    let send = |event| tx.send(Stamped { generation, event }).is_ok();

    if seconds == 0 {
        send(ClockEvent::Expired);
        return;
    }

    if !send(ClockEvent::Tick { remaining: seconds }) {
        return;
    }

    let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
    let mut remaining = seconds;
    while remaining > 0 {
        ticker.tick().await;
        remaining -= 1;
        let event = if remaining == 0 {
            ClockEvent::Expired
        } else {
            ClockEvent::Tick { remaining }
        };
        if !send(event) {
            return;
        }
    }
}

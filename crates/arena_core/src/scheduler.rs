//! Real-time driver: runs a world at the fixed tick rate.
//!
//! The loop is a classic accumulator: wall-clock time since the last
//! pass is added to a lag budget and one tick runs per full period in
//! it. A slow tick makes the next pass run several ticks back to back
//! until the schedule has caught up; ticks are never skipped. Pacing
//! only decides WHEN ticks run, never what they compute, so a paced
//! run and a tight scripted loop produce identical worlds.
//!
//! Renderers attach through a frame tap, a rendezvous channel the
//! scheduler offers a fresh snapshot to after each burst of ticks. A
//! consumer that is busy misses that frame and picks up a newer one;
//! the scheduler never waits for it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::world::{InputFeed, World, WorldSnapshot, TICKS_PER_SECOND};

/// Ticks between two progress log lines.
const PROGRESS_LOG_INTERVAL: u64 = 200;

/// Clonable switch that makes a running scheduler return.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Ask the scheduler to stop after the current tick.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Owns a world and steps it at [`TICKS_PER_SECOND`].
pub struct Scheduler {
    world: World,
    period: Duration,
    max_ticks: u64,
    stop: Arc<AtomicBool>,
    frame_tx: Option<Sender<WorldSnapshot>>,
}

impl Scheduler {
    /// Wrap a world for paced execution.
    #[must_use]
    pub fn new(world: World) -> Self {
        Self {
            world,
            period: Duration::from_secs(1) / TICKS_PER_SECOND,
            max_ticks: 0,
            stop: Arc::new(AtomicBool::new(false)),
            frame_tx: None,
        }
    }

    /// Stop automatically once this many ticks have run. Zero means
    /// run until stopped.
    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// The scheduled world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access, for collision rules before the run.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// A switch that stops the loop from another thread.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::clone(&self.stop),
        }
    }

    /// Key event sender for the scheduled world.
    #[must_use]
    pub fn input_feed(&self) -> InputFeed {
        self.world.input_feed()
    }

    /// Attach a frame consumer and get its end of the tap.
    ///
    /// The tap is a rendezvous: a snapshot is handed over only when
    /// the consumer is already waiting in `recv`, otherwise it is
    /// dropped. Attaching again replaces the previous tap.
    pub fn frames(&mut self) -> Receiver<WorldSnapshot> {
        let (tx, rx) = bounded(0);
        self.frame_tx = Some(tx);
        rx
    }

    /// Run the loop on the calling thread until stopped or the tick
    /// limit is reached, then hand the world back.
    pub fn run(mut self) -> World {
        tracing::info!(
            scenario = %self.world.name(),
            tick_rate = TICKS_PER_SECOND,
            max_ticks = self.max_ticks,
            "scheduler started"
        );

        let mut previous = Instant::now();
        let mut lag = Duration::ZERO;
        while !self.finished() {
            let now = Instant::now();
            lag += now - previous;
            previous = now;

            let mut ticked = false;
            while lag >= self.period && !self.finished() {
                self.step();
                ticked = true;
                lag -= self.period;
            }
            if ticked {
                self.offer_frame();
            }

            let wait = self.period.saturating_sub(lag);
            if !wait.is_zero() && !self.finished() {
                std::thread::sleep(wait);
            }
        }

        tracing::info!(ticks = self.world.tick_count(), "scheduler stopped");
        self.world
    }

    fn finished(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
            || (self.max_ticks != 0 && self.world.tick_count() >= self.max_ticks)
    }

    fn step(&mut self) {
        let tick_start = Instant::now();
        self.world.tick();

        let spent = tick_start.elapsed();
        if spent > self.period {
            tracing::warn!(
                tick = self.world.tick_count(),
                elapsed_ms = spent.as_millis() as u64,
                budget_ms = self.period.as_millis() as u64,
                "tick overran its slot"
            );
        }
        if self.world.tick_count() % PROGRESS_LOG_INTERVAL == 0 {
            tracing::debug!(tick = self.world.tick_count(), "simulation progress");
        }
    }

    fn offer_frame(&self) {
        if let Some(tx) = &self.frame_tx {
            let _ = tx.try_send(self.world.snapshot());
        }
    }
}

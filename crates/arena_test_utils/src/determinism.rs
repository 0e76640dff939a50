//! Determinism testing utilities.
//!
//! Harnesses for verifying that a world produces identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! Recordings only replay if every run of the same inputs hashes the
//! same. Sources of non-determinism include:
//!
//! - **Controller workers**: policies run on their own threads and
//!   publish commands at unpredictable times. Scripted ticks never read
//!   worker output, so thread timing cannot leak into the state hash.
//!   Live ticks stay deterministic only when every autopilot command is
//!   timing-independent; the canned fixtures qualify because their
//!   autopiloted agents run idle policies.
//!
//! - **Map iteration order**: the default hasher is randomized. Agents
//!   live in a `Vec` in id order and key latches in a `BTreeMap`, so
//!   nothing iterates an unordered container.
//!
//! - **Float evaluation order**: `f64` operations are exact, so
//!   identical operation order gives identical bits. The tick pipeline
//!   fixes that order.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual step determinism (physics, visibility)
//! 2. **Property tests**: random scripts must still reproduce exactly
//! 3. **Integration tests**: full scenarios reproduce across runs
//! 4. **Parallel tests**: N worlds ticked in parallel all match

use std::thread;

use arena_core::input::KeyEvent;
use arena_core::recording::{replay, Recorder, Recording};
use arena_core::world::{TickInputs, World};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Final state hash from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated per run.
    pub ticks: u64,
}

impl DeterminismResult {
    /// All distinct hashes (one entry for a deterministic run set).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert the runs matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Runs diverged!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel world runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each world.
    pub hashes: Vec<u64>,
    /// Number of ticks each world ran.
    pub ticks: u64,
    /// Number of worlds run.
    pub worlds: usize,
}

impl ParallelRunResult {
    /// Check whether all worlds produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all worlds matched.
    ///
    /// # Panics
    ///
    /// Panics if the worlds produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel worlds diverged!\n\
                 Worlds: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.worlds,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Play a scripted input sequence, one tick per entry.
pub fn run_script(world: &mut World, script: &[TickInputs]) {
    for inputs in script {
        world.tick_scripted(inputs);
    }
}

/// Feed a key-event sequence through live ticks, one entry per tick.
///
/// Events in an entry are buffered before the tick runs, so the world
/// resolves them exactly as a host reporting keys between frames.
pub fn run_key_script(world: &mut World, script: &[Vec<KeyEvent>]) {
    let feed = world.input_feed();
    for events in script {
        for &event in events {
            feed.send(event);
        }
        world.tick();
    }
}

/// Run the same script against `runs` fresh worlds and compare final
/// state hashes.
///
/// # Example
///
/// ```ignore
/// use arena_test_utils::determinism::verify_script_determinism;
/// use arena_test_utils::fixtures;
///
/// let result = verify_script_determinism(
///     5,
///     || fixtures::world_from(fixtures::duel_scenario()),
///     &fixtures::steady_script(100, fixtures::forward_commands(2)),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_script_determinism<F>(
    runs: usize,
    setup: F,
    script: &[TickInputs],
) -> DeterminismResult
where
    F: Fn() -> World,
{
    let mut hashes = Vec::with_capacity(runs);
    for _ in 0..runs {
        let mut world = setup();
        run_script(&mut world, script);
        hashes.push(world.state_hash());
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        ticks: script.len() as u64,
    }
}

/// Run the same key-event script against `runs` fresh worlds through
/// live ticks and compare final state hashes.
///
/// The setup must produce worlds whose autopilot commands are
/// timing-independent, or live ticking itself is non-deterministic and
/// the comparison means nothing.
pub fn verify_key_determinism<F>(
    runs: usize,
    setup: F,
    script: &[Vec<KeyEvent>],
) -> DeterminismResult
where
    F: Fn() -> World,
{
    let mut hashes = Vec::with_capacity(runs);
    for _ in 0..runs {
        let mut world = setup();
        run_key_script(&mut world, script);
        hashes.push(world.state_hash());
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        ticks: script.len() as u64,
    }
}

/// Run `worlds` copies of the same scripted scenario on parallel
/// threads and collect final hashes.
///
/// Catches non-determinism that only shows under thread scheduling
/// variations or memory layout differences.
pub fn run_parallel_scripts<F>(setup: F, script: &[TickInputs], worlds: usize) -> ParallelRunResult
where
    F: Fn() -> World + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..worlds)
            .map(|_| {
                s.spawn(|| {
                    let mut world = setup();
                    run_script(&mut world, script);
                    world.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelRunResult {
        hashes,
        ticks: script.len() as u64,
        worlds,
    }
}

/// Compare two scripted runs tick-by-tick, finding the first
/// divergence.
///
/// Useful for debugging: a failing hash comparison says nothing about
/// when the runs split; this says exactly which tick.
///
/// # Returns
///
/// `None` if both runs match throughout, `Some(tick)` for the first
/// tick whose hashes differ. Tick 0 means the setups already differ.
pub fn find_first_divergence<F>(setup: F, script: &[TickInputs]) -> Option<u64>
where
    F: Fn() -> World,
{
    let mut first = setup();
    let mut second = setup();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for inputs in script {
        first.tick_scripted(inputs);
        second.tick_scripted(inputs);

        if first.state_hash() != second.state_hash() {
            tracing::debug!(tick = first.tick_count(), "scripted runs diverged");
            return Some(first.tick_count());
        }
    }

    None
}

/// Verify that a recorded live run survives the full byte round trip
/// and replays to the same final hash on a fresh world.
///
/// Drives a recorder with the key script, serializes the capture,
/// decodes it and replays it into a second world from the same setup.
pub fn verify_replay_round_trip<F>(setup: F, script: &[Vec<KeyEvent>]) -> bool
where
    F: Fn() -> World,
{
    let mut recorder = Recorder::new(setup());
    let feed = recorder.world().input_feed();
    for events in script {
        for &event in events {
            feed.send(event);
        }
        recorder.tick();
    }
    let (live, recording) = recorder.finish();

    let bytes = match recording.to_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "recording failed to serialize");
            return false;
        }
    };
    let restored = match Recording::from_bytes(&bytes) {
        Ok(restored) => restored,
        Err(e) => {
            tracing::debug!(error = %e, "recording failed to decode");
            return false;
        }
    };

    let mut replayed = setup();
    if let Err(e) = replay(&mut replayed, &restored) {
        tracing::debug!(error = %e, "replay rejected the recording");
        return false;
    }

    replayed.state_hash() == live.state_hash()
}

/// Proptest strategies for determinism testing.
///
/// These generate random but reproducible inputs for property-based
/// tests of scripted and key-driven runs.
pub mod strategies {
    use arena_core::input::{Key, KeyEvent};
    use arena_core::math::Vec2;
    use arena_core::messages::ActionCommand;
    use arena_core::world::TickInputs;
    use proptest::prelude::*;

    /// Keys the generated scripts draw from, the WASD scheme alphabet.
    const SCRIPT_KEYS: [Key; 6] = [Key::W, Key::S, Key::A, Key::D, Key::J, Key::P];

    /// Spawn position clear of the border walls for a default body.
    pub fn arb_position() -> impl Strategy<Value = Vec2> {
        (60.0f64..940.0, 60.0f64..940.0).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// Heading in degrees.
    pub fn arb_angle() -> impl Strategy<Value = f64> {
        0.0f64..360.0
    }

    /// Acceleration command, deliberately exceeding the default body
    /// limits some of the time so clamping is exercised.
    pub fn arb_command() -> impl Strategy<Value = ActionCommand> {
        (-15.0f32..15.0, -15.0f32..15.0).prop_map(|(a, a_alpha)| ActionCommand::new(a, a_alpha))
    }

    /// One command per agent.
    pub fn arb_commands(agents: usize) -> impl Strategy<Value = Vec<ActionCommand>> {
        proptest::collection::vec(arb_command(), agents)
    }

    /// Scripted command input for up to `max_ticks` ticks.
    pub fn arb_command_script(
        agents: usize,
        max_ticks: usize,
    ) -> impl Strategy<Value = Vec<TickInputs>> {
        proptest::collection::vec(
            arb_commands(agents).prop_map(|commands| TickInputs {
                commands,
                ..TickInputs::default()
            }),
            1..max_ticks,
        )
    }

    /// Legal key-event script: every generated entry toggles one key's
    /// held state, so a press only ever follows a release and vice
    /// versa, matching what a real host reports.
    pub fn arb_key_script(max_ticks: usize) -> impl Strategy<Value = Vec<Vec<KeyEvent>>> {
        proptest::collection::vec(
            proptest::collection::vec(0..SCRIPT_KEYS.len(), 0..3),
            1..max_ticks,
        )
        .prop_map(|ticks| {
            let mut held = [false; 6];
            ticks
                .into_iter()
                .map(|toggles| {
                    toggles
                        .into_iter()
                        .map(|i| {
                            held[i] = !held[i];
                            KeyEvent {
                                key: SCRIPT_KEYS[i],
                                pressed: held[i],
                            }
                        })
                        .collect()
                })
                .collect()
        })
    }
}

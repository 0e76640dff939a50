//! Recordings: capture a live run, persist it, play it back.
//!
//! A recording stores the scenario name, the replayable inputs of
//! every tick and fingerprints of the start and end states. Replaying
//! feeds those inputs through the scripted tick path on a world built
//! from the same scenario; matching fingerprints prove the replay
//! reproduced the original run bit for bit.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};
use crate::world::{TickInputs, World};

/// Format version written into every recording.
pub const RECORDING_VERSION: u32 = 1;

/// A captured run: per-tick inputs plus state fingerprints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Format version, checked on load.
    pub version: u32,
    /// Name of the scenario the run was captured on.
    pub scenario: String,
    /// State fingerprint before the first recorded tick.
    pub start_hash: u64,
    /// Replayable inputs, one entry per tick.
    pub ticks: Vec<TickInputs>,
    /// Tick count when the capture stopped.
    pub final_tick: u64,
    /// State fingerprint when the capture stopped.
    pub final_hash: u64,
}

impl Recording {
    /// Encode to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| ArenaError::Recording(format!("failed to encode recording: {e}")))
    }

    /// Decode from bytes and check the format version.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or the version does not
    /// match [`RECORDING_VERSION`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let recording: Self = bincode::deserialize(data)
            .map_err(|e| ArenaError::Recording(format!("failed to decode recording: {e}")))?;
        if recording.version != RECORDING_VERSION {
            return Err(ArenaError::RecordingVersion {
                expected: RECORDING_VERSION,
                found: recording.version,
            });
        }
        Ok(recording)
    }

    /// Write the recording to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)
            .map_err(|e| ArenaError::Recording(format!("failed to write recording: {e}")))
    }

    /// Read a recording from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the read or decoding fails, or the format
    /// version does not match.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| ArenaError::Recording(format!("failed to read recording: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Number of recorded ticks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Whether the capture holds no ticks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

/// Wraps a world and captures the replayable inputs of every live
/// tick.
pub struct Recorder {
    world: World,
    start_hash: u64,
    ticks: Vec<TickInputs>,
}

impl Recorder {
    /// Start a capture on a freshly built world.
    ///
    /// The start fingerprint is taken here, so any ticks run before
    /// handing the world over would make the recording unreplayable.
    #[must_use]
    pub fn new(world: World) -> Self {
        let start_hash = world.state_hash();
        Self {
            world,
            start_hash,
            ticks: Vec::new(),
        }
    }

    /// The world being recorded.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for key feeds and collision rules.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Run one live tick and capture its inputs.
    pub fn tick(&mut self) {
        self.world.tick();
        self.ticks.push(self.world.events().to_inputs());
    }

    /// Stop the capture and hand back the world with the recording.
    #[must_use]
    pub fn finish(self) -> (World, Recording) {
        let recording = Recording {
            version: RECORDING_VERSION,
            scenario: self.world.name().to_string(),
            start_hash: self.start_hash,
            ticks: self.ticks,
            final_tick: self.world.tick_count(),
            final_hash: self.world.state_hash(),
        };
        tracing::info!(
            scenario = %recording.scenario,
            ticks = recording.ticks.len(),
            "recording finished"
        );
        (self.world, recording)
    }
}

/// Drive a world through a recording and verify it reproduces the
/// captured run.
///
/// The world must be freshly built from the same scenario the
/// recording was captured on. Collision rules are not part of a
/// recording; any rules active during the capture have to be
/// registered again before replaying. Both fingerprints are checked,
/// the starting state before any tick and the final state after the
/// last one.
///
/// # Errors
///
/// Returns [`ArenaError::ReplayDiverged`] when either fingerprint does
/// not match.
pub fn replay(world: &mut World, recording: &Recording) -> Result<()> {
    let start = world.state_hash();
    if start != recording.start_hash {
        return Err(ArenaError::ReplayDiverged {
            tick: world.tick_count(),
            expected: recording.start_hash,
            actual: start,
        });
    }
    for inputs in &recording.ticks {
        world.tick_scripted(inputs);
    }
    let actual = world.state_hash();
    if actual != recording.final_hash {
        return Err(ArenaError::ReplayDiverged {
            tick: world.tick_count(),
            expected: recording.final_hash,
            actual,
        });
    }
    tracing::info!(ticks = recording.ticks.len(), "replay verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ObstacleGrid;
    use crate::input::{ControlScheme, Key};
    use crate::math::Vec2;
    use crate::messages::ActionCommand;
    use crate::scenario::{AgentSpec, PlayerSpec, Scenario};
    use crate::weapon::WeaponSpec;

    fn piloted_scenario() -> Scenario {
        Scenario::new("capture", ObstacleGrid::example_arena())
            .with_agent(
                AgentSpec::new(Vec2::new(500.0, 200.0), 90.0)
                    .with_player(PlayerSpec::new(ControlScheme::wasd()))
                    .with_weapon(WeaponSpec::new()),
            )
            .with_agent(AgentSpec::new(Vec2::new(500.0, 700.0), 0.0))
    }

    #[test]
    fn test_recording_round_trips_through_bytes() {
        let recording = Recording {
            version: RECORDING_VERSION,
            scenario: "bytes".to_string(),
            start_hash: 11,
            ticks: vec![
                TickInputs {
                    commands: vec![ActionCommand::new(1.0, -2.0)],
                    toggles: vec![0],
                    turns: vec![(0, 4.5)],
                    shots: vec![(0, 12.0)],
                },
                TickInputs::default(),
            ],
            final_tick: 2,
            final_hash: 77,
        };

        let bytes = recording.to_bytes().unwrap();
        let decoded = Recording::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, recording);
        assert_eq!(decoded.len(), 2);
        assert!(!decoded.is_empty());
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let recording = Recording {
            version: RECORDING_VERSION + 1,
            scenario: "future".to_string(),
            start_hash: 0,
            ticks: Vec::new(),
            final_tick: 0,
            final_hash: 0,
        };
        let bytes = recording.to_bytes().unwrap();

        let err = Recording::from_bytes(&bytes).unwrap_err();
        match err {
            ArenaError::RecordingVersion { expected, found } => {
                assert_eq!(expected, RECORDING_VERSION);
                assert_eq!(found, RECORDING_VERSION + 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        assert!(matches!(
            Recording::from_bytes(&[0xff; 3]),
            Err(ArenaError::Recording(_))
        ));
    }

    #[test]
    fn test_recorded_run_replays_identically() {
        let mut recorder = Recorder::new(World::new(piloted_scenario()).unwrap());

        // A short drive with a shot in the middle.
        recorder.world().press(Key::W);
        for _ in 0..3 {
            recorder.tick();
        }
        recorder.world().release(Key::W);
        recorder.world().press(Key::J);
        recorder.tick();
        recorder.world().release(Key::J);
        for _ in 0..16 {
            recorder.tick();
        }
        let (original, recording) = recorder.finish();
        assert_eq!(recording.final_tick, 20);
        assert_eq!(recording.len(), 20);

        let mut replayed = World::new(piloted_scenario()).unwrap();
        replay(&mut replayed, &recording).unwrap();

        assert_eq!(replayed.tick_count(), original.tick_count());
        assert_eq!(replayed.state_hash(), original.state_hash());
        assert_eq!(
            replayed.agents()[0].state().pos,
            original.agents()[0].state().pos
        );
    }

    #[test]
    fn test_replay_rejects_wrong_scenario() {
        let mut recorder = Recorder::new(World::new(piloted_scenario()).unwrap());
        for _ in 0..3 {
            recorder.tick();
        }
        let (_, recording) = recorder.finish();

        let other = Scenario::new("other", ObstacleGrid::example_arena())
            .with_agent(AgentSpec::new(Vec2::new(200.0, 200.0), 0.0));
        let mut world = World::new(other).unwrap();

        let err = replay(&mut world, &recording).unwrap_err();
        assert!(matches!(err, ArenaError::ReplayDiverged { tick: 0, .. }));
        // Nothing ran on the mismatched world.
        assert_eq!(world.tick_count(), 0);
    }

    #[test]
    fn test_replay_detects_tampered_inputs() {
        let mut recorder = Recorder::new(World::new(piloted_scenario()).unwrap());
        recorder.world().press(Key::W);
        for _ in 0..5 {
            recorder.tick();
        }
        let (_, mut recording) = recorder.finish();

        recording.ticks[2].commands[0] = ActionCommand::new(-1.0, 0.0);

        let mut world = World::new(piloted_scenario()).unwrap();
        let err = replay(&mut world, &recording).unwrap_err();
        assert!(matches!(err, ArenaError::ReplayDiverged { tick: 5, .. }));
    }
}

//! Run modes: paced runs, fast-forward simulation, capture and
//! verified replay.
//!
//! Paced runs drive a [`Scheduler`] at real time and stream frame
//! reports from its tap; everything else steps the world in a tight
//! loop as fast as it goes. The determinism sweep records one live
//! run, then replays the capture on fresh worlds in parallel and
//! checks every one reproduces the recorded fingerprint.

use rayon::prelude::*;

use arena_core::error::Result;
use arena_core::recording::{replay, Recorder, Recording};
use arena_core::scenario::Scenario;
use arena_core::scheduler::Scheduler;
use arena_core::world::World;

use crate::protocol::{format_hash, write_line, Report};

/// Outcome of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Ticks executed.
    pub ticks: u64,
    /// Final state fingerprint.
    pub hash: u64,
    /// Agents not dead at the end.
    pub survivors: usize,
}

impl RunOutcome {
    fn of(world: &World) -> Self {
        Self {
            ticks: world.tick_count(),
            hash: world.state_hash(),
            survivors: world
                .agents()
                .iter()
                .filter(|agent| !agent.state().is_dead())
                .count(),
        }
    }
}

/// Run a scenario at the real-time tick rate.
///
/// With `frames` set, every frame the scheduler offers is written to
/// stdout as a JSON line while the run progresses. The writer thread
/// consumes the scheduler's rendezvous tap, so a slow consumer skips
/// frames instead of stalling the simulation.
pub fn run_paced(scenario: Scenario, max_ticks: u64, frames: bool) -> Result<RunOutcome> {
    let world = World::new(scenario)?;
    let mut scheduler = Scheduler::new(world).with_max_ticks(max_ticks);

    let outcome = if frames {
        let tap = scheduler.frames();
        std::thread::scope(|scope| {
            let writer = scope.spawn(move || {
                let mut sink = std::io::stdout().lock();
                while let Ok(snapshot) = tap.recv() {
                    if write_line(&mut sink, &Report::frame(&snapshot)).is_err() {
                        break;
                    }
                }
            });
            let world = scheduler.run();
            // Dropping the scheduler closed the tap; the writer drains
            // and exits.
            writer.join().expect("frame writer panicked");
            RunOutcome::of(&world)
        })
    } else {
        RunOutcome::of(&scheduler.run())
    };
    Ok(outcome)
}

/// Step a scenario as fast as possible for a fixed number of ticks.
pub fn simulate(scenario: Scenario, ticks: u64) -> Result<RunOutcome> {
    let mut world = World::new(scenario)?;
    for _ in 0..ticks {
        world.tick();
    }
    tracing::info!(
        ticks = world.tick_count(),
        hash = %format_hash(world.state_hash()),
        "simulation finished"
    );
    Ok(RunOutcome::of(&world))
}

/// Run a scenario live and capture it as a recording.
pub fn record(scenario: Scenario, ticks: u64) -> Result<(Recording, RunOutcome)> {
    let mut recorder = Recorder::new(World::new(scenario)?);
    for _ in 0..ticks {
        recorder.tick();
    }
    let (world, recording) = recorder.finish();
    Ok((recording, RunOutcome::of(&world)))
}

/// Replay a recording on fresh worlds, `runs` times in parallel.
///
/// Each replay verifies both state fingerprints itself; the first
/// divergence surfaces as the error of its run.
pub fn verify_recording<F>(build: F, recording: &Recording, runs: usize) -> Result<()>
where
    F: Fn() -> Result<World> + Sync,
{
    (0..runs.max(1)).into_par_iter().try_for_each(|run| {
        let mut world = build()?;
        replay(&mut world, recording).map_err(|e| {
            tracing::error!(run, error = %e, "replay diverged");
            e
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_test_utils::fixtures;

    #[test]
    fn test_simulate_runs_the_requested_ticks() {
        let outcome = simulate(fixtures::duel_scenario(), 15).unwrap();
        assert_eq!(outcome.ticks, 15);
        assert_eq!(outcome.survivors, 2);
    }

    #[test]
    fn test_record_then_verify_in_parallel() {
        let (recording, outcome) = record(fixtures::duel_scenario(), 25).unwrap();
        assert_eq!(recording.len(), 25);
        assert_eq!(recording.final_hash, outcome.hash);

        verify_recording(|| World::new(fixtures::duel_scenario()), &recording, 4).unwrap();
    }

    #[test]
    fn test_verify_rejects_mismatched_world() {
        let (recording, _) = record(fixtures::duel_scenario(), 5).unwrap();
        let err = verify_recording(
            || World::new(fixtures::lone_scenario(500.0, 500.0, 0.0)),
            &recording,
            2,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            arena_core::error::ArenaError::ReplayDiverged { .. }
        ));
    }

    #[test]
    fn test_paced_run_stops_at_tick_limit() {
        let outcome = run_paced(fixtures::lone_scenario(500.0, 500.0, 0.0), 3, false).unwrap();
        assert_eq!(outcome.ticks, 3);
        assert_eq!(outcome.survivors, 1);
    }
}

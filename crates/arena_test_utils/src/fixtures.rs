//! Test fixtures and helpers.
//!
//! Pre-built grids, agent specs, scenarios, and input scripts for
//! consistent testing across the workspace. World-building fixtures
//! panic on invalid setups; a broken fixture should fail loudly.

use arena_core::grid::{ObstacleGrid, TILE_SIZE};
use arena_core::input::ControlScheme;
use arena_core::math::{heading_vector, wrap_degrees, Vec2};
use arena_core::messages::ActionCommand;
use arena_core::scenario::{AgentSpec, PlayerSpec, Scenario, MAX_AGENTS};
use arena_core::weapon::WeaponSpec;
use arena_core::world::{TickInputs, World};

/// Empty bordered 100x100 grid, the default field for most tests.
#[must_use]
pub fn open_grid() -> ObstacleGrid {
    ObstacleGrid::bordered(100, TILE_SIZE)
}

/// The demo arena with its interior wall columns and row.
#[must_use]
pub fn walled_grid() -> ObstacleGrid {
    ObstacleGrid::example_arena()
}

/// Unarmed agent with a default body and an idle policy.
#[must_use]
pub fn idle_agent(x: f64, y: f64, alpha: f64) -> AgentSpec {
    AgentSpec::new(Vec2::new(x, y), alpha)
}

/// Idle agent carrying a default weapon.
#[must_use]
pub fn armed_agent(x: f64, y: f64, alpha: f64) -> AgentSpec {
    idle_agent(x, y, alpha).with_weapon(WeaponSpec::new())
}

/// Armed agent driven by WASD keys, starting under player control.
#[must_use]
pub fn piloted_agent(x: f64, y: f64, alpha: f64) -> AgentSpec {
    armed_agent(x, y, alpha).with_player(PlayerSpec::new(ControlScheme::wasd()))
}

/// A single idle agent alone on the open grid.
#[must_use]
pub fn lone_scenario(x: f64, y: f64, alpha: f64) -> Scenario {
    Scenario::new("lone", open_grid()).with_agent(idle_agent(x, y, alpha))
}

/// Two armed agents facing each other across the open field.
#[must_use]
pub fn duel_scenario() -> Scenario {
    Scenario::new("duel", open_grid())
        .with_agent(armed_agent(300.0, 500.0, 90.0))
        .with_agent(armed_agent(700.0, 500.0, 270.0))
}

/// A piloted agent with an idle bystander downfield of it.
///
/// The pilot spawns at (500, 200) facing down the field, so forward
/// drive and shots head toward the bystander at (500, 800).
#[must_use]
pub fn piloted_scenario() -> Scenario {
    Scenario::new("piloted", open_grid())
        .with_agent(piloted_agent(500.0, 200.0, 180.0))
        .with_agent(idle_agent(500.0, 800.0, 0.0))
}

/// Two pilots on the same WASD scheme, so every key drives both
/// agents through one shared latch.
#[must_use]
pub fn shared_keys_scenario() -> Scenario {
    Scenario::new("shared-keys", open_grid())
        .with_agent(piloted_agent(300.0, 300.0, 90.0))
        .with_agent(piloted_agent(700.0, 700.0, 270.0))
}

/// `count` idle agents on a ring around the field center, facing
/// inward. Caps at the scenario agent limit.
#[must_use]
pub fn ring_scenario(count: usize) -> Scenario {
    let count = count.min(MAX_AGENTS);
    let mut scenario = Scenario::new("ring", open_grid());
    for i in 0..count {
        let outward = (i as f64) * 360.0 / (count as f64);
        let pos = Vec2::new(500.0, 500.0) + heading_vector(outward) * 300.0;
        scenario = scenario.with_agent(AgentSpec::new(pos, wrap_degrees(outward + 180.0)));
    }
    scenario
}

/// Build a world from a scenario, panicking if the setup is invalid.
#[must_use]
pub fn world_from(scenario: Scenario) -> World {
    match World::new(scenario) {
        Ok(world) => world,
        Err(e) => panic!("fixture scenario failed to build: {e}"),
    }
}

/// A script that polls every agent with the same command each tick.
#[must_use]
pub fn steady_script(ticks: usize, commands: Vec<ActionCommand>) -> Vec<TickInputs> {
    let tick = TickInputs {
        commands,
        ..TickInputs::default()
    };
    vec![tick; ticks]
}

/// Forward-push commands for `agents` agents, one unit of acceleration
/// each.
#[must_use]
pub fn forward_commands(agents: usize) -> Vec<ActionCommand> {
    vec![ActionCommand::new(1.0, 0.0); agents]
}

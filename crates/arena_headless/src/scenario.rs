//! Scenario presets and RON scenario files.
//!
//! A run is started from a source string that is either one of the
//! built-in preset names or a path to a RON file. Files describe the
//! grid and the agent roster declaratively and are turned into an
//! [`arena_core::scenario::Scenario`] here; structural validation
//! stays with the core.
//!
//! ```ron
//! (
//!     name: "ambush",
//!     grid: Scattered(seed: 7),
//!     agents: [
//!         (x: 200.0, y: 200.0, alpha: 90.0, policy: "chase", target: 1,
//!          weapon: (bullet_speed: 20.0)),
//!         (x: 800.0, y: 800.0, policy: "evade", alerts: true),
//!     ],
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use arena_core::agent::AgentBody;
use arena_core::grid::{ObstacleGrid, TILE_SIZE};
use arena_core::input::ControlScheme;
use arena_core::math::Vec2;
use arena_core::scenario::{AgentSpec, PlayerSpec, Scenario};
use arena_core::weapon::WeaponSpec;

use crate::strategies::policy_named;

/// Names [`preset`] answers to.
pub const PRESET_NAMES: [&str; 3] = ["skirmish", "duel", "empty"];

/// Error type for scenario sources.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Source is neither a preset name nor an existing file.
    #[error("no scenario preset or file named '{0}'")]
    NotFound(String),
    /// Failed to read a scenario file.
    #[error("failed to read scenario file: {0}")]
    Read(#[from] std::io::Error),
    /// Failed to parse a scenario file.
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// A name in the file has no known counterpart.
    #[error("unknown {kind} '{name}' in scenario file")]
    Unknown {
        /// What category of name failed to resolve.
        kind: &'static str,
        /// The offending name.
        name: String,
    },
    /// The described world fails the core's structural rules.
    #[error(transparent)]
    Invalid(#[from] arena_core::error::ArenaError),
}

/// Resolve a source string into a scenario.
///
/// Preset names win over files; anything else is treated as a path.
pub fn build(source: &str) -> Result<Scenario, ScenarioError> {
    if let Some(scenario) = preset(source) {
        return Ok(scenario);
    }
    let path = Path::new(source);
    if path.exists() {
        return load_file(path);
    }
    Err(ScenarioError::NotFound(source.to_string()))
}

/// Built-in scenario by name.
#[must_use]
pub fn preset(name: &str) -> Option<Scenario> {
    match name {
        "skirmish" => Some(skirmish()),
        "duel" => Some(duel()),
        "empty" => Some(empty()),
        _ => None,
    }
}

/// The four-agent demo brawl.
///
/// An evading tank, two chasers hunting it (one burst-armed and
/// playable, one fast with hot bullets), and a wandering sentry under
/// invasive player controls.
#[must_use]
pub fn skirmish() -> Scenario {
    Scenario::new("skirmish", ObstacleGrid::example_arena())
        .with_agent(
            AgentSpec::new(Vec2::new(500.0, 750.0), 75.0)
                .with_body(
                    AgentBody::new()
                        .with_radius(40.0)
                        .with_a_max(20.0)
                        .with_a_alpha_max(10.0)
                        .with_max_life(5),
                )
                .with_policy(crate::strategies::EvadePolicy::new()),
        )
        .with_agent(
            AgentSpec::new(Vec2::new(45.0, 845.0), 0.0)
                .with_body(
                    AgentBody::new()
                        .with_radius(30.0)
                        .with_a_max(12.0)
                        .with_a_alpha_max(10.0)
                        .with_max_life(1),
                )
                .with_policy(crate::strategies::ChasePolicy::new(0))
                .with_weapon(WeaponSpec::new().with_burst())
                .with_player(PlayerSpec::new(ControlScheme::player_two())),
        )
        .with_agent(
            AgentSpec::new(Vec2::new(965.0, 35.0), 240.0)
                .with_body(
                    AgentBody::new()
                        .with_radius(25.0)
                        .with_a_max(5.0)
                        .with_a_alpha_max(15.0)
                        .with_v_max(12.0)
                        .with_v_alpha_max(30.0),
                )
                .with_policy(crate::strategies::SentryPolicy::new(3))
                .with_player(PlayerSpec::invasive(ControlScheme::wasd())),
        )
        .with_agent(
            AgentSpec::new(Vec2::new(300.0, 650.0), 70.0)
                .with_body(
                    AgentBody::new()
                        .with_radius(20.0)
                        .with_a_max(15.0)
                        .with_a_alpha_max(15.0),
                )
                .with_policy(crate::strategies::ChasePolicy::new(0))
                .with_weapon(WeaponSpec::new().with_bullet_speed(30.0)),
        )
}

/// Two armed chasers hunting each other across the open field.
#[must_use]
pub fn duel() -> Scenario {
    Scenario::new("duel", ObstacleGrid::bordered(100, TILE_SIZE))
        .with_agent(
            AgentSpec::new(Vec2::new(300.0, 500.0), 90.0)
                .with_policy(crate::strategies::ChasePolicy::new(1))
                .with_weapon(WeaponSpec::new()),
        )
        .with_agent(
            AgentSpec::new(Vec2::new(700.0, 500.0), 270.0)
                .with_policy(crate::strategies::ChasePolicy::new(0))
                .with_weapon(WeaponSpec::new()),
        )
}

/// Agentless bordered field, mostly for pipeline benchmarks.
#[must_use]
pub fn empty() -> Scenario {
    Scenario::new("empty", ObstacleGrid::bordered(100, TILE_SIZE))
}

/// Load a scenario from a RON file.
pub fn load_file(path: impl AsRef<Path>) -> Result<Scenario, ScenarioError> {
    let contents = std::fs::read_to_string(path)?;
    from_ron_str(&contents)
}

/// Build a scenario from RON text.
pub fn from_ron_str(text: &str) -> Result<Scenario, ScenarioError> {
    let file: ScenarioFile = ron::from_str(text)?;
    file.build()
}

/// Grid description in a scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GridEntry {
    /// The standard demo arena.
    Example,
    /// Bordered empty field, `size` tiles per side.
    Bordered {
        /// Tiles per side.
        size: usize,
    },
    /// Bordered field with seeded random obstacles.
    Scattered {
        /// Layout seed.
        seed: u64,
    },
    /// Explicit tile rows of digits, one text line per row.
    Text {
        /// The tile rows.
        rows: String,
    },
}

impl GridEntry {
    fn build(&self) -> Result<ObstacleGrid, ScenarioError> {
        match self {
            Self::Example => Ok(ObstacleGrid::example_arena()),
            Self::Bordered { size } => Ok(ObstacleGrid::bordered(*size, TILE_SIZE)),
            Self::Scattered { seed } => Ok(ObstacleGrid::scattered(*seed)),
            Self::Text { rows } => Ok(ObstacleGrid::from_text(rows, TILE_SIZE)?),
        }
    }
}

/// Optional body overrides; unset fields keep the standard chassis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyEntry {
    /// Collision radius.
    pub radius: Option<f64>,
    /// Linear acceleration limit.
    pub a_max: Option<f64>,
    /// Angular acceleration limit.
    pub a_alpha_max: Option<f64>,
    /// Linear velocity limit.
    pub v_max: Option<f64>,
    /// Angular velocity limit.
    pub v_alpha_max: Option<f64>,
    /// Field of view opening angle.
    pub fov_angle: Option<f64>,
    /// Life points when fully healed.
    pub max_life: Option<u32>,
    /// Respawn delay in seconds.
    pub respawn_secs: Option<f64>,
    /// Post-respawn immunity in seconds.
    pub immunity_secs: Option<f64>,
}

impl BodyEntry {
    fn apply(&self, mut body: AgentBody) -> AgentBody {
        if let Some(v) = self.radius {
            body.radius = v;
        }
        if let Some(v) = self.a_max {
            body.a_max = v;
        }
        if let Some(v) = self.a_alpha_max {
            body.a_alpha_max = v;
        }
        if let Some(v) = self.v_max {
            body.v_max = v;
        }
        if let Some(v) = self.v_alpha_max {
            body.v_alpha_max = v;
        }
        if let Some(v) = self.fov_angle {
            body.fov_angle = v;
        }
        if let Some(v) = self.max_life {
            body.max_life = v;
        }
        if let Some(v) = self.respawn_secs {
            body.respawn_secs = v;
        }
        if let Some(v) = self.immunity_secs {
            body.immunity_secs = v;
        }
        body
    }
}

/// Weapon description in a scenario file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponEntry {
    /// Base bullet speed override.
    pub bullet_speed: Option<f64>,
    /// Reload duration override, seconds.
    pub reload_secs: Option<f64>,
    /// Whether shots amplify into bursts.
    pub burst: bool,
}

impl WeaponEntry {
    fn build(&self) -> WeaponSpec {
        let mut spec = WeaponSpec::new();
        if let Some(v) = self.bullet_speed {
            spec = spec.with_bullet_speed(v);
        }
        if let Some(v) = self.reload_secs {
            spec = spec.with_reload_secs(v);
        }
        if self.burst {
            spec = spec.with_burst();
        }
        spec
    }
}

/// Player attachment in a scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerEntry {
    /// Named key scheme.
    pub scheme: String,
    /// Whether steering writes the turn speed directly.
    pub invasive: bool,
}

impl Default for PlayerEntry {
    fn default() -> Self {
        Self {
            scheme: "wasd".to_string(),
            invasive: false,
        }
    }
}

impl PlayerEntry {
    fn build(&self) -> Result<PlayerSpec, ScenarioError> {
        let scheme = match self.scheme.as_str() {
            "wasd" => ControlScheme::wasd(),
            "player_one" => ControlScheme::player_one(),
            "player_two" => ControlScheme::player_two(),
            "player_four" => ControlScheme::player_four(),
            other => {
                return Err(ScenarioError::Unknown {
                    kind: "control scheme",
                    name: other.to_string(),
                })
            }
        };
        Ok(if self.invasive {
            PlayerSpec::invasive(scheme)
        } else {
            PlayerSpec::new(scheme)
        })
    }
}

/// One agent row in a scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEntry {
    /// Spawn center x.
    pub x: f64,
    /// Spawn center y.
    pub y: f64,
    /// Spawn heading in degrees.
    #[serde(default)]
    pub alpha: f64,
    /// Body overrides.
    #[serde(default)]
    pub body: BodyEntry,
    /// Demo policy name, see [`policy_named`].
    #[serde(default = "default_policy_name")]
    pub policy: String,
    /// Target agent id for hunting policies.
    #[serde(default)]
    pub target: usize,
    /// Seed for randomized policies.
    #[serde(default)]
    pub seed: u64,
    /// Weapon, if armed.
    #[serde(default)]
    pub weapon: Option<WeaponEntry>,
    /// Player controls, if drivable.
    #[serde(default)]
    pub player: Option<PlayerEntry>,
    /// Force the alert subscription instead of asking the policy.
    #[serde(default)]
    pub alerts: Option<bool>,
    /// Enable stale-message dropping in the controller worker.
    #[serde(default)]
    pub resync: bool,
}

fn default_policy_name() -> String {
    "idle".to_string()
}

impl AgentEntry {
    fn build(&self) -> Result<AgentSpec, ScenarioError> {
        let policy =
            policy_named(&self.policy, self.target, self.seed).ok_or(ScenarioError::Unknown {
                kind: "policy",
                name: self.policy.clone(),
            })?;
        let mut spec = AgentSpec::new(Vec2::new(self.x, self.y), self.alpha)
            .with_body(self.body.apply(AgentBody::new()))
            .with_auto_resync(self.resync);
        spec.policy = policy;
        if let Some(weapon) = &self.weapon {
            spec = spec.with_weapon(weapon.build());
        }
        if let Some(player) = &self.player {
            spec = spec.with_player(player.build()?);
        }
        if let Some(flag) = self.alerts {
            spec = spec.with_alert_flag(flag);
        }
        Ok(spec)
    }
}

/// Top-level scenario file layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    /// Scenario name shown in logs and recordings.
    pub name: String,
    /// The obstacle field.
    pub grid: GridEntry,
    /// Agent roster in id order.
    #[serde(default)]
    pub agents: Vec<AgentEntry>,
}

impl ScenarioFile {
    /// Turn the description into a validated scenario.
    pub fn build(&self) -> Result<Scenario, ScenarioError> {
        let mut scenario = Scenario::new(self.name.clone(), self.grid.build()?);
        for entry in &self.agents {
            scenario = scenario.with_agent(entry.build()?);
        }
        scenario.validate()?;
        Ok(scenario)
    }
}

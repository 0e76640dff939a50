//! JSON line output for headless runs.
//!
//! Every line on stdout is one serialized [`Report`]; logs go to
//! stderr so a consumer can pipe the stream straight into a parser.

use std::io::Write;

use serde::{Deserialize, Serialize};

use arena_core::agent::{ControlAuthority, LifePhase};
use arena_core::world::{AgentSnapshot, Bullet, WorldSnapshot};

/// One agent in a frame line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLine {
    /// Agent id, stable across the run.
    pub id: usize,
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Heading in compass degrees.
    pub alpha: f64,
    /// Linear velocity per tick.
    pub v: f64,
    /// Remaining life points.
    pub life: u32,
    /// Life points when fully healed.
    pub max_life: u32,
    /// Live/dead/immune cycle position.
    pub phase: PhaseLine,
    /// Who currently steers.
    pub steered_by: PilotLine,
}

impl AgentLine {
    fn new(id: usize, snap: &AgentSnapshot) -> Self {
        Self {
            id,
            x: snap.pos.x,
            y: snap.pos.y,
            alpha: snap.alpha,
            v: snap.v,
            life: snap.life,
            max_life: snap.max_life,
            phase: snap.phase.into(),
            steered_by: snap.authority.into(),
        }
    }
}

/// Flattened life phase, countdowns elided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseLine {
    /// Up and vulnerable.
    Alive,
    /// Destroyed, waiting for respawn.
    Dead,
    /// Respawned and temporarily untouchable.
    Immune,
}

impl From<LifePhase> for PhaseLine {
    fn from(phase: LifePhase) -> Self {
        match phase {
            LifePhase::Alive => Self::Alive,
            LifePhase::Dead { .. } => Self::Dead,
            LifePhase::Immune { .. } => Self::Immune,
        }
    }
}

/// Which side steers an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PilotLine {
    /// The controller worker.
    Autopilot,
    /// Buffered player keys.
    Player,
}

impl From<ControlAuthority> for PilotLine {
    fn from(authority: ControlAuthority) -> Self {
        match authority {
            ControlAuthority::Autopilot => Self::Autopilot,
            ControlAuthority::Player => Self::Player,
        }
    }
}

/// One bullet in a frame line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BulletLine {
    /// Position x.
    pub x: f64,
    /// Position y.
    pub y: f64,
    /// Flight direction in compass degrees.
    pub direction: f64,
}

impl From<&Bullet> for BulletLine {
    fn from(bullet: &Bullet) -> Self {
        Self {
            x: bullet.pos.x,
            y: bullet.pos.y,
            direction: bullet.direction,
        }
    }
}

/// A line of headless output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Report {
    /// Run accepted, first tick about to execute.
    Ready {
        /// Scenario name.
        scenario: String,
        /// Number of agents in the world.
        agents: usize,
        /// Simulation rate in ticks per second.
        tick_rate: u32,
    },
    /// One rendered tick.
    Frame {
        /// Tick the frame was taken at.
        tick: u64,
        /// All agents in id order.
        agents: Vec<AgentLine>,
        /// All bullets in flight.
        bullets: Vec<BulletLine>,
    },
    /// Run finished.
    Finished {
        /// Scenario name.
        scenario: String,
        /// Ticks executed.
        ticks: u64,
        /// Final state fingerprint, hex.
        hash: String,
        /// Agents not currently dead.
        survivors: usize,
    },
    /// Determinism sweep outcome.
    Determinism {
        /// Replays executed.
        runs: usize,
        /// Whether every replay reproduced the recorded fingerprint.
        deterministic: bool,
        /// The recorded final fingerprint, hex.
        hash: String,
    },
    /// A recording was captured and written.
    Recorded {
        /// Output file path.
        path: String,
        /// Ticks captured.
        ticks: usize,
        /// Final state fingerprint, hex.
        hash: String,
    },
    /// A recording was replayed and checked.
    Replayed {
        /// Recording file path.
        path: String,
        /// Ticks replayed.
        ticks: usize,
        /// Final state fingerprint, hex.
        hash: String,
    },
    /// Known preset names.
    Scenarios {
        /// The preset names.
        names: Vec<String>,
    },
}

impl Report {
    /// Frame report for a world snapshot.
    #[must_use]
    pub fn frame(snapshot: &WorldSnapshot) -> Self {
        Self::Frame {
            tick: snapshot.tick,
            agents: snapshot
                .agents
                .iter()
                .enumerate()
                .map(|(id, agent)| AgentLine::new(id, agent))
                .collect(),
            bullets: snapshot.bullets.iter().map(BulletLine::from).collect(),
        }
    }
}

/// Format a state fingerprint the way every report carries it.
#[must_use]
pub fn format_hash(hash: u64) -> String {
    format!("{hash:016x}")
}

/// Write one report as a JSON line.
pub fn write_line<W: Write>(out: &mut W, report: &Report) -> std::io::Result<()> {
    let json = serde_json::to_string(report).map_err(std::io::Error::other)?;
    writeln!(out, "{json}")
}

//! Agent body parameters and per-tick state.
//!
//! A body describes what an agent's chassis can do and never changes
//! after construction. The state carries everything the simulation
//! mutates tick by tick: pose, velocities, life and the control
//! handoff between autopilot and player.

use serde::{Deserialize, Serialize};

use crate::math::{heading_vector, Vec2};

/// Index of an agent within its world. Stable for the world's lifetime.
pub type AgentId = usize;

/// Immutable chassis parameters of an agent.
///
/// All limits are symmetric: an agent that can accelerate by `a_max`
/// forward can brake by the same amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentBody {
    /// Collision radius in field units.
    pub radius: f64,
    /// Maximum linear acceleration per tick.
    pub a_max: f64,
    /// Maximum angular acceleration per tick, degrees.
    pub a_alpha_max: f64,
    /// Maximum linear velocity per tick.
    pub v_max: f64,
    /// Maximum angular velocity per tick, degrees.
    pub v_alpha_max: f64,
    /// Field of view opening angle, degrees.
    pub fov_angle: f64,
    /// Life points when fully healed.
    pub max_life: u32,
    /// Seconds a destroyed agent stays down before respawning.
    pub respawn_secs: f64,
    /// Seconds of immunity granted on respawn.
    pub immunity_secs: f64,
}

impl Default for AgentBody {
    fn default() -> Self {
        Self {
            radius: 30.0,
            a_max: 10.0,
            a_alpha_max: 10.0,
            v_max: 30.0,
            v_alpha_max: 45.0,
            fov_angle: 90.0,
            max_life: 3,
            respawn_secs: 3.0,
            immunity_secs: 1.0,
        }
    }
}

impl AgentBody {
    /// Body with the standard parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collision radius.
    #[must_use]
    pub const fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Set the linear acceleration limit.
    #[must_use]
    pub const fn with_a_max(mut self, a_max: f64) -> Self {
        self.a_max = a_max;
        self
    }

    /// Set the angular acceleration limit.
    #[must_use]
    pub const fn with_a_alpha_max(mut self, a_alpha_max: f64) -> Self {
        self.a_alpha_max = a_alpha_max;
        self
    }

    /// Set the linear velocity limit.
    #[must_use]
    pub const fn with_v_max(mut self, v_max: f64) -> Self {
        self.v_max = v_max;
        self
    }

    /// Set the angular velocity limit.
    #[must_use]
    pub const fn with_v_alpha_max(mut self, v_alpha_max: f64) -> Self {
        self.v_alpha_max = v_alpha_max;
        self
    }

    /// Set the field of view opening angle.
    #[must_use]
    pub const fn with_fov_angle(mut self, fov_angle: f64) -> Self {
        self.fov_angle = fov_angle;
        self
    }

    /// Set the maximum life points.
    #[must_use]
    pub const fn with_max_life(mut self, max_life: u32) -> Self {
        self.max_life = max_life;
        self
    }

    /// Set the respawn delay in seconds.
    #[must_use]
    pub const fn with_respawn_secs(mut self, secs: f64) -> Self {
        self.respawn_secs = secs;
        self
    }

    /// Set the post-respawn immunity duration in seconds.
    #[must_use]
    pub const fn with_immunity_secs(mut self, secs: f64) -> Self {
        self.immunity_secs = secs;
        self
    }
}

/// Where an agent is in its live/dead/respawn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifePhase {
    /// Up and vulnerable.
    Alive,
    /// Destroyed; counts down to respawn.
    Dead {
        /// Ticks until the agent respawns.
        respawn_in: u32,
    },
    /// Freshly respawned; bullets pass through until this wears off.
    Immune {
        /// Ticks until the immunity ends.
        wears_off_in: u32,
    },
}

impl LifePhase {
    /// Whether the agent is destroyed.
    #[must_use]
    pub const fn is_dead(self) -> bool {
        matches!(self, Self::Dead { .. })
    }

    /// Whether bullets currently pass through the agent.
    #[must_use]
    pub const fn is_immune(self) -> bool {
        matches!(self, Self::Immune { .. })
    }
}

/// Who steers the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlAuthority {
    /// The agent's movement policy worker drives.
    Autopilot,
    /// A human player drives.
    Player,
}

impl ControlAuthority {
    /// The other authority.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Autopilot => Self::Player,
            Self::Player => Self::Autopilot,
        }
    }
}

/// Mutable per-tick state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Center position in field units.
    pub pos: Vec2,
    /// Heading in compass degrees, wrapped into `[0, 360)`.
    pub alpha: f64,
    /// Linear velocity in field units per tick. Negative is reverse.
    pub v: f64,
    /// Angular velocity in degrees per tick.
    pub v_alpha: f64,
    /// Remaining life points.
    pub life: u32,
    /// Live/dead/immune cycle position.
    pub phase: LifePhase,
    /// Current steering authority.
    pub authority: ControlAuthority,
}

impl AgentState {
    /// Fresh state at a spawn pose, fully healed and on autopilot.
    #[must_use]
    pub const fn spawned_at(pos: Vec2, alpha: f64, body: &AgentBody) -> Self {
        Self {
            pos,
            alpha,
            v: 0.0,
            v_alpha: 0.0,
            life: body.max_life,
            phase: LifePhase::Alive,
            authority: ControlAuthority::Autopilot,
        }
    }

    /// Whether the agent is destroyed.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.phase.is_dead()
    }

    /// Whether bullets currently pass through the agent.
    #[must_use]
    pub const fn is_immune(&self) -> bool {
        self.phase.is_immune()
    }

    /// Unit vector of the current heading.
    #[must_use]
    pub fn heading(&self) -> Vec2 {
        heading_vector(self.alpha)
    }
}

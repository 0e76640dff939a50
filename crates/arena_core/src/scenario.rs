//! Scenario assembly: the field, the agents, and their wiring.
//!
//! A scenario is everything the world needs at construction and is
//! assumed validated before the simulation starts. [`Scenario::validate`]
//! checks the structural rules: the agent cap, spawn centers inside the
//! field, and spawn circles clear of obstacles. Anything finer, like
//! balancing body parameters, is the caller's business.

use crate::agent::AgentBody;
use crate::error::{ArenaError, Result};
use crate::grid::ObstacleGrid;
use crate::input::{ControlScheme, INVASIVE_TURN_RATE};
use crate::math::Vec2;
use crate::policy::{IdlePolicy, MovementPolicy};
use crate::weapon::WeaponSpec;

/// Largest number of agents one world supports.
pub const MAX_AGENTS: usize = 6;

/// Player control attached to an agent.
#[derive(Debug, Clone)]
pub struct PlayerSpec {
    /// Key bindings.
    pub scheme: ControlScheme,
    /// Whether steering writes `v_alpha` directly.
    pub invasive: bool,
    /// Turn rate used by invasive steering.
    pub turn_rate: f64,
}

impl PlayerSpec {
    /// Standard acceleration-based controls.
    #[must_use]
    pub const fn new(scheme: ControlScheme) -> Self {
        Self {
            scheme,
            invasive: false,
            turn_rate: INVASIVE_TURN_RATE,
        }
    }

    /// Invasive controls: steering keys set the turn speed directly.
    #[must_use]
    pub const fn invasive(scheme: ControlScheme) -> Self {
        Self {
            scheme,
            invasive: true,
            turn_rate: INVASIVE_TURN_RATE,
        }
    }

    /// Override the invasive turn rate.
    #[must_use]
    pub const fn with_turn_rate(mut self, rate: f64) -> Self {
        self.turn_rate = rate;
        self
    }
}

/// Everything needed to spawn one agent.
pub struct AgentSpec {
    /// Physical parameters.
    pub body: AgentBody,
    /// Spawn center.
    pub pos: Vec2,
    /// Spawn heading in degrees.
    pub alpha: f64,
    /// Decision policy run by the agent's controller worker.
    pub policy: Box<dyn MovementPolicy>,
    /// Weapon, if the agent carries one.
    pub weapon: Option<WeaponSpec>,
    /// Player control, if a human can drive this agent.
    pub player: Option<PlayerSpec>,
    /// Explicit alert subscription. `None` defers to the policy.
    pub alert_flag: Option<bool>,
    /// Whether the controller drops sensor messages it lags behind on.
    pub auto_resync: bool,
}

impl AgentSpec {
    /// Agent with a default body and an idle policy.
    #[must_use]
    pub fn new(pos: Vec2, alpha: f64) -> Self {
        Self {
            body: AgentBody::new(),
            pos,
            alpha,
            policy: Box::new(IdlePolicy),
            weapon: None,
            player: None,
            alert_flag: None,
            auto_resync: false,
        }
    }

    /// Set the physical parameters.
    #[must_use]
    pub fn with_body(mut self, body: AgentBody) -> Self {
        self.body = body;
        self
    }

    /// Set the decision policy.
    #[must_use]
    pub fn with_policy(mut self, policy: impl MovementPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Give the agent a weapon.
    #[must_use]
    pub fn with_weapon(mut self, weapon: WeaponSpec) -> Self {
        self.weapon = Some(weapon);
        self
    }

    /// Attach player controls. The agent starts player-driven.
    #[must_use]
    pub fn with_player(mut self, player: PlayerSpec) -> Self {
        self.player = Some(player);
        self
    }

    /// Force the alert subscription instead of asking the policy.
    #[must_use]
    pub fn with_alert_flag(mut self, flag: bool) -> Self {
        self.alert_flag = Some(flag);
        self
    }

    /// Enable stale-message dropping in the controller worker.
    #[must_use]
    pub fn with_auto_resync(mut self, enabled: bool) -> Self {
        self.auto_resync = enabled;
        self
    }

    /// Whether this agent receives alert broadcasts.
    #[must_use]
    pub fn wants_alerts(&self) -> bool {
        self.alert_flag
            .unwrap_or_else(|| self.policy.wants_alerts())
    }
}

/// A complete world setup.
pub struct Scenario {
    /// Name shown in logs and recordings.
    pub name: String,
    /// Obstacle layout.
    pub grid: ObstacleGrid,
    /// Agents in id order.
    pub agents: Vec<AgentSpec>,
}

impl Scenario {
    /// Scenario with no agents yet.
    pub fn new(name: impl Into<String>, grid: ObstacleGrid) -> Self {
        Self {
            name: name.into(),
            grid,
            agents: Vec::new(),
        }
    }

    /// Append an agent. Ids are assigned in insertion order.
    #[must_use]
    pub fn with_agent(mut self, spec: AgentSpec) -> Self {
        self.agents.push(spec);
        self
    }

    /// Check the structural spawn rules.
    pub fn validate(&self) -> Result<()> {
        if self.agents.len() > MAX_AGENTS {
            return Err(ArenaError::TooManyAgents {
                requested: self.agents.len(),
                max: MAX_AGENTS,
            });
        }

        let field = self.grid.field_size();
        for (index, spec) in self.agents.iter().enumerate() {
            let Vec2 { x, y } = spec.pos;
            let in_field = x >= 0.0 && x < field && y >= 0.0 && y < field;
            if !in_field || self.grid.circle_blocked(spec.pos, spec.body.radius) {
                return Err(ArenaError::InvalidSpawn { index, x, y });
            }
        }
        Ok(())
    }
}

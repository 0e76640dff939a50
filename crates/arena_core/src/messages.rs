//! Messages exchanged between the world and agent controllers.
//!
//! The world pushes sensor messages into each controller's mailbox;
//! the controller worker answers by publishing an [`ActionCommand`]
//! into its [`CommandSlot`]. The slot is a single atomic word, so the
//! scheduler always reads a complete command even while the worker is
//! writing a new one.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::grid::TileKind;
use crate::math::Vec2;

/// Acceleration request produced by a controller or player.
///
/// `a` is linear acceleration in field units per tick squared,
/// `a_alpha` angular acceleration in degrees. Both get clamped to the
/// agent's body limits before they take effect.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionCommand {
    /// Linear acceleration.
    pub a: f32,
    /// Angular acceleration, degrees.
    pub a_alpha: f32,
}

impl ActionCommand {
    /// Command that requests no change.
    pub const ZERO: Self = Self { a: 0.0, a_alpha: 0.0 };

    /// Create a new command.
    #[must_use]
    pub const fn new(a: f32, a_alpha: f32) -> Self {
        Self { a, a_alpha }
    }
}

/// Lock-free single-command exchange cell.
///
/// Both halves of the command live in one `AtomicU64`, so a reader
/// never observes the linear part of one command paired with the
/// angular part of another.
#[derive(Debug, Default)]
pub struct CommandSlot(AtomicU64);

impl CommandSlot {
    /// Slot holding [`ActionCommand::ZERO`].
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Publish a command, replacing the previous one.
    pub fn store(&self, cmd: ActionCommand) {
        let bits = (u64::from(cmd.a.to_bits()) << 32) | u64::from(cmd.a_alpha.to_bits());
        self.0.store(bits, Ordering::Release);
    }

    /// Read the most recently published command.
    #[must_use]
    pub fn load(&self) -> ActionCommand {
        let bits = self.0.load(Ordering::Acquire);
        ActionCommand {
            a: f32::from_bits((bits >> 32) as u32),
            a_alpha: f32::from_bits(bits as u32),
        }
    }

    /// Reset to [`ActionCommand::ZERO`].
    pub fn clear(&self) {
        self.store(ActionCommand::ZERO);
    }
}

/// One tile visible to an agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSighting {
    /// Tile coordinates on the grid.
    pub tile: (usize, usize),
    /// What occupies the tile.
    pub kind: TileKind,
    /// Distance from the viewer to the tile center.
    pub distance: f64,
}

/// One agent visible to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSighting {
    /// Center of the sighted agent.
    pub pos: Vec2,
    /// Distance between the two centers.
    pub distance: f64,
}

/// Pose and velocities of the receiving agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionReading {
    /// Center position.
    pub pos: Vec2,
    /// Heading in compass degrees.
    pub alpha: f64,
    /// Linear velocity per tick.
    pub v: f64,
    /// Angular velocity per tick, degrees.
    pub v_alpha: f64,
}

/// Everything inside the receiving agent's field of view this tick.
///
/// `agents` always has one entry per agent in the world, in world
/// order; entries outside the cone are `None`. The receiver's own
/// entry is always present since an agent overlaps itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisionReading {
    /// Visible non-empty tiles.
    pub tiles: Vec<TileSighting>,
    /// Per-agent sightings, indexed by agent id.
    pub agents: Vec<Option<AgentSighting>>,
}

/// Broadcast of every agent position, sent to subscribed agents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlertReading {
    /// Agent centers, indexed by agent id.
    pub positions: Vec<Vec2>,
}

/// A sensor message queued into a controller mailbox.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorMessage {
    /// Own pose after the movement pass.
    Position {
        /// Tick the reading was taken.
        tick: u64,
        /// The reading.
        reading: PositionReading,
    },
    /// Field of view contents after the movement pass.
    Vision {
        /// Tick the reading was taken.
        tick: u64,
        /// The reading.
        reading: VisionReading,
    },
    /// Periodic all-positions broadcast.
    Alert {
        /// Tick the broadcast was taken.
        tick: u64,
        /// The broadcast.
        reading: AlertReading,
    },
}

impl SensorMessage {
    /// Tick the message was produced.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        match self {
            Self::Position { tick, .. } | Self::Vision { tick, .. } | Self::Alert { tick, .. } => {
                *tick
            }
        }
    }

    /// Whether this is an alert broadcast. Alerts survive resync
    /// backlog dropping where positional messages do not.
    #[must_use]
    pub const fn is_alert(&self) -> bool {
        matches!(self, Self::Alert { .. })
    }
}

//! # Arena Core
//!
//! Deterministic multi-agent arena simulation.
//!
//! A square tile field with walls and holes, up to six circular
//! agents, bullets, and a fixed 20 Hz tick pipeline. Each agent is
//! driven either by an autopilot policy running on its own worker
//! thread or by a human pilot feeding buffered key events; control can
//! be handed back and forth at runtime. Everything that affects the
//! physical state happens in deterministic order on the tick thread,
//! so a run can be captured as per-tick inputs and replayed bit for
//! bit.
//!
//! ## Crate Structure
//!
//! - [`world`] - the simulation state and tick pipeline
//! - [`scenario`] - declarative world construction
//! - [`physics`] - command integration and swept wall collision
//! - [`grid`] - the obstacle tile field
//! - [`visibility`] - field-of-view queries for sensors
//! - [`controller`] - per-agent autopilot workers
//! - [`policy`] - the movement policy trait autopilots implement
//! - [`weapon`] - fire queue, reload timer and access gating
//! - [`input`] - key schemes, latches and the player pilot
//! - [`recording`] - capture, persistence and verified replay
//! - [`scheduler`] - real-time pacing and frame handoff

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod collision;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod input;
pub mod math;
pub mod messages;
pub mod physics;
pub mod policy;
pub mod recording;
pub mod scenario;
pub mod scheduler;
pub mod visibility;
pub mod weapon;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{AgentBody, AgentId, AgentState, ControlAuthority, LifePhase};
    pub use crate::collision::{CatchRule, CollisionEffect, CollisionRule, Contact};
    pub use crate::controller::ControllerHandle;
    pub use crate::error::{ArenaError, Result};
    pub use crate::grid::{ObstacleGrid, TileKind};
    pub use crate::input::{ControlScheme, Key, KeyEvent, PlayerAction};
    pub use crate::math::Vec2;
    pub use crate::messages::{ActionCommand, SensorMessage};
    pub use crate::policy::{IdlePolicy, MovementPolicy, PolicyCtx};
    pub use crate::recording::{replay, Recorder, Recording};
    pub use crate::scenario::{AgentSpec, PlayerSpec, Scenario};
    pub use crate::scheduler::{Scheduler, StopHandle};
    pub use crate::weapon::{Weapon, WeaponSpec};
    pub use crate::world::{World, WorldSnapshot, TICKS_PER_SECOND};
}

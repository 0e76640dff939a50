//! Movement policies: the pluggable brains of autopiloted agents.
//!
//! A policy receives each sensor message through one of its handler
//! methods and answers with an [`ActionCommand`]. The handlers run on
//! the agent's controller worker thread, never on the scheduler, so a
//! slow policy can only ever starve its own agent.
//!
//! The [`PolicyCtx`] passed alongside every reading is the policy's
//! scratch space: body parameters, the previously issued command, a
//! destination cell, a short message memory and the weapon handle.

use std::collections::VecDeque;

use crate::agent::AgentBody;
use crate::math::Vec2;
use crate::messages::{ActionCommand, AlertReading, PositionReading, SensorMessage, VisionReading};
use crate::weapon::GunHandle;

/// How many sensor messages the context memory retains.
pub const MEMORY_SIZE: usize = 10;

/// Per-controller working state available to a policy.
pub struct PolicyCtx {
    body: AgentBody,
    previous: ActionCommand,
    /// Free-form destination cell for steering policies.
    pub destination: Option<Vec2>,
    memory: VecDeque<SensorMessage>,
    gun: Option<GunHandle>,
}

impl PolicyCtx {
    /// Create a context for an agent with the given body and optional
    /// weapon handle.
    #[must_use]
    pub fn new(body: AgentBody, gun: Option<GunHandle>) -> Self {
        Self {
            body,
            previous: ActionCommand::ZERO,
            destination: None,
            memory: VecDeque::new(),
            gun,
        }
    }

    /// Body parameters of the agent this policy steers.
    #[must_use]
    pub const fn body(&self) -> &AgentBody {
        &self.body
    }

    /// The command most recently issued by this policy.
    #[must_use]
    pub const fn previous(&self) -> ActionCommand {
        self.previous
    }

    pub(crate) fn set_previous(&mut self, cmd: ActionCommand) {
        self.previous = cmd;
    }

    /// Forget the issued command and destination. The message memory
    /// survives a reset.
    pub(crate) fn reset(&mut self) {
        self.previous = ActionCommand::ZERO;
        self.destination = None;
    }

    /// Store a message, dropping the oldest past [`MEMORY_SIZE`].
    pub(crate) fn memorize(&mut self, msg: SensorMessage) {
        self.memory.push_front(msg);
        if self.memory.len() > MEMORY_SIZE {
            self.memory.pop_back();
        }
    }

    /// Remembered messages, newest first.
    pub fn memory(&self) -> impl Iterator<Item = &SensorMessage> + '_ {
        self.memory.iter()
    }

    /// Whether the agent's weapon is reloading. False without a weapon.
    #[must_use]
    pub fn is_reloading(&self) -> bool {
        self.gun.as_ref().is_some_and(GunHandle::is_reloading)
    }

    /// Whether the agent will already shoot at the next tick.
    #[must_use]
    pub fn is_shooting(&self) -> bool {
        self.gun.as_ref().is_some_and(GunHandle::is_preparing)
    }

    /// If able, shoot at the next tick. Silently does nothing without
    /// a weapon or without gun access.
    pub fn shoot(&self) {
        if let Some(gun) = &self.gun {
            gun.request_fire();
        }
    }
}

/// Handler set driving an autopiloted agent.
///
/// Every handler has a passive default: `position` holds still,
/// `vision` and `alert` delegate to `default`, and `default` repeats
/// the previous command. A policy overrides only what it cares about.
pub trait MovementPolicy: Send {
    /// Whether this policy wants the periodic alert broadcast.
    /// Policies that navigate by other agents' positions opt in.
    fn wants_alerts(&self) -> bool {
        false
    }

    /// Fallback for readings the policy does not handle specially.
    fn default(&mut self, ctx: &mut PolicyCtx) -> ActionCommand {
        ctx.previous()
    }

    /// React to the agent's own pose.
    fn position(&mut self, reading: &PositionReading, ctx: &mut PolicyCtx) -> ActionCommand {
        let _ = (reading, ctx);
        ActionCommand::ZERO
    }

    /// React to the field of view contents.
    fn vision(&mut self, reading: &VisionReading, ctx: &mut PolicyCtx) -> ActionCommand {
        let _ = reading;
        self.default(ctx)
    }

    /// React to the all-positions broadcast.
    fn alert(&mut self, reading: &AlertReading, ctx: &mut PolicyCtx) -> ActionCommand {
        let _ = reading;
        self.default(ctx)
    }
}

/// Policy that never steers.
///
/// Useful for scripted worlds and replays where commands come from the
/// outside and the controller merely needs to exist.
pub struct IdlePolicy;

impl MovementPolicy for IdlePolicy {}

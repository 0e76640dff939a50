//! The arena world: agents, bullets and the fixed-rate tick pipeline.
//!
//! A tick runs a fixed sequence: lifecycle countdowns, player input,
//! fire resolution, bullet flight, one movement pass per agent, the
//! contact scan and finally sensor dispatch. Everything that mutates
//! state happens on the caller's thread in deterministic order; the
//! only concurrency is the controller workers reading their mailboxes
//! on the far side of a channel.
//!
//! Scripted ticks replace the live input and fire stages with recorded
//! values and leave everything else identical, which is what makes a
//! recording replayable: the physical state is a pure function of the
//! scenario and the per-tick inputs.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::agent::{AgentBody, AgentId, AgentState, ControlAuthority, LifePhase};
use crate::collision::{CollisionEffect, CollisionRule, Contact};
use crate::controller::ControllerHandle;
use crate::error::Result;
use crate::geometry::circles_overlap;
use crate::grid::ObstacleGrid;
use crate::input::{Key, KeyEvent, KeyLatch, PlayerPilot};
use crate::math::{heading_vector, Vec2};
use crate::messages::{ActionCommand, AlertReading, PositionReading, SensorMessage, VisionReading};
use crate::physics::{bullet_step_count, integrate_command, sweep_walls};
use crate::scenario::{AgentSpec, Scenario};
use crate::visibility::{visible_agents, visible_tiles};
use crate::weapon::Weapon;

/// Fixed simulation rate in ticks per second.
pub const TICKS_PER_SECOND: u32 = 20;

/// Ticks between two alert broadcasts.
pub const ALERT_INTERVAL: u64 = 10;

/// Seconds the autopilot toggle stays locked after an attempt.
pub const TOGGLE_COOLDOWN_SECS: f64 = 0.5;

/// Whole ticks covering `secs` at the simulation rate.
fn duration_ticks(secs: f64) -> u32 {
    (secs * f64::from(TICKS_PER_SECOND)).round() as u32
}

/// A bullet in flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    /// Current position.
    pub pos: Vec2,
    /// Distance covered per tick, in field units.
    pub speed: f64,
    /// Flight direction in compass degrees, fixed at fire time.
    pub direction: f64,
}

/// One agent and everything attached to it.
///
/// The aggregate owns the controller handle, so dropping a world joins
/// every worker thread.
pub struct Agent {
    body: AgentBody,
    state: AgentState,
    controller: ControllerHandle,
    weapon: Option<Weapon>,
    pilot: Option<PlayerPilot>,
    alert_flag: bool,
}

impl Agent {
    /// Chassis parameters.
    #[must_use]
    pub const fn body(&self) -> &AgentBody {
        &self.body
    }

    /// Current physical state.
    #[must_use]
    pub const fn state(&self) -> &AgentState {
        &self.state
    }

    /// The agent's weapon, if it carries one.
    #[must_use]
    pub const fn weapon(&self) -> Option<&Weapon> {
        self.weapon.as_ref()
    }

    /// Whether a player pilot is attached.
    #[must_use]
    pub const fn is_piloted(&self) -> bool {
        self.pilot.is_some()
    }

    /// Whether the agent receives alert broadcasts.
    #[must_use]
    pub const fn wants_alerts(&self) -> bool {
        self.alert_flag
    }

    /// Whether sensor messages currently reach the controller worker.
    /// Player control and death both cut the feed.
    fn controller_listening(&self) -> bool {
        self.state.authority == ControlAuthority::Autopilot && !self.state.is_dead()
    }

    fn send_sensor(&self, msg: SensorMessage) {
        if self.controller_listening() {
            self.controller.send(msg);
        }
    }

    /// Command of whichever side currently steers. A dead agent always
    /// polls zero.
    fn poll_command(&self) -> ActionCommand {
        if self.state.is_dead() {
            return ActionCommand::ZERO;
        }
        match self.state.authority {
            ControlAuthority::Player => self
                .pilot
                .as_ref()
                .map_or(ActionCommand::ZERO, PlayerPilot::command),
            ControlAuthority::Autopilot => self.controller.command(),
        }
    }
}

/// The replayable inputs of one tick.
///
/// Everything else a tick does is derived from prior state, so these
/// four lists are all a recording has to carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInputs {
    /// Command each agent was polled with, in agent order. Missing
    /// entries poll as zero.
    pub commands: Vec<ActionCommand>,
    /// Agents whose control authority flipped this tick.
    pub toggles: Vec<AgentId>,
    /// Direct `v_alpha` writes from invasive steering.
    pub turns: Vec<(AgentId, f64)>,
    /// Released shots as (shooter, bullet speed).
    pub shots: Vec<(AgentId, f64)>,
}

/// What happened during the most recent tick.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Command each agent was polled with, in agent order.
    pub commands: Vec<ActionCommand>,
    /// Agents whose control authority flipped.
    pub toggles: Vec<AgentId>,
    /// Direct `v_alpha` writes from invasive steering.
    pub turns: Vec<(AgentId, f64)>,
    /// Released shots as (shooter, bullet speed).
    pub shots: Vec<(AgentId, f64)>,
    /// Contact pairs handed to the collision rules, lower id first.
    pub contacts: Vec<(AgentId, AgentId)>,
    /// Agents destroyed this tick.
    pub destroyed: Vec<AgentId>,
}

impl TickEvents {
    /// The replayable subset of this tick's events.
    #[must_use]
    pub fn to_inputs(&self) -> TickInputs {
        TickInputs {
            commands: self.commands.clone(),
            toggles: self.toggles.clone(),
            turns: self.turns.clone(),
            shots: self.shots.clone(),
        }
    }
}

/// Clonable sender that feeds host key events into a world.
///
/// The world drains buffered events at the start of its next tick, so
/// a host thread can report keys at any rate without synchronizing.
#[derive(Debug, Clone)]
pub struct InputFeed {
    tx: Sender<KeyEvent>,
}

impl InputFeed {
    /// Report a pressed key.
    pub fn press(&self, key: Key) {
        let _ = self.tx.send(KeyEvent { key, pressed: true });
    }

    /// Report a released key.
    pub fn release(&self, key: Key) {
        let _ = self.tx.send(KeyEvent { key, pressed: false });
    }

    /// Forward a raw key event.
    pub fn send(&self, event: KeyEvent) {
        let _ = self.tx.send(event);
    }
}

/// Per-agent view in a [`WorldSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Center position.
    pub pos: Vec2,
    /// Heading in compass degrees.
    pub alpha: f64,
    /// Linear velocity per tick.
    pub v: f64,
    /// Angular velocity per tick, degrees.
    pub v_alpha: f64,
    /// Collision radius.
    pub radius: f64,
    /// Remaining life points.
    pub life: u32,
    /// Life points when fully healed.
    pub max_life: u32,
    /// Live/dead/immune cycle position.
    pub phase: LifePhase,
    /// Who currently steers.
    pub authority: ControlAuthority,
}

/// Read-only view of a world for renderers and wire protocols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Tick the snapshot was taken at.
    pub tick: u64,
    /// All agents in agent order.
    pub agents: Vec<AgentSnapshot>,
    /// All bullets in flight.
    pub bullets: Vec<Bullet>,
}

/// The simulation: obstacle grid, agents, bullets and collision rules.
pub struct World {
    tick: u64,
    name: String,
    grid: ObstacleGrid,
    agents: Vec<Agent>,
    bullets: Vec<Bullet>,
    rules: Vec<Box<dyn CollisionRule>>,
    latches: BTreeMap<Key, KeyLatch>,
    key_tx: Sender<KeyEvent>,
    key_rx: Receiver<KeyEvent>,
    events: TickEvents,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("tick", &self.tick)
            .field("name", &self.name)
            .field("grid", &self.grid)
            .field("agents", &self.agents.len())
            .field("bullets", &self.bullets)
            .field("rules", &self.rules.len())
            .field("latches", &self.latches)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl World {
    /// Build a world from a validated scenario and spawn one controller
    /// worker per agent.
    ///
    /// Agents with an attached player start under player control, the
    /// rest on autopilot.
    ///
    /// # Errors
    ///
    /// Fails when the scenario does not validate or a worker thread
    /// cannot be spawned.
    pub fn new(scenario: Scenario) -> Result<Self> {
        scenario.validate()?;
        let Scenario {
            name,
            grid,
            agents: specs,
        } = scenario;

        let mut agents = Vec::with_capacity(specs.len());
        for (id, spec) in specs.into_iter().enumerate() {
            let alert_flag = spec.wants_alerts();
            let AgentSpec {
                body,
                pos,
                alpha,
                policy,
                weapon,
                player,
                auto_resync,
                ..
            } = spec;

            let mut weapon = weapon.map(|spec| Weapon::new(spec, TICKS_PER_SECOND));
            let gun = weapon.as_ref().map(Weapon::handle);
            let controller = ControllerHandle::spawn(id, policy, body, gun, auto_resync)?;

            if let Some(weapon) = weapon.as_mut() {
                weapon.set_enabled(true);
                weapon.set_ai_access(true);
            }

            let pilot = player.map(|p| {
                let cooldown = duration_ticks(TOGGLE_COOLDOWN_SECS);
                if p.invasive {
                    PlayerPilot::invasive(p.scheme, p.turn_rate, cooldown)
                } else {
                    PlayerPilot::new(p.scheme, cooldown)
                }
            });

            let mut agent = Agent {
                body,
                state: AgentState::spawned_at(pos, alpha, &body),
                controller,
                weapon,
                pilot,
                alert_flag,
            };
            if agent.pilot.is_some() {
                Self::hand_to_player(&mut agent);
            }
            agents.push(agent);
        }

        let mut latches = BTreeMap::new();
        for agent in &agents {
            if let Some(pilot) = &agent.pilot {
                for (key, action) in pilot.scheme().bindings() {
                    if !action.is_stateless() {
                        latches.entry(key).or_default();
                    }
                }
            }
        }

        let (key_tx, key_rx) = unbounded();
        tracing::info!(name = %name, agents = agents.len(), "world created");
        Ok(Self {
            tick: 0,
            name,
            grid,
            agents,
            bullets: Vec::new(),
            rules: Vec::new(),
            latches,
            key_tx,
            key_rx,
            events: TickEvents::default(),
        })
    }

    /// Scenario name this world was built from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of completed ticks.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// The obstacle grid.
    #[must_use]
    pub const fn grid(&self) -> &ObstacleGrid {
        &self.grid
    }

    /// All agents in agent order.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// One agent by id.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// All bullets in flight.
    #[must_use]
    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    /// Events of the most recently completed tick.
    #[must_use]
    pub const fn events(&self) -> &TickEvents {
        &self.events
    }

    /// Register a collision rule. Rules run in registration order.
    pub fn add_rule(&mut self, rule: impl CollisionRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// A sender for host key events.
    #[must_use]
    pub fn input_feed(&self) -> InputFeed {
        InputFeed {
            tx: self.key_tx.clone(),
        }
    }

    /// Report a pressed key.
    pub fn press(&self, key: Key) {
        let _ = self.key_tx.send(KeyEvent { key, pressed: true });
    }

    /// Report a released key.
    pub fn release(&self, key: Key) {
        let _ = self.key_tx.send(KeyEvent { key, pressed: false });
    }

    /// Advance the world by one live tick.
    pub fn tick(&mut self) {
        self.tick_inner(None);
    }

    /// Advance the world by one tick driven by recorded inputs.
    ///
    /// Key resolution and weapon fire are replaced by the recorded
    /// values; physics, lifecycle and collision rules run as usual.
    pub fn tick_scripted(&mut self, inputs: &TickInputs) {
        self.tick_inner(Some(inputs));
    }

    fn tick_inner(&mut self, scripted: Option<&TickInputs>) {
        self.tick += 1;
        self.events = TickEvents::default();

        self.step_lifecycle();
        match scripted {
            Some(inputs) => self.apply_scripted_inputs(inputs),
            None => self.resolve_input(),
        }
        match scripted {
            Some(inputs) => self.spawn_scripted_shots(inputs),
            None => self.resolve_fire(),
        }
        self.step_bullets();
        self.step_agents(scripted);
        self.scan_contacts();
        self.dispatch_messages();

        tracing::trace!(tick = self.tick, hash = self.state_hash(), "tick complete");
    }

    /// Count down respawn, immunity, reload and toggle cooldowns.
    fn step_lifecycle(&mut self) {
        let field_size = self.grid.field_size();
        let tile_size = self.grid.tile_size();
        for (id, agent) in self.agents.iter_mut().enumerate() {
            match agent.state.phase {
                LifePhase::Dead { respawn_in } => {
                    let left = respawn_in.saturating_sub(1);
                    if left == 0 {
                        Self::respawn(agent, field_size, tile_size);
                        tracing::debug!(agent = id, "agent respawned");
                    } else {
                        agent.state.phase = LifePhase::Dead { respawn_in: left };
                    }
                }
                LifePhase::Immune { wears_off_in } => {
                    let left = wears_off_in.saturating_sub(1);
                    agent.state.phase = if left == 0 {
                        LifePhase::Alive
                    } else {
                        LifePhase::Immune { wears_off_in: left }
                    };
                }
                LifePhase::Alive => {}
            }
            if let Some(pilot) = agent.pilot.as_mut() {
                pilot.tick_cooldown();
            }
            if let Some(weapon) = agent.weapon.as_mut() {
                weapon.tick_reload();
            }
        }
    }

    /// Drain buffered key events and run every pilot's tick.
    ///
    /// Stateless actions execute per press event in arrival order;
    /// stateful keys update their latches first and feed all bound
    /// pilots afterwards, so several pilots may share a key.
    fn resolve_input(&mut self) {
        while let Ok(event) = self.key_rx.try_recv() {
            if let Some(latch) = self.latches.get_mut(&event.key) {
                if event.pressed {
                    latch.press();
                } else {
                    latch.release();
                }
            }
            if !event.pressed {
                continue;
            }
            for id in 0..self.agents.len() {
                let agent = &mut self.agents[id];
                let Some(pilot) = agent.pilot.as_mut() else {
                    continue;
                };
                let Some(action) = pilot.scheme().action(event.key) else {
                    continue;
                };
                if !action.is_stateless() {
                    continue;
                }
                // ToggleAutopilot is the only stateless action. The
                // cooldown is consumed even when the agent is dead and
                // the handoff itself has to wait for the respawn.
                if !pilot.try_toggle() {
                    continue;
                }
                if agent.state.is_dead() {
                    continue;
                }
                Self::toggle_authority(agent);
                self.events.toggles.push(id);
                tracing::debug!(
                    agent = id,
                    authority = ?self.agents[id].state.authority,
                    "control toggled"
                );
            }
        }

        for (&key, latch) in &mut self.latches {
            let active = latch.take_active();
            for agent in &mut self.agents {
                let Some(pilot) = agent.pilot.as_mut() else {
                    continue;
                };
                let Some(action) = pilot.scheme().action(key) else {
                    continue;
                };
                if !action.is_stateless() {
                    pilot.key_state(action, active);
                }
            }
        }

        for id in 0..self.agents.len() {
            let agent = &mut self.agents[id];
            let Some(pilot) = agent.pilot.as_mut() else {
                continue;
            };
            let outcome = pilot.finish_tick();
            if outcome.fire {
                if let Some(weapon) = agent.weapon.as_mut() {
                    weapon.request_fire_player();
                }
            }
            if let Some(v_alpha) = outcome.invasive_turn {
                if agent.state.authority == ControlAuthority::Player && !agent.state.is_dead() {
                    agent.state.v_alpha = v_alpha;
                    self.events.turns.push((id, v_alpha));
                }
            }
        }
    }

    /// Re-apply recorded toggles and invasive turns.
    fn apply_scripted_inputs(&mut self, inputs: &TickInputs) {
        for &id in &inputs.toggles {
            let Some(agent) = self.agents.get_mut(id) else {
                continue;
            };
            Self::toggle_authority(agent);
            self.events.toggles.push(id);
        }
        for &(id, v_alpha) in &inputs.turns {
            let Some(agent) = self.agents.get_mut(id) else {
                continue;
            };
            agent.state.v_alpha = v_alpha;
            self.events.turns.push((id, v_alpha));
        }
    }

    /// Resolve queued fire requests into bullets.
    fn resolve_fire(&mut self) {
        for id in 0..self.agents.len() {
            let agent = &mut self.agents[id];
            let Some(weapon) = agent.weapon.as_mut() else {
                continue;
            };
            let Some(base_speed) = weapon.resolve_fire() else {
                continue;
            };
            // Forward momentum adds to the shot; reversing does not
            // subtract from it.
            let speed = agent.state.v.max(0.0) + base_speed;
            self.spawn_bullet(id, speed);
        }
    }

    /// Spawn recorded shots at the shooters' current poses.
    fn spawn_scripted_shots(&mut self, inputs: &TickInputs) {
        for &(shooter, speed) in &inputs.shots {
            if shooter < self.agents.len() {
                self.spawn_bullet(shooter, speed);
            }
        }
    }

    fn spawn_bullet(&mut self, shooter: AgentId, speed: f64) {
        let agent = &self.agents[shooter];
        let start = agent.state.pos + agent.state.heading() * (agent.body.radius + 1.0);
        self.bullets.push(Bullet {
            pos: start,
            speed,
            direction: agent.state.alpha,
        });
        self.events.shots.push((shooter, speed));
        tracing::debug!(agent = shooter, speed, "bullet fired");
    }

    /// Fly every bullet in unit steps, testing tiles and agents at
    /// each step.
    ///
    /// Dead and immune agents still absorb bullets; the hit simply
    /// deals no damage.
    fn step_bullets(&mut self) {
        let bullets = std::mem::take(&mut self.bullets);
        'flight: for mut bullet in bullets {
            let step = heading_vector(bullet.direction);
            for _ in 0..bullet_step_count(bullet.speed) {
                bullet.pos = bullet.pos + step;
                if self.grid.tile_at_point(bullet.pos).stops_bullets() {
                    continue 'flight;
                }
                for (id, agent) in self.agents.iter_mut().enumerate() {
                    if bullet.pos.distance(agent.state.pos) <= agent.body.radius {
                        if Self::deal_damage(agent, 1) {
                            self.events.destroyed.push(id);
                            tracing::debug!(agent = id, "agent shot down");
                        }
                        continue 'flight;
                    }
                }
            }
            self.bullets.push(bullet);
        }
    }

    /// Poll and move each agent in agent order.
    fn step_agents(&mut self, scripted: Option<&TickInputs>) {
        for id in 0..self.agents.len() {
            let command = match scripted {
                Some(inputs) => inputs.commands.get(id).copied().unwrap_or_default(),
                None => self.agents[id].poll_command(),
            };
            self.events.commands.push(command);

            let agent = &mut self.agents[id];
            if agent.state.is_dead() {
                continue;
            }
            let motion = integrate_command(&agent.state, &agent.body, command);
            let swept = sweep_walls(&self.grid, agent.state.pos, agent.body.radius, motion.delta);
            agent.state.pos = agent.state.pos + swept.delta;
            agent.state.alpha = motion.alpha;
            agent.state.v = motion.v;
            agent.state.v_alpha = motion.v_alpha;
            if let Some(kind) = swept.blocked_by {
                let damage = kind.contact_damage();
                if damage > 0 && Self::deal_damage(agent, damage) {
                    self.events.destroyed.push(id);
                    tracing::debug!(agent = id, "agent destroyed by terrain");
                }
            }
        }
    }

    /// Scan all agent pairs and apply rule effects.
    ///
    /// Each unordered pair is dispatched at most once per tick; the
    /// collected effects apply after the scan so rules observe every
    /// contact at pre-effect positions.
    fn scan_contacts(&mut self) {
        let mut effects = Vec::new();
        for i in 0..self.agents.len() {
            for j in (i + 1)..self.agents.len() {
                let first = &self.agents[i];
                let second = &self.agents[j];
                if !circles_overlap(
                    first.state.pos,
                    first.body.radius,
                    second.state.pos,
                    second.body.radius,
                ) {
                    continue;
                }
                let contact = Contact {
                    first: i,
                    first_pos: first.state.pos,
                    second: j,
                    second_pos: second.state.pos,
                };
                self.events.contacts.push((i, j));
                for rule in &mut self.rules {
                    effects.extend(rule.on_contact(contact));
                }
            }
        }
        for effect in effects {
            match effect {
                CollisionEffect::TeleportFarthestFrom { agent, reference } => {
                    self.teleport_farthest_from(agent, reference);
                }
            }
        }
    }

    /// Broadcast alerts on the alert cadence, then send each listening
    /// agent its vision and position readings.
    fn dispatch_messages(&self) {
        if self.tick % ALERT_INTERVAL == 0 {
            let reading = AlertReading {
                positions: self.agents.iter().map(|a| a.state.pos).collect(),
            };
            for agent in &self.agents {
                if agent.alert_flag {
                    agent.send_sensor(SensorMessage::Alert {
                        tick: self.tick,
                        reading: reading.clone(),
                    });
                }
            }
        }

        let poses: Vec<(Vec2, f64)> = self
            .agents
            .iter()
            .map(|a| (a.state.pos, a.body.radius))
            .collect();
        for agent in &self.agents {
            if !agent.controller_listening() {
                continue;
            }
            let reading = VisionReading {
                tiles: visible_tiles(
                    &self.grid,
                    agent.state.pos,
                    agent.state.alpha,
                    agent.body.fov_angle,
                ),
                agents: visible_agents(
                    agent.state.pos,
                    agent.body.radius,
                    agent.state.alpha,
                    agent.body.fov_angle,
                    &poses,
                ),
            };
            agent.send_sensor(SensorMessage::Vision {
                tick: self.tick,
                reading,
            });
            agent.send_sensor(SensorMessage::Position {
                tick: self.tick,
                reading: PositionReading {
                    pos: agent.state.pos,
                    alpha: agent.state.alpha,
                    v: agent.state.v,
                    v_alpha: agent.state.v_alpha,
                },
            });
        }
    }

    /// Apply damage, destroying the agent when life runs out. Returns
    /// whether this call destroyed it. Dead and immune agents take no
    /// damage.
    fn deal_damage(agent: &mut Agent, damage: u32) -> bool {
        if agent.state.is_dead() || agent.state.is_immune() {
            return false;
        }
        agent.state.life = agent.state.life.saturating_sub(damage);
        if agent.state.life == 0 {
            Self::destroy(agent);
            return true;
        }
        false
    }

    /// Put the agent into its dead phase: velocities zeroed, mailbox
    /// flushed, gun disabled for both sides. Authority is preserved so
    /// the respawn can restore the same side.
    fn destroy(agent: &mut Agent) {
        agent.state.phase = LifePhase::Dead {
            respawn_in: duration_ticks(agent.body.respawn_secs),
        };
        agent.state.v = 0.0;
        agent.state.v_alpha = 0.0;
        agent.controller.flush();
        if let Some(weapon) = agent.weapon.as_mut() {
            weapon.set_enabled(false);
            weapon.set_player_access(false);
            weapon.set_ai_access(false);
        }
    }

    /// Bring a dead agent back: full life, temporary immunity, a
    /// teleport to the corner farthest from where it fell, and the
    /// full control handoff to whichever side held authority.
    fn respawn(agent: &mut Agent, field_size: f64, tile_size: f64) {
        agent.state.life = agent.body.max_life;
        agent.state.phase = LifePhase::Immune {
            wears_off_in: duration_ticks(agent.body.immunity_secs),
        };
        let (pos, alpha) = farthest_corner(field_size, tile_size, agent.body.radius, agent.state.pos);
        agent.state.pos = pos;
        agent.state.alpha = alpha;
        agent.state.v = 0.0;
        agent.state.v_alpha = 0.0;
        match agent.state.authority {
            ControlAuthority::Player => Self::hand_to_player(agent),
            ControlAuthority::Autopilot => Self::hand_to_autopilot(agent),
        }
        if let Some(weapon) = agent.weapon.as_mut() {
            weapon.set_enabled(true);
            match agent.state.authority {
                ControlAuthority::Player => weapon.set_player_access(true),
                ControlAuthority::Autopilot => weapon.set_ai_access(true),
            }
        }
    }

    fn toggle_authority(agent: &mut Agent) {
        match agent.state.authority {
            ControlAuthority::Autopilot => Self::hand_to_player(agent),
            ControlAuthority::Player => Self::hand_to_autopilot(agent),
        }
    }

    /// Hand steering and gun to the player. The controller keeps
    /// running but its mailbox is flushed and its output ignored.
    fn hand_to_player(agent: &mut Agent) {
        agent.controller.flush();
        if let Some(weapon) = agent.weapon.as_mut() {
            weapon.set_ai_access(false);
            weapon.set_player_access(true);
        }
        agent.state.authority = ControlAuthority::Player;
    }

    /// Hand steering and gun back to the autopilot. The controller is
    /// reset so no stale command from before the player took over
    /// comes back to life.
    fn hand_to_autopilot(agent: &mut Agent) {
        if let Some(weapon) = agent.weapon.as_mut() {
            weapon.set_player_access(false);
        }
        agent.controller.reset();
        if let Some(weapon) = agent.weapon.as_mut() {
            weapon.set_ai_access(true);
        }
        agent.state.authority = ControlAuthority::Autopilot;
    }

    fn teleport_farthest_from(&mut self, id: AgentId, reference: Vec2) {
        let field_size = self.grid.field_size();
        let tile_size = self.grid.tile_size();
        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        let (pos, alpha) = farthest_corner(field_size, tile_size, agent.body.radius, reference);
        agent.state.pos = pos;
        agent.state.alpha = alpha;
        agent.state.v = 0.0;
        agent.state.v_alpha = 0.0;
        tracing::debug!(agent = id, x = pos.x, y = pos.y, "agent teleported");
    }

    /// Fingerprint of the physical state: tick, agent poses, life,
    /// phases, authorities and bullets.
    ///
    /// Worker and input state is excluded, so a live run and its
    /// scripted replay hash identically tick for tick.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        for agent in &self.agents {
            let state = &agent.state;
            state.pos.x.to_bits().hash(&mut hasher);
            state.pos.y.to_bits().hash(&mut hasher);
            state.alpha.to_bits().hash(&mut hasher);
            state.v.to_bits().hash(&mut hasher);
            state.v_alpha.to_bits().hash(&mut hasher);
            state.life.hash(&mut hasher);
            match state.phase {
                LifePhase::Alive => 0u32.hash(&mut hasher),
                LifePhase::Dead { respawn_in } => {
                    1u32.hash(&mut hasher);
                    respawn_in.hash(&mut hasher);
                }
                LifePhase::Immune { wears_off_in } => {
                    2u32.hash(&mut hasher);
                    wears_off_in.hash(&mut hasher);
                }
            }
            (state.authority == ControlAuthority::Player).hash(&mut hasher);
        }
        for bullet in &self.bullets {
            bullet.pos.x.to_bits().hash(&mut hasher);
            bullet.pos.y.to_bits().hash(&mut hasher);
            bullet.speed.to_bits().hash(&mut hasher);
            bullet.direction.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Take a read-only snapshot for rendering or streaming.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            agents: self
                .agents
                .iter()
                .map(|a| AgentSnapshot {
                    pos: a.state.pos,
                    alpha: a.state.alpha,
                    v: a.state.v,
                    v_alpha: a.state.v_alpha,
                    radius: a.body.radius,
                    life: a.state.life,
                    max_life: a.body.max_life,
                    phase: a.state.phase,
                    authority: a.state.authority,
                })
                .collect(),
            bullets: self.bullets.clone(),
        }
    }
}

/// Spawn pose in the field corner diagonally opposite `from`'s
/// quadrant, one tile plus a small margin in from the walls, angled
/// toward the field center.
fn farthest_corner(field_size: f64, tile_size: f64, radius: f64, from: Vec2) -> (Vec2, f64) {
    let lower = tile_size + radius + 1.0;
    let upper = field_size - tile_size - radius - 2.0;
    let half = field_size / 2.0;
    if from.x > half {
        if from.y > half {
            (Vec2::new(lower, lower), 135.0)
        } else {
            (Vec2::new(lower, upper), 45.0)
        }
    } else if from.y > half {
        (Vec2::new(upper, lower), 225.0)
    } else {
        (Vec2::new(upper, upper), 315.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CatchRule;
    use crate::error::ArenaError;
    use crate::input::ControlScheme;
    use crate::policy::{MovementPolicy, PolicyCtx};
    use crate::scenario::PlayerSpec;
    use crate::weapon::WeaponSpec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    const HOLE_MAP: &str = "00000\n00000\n00300\n00000\n00000";

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }

    fn lone_agent(pos: Vec2, alpha: f64) -> Scenario {
        Scenario::new("test", ObstacleGrid::bordered(100, 10.0))
            .with_agent(AgentSpec::new(pos, alpha))
    }

    fn push_command(a: f32, a_alpha: f32) -> TickInputs {
        TickInputs {
            commands: vec![ActionCommand::new(a, a_alpha)],
            ..TickInputs::default()
        }
    }

    #[test]
    fn test_world_from_scenario() {
        let world = World::new(lone_agent(Vec2::new(500.0, 500.0), 0.0)).unwrap();
        assert_eq!(world.tick_count(), 0);
        assert_eq!(world.agents().len(), 1);
        assert!(world.bullets().is_empty());
        let agent = &world.agents()[0];
        assert_eq!(agent.state().authority, ControlAuthority::Autopilot);
        assert!(!agent.is_piloted());
        assert!(agent.weapon().is_none());
    }

    #[test]
    fn test_rejects_invalid_spawn() {
        let err = World::new(lone_agent(Vec2::new(5.0, 5.0), 0.0)).unwrap_err();
        assert!(matches!(err, ArenaError::InvalidSpawn { index: 0, .. }));
    }

    #[test]
    fn test_scripted_command_moves_agent() {
        let mut world = World::new(lone_agent(Vec2::new(500.0, 500.0), 90.0)).unwrap();
        world.tick_scripted(&push_command(10.0, 0.0));

        assert_eq!(world.tick_count(), 1);
        let state = world.agents()[0].state();
        assert_eq!(state.v, 10.0);
        assert!((state.pos.x - 510.0).abs() < 1e-9);
        assert!((state.pos.y - 500.0).abs() < 1e-9);
        assert_eq!(world.events().commands, vec![ActionCommand::new(10.0, 0.0)]);
    }

    #[test]
    fn test_border_stops_movement_without_damage() {
        // Heading 270 drives straight at the left border.
        let mut world = World::new(lone_agent(Vec2::new(45.0, 500.0), 270.0)).unwrap();
        world.tick_scripted(&push_command(10.0, 0.0));

        let state = world.agents()[0].state();
        // Border ends at x=10; the rim comes no closer than the radius.
        assert!((state.pos.x - 40.0).abs() < 1e-9);
        assert_eq!(state.v, 10.0);
        assert_eq!(state.life, 3);
        assert!(world.events().destroyed.is_empty());
    }

    #[test]
    fn test_hole_contact_destroys_agent() {
        let grid = ObstacleGrid::from_text(HOLE_MAP, 10.0).unwrap();
        let body = AgentBody::new().with_radius(5.0);
        let scenario = Scenario::new("hole", grid)
            .with_agent(AgentSpec::new(Vec2::new(25.0, 44.0), 0.0).with_body(body));
        let mut world = World::new(scenario).unwrap();

        world.tick_scripted(&push_command(10.0, 0.0));

        let state = world.agents()[0].state();
        assert!(state.is_dead());
        assert_eq!(state.life, 0);
        assert_eq!(state.v, 0.0);
        assert!((state.pos.y - 35.0).abs() < 1e-9);
        assert_eq!(world.events().destroyed, vec![0]);
    }

    #[test]
    fn test_destroyed_agent_respawns_in_far_corner() {
        let grid = ObstacleGrid::from_text(HOLE_MAP, 10.0).unwrap();
        let body = AgentBody::new()
            .with_radius(5.0)
            .with_respawn_secs(0.25)
            .with_immunity_secs(0.2);
        let scenario = Scenario::new("respawn", grid)
            .with_agent(AgentSpec::new(Vec2::new(25.0, 44.0), 0.0).with_body(body));
        let mut world = World::new(scenario).unwrap();

        world.tick_scripted(&push_command(10.0, 0.0));
        assert!(world.agents()[0].state().is_dead());

        // 0.25s at 20 ticks/s: four idle ticks still dead, the fifth
        // brings the agent back.
        let idle = TickInputs::default();
        for _ in 0..4 {
            world.tick_scripted(&idle);
            assert!(world.agents()[0].state().is_dead());
        }
        world.tick_scripted(&idle);

        let state = world.agents()[0].state();
        assert!(state.is_immune());
        assert_eq!(state.life, 3);
        // Death near the bottom-left sends the agent to the top-right
        // corner, facing back into the field.
        assert_eq!(state.pos, Vec2::new(33.0, 16.0));
        assert_eq!(state.alpha, 225.0);
        assert_eq!(state.v, 0.0);
        assert_eq!(state.authority, ControlAuthority::Autopilot);

        // Immunity of 0.2s wears off after four more ticks.
        for _ in 0..3 {
            world.tick_scripted(&idle);
            assert!(world.agents()[0].state().is_immune());
        }
        world.tick_scripted(&idle);
        assert_eq!(world.agents()[0].state().phase, LifePhase::Alive);
    }

    #[test]
    fn test_bullet_crosses_field_and_hits() {
        let scenario = Scenario::new("duel", ObstacleGrid::example_arena())
            .with_agent(
                AgentSpec::new(Vec2::new(300.0, 200.0), 90.0).with_weapon(WeaponSpec::new()),
            )
            .with_agent(AgentSpec::new(Vec2::new(400.0, 200.0), 270.0));
        let mut world = World::new(scenario).unwrap();

        let mut first = TickInputs::default();
        first.shots.push((0, 12.0));
        world.tick_scripted(&first);

        // Muzzle at radius+1: the bullet starts at x=331 and makes 12
        // unit steps per tick.
        assert_eq!(world.bullets().len(), 1);
        assert_eq!(world.bullets()[0].pos, Vec2::new(343.0, 200.0));
        assert_eq!(world.events().shots, vec![(0, 12.0)]);
        assert_eq!(world.agents()[1].state().life, 3);

        // The target rim sits at x=370; the fourth tick reaches it.
        let idle = TickInputs::default();
        for _ in 0..3 {
            world.tick_scripted(&idle);
        }
        assert!(world.bullets().is_empty());
        assert_eq!(world.agents()[1].state().life, 2);
    }

    #[test]
    fn test_immune_agent_absorbs_bullet_unharmed() {
        let scenario = Scenario::new("immune", ObstacleGrid::example_arena())
            .with_agent(
                AgentSpec::new(Vec2::new(300.0, 200.0), 90.0).with_weapon(WeaponSpec::new()),
            )
            .with_agent(AgentSpec::new(Vec2::new(400.0, 200.0), 270.0));
        let mut world = World::new(scenario).unwrap();
        world.agents[1].state.phase = LifePhase::Immune { wears_off_in: 1000 };

        let mut first = TickInputs::default();
        first.shots.push((0, 12.0));
        world.tick_scripted(&first);
        let idle = TickInputs::default();
        for _ in 0..3 {
            world.tick_scripted(&idle);
        }

        // Absorbed without damage.
        assert!(world.bullets().is_empty());
        assert_eq!(world.agents()[1].state().life, 3);
        assert!(world.events().destroyed.is_empty());
    }

    #[test]
    fn test_wall_swallows_bullet() {
        // Shooter faces the wall column at x 330..340; the muzzle point
        // lands inside it.
        let scenario = Scenario::new("wall", ObstacleGrid::example_arena()).with_agent(
            AgentSpec::new(Vec2::new(300.0, 300.0), 90.0).with_weapon(WeaponSpec::new()),
        );
        let mut world = World::new(scenario).unwrap();

        let mut first = TickInputs::default();
        first.shots.push((0, 12.0));
        world.tick_scripted(&first);

        assert!(world.bullets().is_empty());
        assert_eq!(world.events().shots, vec![(0, 12.0)]);
    }

    #[test]
    fn test_catch_rule_teleports_hunter_once() {
        let scenario = Scenario::new("catch", ObstacleGrid::example_arena())
            .with_agent(AgentSpec::new(Vec2::new(500.0, 300.0), 0.0))
            .with_agent(AgentSpec::new(Vec2::new(540.0, 300.0), 0.0));
        let mut world = World::new(scenario).unwrap();
        world.add_rule(CatchRule::new(0, &[1]));

        world.tick_scripted(&TickInputs::default());

        // One dispatch for the unordered pair.
        assert_eq!(world.events().contacts, vec![(0, 1)]);
        let hunter = world.agents()[1].state();
        assert_eq!(hunter.pos, Vec2::new(958.0, 958.0));
        assert_eq!(hunter.alpha, 315.0);
        assert_eq!(hunter.v, 0.0);
        // The fugitive stays put.
        assert_eq!(world.agents()[0].state().pos, Vec2::new(500.0, 300.0));

        // Separated now: the next tick reports no contact.
        world.tick_scripted(&TickInputs::default());
        assert!(world.events().contacts.is_empty());
    }

    #[test]
    fn test_alert_broadcast_every_ten_ticks() {
        struct AlertCounter(Arc<AtomicUsize>);
        impl MovementPolicy for AlertCounter {
            fn alert(&mut self, _reading: &AlertReading, ctx: &mut PolicyCtx) -> ActionCommand {
                self.0.fetch_add(1, Ordering::SeqCst);
                ctx.previous()
            }
        }

        let count = Arc::new(AtomicUsize::new(0));
        let scenario = Scenario::new("alerts", ObstacleGrid::example_arena())
            .with_agent(
                AgentSpec::new(Vec2::new(500.0, 200.0), 0.0)
                    .with_policy(AlertCounter(Arc::clone(&count)))
                    .with_alert_flag(true),
            )
            .with_agent(AgentSpec::new(Vec2::new(500.0, 400.0), 0.0));
        let mut world = World::new(scenario).unwrap();

        for _ in 0..9 {
            world.tick();
        }
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        world.tick();
        assert!(wait_for(|| count.load(Ordering::SeqCst) == 1));

        for _ in 0..10 {
            world.tick();
        }
        assert!(wait_for(|| count.load(Ordering::SeqCst) == 2));
    }

    #[test]
    fn test_vision_reaches_controller_with_self_sighting() {
        struct VisionProbe {
            own_entry: Arc<Mutex<Option<bool>>>,
        }
        impl MovementPolicy for VisionProbe {
            fn vision(&mut self, reading: &VisionReading, ctx: &mut PolicyCtx) -> ActionCommand {
                let present = reading.agents.first().is_some_and(Option::is_some);
                *self.own_entry.lock().unwrap() = Some(present);
                ctx.previous()
            }
        }

        let own_entry = Arc::new(Mutex::new(None));
        let scenario = Scenario::new("vision", ObstacleGrid::example_arena()).with_agent(
            AgentSpec::new(Vec2::new(500.0, 200.0), 0.0).with_policy(VisionProbe {
                own_entry: Arc::clone(&own_entry),
            }),
        );
        let mut world = World::new(scenario).unwrap();

        world.tick();
        assert!(wait_for(|| own_entry.lock().unwrap().is_some()));
        assert_eq!(*own_entry.lock().unwrap(), Some(true));
    }

    #[test]
    fn test_player_keys_drive_the_agent() {
        let scenario = Scenario::new("pilot", ObstacleGrid::example_arena()).with_agent(
            AgentSpec::new(Vec2::new(500.0, 200.0), 90.0)
                .with_player(PlayerSpec::new(ControlScheme::wasd())),
        );
        let mut world = World::new(scenario).unwrap();
        assert_eq!(world.agents()[0].state().authority, ControlAuthority::Player);

        world.press(Key::W);
        world.tick();
        let state = world.agents()[0].state();
        assert_eq!(state.v, 1.0);
        assert!((state.pos.x - 501.0).abs() < 1e-9);

        // Released key: acceleration clears but momentum stays.
        world.release(Key::W);
        world.tick();
        let state = world.agents()[0].state();
        assert_eq!(state.v, 1.0);
        assert!((state.pos.x - 502.0).abs() < 1e-9);
    }

    #[test]
    fn test_toggle_key_hands_control_back_and_forth() {
        let scenario = Scenario::new("toggle", ObstacleGrid::example_arena()).with_agent(
            AgentSpec::new(Vec2::new(500.0, 200.0), 0.0)
                .with_player(PlayerSpec::new(ControlScheme::wasd())),
        );
        let mut world = World::new(scenario).unwrap();
        assert_eq!(world.agents()[0].state().authority, ControlAuthority::Player);

        world.press(Key::P);
        world.tick();
        assert_eq!(
            world.agents()[0].state().authority,
            ControlAuthority::Autopilot
        );
        assert_eq!(world.events().toggles, vec![0]);

        // The cooldown swallows an immediate second press.
        world.press(Key::P);
        world.tick();
        assert_eq!(
            world.agents()[0].state().authority,
            ControlAuthority::Autopilot
        );
        assert!(world.events().toggles.is_empty());

        // Half a second later the toggle works again.
        for _ in 0..10 {
            world.tick();
        }
        world.press(Key::P);
        world.tick();
        assert_eq!(world.agents()[0].state().authority, ControlAuthority::Player);
    }

    #[test]
    fn test_dead_agent_consumes_toggle_without_handoff() {
        let scenario = Scenario::new("dead-toggle", ObstacleGrid::example_arena()).with_agent(
            AgentSpec::new(Vec2::new(500.0, 200.0), 0.0)
                .with_player(PlayerSpec::new(ControlScheme::wasd())),
        );
        let mut world = World::new(scenario).unwrap();
        World::deal_damage(&mut world.agents[0], 100);
        assert!(world.agents()[0].state().is_dead());

        world.press(Key::P);
        world.tick();
        // Ignored, but the cooldown is spent.
        assert_eq!(world.agents()[0].state().authority, ControlAuthority::Player);
        assert!(world.events().toggles.is_empty());

        world.agents[0].state.phase = LifePhase::Alive;
        world.press(Key::P);
        world.tick();
        assert_eq!(world.agents()[0].state().authority, ControlAuthority::Player);

        for _ in 0..10 {
            world.tick();
        }
        world.press(Key::P);
        world.tick();
        assert_eq!(
            world.agents()[0].state().authority,
            ControlAuthority::Autopilot
        );
    }

    #[test]
    fn test_invasive_steering_writes_turn_rate() {
        let scenario = Scenario::new("invasive", ObstacleGrid::example_arena()).with_agent(
            AgentSpec::new(Vec2::new(500.0, 200.0), 0.0)
                .with_player(PlayerSpec::invasive(ControlScheme::wasd())),
        );
        let mut world = World::new(scenario).unwrap();

        world.press(Key::D);
        world.tick();
        let state = world.agents()[0].state();
        assert_eq!(state.v_alpha, 10.0);
        assert_eq!(state.alpha, 10.0);
        assert_eq!(world.events().turns, vec![(0, 10.0)]);

        // Releasing the key zeroes the turn rate; the heading stays.
        world.release(Key::D);
        world.tick();
        let state = world.agents()[0].state();
        assert_eq!(state.v_alpha, 0.0);
        assert_eq!(state.alpha, 10.0);
        assert_eq!(world.events().turns, vec![(0, 0.0)]);
    }

    #[test]
    fn test_gun_access_follows_authority() {
        let scenario = Scenario::new("gun", ObstacleGrid::example_arena()).with_agent(
            AgentSpec::new(Vec2::new(500.0, 200.0), 0.0)
                .with_player(PlayerSpec::new(ControlScheme::wasd()))
                .with_weapon(WeaponSpec::new()),
        );
        let mut world = World::new(scenario).unwrap();

        // The player side holds the gun from the start.
        assert!(world.agents[0].weapon.as_mut().unwrap().request_fire_player());

        // Handing over to the autopilot drops the queued request and
        // withdraws player access.
        World::hand_to_autopilot(&mut world.agents[0]);
        let weapon = world.agents[0].weapon.as_mut().unwrap();
        assert!(!weapon.is_preparing());
        assert!(!weapon.request_fire_player());
    }

    #[test]
    fn test_scripted_runs_hash_identically() {
        let build = || {
            World::new(
                Scenario::new("hash", ObstacleGrid::example_arena())
                    .with_agent(AgentSpec::new(Vec2::new(500.0, 200.0), 90.0))
                    .with_agent(AgentSpec::new(Vec2::new(500.0, 400.0), 0.0)),
            )
            .unwrap()
        };
        let mut first = build();
        let mut second = build();
        assert_eq!(first.state_hash(), second.state_hash());

        let script = vec![
            TickInputs {
                commands: vec![ActionCommand::new(5.0, 2.0), ActionCommand::new(0.0, -3.0)],
                shots: vec![(0, 12.0)],
                ..TickInputs::default()
            },
            TickInputs::default(),
            TickInputs {
                turns: vec![(1, 7.5)],
                ..TickInputs::default()
            },
        ];
        for inputs in &script {
            first.tick_scripted(inputs);
            second.tick_scripted(inputs);
            assert_eq!(first.state_hash(), second.state_hash());
        }

        // Diverging commands diverge the hash.
        first.tick_scripted(&push_command(9.0, 0.0));
        second.tick_scripted(&push_command(8.0, 0.0));
        assert_ne!(first.state_hash(), second.state_hash());
    }

    #[test]
    fn test_events_round_trip_into_inputs() {
        let scenario = Scenario::new("events", ObstacleGrid::example_arena())
            .with_agent(AgentSpec::new(Vec2::new(500.0, 200.0), 90.0))
            .with_agent(AgentSpec::new(Vec2::new(500.0, 400.0), 0.0));
        let mut world = World::new(scenario).unwrap();

        let inputs = TickInputs {
            commands: vec![ActionCommand::new(3.0, 1.0), ActionCommand::ZERO],
            turns: vec![(1, -4.0)],
            shots: vec![(0, 15.0)],
            ..TickInputs::default()
        };
        world.tick_scripted(&inputs);
        assert_eq!(world.events().to_inputs(), inputs);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let scenario = Scenario::new("snap", ObstacleGrid::example_arena())
            .with_agent(
                AgentSpec::new(Vec2::new(300.0, 200.0), 90.0).with_weapon(WeaponSpec::new()),
            )
            .with_agent(AgentSpec::new(Vec2::new(600.0, 200.0), 270.0));
        let mut world = World::new(scenario).unwrap();

        let mut first = TickInputs::default();
        first.shots.push((0, 12.0));
        world.tick_scripted(&first);

        let snap = world.snapshot();
        assert_eq!(snap.tick, 1);
        assert_eq!(snap.agents.len(), 2);
        assert_eq!(snap.agents[0].radius, 30.0);
        assert_eq!(snap.agents[0].max_life, 3);
        assert_eq!(snap.agents[0].pos, world.agents()[0].state().pos);
        assert_eq!(snap.bullets.len(), 1);
        assert_eq!(snap.bullets, world.bullets());
    }

    #[test]
    fn test_farthest_corner_quadrants() {
        // Field 1000, tile 10, radius 30: margins at 41 and 958.
        let cases = [
            (Vec2::new(900.0, 900.0), Vec2::new(41.0, 41.0), 135.0),
            (Vec2::new(900.0, 100.0), Vec2::new(41.0, 958.0), 45.0),
            (Vec2::new(100.0, 900.0), Vec2::new(958.0, 41.0), 225.0),
            (Vec2::new(100.0, 100.0), Vec2::new(958.0, 958.0), 315.0),
        ];
        for (from, expected_pos, expected_alpha) in cases {
            let (pos, alpha) = farthest_corner(1000.0, 10.0, 30.0, from);
            assert_eq!(pos, expected_pos, "from {from:?}");
            assert_eq!(alpha, expected_alpha, "from {from:?}");
        }
        // Dead center counts as the top-left quadrant.
        let (pos, _) = farthest_corner(1000.0, 10.0, 30.0, Vec2::new(500.0, 500.0));
        assert_eq!(pos, Vec2::new(958.0, 958.0));
    }
}

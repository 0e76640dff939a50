//! Demo autopilot policies for headless runs.
//!
//! These cover the classic arena behaviors: blind cruisers that trace
//! a fixed figure, a random walker, and alert-driven hunters and
//! evaders. They double as worked examples for writing a
//! [`MovementPolicy`] against the sensor readings.

use arena_core::agent::AgentId;
use arena_core::math::{clamp_symmetric, wrap_degrees, Vec2};
use arena_core::messages::{ActionCommand, AlertReading, PositionReading};
use arena_core::policy::{IdlePolicy, MovementPolicy, PolicyCtx};

/// Forward speed the steering policies settle at.
const CRUISE_SPEED: f64 = 10.0;

/// Chase shoots once its heading is within this many degrees of the
/// target bearing.
const AIM_TOLERANCE: f64 = 15.0;

/// Compass bearing from one point to another.
fn bearing_to(from: Vec2, to: Vec2) -> f64 {
    wrap_degrees((to.x - from.x).atan2(-(to.y - from.y)).to_degrees())
}

/// Signed degrees from the current heading to a bearing, in
/// `[-180, 180)`. Positive means turn clockwise.
fn angle_error(bearing: f64, alpha: f64) -> f64 {
    let diff = wrap_degrees(bearing - alpha);
    if diff >= 180.0 {
        diff - 360.0
    } else {
        diff
    }
}

/// Turn toward a destination and hold cruise speed.
///
/// The turn command closes a quarter of the remaining angle error per
/// tick and damps the current turn rate, which settles onto the
/// bearing without oscillating at the body's usual turn limits.
fn steer_towards(reading: &PositionReading, dest: Vec2, ctx: &PolicyCtx) -> ActionCommand {
    let body = ctx.body();
    let err = angle_error(bearing_to(reading.pos, dest), reading.alpha);
    let a_alpha = clamp_symmetric(err * 0.25 - reading.v_alpha * 0.5, body.a_alpha_max);
    let a = if reading.v < CRUISE_SPEED.min(body.v_max) {
        1.0
    } else {
        0.0
    };
    ActionCommand::new(a, a_alpha as f32)
}

/// Tiny LCG for policies that need reproducible randomness without
/// dragging a rng crate into the hot path.
struct WalkRng {
    state: u64,
}

impl WalkRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(0x5_DEEC_E66D).wrapping_add(11);
        self.state
    }

    fn next_range(&mut self, min: i64, max: i64) -> i64 {
        let range = (max - min) as u64;
        if range == 0 {
            return min;
        }
        min + (self.next() % range) as i64
    }
}

/// Accelerates gently while turning until it reaches a slow cruise,
/// then holds both, tracing a wide circle.
pub struct CruisePolicy;

impl MovementPolicy for CruisePolicy {
    fn position(&mut self, reading: &PositionReading, _ctx: &mut PolicyCtx) -> ActionCommand {
        if reading.v < 7.0 {
            ActionCommand::new(0.5, 1.0)
        } else {
            ActionCommand::ZERO
        }
    }
}

/// Keeps accelerating while turning, so the path opens into a spiral
/// until the body's speed limit flattens it.
pub struct SpiralPolicy;

impl MovementPolicy for SpiralPolicy {
    fn position(&mut self, reading: &PositionReading, _ctx: &mut PolicyCtx) -> ActionCommand {
        if reading.v < 20.0 {
            ActionCommand::new(1.0, 1.0)
        } else {
            ActionCommand::new(1.0, 0.0)
        }
    }
}

/// Turns in place, winding up to a fast standing spin.
pub struct SpinPolicy;

impl MovementPolicy for SpinPolicy {
    fn position(&mut self, reading: &PositionReading, _ctx: &mut PolicyCtx) -> ActionCommand {
        if reading.v_alpha > 30.0 {
            ActionCommand::ZERO
        } else {
            // The body clamp cuts this down to the per-tick limit.
            ActionCommand::new(0.0, 1_000.0)
        }
    }
}

/// Wanders with random turn impulses, keeping a moderate speed.
pub struct RandomWalkPolicy {
    rng: WalkRng,
}

impl RandomWalkPolicy {
    /// Walker seeded for a reproducible wander.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: WalkRng::new(seed),
        }
    }
}

impl MovementPolicy for RandomWalkPolicy {
    fn position(&mut self, reading: &PositionReading, _ctx: &mut PolicyCtx) -> ActionCommand {
        let a = if reading.v < 15.0 { 1.0 } else { 0.0 };
        let a_alpha = self.rng.next_range(-20, 21) as f32;
        ActionCommand::new(a, a_alpha)
    }
}

/// Hunts one agent by its alert position and shoots when lined up.
///
/// The alert broadcast refreshes the destination; between broadcasts
/// the policy keeps steering at the last known position. Shooting is
/// a no-op while the agent carries no weapon or lacks gun access.
pub struct ChasePolicy {
    target: AgentId,
}

impl ChasePolicy {
    /// Chase the agent with the given id.
    #[must_use]
    pub const fn new(target: AgentId) -> Self {
        Self { target }
    }
}

impl MovementPolicy for ChasePolicy {
    fn wants_alerts(&self) -> bool {
        true
    }

    fn alert(&mut self, reading: &AlertReading, ctx: &mut PolicyCtx) -> ActionCommand {
        if let Some(&pos) = reading.positions.get(self.target) {
            ctx.destination = Some(pos);
        }
        ctx.previous()
    }

    fn position(&mut self, reading: &PositionReading, ctx: &mut PolicyCtx) -> ActionCommand {
        let Some(dest) = ctx.destination else {
            // No sighting yet; turn in place and wait for one.
            return ActionCommand::new(0.0, 1.0);
        };
        let aim_error = angle_error(bearing_to(reading.pos, dest), reading.alpha);
        if aim_error.abs() <= AIM_TOLERANCE && !ctx.is_reloading() {
            ctx.shoot();
        }
        steer_towards(reading, dest, ctx)
    }
}

/// Runs from the nearest other agent reported by the alert broadcast.
pub struct EvadePolicy {
    own_pos: Option<Vec2>,
    threat: Option<Vec2>,
}

impl EvadePolicy {
    /// Evader with no threat sighted yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            own_pos: None,
            threat: None,
        }
    }
}

impl Default for EvadePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl MovementPolicy for EvadePolicy {
    fn wants_alerts(&self) -> bool {
        true
    }

    fn alert(&mut self, reading: &AlertReading, ctx: &mut PolicyCtx) -> ActionCommand {
        if let Some(own) = self.own_pos {
            // The broadcast includes the receiver; skip anything close
            // enough to be our own entry.
            self.threat = reading
                .positions
                .iter()
                .copied()
                .filter(|p| p.distance(own) > 1.0)
                .min_by(|a, b| a.distance(own).total_cmp(&b.distance(own)));
        }
        ctx.previous()
    }

    fn position(&mut self, reading: &PositionReading, ctx: &mut PolicyCtx) -> ActionCommand {
        self.own_pos = Some(reading.pos);
        let Some(threat) = self.threat else {
            return ActionCommand::new(1.0, 0.0);
        };
        let away = wrap_degrees(bearing_to(reading.pos, threat) + 180.0);
        let flee_point = reading.pos + arena_core::math::heading_vector(away) * 100.0;
        steer_towards(reading, flee_point, ctx)
    }
}

/// Fires every chance it gets while wandering randomly.
pub struct SentryPolicy {
    rng: WalkRng,
}

impl SentryPolicy {
    /// Sentry seeded for a reproducible wander.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: WalkRng::new(seed),
        }
    }
}

impl MovementPolicy for SentryPolicy {
    fn wants_alerts(&self) -> bool {
        true
    }

    fn position(&mut self, reading: &PositionReading, ctx: &mut PolicyCtx) -> ActionCommand {
        ctx.shoot();
        let a = if reading.v < 8.0 { 1.0 } else { 0.0 };
        let a_alpha = self.rng.next_range(-10, 11) as f32;
        ActionCommand::new(a, a_alpha)
    }
}

/// Look up a demo policy by its scenario-file name.
///
/// `target` feeds the chase policy, `seed` the randomized ones.
/// Returns `None` for names no demo policy answers to.
#[must_use]
pub fn policy_named(
    name: &str,
    target: AgentId,
    seed: u64,
) -> Option<Box<dyn MovementPolicy + 'static>> {
    match name {
        "idle" => Some(Box::new(IdlePolicy)),
        "cruise" => Some(Box::new(CruisePolicy)),
        "spiral" => Some(Box::new(SpiralPolicy)),
        "spin" => Some(Box::new(SpinPolicy)),
        "walk" => Some(Box::new(RandomWalkPolicy::new(seed))),
        "chase" => Some(Box::new(ChasePolicy::new(target))),
        "evade" => Some(Box::new(EvadePolicy::new())),
        "sentry" => Some(Box::new(SentryPolicy::new(seed))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::agent::AgentBody;

    fn ctx() -> PolicyCtx {
        PolicyCtx::new(AgentBody::new(), None)
    }

    fn reading_at(pos: Vec2, alpha: f64, v: f64) -> PositionReading {
        PositionReading {
            pos,
            alpha,
            v,
            v_alpha: 0.0,
        }
    }

    #[test]
    fn test_bearing_cardinals() {
        let origin = Vec2::new(500.0, 500.0);
        assert!((bearing_to(origin, Vec2::new(500.0, 400.0)) - 0.0).abs() < 1e-9);
        assert!((bearing_to(origin, Vec2::new(600.0, 500.0)) - 90.0).abs() < 1e-9);
        assert!((bearing_to(origin, Vec2::new(500.0, 600.0)) - 180.0).abs() < 1e-9);
        assert!((bearing_to(origin, Vec2::new(400.0, 500.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_angle_error_takes_the_short_way() {
        assert!((angle_error(10.0, 350.0) - 20.0).abs() < 1e-9);
        assert!((angle_error(350.0, 10.0) + 20.0).abs() < 1e-9);
        // Exactly opposite resolves to a counter-clockwise turn.
        assert!((angle_error(180.0, 0.0) + 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_cruise_accelerates_then_coasts() {
        let mut policy = CruisePolicy;
        let mut ctx = ctx();
        let slow = policy.position(&reading_at(Vec2::new(500.0, 500.0), 0.0, 2.0), &mut ctx);
        assert!(slow.a > 0.0 && slow.a_alpha > 0.0);

        let fast = policy.position(&reading_at(Vec2::new(500.0, 500.0), 0.0, 9.0), &mut ctx);
        assert_eq!(fast, ActionCommand::ZERO);
    }

    #[test]
    fn test_spin_stops_winding_past_limit() {
        let mut policy = SpinPolicy;
        let mut ctx = ctx();
        let mut reading = reading_at(Vec2::new(500.0, 500.0), 0.0, 0.0);
        reading.v_alpha = 10.0;
        assert!(policy.position(&reading, &mut ctx).a_alpha > 0.0);

        reading.v_alpha = 31.0;
        assert_eq!(policy.position(&reading, &mut ctx), ActionCommand::ZERO);
    }

    #[test]
    fn test_random_walk_is_seed_reproducible() {
        let mut a = RandomWalkPolicy::new(7);
        let mut b = RandomWalkPolicy::new(7);
        let mut ctx_a = ctx();
        let mut ctx_b = ctx();
        let reading = reading_at(Vec2::new(500.0, 500.0), 0.0, 3.0);
        for _ in 0..20 {
            assert_eq!(
                a.position(&reading, &mut ctx_a),
                b.position(&reading, &mut ctx_b)
            );
        }
    }

    #[test]
    fn test_walk_turn_impulse_stays_in_range() {
        let mut policy = RandomWalkPolicy::new(123);
        let mut ctx = ctx();
        let reading = reading_at(Vec2::new(500.0, 500.0), 0.0, 20.0);
        for _ in 0..100 {
            let cmd = policy.position(&reading, &mut ctx);
            assert_eq!(cmd.a, 0.0, "at speed the walker only turns");
            assert!((-20.0..=20.0).contains(&cmd.a_alpha));
        }
    }

    #[test]
    fn test_chase_turns_toward_alerted_target() {
        let mut policy = ChasePolicy::new(1);
        assert!(policy.wants_alerts());
        let mut ctx = ctx();

        let alert = AlertReading {
            positions: vec![Vec2::new(500.0, 500.0), Vec2::new(800.0, 500.0)],
        };
        policy.alert(&alert, &mut ctx);
        assert_eq!(ctx.destination, Some(Vec2::new(800.0, 500.0)));

        // Facing north with the target due east: clockwise turn.
        let cmd = policy.position(&reading_at(Vec2::new(500.0, 500.0), 0.0, 5.0), &mut ctx);
        assert!(cmd.a_alpha > 0.0);
    }

    #[test]
    fn test_chase_searches_without_sighting() {
        let mut policy = ChasePolicy::new(1);
        let mut ctx = ctx();
        let cmd = policy.position(&reading_at(Vec2::new(500.0, 500.0), 0.0, 0.0), &mut ctx);
        assert_eq!(cmd.a, 0.0);
        assert!(cmd.a_alpha > 0.0);
    }

    #[test]
    fn test_evade_turns_away_from_threat() {
        let mut policy = EvadePolicy::new();
        let mut ctx = ctx();
        let own = Vec2::new(500.0, 500.0);

        // Seed own position, then alert with a threat due east.
        policy.position(&reading_at(own, 90.0, 5.0), &mut ctx);
        let alert = AlertReading {
            positions: vec![own, Vec2::new(600.0, 500.0)],
        };
        policy.alert(&alert, &mut ctx);

        // Facing the threat dead-on, the command must start a turn.
        let cmd = policy.position(&reading_at(own, 90.0, 5.0), &mut ctx);
        assert!(cmd.a_alpha.abs() > 0.0);
    }

    #[test]
    fn test_evade_ignores_its_own_broadcast_entry() {
        let mut policy = EvadePolicy::new();
        let mut ctx = ctx();
        let own = Vec2::new(500.0, 500.0);
        policy.position(&reading_at(own, 0.0, 5.0), &mut ctx);

        // Only the evader itself in the broadcast: no threat picked.
        let alert = AlertReading {
            positions: vec![own],
        };
        policy.alert(&alert, &mut ctx);
        assert!(policy.threat.is_none());
    }

    #[test]
    fn test_policy_named_resolves_known_names() {
        for name in ["idle", "cruise", "spiral", "spin", "walk", "chase", "evade", "sentry"] {
            assert!(policy_named(name, 0, 1).is_some(), "missing policy {name}");
        }
        assert!(policy_named("teleport", 0, 1).is_none());
    }
}

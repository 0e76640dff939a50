//! Movement integration and obstacle sweeps.
//!
//! Each tick an agent's polled command is integrated into new velocities
//! and a desired displacement, then the displacement is swept against the
//! grid's merged rectangles. The sweep samples the move in fixed sub-steps
//! per axis and keeps the longest prefix that leaves the agent's circle
//! clear of every blocking rectangle. Axes advance independently, so an
//! agent pushed diagonally into a wall slides along it. Speed is not
//! zeroed on contact.

use crate::agent::{AgentBody, AgentState};
use crate::grid::{ObstacleGrid, ObstacleRect, TileKind};
use crate::math::{clamp_symmetric, heading_vector, wrap_degrees, Vec2};
use crate::messages::ActionCommand;

/// Number of sub-steps the wall sweep samples per axis.
pub const COLLISION_SUBSTEPS: usize = 10;

/// Result of integrating a command, before wall resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Desired displacement for this tick.
    pub delta: Vec2,
    /// New facing angle in degrees, already wrapped to `[0, 360)`.
    pub alpha: f64,
    /// New forward speed.
    pub v: f64,
    /// New turn rate in degrees per tick.
    pub v_alpha: f64,
}

/// Integrate an acceleration command into new velocities and a
/// displacement.
///
/// Both acceleration components are clamped to the body's limits before
/// they are applied, and both velocities are clamped after. The
/// displacement points along the new facing angle.
#[must_use]
pub fn integrate_command(state: &AgentState, body: &AgentBody, command: ActionCommand) -> Motion {
    let a = clamp_symmetric(f64::from(command.a), body.a_max);
    let a_alpha = clamp_symmetric(f64::from(command.a_alpha), body.a_alpha_max);

    let v = clamp_symmetric(state.v + a, body.v_max);
    let v_alpha = clamp_symmetric(state.v_alpha + a_alpha, body.v_alpha_max);
    let alpha = wrap_degrees(state.alpha + v_alpha);

    Motion {
        delta: heading_vector(alpha) * v,
        alpha,
        v,
        v_alpha,
    }
}

/// Result of sweeping a displacement against the obstacle grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    /// Largest safe prefix of the requested displacement, per axis.
    pub delta: Vec2,
    /// Kind of a rectangle that cut the move short, if any. When both
    /// axes hit different kinds, a damaging kind wins.
    pub blocked_by: Option<TileKind>,
}

/// Sweep a circle's displacement against the grid's blocking rectangles.
///
/// The move is sampled in [`COLLISION_SUBSTEPS`] per-axis sub-steps. An
/// axis stops advancing at the first sub-step whose combined position
/// would overlap a rectangle; the other axis keeps going. A clear
/// starting circle therefore always ends clear.
#[must_use]
pub fn sweep_walls(grid: &ObstacleGrid, center: Vec2, radius: f64, delta: Vec2) -> Sweep {
    let candidates = candidate_rects(grid, center, radius, delta);
    if candidates.is_empty() {
        return Sweep {
            delta,
            blocked_by: None,
        };
    }

    let substeps = COLLISION_SUBSTEPS as f64;
    let step_x = delta.x / substeps;
    let step_y = delta.y / substeps;

    let mut dx = 0.0;
    let mut dy = 0.0;
    let mut x_blocked = false;
    let mut y_blocked = false;
    let mut blocked_by = None;

    for _ in 0..COLLISION_SUBSTEPS {
        if !x_blocked {
            let next = dx + step_x;
            match blocking_kind(&candidates, center + Vec2::new(next, dy), radius) {
                Some(kind) => {
                    x_blocked = true;
                    note_block(&mut blocked_by, kind);
                }
                None => dx = next,
            }
        }
        if !y_blocked {
            let next = dy + step_y;
            match blocking_kind(&candidates, center + Vec2::new(dx, next), radius) {
                Some(kind) => {
                    y_blocked = true;
                    note_block(&mut blocked_by, kind);
                }
                None => dy = next,
            }
        }
        if x_blocked && y_blocked {
            break;
        }
    }

    Sweep {
        delta: Vec2::new(dx, dy),
        blocked_by,
    }
}

/// Number of unit sub-steps a bullet takes per tick.
///
/// Speed truncates to whole units, with a floor of one so slow bullets
/// still advance instead of idling in place forever.
#[must_use]
pub fn bullet_step_count(speed: f64) -> usize {
    let whole = speed.max(0.0).trunc() as usize;
    whole.max(1)
}

/// Rectangles whose area intersects the axis-aligned bounds of the
/// swept circle. The bounds test keeps touching rectangles; the strict
/// overlap test sorts those out later.
fn candidate_rects<'a>(
    grid: &'a ObstacleGrid,
    center: Vec2,
    radius: f64,
    delta: Vec2,
) -> Vec<&'a ObstacleRect> {
    let min = Vec2::new(
        center.x - radius + delta.x.min(0.0),
        center.y - radius + delta.y.min(0.0),
    );
    let max = Vec2::new(
        center.x + radius + delta.x.max(0.0),
        center.y + radius + delta.y.max(0.0),
    );
    grid.rectangles()
        .iter()
        .filter(|o| {
            let far = o.rect.max();
            o.rect.origin.x <= max.x
                && far.x >= min.x
                && o.rect.origin.y <= max.y
                && far.y >= min.y
        })
        .collect()
}

fn blocking_kind(candidates: &[&ObstacleRect], center: Vec2, radius: f64) -> Option<TileKind> {
    let mut found = None;
    for o in candidates {
        if o.rect.overlaps_circle(center, radius) {
            if o.kind.contact_damage() > 0 {
                return Some(o.kind);
            }
            found.get_or_insert(o.kind);
        }
    }
    found
}

fn note_block(slot: &mut Option<TileKind>, kind: TileKind) {
    match slot {
        Some(k) if k.contact_damage() > 0 => {}
        _ => *slot = Some(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state_at(x: f64, y: f64, alpha: f64) -> AgentState {
        AgentState::spawned_at(Vec2::new(x, y), alpha, &AgentBody::new())
    }

    #[test]
    fn test_integrate_clamps_acceleration_and_speed() {
        let body = AgentBody::new();
        let mut state = state_at(500.0, 500.0, 0.0);

        // a_max is 10, so an oversized command adds 10.
        let m = integrate_command(&state, &body, ActionCommand::new(50.0, 0.0));
        assert_eq!(m.v, 10.0);

        // v_max is 30, so from 25 a full push clamps at the cap.
        state.v = 25.0;
        let m = integrate_command(&state, &body, ActionCommand::new(50.0, 0.0));
        assert_eq!(m.v, 30.0);

        state.v = 25.0;
        let m = integrate_command(&state, &body, ActionCommand::new(-100.0, 0.0));
        assert_eq!(m.v, 15.0);
    }

    #[test]
    fn test_integrate_turn_wraps_angle() {
        let body = AgentBody::new();
        let mut state = state_at(500.0, 500.0, 350.0);
        let m = integrate_command(&state, &body, ActionCommand::new(0.0, 20.0));
        // a_alpha clamps to 10, so the new angle is 360 -> wrapped to 0.
        assert_eq!(m.v_alpha, 10.0);
        assert_eq!(m.alpha, 0.0);

        state.alpha = 5.0;
        state.v_alpha = -10.0;
        let m = integrate_command(&state, &body, ActionCommand::new(0.0, 0.0));
        assert_eq!(m.alpha, 355.0);
    }

    #[test]
    fn test_integrate_heading_matches_angle() {
        let body = AgentBody::new();
        let mut state = state_at(500.0, 500.0, 0.0);
        state.v = 10.0;

        // Angle 0 faces up the screen, toward negative y.
        let m = integrate_command(&state, &body, ActionCommand::ZERO);
        assert!(m.delta.x.abs() < 1e-9);
        assert!((m.delta.y + 10.0).abs() < 1e-9);

        state.alpha = 90.0;
        let m = integrate_command(&state, &body, ActionCommand::ZERO);
        assert!((m.delta.x - 10.0).abs() < 1e-9);
        assert!(m.delta.y.abs() < 1e-9);
    }

    #[test]
    fn test_sweep_open_field_keeps_full_delta() {
        let grid = ObstacleGrid::example_arena();
        let sweep = sweep_walls(&grid, Vec2::new(500.0, 200.0), 30.0, Vec2::new(5.0, 10.0));
        assert_eq!(sweep.delta, Vec2::new(5.0, 10.0));
        assert!(sweep.blocked_by.is_none());
    }

    #[test]
    fn test_sweep_stops_before_border() {
        let grid = ObstacleGrid::bordered(100, 10.0);
        // The left border rect ends at x=10. Starting at x=45 with
        // radius 30, sub-steps of -1 fit until the circle touches the
        // wall at x=40; the next would overlap.
        let sweep = sweep_walls(&grid, Vec2::new(45.0, 500.0), 30.0, Vec2::new(-10.0, 0.0));
        assert_eq!(sweep.delta, Vec2::new(-5.0, 0.0));
        assert_eq!(sweep.blocked_by, Some(TileKind::Border));
    }

    #[test]
    fn test_sweep_slides_along_wall() {
        let grid = ObstacleGrid::bordered(100, 10.0);
        // Pushing diagonally into the top border: y stops at contact,
        // x keeps the full move.
        let sweep = sweep_walls(&grid, Vec2::new(500.0, 45.0), 30.0, Vec2::new(10.0, -10.0));
        assert_eq!(sweep.delta, Vec2::new(10.0, -5.0));
        assert_eq!(sweep.blocked_by, Some(TileKind::Border));
    }

    #[test]
    fn test_sweep_reports_hole_contact() {
        let grid = ObstacleGrid::from_text("00000\n00000\n00300\n00000\n00000", 10.0).unwrap();
        let sweep = sweep_walls(&grid, Vec2::new(25.0, 44.0), 5.0, Vec2::new(0.0, -10.0));
        assert_eq!(sweep.delta, Vec2::new(0.0, -9.0));
        assert_eq!(sweep.blocked_by, Some(TileKind::Hole));
        assert_eq!(sweep.blocked_by.unwrap().contact_damage(), 1000);
    }

    #[test]
    fn test_sweep_zero_delta_stays_put() {
        let grid = ObstacleGrid::from_text("00000\n00000\n00300\n00000\n00000", 10.0).unwrap();
        let sweep = sweep_walls(&grid, Vec2::new(25.0, 44.0), 5.0, Vec2::ZERO);
        assert_eq!(sweep.delta, Vec2::ZERO);
        assert!(sweep.blocked_by.is_none());
    }

    #[test]
    fn test_bullet_step_count_floors_at_one() {
        assert_eq!(bullet_step_count(12.3), 12);
        assert_eq!(bullet_step_count(42.0), 42);
        assert_eq!(bullet_step_count(0.4), 1);
        assert_eq!(bullet_step_count(0.0), 1);
    }

    proptest! {
        /// A circle that starts clear of all walls must end clear, no
        /// matter the requested displacement.
        #[test]
        fn prop_sweep_end_position_stays_clear(
            x in 40.0f64..960.0,
            y in 40.0f64..960.0,
            dx in -30.0f64..30.0,
            dy in -30.0f64..30.0,
        ) {
            let grid = ObstacleGrid::example_arena();
            let start = Vec2::new(x, y);
            prop_assume!(!grid.circle_blocked(start, 20.0));

            let sweep = sweep_walls(&grid, start, 20.0, Vec2::new(dx, dy));
            let end = start + sweep.delta;
            prop_assert!(!grid.circle_blocked(end, 20.0));
        }

        /// Integration never exceeds the body's velocity limits.
        #[test]
        fn prop_integrate_respects_velocity_limits(
            v in -30.0f64..30.0,
            v_alpha in -45.0f64..45.0,
            a in -100.0f32..100.0,
            a_alpha in -100.0f32..100.0,
        ) {
            let body = AgentBody::new();
            let mut state = state_at(500.0, 500.0, 0.0);
            state.v = v;
            state.v_alpha = v_alpha;

            let m = integrate_command(&state, &body, ActionCommand::new(a, a_alpha));
            prop_assert!(m.v.abs() <= body.v_max);
            prop_assert!(m.v_alpha.abs() <= body.v_alpha_max);
            prop_assert!((0.0..360.0).contains(&m.alpha));
        }
    }
}

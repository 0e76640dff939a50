//! Field-of-view queries for tiles and agents.
//!
//! Tiles are tested by their representative sight points: a tile is
//! visible when the angle between the viewer's heading and the offset
//! to the tile center fits inside the cone, boundary included. Agents
//! are easier to see than tiles: an agent is also visible when the two
//! circles touch (which makes every agent see itself) or when one of
//! the cone's boundary rays clips its circle, so a body straddling the
//! cone edge does not vanish.

use crate::geometry::{circles_overlap, in_field_of_view, ray_hits_circle};
use crate::grid::ObstacleGrid;
use crate::math::{heading_vector, Vec2};
use crate::messages::{AgentSighting, TileSighting};

/// All non-empty tiles inside the viewer's cone, in sight-point order.
#[must_use]
pub fn visible_tiles(
    grid: &ObstacleGrid,
    viewer: Vec2,
    alpha: f64,
    fov_deg: f64,
) -> Vec<TileSighting> {
    grid.sight_points()
        .iter()
        .filter(|p| in_field_of_view(viewer, alpha, fov_deg, p.point))
        .map(|p| TileSighting {
            tile: p.tile,
            kind: p.kind,
            distance: viewer.distance(p.point),
        })
        .collect()
}

/// Per-agent sightings for a viewer, indexed like `others`.
///
/// Each entry is `Some` when the corresponding circle overlaps the
/// viewer, sits inside the cone, or is clipped by a cone boundary ray.
/// The viewer's own entry comes out `Some` with distance zero.
#[must_use]
pub fn visible_agents(
    viewer: Vec2,
    viewer_radius: f64,
    alpha: f64,
    fov_deg: f64,
    others: &[(Vec2, f64)],
) -> Vec<Option<AgentSighting>> {
    let half = fov_deg / 2.0;
    let left_ray = heading_vector(alpha - half);
    let right_ray = heading_vector(alpha + half);

    others
        .iter()
        .map(|&(pos, radius)| {
            let seen = circles_overlap(viewer, viewer_radius, pos, radius)
                || in_field_of_view(viewer, alpha, fov_deg, pos)
                || ray_hits_circle(viewer, left_ray, pos, radius)
                || ray_hits_circle(viewer, right_ray, pos, radius);
            seen.then(|| AgentSighting {
                pos,
                distance: viewer.distance(pos),
            })
        })
        .collect()
}

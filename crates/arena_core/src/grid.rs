//! Tile grid and obstacle layout for the arena field.
//!
//! The field is a square grid of tiles. Each tile has a kind that
//! decides whether agents and bullets pass through it and whether
//! touching it hurts. For collision the grid is flattened into merged
//! axis-aligned rectangles so the movement sweep probes a handful of
//! rects instead of thousands of tiles. For vision each non-empty tile
//! contributes one representative sight point at its center.

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};
use crate::geometry::Rect;
use crate::math::Vec2;

/// Default number of tiles along one side of the field.
pub const TILE_COUNT: usize = 100;

/// Default edge length of one tile in field units.
pub const TILE_SIZE: f64 = 10.0;

/// Default field edge length in field units.
pub const FIELD_SIZE: f64 = 1000.0;

/// Damage dealt when an agent runs into a hole tile.
pub const HOLE_DAMAGE: u32 = 1000;

/// What occupies a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TileKind {
    /// Open ground.
    #[default]
    Empty,
    /// Interior wall segment.
    Wall,
    /// Outer boundary wall.
    Border,
    /// Pit. Blocks movement like a wall but destroys agents on contact.
    Hole,
}

impl TileKind {
    /// Whether agents collide with this tile.
    #[must_use]
    pub const fn blocks_movement(self) -> bool {
        !matches!(self, Self::Empty)
    }

    /// Whether bullets stop on this tile.
    #[must_use]
    pub const fn stops_bullets(self) -> bool {
        !matches!(self, Self::Empty)
    }

    /// Damage dealt to an agent whose movement is blocked by this tile.
    #[must_use]
    pub const fn contact_damage(self) -> u32 {
        match self {
            Self::Hole => HOLE_DAMAGE,
            _ => 0,
        }
    }

    /// Tile kind for a map character, if it names one.
    #[must_use]
    pub const fn from_digit(c: char) -> Option<Self> {
        match c {
            '0' => Some(Self::Empty),
            '1' => Some(Self::Wall),
            '2' => Some(Self::Border),
            '3' => Some(Self::Hole),
            _ => None,
        }
    }
}

/// A merged run of blocking tiles, used by the collision sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleRect {
    /// Covered area in field units.
    pub rect: Rect,
    /// Kind shared by every tile in the run.
    pub kind: TileKind,
}

/// Representative point of a non-empty tile, used by the vision pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SightPoint {
    /// Tile coordinates.
    pub tile: (usize, usize),
    /// Tile kind.
    pub kind: TileKind,
    /// Tile center in field units.
    pub point: Vec2,
}

/// Obstacle layout of the arena field.
///
/// Immutable once built: the merged rectangles and sight points are
/// derived in the constructor and stay valid for the grid's lifetime.
#[derive(Debug, Clone)]
pub struct ObstacleGrid {
    size: usize,
    tile_size: f64,
    /// Tile kinds in column-major order: index `x * size + y`.
    tiles: Vec<TileKind>,
    rects: Vec<ObstacleRect>,
    sight_points: Vec<SightPoint>,
}

impl ObstacleGrid {
    /// Build a grid from a column-major tile list.
    ///
    /// `tiles[x * size + y]` is the tile at column x, row y.
    pub fn from_tiles(size: usize, tile_size: f64, tiles: Vec<TileKind>) -> Result<Self> {
        if size == 0 {
            return Err(ArenaError::InvalidScenario(
                "grid size must be at least 1".into(),
            ));
        }
        if !(tile_size > 0.0) {
            return Err(ArenaError::InvalidScenario(format!(
                "tile size must be positive, got {tile_size}"
            )));
        }
        if tiles.len() != size * size {
            return Err(ArenaError::InvalidScenario(format!(
                "expected {} tiles for a {size}x{size} grid, got {}",
                size * size,
                tiles.len()
            )));
        }
        let rects = merge_rectangles(&tiles, size, tile_size);
        let sight_points = collect_sight_points(&tiles, size, tile_size);
        Ok(Self {
            size,
            tile_size,
            tiles,
            rects,
            sight_points,
        })
    }

    /// Build a grid from a character map.
    ///
    /// Each line is one row, each character one tile: `0` empty, `1`
    /// wall, `2` border, `3` hole. Unknown characters and missing
    /// trailing tiles read as empty, so hand-written maps can use
    /// spaces for open ground.
    pub fn from_text(text: &str, tile_size: f64) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        let size = lines.len();
        if size == 0 {
            return Err(ArenaError::InvalidScenario("empty grid text".into()));
        }
        let mut tiles = vec![TileKind::Empty; size * size];
        for (y, line) in lines.iter().enumerate() {
            for (x, c) in line.chars().take(size).enumerate() {
                if let Some(kind) = TileKind::from_digit(c) {
                    tiles[x * size + y] = kind;
                }
            }
        }
        Self::from_tiles(size, tile_size, tiles)
    }

    /// Grid with only the outer border ring set.
    #[must_use]
    pub fn bordered(size: usize, tile_size: f64) -> Self {
        debug_assert!(size >= 2 && tile_size > 0.0);
        let mut tiles = vec![TileKind::Empty; size * size];
        for i in 0..size {
            tiles[i * size] = TileKind::Border;
            tiles[i * size + (size - 1)] = TileKind::Border;
            tiles[i] = TileKind::Border;
            tiles[(size - 1) * size + i] = TileKind::Border;
        }
        let rects = merge_rectangles(&tiles, size, tile_size);
        let sight_points = collect_sight_points(&tiles, size, tile_size);
        Self {
            size,
            tile_size,
            tiles,
            rects,
            sight_points,
        }
    }

    /// The standard demo arena: bordered field with three interior
    /// wall segments forming an open maze around the center.
    #[must_use]
    pub fn example_arena() -> Self {
        let size = TILE_COUNT;
        let mut grid = Self::bordered(size, TILE_SIZE);
        for i in size / 4..size / 2 {
            grid.tiles[i * size + size / 2] = TileKind::Wall;
            grid.tiles[(size / 3) * size + i] = TileKind::Wall;
            grid.tiles[(size / 4 * 3) * size + i] = TileKind::Wall;
        }
        grid.rebuild_derived();
        grid
    }

    /// Bordered field with randomly scattered wall clusters and hole
    /// patches. Same seed, same layout.
    #[must_use]
    pub fn scattered(seed: u64) -> Self {
        let size = TILE_COUNT;
        let mut grid = Self::bordered(size, TILE_SIZE);
        let mut rng = GridRng::new(seed);
        let features = 14;
        let margin = 5;

        for _ in 0..features {
            let x = rng.next_range(margin, size - margin);
            let y = rng.next_range(margin, size - margin);
            match rng.next() % 3 {
                0 => {
                    // Square wall cluster.
                    let extent = rng.next_range(1, 4);
                    for dy in 0..extent {
                        for dx in 0..extent {
                            grid.set_if_in_range(x + dx, y + dy, TileKind::Wall, margin);
                        }
                    }
                }
                1 => {
                    // Small hole patch.
                    let extent = rng.next_range(1, 3);
                    for dy in 0..extent {
                        for dx in 0..extent {
                            grid.set_if_in_range(x + dx, y + dy, TileKind::Hole, margin);
                        }
                    }
                }
                _ => {
                    // Wall line with a two-tile gap.
                    let horizontal = rng.next() % 2 == 0;
                    let length = rng.next_range(4, 9);
                    let gap = rng.next_range(1, length - 1);
                    for i in 0..length {
                        if i == gap || i == gap + 1 {
                            continue;
                        }
                        let (nx, ny) = if horizontal { (x + i, y) } else { (x, y + i) };
                        grid.set_if_in_range(nx, ny, TileKind::Wall, margin);
                    }
                }
            }
        }

        grid.rebuild_derived();
        grid
    }

    fn set_if_in_range(&mut self, x: usize, y: usize, kind: TileKind, margin: usize) {
        if x >= margin && x < self.size - margin && y >= margin && y < self.size - margin {
            self.tiles[x * self.size + y] = kind;
        }
    }

    fn rebuild_derived(&mut self) {
        self.rects = merge_rectangles(&self.tiles, self.size, self.tile_size);
        self.sight_points = collect_sight_points(&self.tiles, self.size, self.tile_size);
    }

    /// Number of tiles along one side.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Edge length of one tile in field units.
    #[must_use]
    pub const fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Field edge length in field units.
    #[must_use]
    pub fn field_size(&self) -> f64 {
        self.size as f64 * self.tile_size
    }

    /// Tile kind at grid coordinates, if in range.
    #[must_use]
    pub fn tile(&self, x: usize, y: usize) -> Option<TileKind> {
        if x < self.size && y < self.size {
            Some(self.tiles[x * self.size + y])
        } else {
            None
        }
    }

    /// Tile coordinates containing a field point, clamped to the grid.
    #[must_use]
    pub fn tile_coords(&self, point: Vec2) -> (usize, usize) {
        let last = (self.size - 1) as f64;
        let x = (point.x / self.tile_size).clamp(0.0, last) as usize;
        let y = (point.y / self.tile_size).clamp(0.0, last) as usize;
        (x, y)
    }

    /// Tile kind under a field point, clamped to the grid.
    #[must_use]
    pub fn tile_at_point(&self, point: Vec2) -> TileKind {
        let (x, y) = self.tile_coords(point);
        self.tiles[x * self.size + y]
    }

    /// Merged blocking rectangles, sorted by row then column.
    #[must_use]
    pub fn rectangles(&self) -> &[ObstacleRect] {
        &self.rects
    }

    /// Representative points of all non-empty tiles, column-major.
    #[must_use]
    pub fn sight_points(&self) -> &[SightPoint] {
        &self.sight_points
    }

    /// Whether a circle intersects any blocking tile.
    #[must_use]
    pub fn circle_blocked(&self, center: Vec2, radius: f64) -> bool {
        self.rects
            .iter()
            .any(|o| o.rect.overlaps_circle(center, radius))
    }
}

/// Merge blocking tiles into rectangles: horizontal runs of one kind
/// per row, then equal runs stacked across consecutive rows.
fn merge_rectangles(tiles: &[TileKind], size: usize, tile_size: f64) -> Vec<ObstacleRect> {
    #[derive(Clone, Copy, PartialEq)]
    struct Strip {
        x0: usize,
        x1: usize, // exclusive
        kind: TileKind,
    }

    struct OpenRect {
        strip: Strip,
        y0: usize,
        rows: usize,
    }

    let mut rects = Vec::new();
    let mut open: Vec<OpenRect> = Vec::new();

    let close = |r: OpenRect, rects: &mut Vec<ObstacleRect>| {
        rects.push(ObstacleRect {
            rect: Rect::new(
                Vec2::new(r.strip.x0 as f64 * tile_size, r.y0 as f64 * tile_size),
                (r.strip.x1 - r.strip.x0) as f64 * tile_size,
                r.rows as f64 * tile_size,
            ),
            kind: r.strip.kind,
        });
    };

    for y in 0..size {
        let mut strips = Vec::new();
        let mut x = 0;
        while x < size {
            let kind = tiles[x * size + y];
            if !kind.blocks_movement() {
                x += 1;
                continue;
            }
            let x0 = x;
            while x < size && tiles[x * size + y] == kind {
                x += 1;
            }
            strips.push(Strip { x0, x1: x, kind });
        }

        let mut next_open = Vec::new();
        for strip in strips {
            let carried = open
                .iter()
                .position(|r| r.strip == strip && r.y0 + r.rows == y);
            if let Some(idx) = carried {
                let mut r = open.swap_remove(idx);
                r.rows += 1;
                next_open.push(r);
            } else {
                next_open.push(OpenRect { strip, y0: y, rows: 1 });
            }
        }
        for stale in open.drain(..) {
            close(stale, &mut rects);
        }
        open = next_open;
    }
    for r in open {
        close(r, &mut rects);
    }

    rects.sort_by(|a, b| {
        (a.rect.origin.y, a.rect.origin.x)
            .partial_cmp(&(b.rect.origin.y, b.rect.origin.x))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rects
}

fn collect_sight_points(tiles: &[TileKind], size: usize, tile_size: f64) -> Vec<SightPoint> {
    let half = tile_size / 2.0;
    let mut points = Vec::new();
    for x in 0..size {
        for y in 0..size {
            let kind = tiles[x * size + y];
            if kind == TileKind::Empty {
                continue;
            }
            points.push(SightPoint {
                tile: (x, y),
                kind,
                point: Vec2::new(x as f64 * tile_size + half, y as f64 * tile_size + half),
            });
        }
    }
    points
}

/// Simple deterministic RNG for scattered layouts.
struct GridRng {
    state: u64,
}

impl GridRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(0x5_DEEC_E66D).wrapping_add(11);
        self.state
    }

    fn next_range(&mut self, min: usize, max: usize) -> usize {
        let range = (max - min) as u64;
        if range == 0 {
            return min;
        }
        min + (self.next() % range) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_arena_layout() {
        let grid = ObstacleGrid::example_arena();
        assert_eq!(grid.size(), TILE_COUNT);

        // Border ring.
        assert_eq!(grid.tile(0, 0), Some(TileKind::Border));
        assert_eq!(grid.tile(99, 0), Some(TileKind::Border));
        assert_eq!(grid.tile(0, 99), Some(TileKind::Border));
        assert_eq!(grid.tile(50, 0), Some(TileKind::Border));

        // Interior segments: row at y=50, columns at x=33 and x=75.
        assert_eq!(grid.tile(25, 50), Some(TileKind::Wall));
        assert_eq!(grid.tile(49, 50), Some(TileKind::Wall));
        assert_eq!(grid.tile(33, 25), Some(TileKind::Wall));
        assert_eq!(grid.tile(33, 49), Some(TileKind::Wall));
        assert_eq!(grid.tile(75, 25), Some(TileKind::Wall));
        assert_eq!(grid.tile(75, 49), Some(TileKind::Wall));

        // The segments stop short of these tiles.
        assert_eq!(grid.tile(50, 50), Some(TileKind::Empty));
        assert_eq!(grid.tile(33, 50), Some(TileKind::Wall)); // row crosses the column
        assert_eq!(grid.tile(33, 24), Some(TileKind::Empty));
        assert_eq!(grid.tile(75, 50), Some(TileKind::Empty));
    }

    #[test]
    fn test_from_text_small_grid() {
        let grid = ObstacleGrid::from_text("2222\n2002\n2012\n2222", 10.0).unwrap();
        assert_eq!(grid.size(), 4);
        assert_eq!(grid.tile(0, 0), Some(TileKind::Border));
        assert_eq!(grid.tile(1, 1), Some(TileKind::Empty));
        assert_eq!(grid.tile(2, 2), Some(TileKind::Wall));
        // Unknown characters read as empty.
        let lenient = ObstacleGrid::from_text("22\n2x", 10.0).unwrap();
        assert_eq!(lenient.tile(1, 1), Some(TileKind::Empty));
    }

    #[test]
    fn test_merged_rectangles_cover_blocking_tiles() {
        let grid = ObstacleGrid::from_text("2222\n2002\n2012\n2222", 10.0).unwrap();
        // Ring merges into four rects plus the lone wall tile.
        assert_eq!(grid.rectangles().len(), 5);

        let total_area: f64 = grid
            .rectangles()
            .iter()
            .map(|o| o.rect.width * o.rect.height)
            .sum();
        // 12 border tiles + 1 wall tile, each 10x10.
        assert!((total_area - 1300.0).abs() < 1e-9);

        let wall = grid
            .rectangles()
            .iter()
            .find(|o| o.kind == TileKind::Wall)
            .unwrap();
        assert_eq!(wall.rect.origin, Vec2::new(20.0, 20.0));
        assert_eq!(wall.rect.width, 10.0);
        assert_eq!(wall.rect.height, 10.0);
    }

    #[test]
    fn test_merged_rectangles_vertical_stacking() {
        // A 2-wide, 3-tall wall block must merge into a single rect.
        let grid = ObstacleGrid::from_text("00000\n01100\n01100\n01100\n00000", 10.0).unwrap();
        assert_eq!(grid.rectangles().len(), 1);
        let r = grid.rectangles()[0];
        assert_eq!(r.rect.origin, Vec2::new(10.0, 10.0));
        assert_eq!(r.rect.width, 20.0);
        assert_eq!(r.rect.height, 30.0);
    }

    #[test]
    fn test_adjacent_different_kinds_stay_separate() {
        let grid = ObstacleGrid::from_text("000\n130\n000", 10.0).unwrap();
        assert_eq!(grid.rectangles().len(), 2);
        let kinds: Vec<TileKind> = grid.rectangles().iter().map(|o| o.kind).collect();
        assert!(kinds.contains(&TileKind::Wall));
        assert!(kinds.contains(&TileKind::Hole));
    }

    #[test]
    fn test_tile_at_point_clamps() {
        let grid = ObstacleGrid::example_arena();
        assert_eq!(grid.tile_at_point(Vec2::new(-5.0, -5.0)), TileKind::Border);
        assert_eq!(
            grid.tile_at_point(Vec2::new(1e6, 1e6)),
            TileKind::Border
        );
        assert_eq!(grid.tile_at_point(Vec2::new(500.0, 200.0)), TileKind::Empty);
    }

    #[test]
    fn test_sight_points_match_tiles() {
        let grid = ObstacleGrid::from_text("2222\n2002\n2012\n2222", 10.0).unwrap();
        assert_eq!(grid.sight_points().len(), 13);
        let wall_point = grid
            .sight_points()
            .iter()
            .find(|p| p.kind == TileKind::Wall)
            .unwrap();
        assert_eq!(wall_point.tile, (2, 2));
        assert_eq!(wall_point.point, Vec2::new(25.0, 25.0));
    }

    #[test]
    fn test_circle_blocked() {
        let grid = ObstacleGrid::example_arena();
        // Open ground in the upper-left quadrant.
        assert!(!grid.circle_blocked(Vec2::new(150.0, 150.0), 30.0));
        // Pressed into the wall column at x=33.
        assert!(grid.circle_blocked(Vec2::new(340.0, 300.0), 30.0));
        // Near the border.
        assert!(grid.circle_blocked(Vec2::new(15.0, 500.0), 30.0));
    }

    #[test]
    fn test_scattered_determinism() {
        let a = ObstacleGrid::scattered(42);
        let b = ObstacleGrid::scattered(42);
        assert_eq!(a.tiles, b.tiles);

        let c = ObstacleGrid::scattered(43);
        assert_ne!(a.tiles, c.tiles);
    }

    #[test]
    fn test_scattered_keeps_border_and_margin() {
        let grid = ObstacleGrid::scattered(7);
        for i in 0..TILE_COUNT {
            assert_eq!(grid.tile(i, 0), Some(TileKind::Border));
            assert_eq!(grid.tile(i, TILE_COUNT - 1), Some(TileKind::Border));
            assert_eq!(grid.tile(0, i), Some(TileKind::Border));
            assert_eq!(grid.tile(TILE_COUNT - 1, i), Some(TileKind::Border));
        }
        // Tiles just inside the border stay clear.
        for i in 1..5 {
            assert_eq!(grid.tile(i, i), Some(TileKind::Empty));
        }
    }

    #[test]
    fn test_invalid_grids_rejected() {
        assert!(ObstacleGrid::from_tiles(0, 10.0, Vec::new()).is_err());
        assert!(ObstacleGrid::from_tiles(2, 0.0, vec![TileKind::Empty; 4]).is_err());
        assert!(ObstacleGrid::from_tiles(2, 10.0, vec![TileKind::Empty; 3]).is_err());
        assert!(ObstacleGrid::from_text("", 10.0).is_err());
    }
}

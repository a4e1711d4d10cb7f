use crate::KernelError;
use glam::{Vec2, Vec3};
use mazeview_common::CellCoord;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Closed circle-vs-rectangle test on the ground plane.
///
/// Touching counts as intersecting: a circle whose distance to the rectangle
/// is exactly `radius` collides.
pub fn circle_intersects_rect(center: Vec2, radius: f32, rect_min: Vec2, rect_size: Vec2) -> bool {
    let closest = center.clamp(rect_min, rect_min + rect_size);
    center.distance_squared(closest) <= radius * radius
}

/// Grid of blocked/free cells laid out row-major.
///
/// Cell `(x, y)` covers the unit square whose minimum corner is
/// `(origin.x - 0.5 + x, origin.z - 0.5 + y)` on the XZ plane, where `origin`
/// is the world position the maze model is drawn at.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollisionMap {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl CollisionMap {
    /// Build a map from row-major cells (`true` = blocked).
    pub fn new(width: usize, height: usize, cells: Vec<bool>) -> Result<Self, KernelError> {
        let expected = width * height;
        if cells.len() != expected {
            return Err(KernelError::CellCountMismatch {
                width,
                height,
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// A map with every cell free.
    pub fn open(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    /// Parse a text grid: `#` marks a blocked cell, anything else is free.
    /// Blank lines are skipped.
    pub fn from_ascii(text: &str) -> Result<Self, KernelError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let width = rows.first().map_or(0, |r| r.chars().count());
        let mut cells = Vec::with_capacity(width * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(KernelError::RaggedRow {
                    row,
                    found,
                    expected: width,
                });
            }
            cells.extend(line.chars().map(|c| c == '#'));
        }
        Self::new(width, rows.len(), cells)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// True when the grid has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether `(x, y)` is blocked. Out-of-range cells are free.
    pub fn is_blocked(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|&&b| b).count()
    }

    /// Blocked cells in row-major order.
    pub fn blocked_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &blocked)| blocked)
            .map(|(i, _)| CellCoord::new(i % self.width, i / self.width))
    }

    /// Minimum corner and size of a cell's square on the XZ plane.
    pub fn cell_rect(origin: Vec3, cell: CellCoord) -> (Vec2, Vec2) {
        let min = Vec2::new(
            origin.x - 0.5 + cell.x as f32,
            origin.z - 0.5 + cell.y as f32,
        );
        (min, Vec2::ONE)
    }

    /// The cell containing `point`, clamped into the grid.
    ///
    /// Returns `None` only for an empty map.
    pub fn cell_at(&self, origin: Vec3, point: Vec2) -> Option<CellCoord> {
        if self.is_empty() {
            return None;
        }
        let x = (point.x - origin.x + 0.5).floor() as i64;
        let y = (point.y - origin.z + 0.5).floor() as i64;
        Some(CellCoord::new(
            x.clamp(0, self.width as i64 - 1) as usize,
            y.clamp(0, self.height as i64 - 1) as usize,
        ))
    }

    /// Blocked cells whose square intersects the circle, row-major.
    pub fn hits(&self, origin: Vec3, center: Vec2, radius: f32) -> Vec<CellCoord> {
        self.candidates(origin, center, radius)
            .filter(|&cell| self.cell_hit(origin, cell, center, radius))
            .collect()
    }

    /// First blocked cell (row-major) whose square intersects the circle.
    pub fn first_hit(&self, origin: Vec3, center: Vec2, radius: f32) -> Option<CellCoord> {
        self.candidates(origin, center, radius)
            .find(|&cell| self.cell_hit(origin, cell, center, radius))
    }

    /// Whether the circle touches any blocked cell.
    pub fn collides(&self, origin: Vec3, center: Vec2, radius: f32) -> bool {
        self.first_hit(origin, center, radius).is_some()
    }

    fn cell_hit(&self, origin: Vec3, cell: CellCoord, center: Vec2, radius: f32) -> bool {
        if !self.is_blocked(cell.x, cell.y) {
            return false;
        }
        let (min, size) = Self::cell_rect(origin, cell);
        circle_intersects_rect(center, radius, min, size)
    }

    /// Cells overlapping the circle's bounding square, row-major.
    ///
    /// Only these cells can intersect the circle, so testing them gives the
    /// same answer as scanning the whole grid. An infinite radius covers the
    /// whole grid; a non-finite centre touches nothing.
    fn candidates(
        &self,
        origin: Vec3,
        center: Vec2,
        radius: f32,
    ) -> impl Iterator<Item = CellCoord> + use<> {
        let r = radius.abs();
        let (xs, ys) = if self.is_empty() || !center.is_finite() {
            (empty_range(), empty_range())
        } else {
            (
                axis_range(center.x - origin.x, r, self.width),
                axis_range(center.y - origin.z, r, self.height),
            )
        };
        ys.flat_map(move |y| xs.clone().map(move |x| CellCoord::new(x, y)))
    }
}

#[allow(clippy::reversed_empty_ranges)]
fn empty_range() -> RangeInclusive<usize> {
    1..=0
}

/// Indices `k` in `0..len` whose span `[k - 0.5, k + 0.5]` meets
/// `[local - r, local + r]`, padded by one cell each side to absorb rounding.
///
/// Bounds are clamped as floats so far-away or unbounded circles never
/// overflow the index arithmetic.
fn axis_range(local: f32, r: f32, len: usize) -> RangeInclusive<usize> {
    let last = len as f32 - 1.0;
    let lo = ((local - r - 0.5).ceil() - 1.0).max(0.0);
    let hi = ((local + r + 0.5).floor() + 1.0).min(last);
    if !(lo <= hi) {
        return empty_range();
    }
    lo as usize..=hi as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    const BORDER_3X3: &str = "
        ###
        #.#
        ###
    ";

    /// Reference scan over every cell of the grid.
    fn exhaustive(map: &CollisionMap, origin: Vec3, center: Vec2, radius: f32) -> bool {
        let mut hit = false;
        for y in 0..map.height() {
            for x in 0..map.width() {
                let (min, size) = CollisionMap::cell_rect(origin, CellCoord::new(x, y));
                if map.is_blocked(x, y) && circle_intersects_rect(center, radius, min, size) {
                    hit = true;
                }
            }
        }
        hit
    }

    #[test]
    fn circle_inside_rect_collides() {
        assert!(circle_intersects_rect(
            Vec2::new(0.5, 0.5),
            0.1,
            Vec2::ZERO,
            Vec2::ONE
        ));
    }

    #[test]
    fn circle_far_from_rect_is_clear() {
        assert!(!circle_intersects_rect(
            Vec2::new(3.0, 3.0),
            0.1,
            Vec2::ZERO,
            Vec2::ONE
        ));
    }

    #[test]
    fn touching_edge_counts_as_collision() {
        // Exactly representable: edge at x = 1.0, centre at 1.25, radius 0.25.
        assert!(circle_intersects_rect(
            Vec2::new(1.25, 0.5),
            0.25,
            Vec2::ZERO,
            Vec2::ONE
        ));
        assert!(!circle_intersects_rect(
            Vec2::new(1.25, 0.5),
            0.125,
            Vec2::ZERO,
            Vec2::ONE
        ));
    }

    #[test]
    fn corner_uses_euclidean_distance() {
        // Diagonal distance to corner (1,1) is ~0.283 > 0.25.
        assert!(!circle_intersects_rect(
            Vec2::new(1.2, 1.2),
            0.25,
            Vec2::ZERO,
            Vec2::ONE
        ));
        assert!(circle_intersects_rect(
            Vec2::new(1.2, 1.2),
            0.3,
            Vec2::ZERO,
            Vec2::ONE
        ));
    }

    #[test]
    fn distant_centres_are_clear() {
        let open = CollisionMap::open(4, 4);
        let walled = CollisionMap::from_ascii(BORDER_3X3).unwrap();
        for x in [1.0e19, -1.0e19, f32::MAX, f32::MIN] {
            for center in [Vec2::new(x, 0.0), Vec2::new(0.0, x), Vec2::splat(x)] {
                assert!(!open.collides(Vec3::ZERO, center, 0.1));
                assert!(!walled.collides(Vec3::ZERO, center, 0.1));
                assert_eq!(
                    walled.collides(Vec3::ZERO, center, 0.1),
                    exhaustive(&walled, Vec3::ZERO, center, 0.1)
                );
            }
        }
    }

    #[test]
    fn distant_camera_is_never_rolled_back_on_open_map() {
        let map = CollisionMap::open(4, 4);
        assert!(map.first_hit(Vec3::new(-1.0e19, 0.0, 1.0e19), Vec2::ONE, 0.1).is_none());
        assert!(map.hits(Vec3::ZERO, Vec2::new(-1.0e19, 1.0e19), 0.1).is_empty());
    }

    #[test]
    fn infinite_radius_covers_every_blocked_cell() {
        let single = CollisionMap::from_ascii("#").unwrap();
        let center = Vec2::new(5.0, 5.0);
        assert!(circle_intersects_rect(center, f32::INFINITY, Vec2::splat(-0.5), Vec2::ONE));
        assert!(single.collides(Vec3::ZERO, center, f32::INFINITY));

        let walled = CollisionMap::from_ascii(BORDER_3X3).unwrap();
        assert_eq!(walled.hits(Vec3::ZERO, Vec2::ONE, f32::INFINITY).len(), 8);
        assert!(!CollisionMap::open(3, 3).collides(Vec3::ZERO, Vec2::ONE, f32::INFINITY));
    }

    #[test]
    fn nan_inputs_report_no_hit() {
        let walled = CollisionMap::from_ascii(BORDER_3X3).unwrap();
        assert!(!walled.collides(Vec3::ZERO, Vec2::new(f32::NAN, 1.0), 0.1));
        assert!(!walled.collides(Vec3::ZERO, Vec2::ONE, f32::NAN));
        assert!(!exhaustive(&walled, Vec3::ZERO, Vec2::ONE, f32::NAN));
    }

    #[test]
    fn ascii_parsing() {
        let map = CollisionMap::from_ascii(BORDER_3X3).unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 3);
        assert_eq!(map.blocked_count(), 8);
        assert!(!map.is_blocked(1, 1));
        assert!(map.is_blocked(0, 0));
        assert!(!map.is_blocked(5, 5));
    }

    #[test]
    fn ragged_ascii_is_rejected() {
        let err = CollisionMap::from_ascii("##\n#\n").unwrap_err();
        assert!(matches!(err, KernelError::RaggedRow { row: 1, .. }));
    }

    #[test]
    fn cell_count_mismatch_is_rejected() {
        let err = CollisionMap::new(2, 2, vec![true; 3]).unwrap_err();
        assert!(matches!(
            err,
            KernelError::CellCountMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn blocked_cells_are_row_major() {
        let map = CollisionMap::from_ascii("#.\n.#").unwrap();
        let cells: Vec<CellCoord> = map.blocked_cells().collect();
        assert_eq!(cells, vec![CellCoord::new(0, 0), CellCoord::new(1, 1)]);
    }

    #[test]
    fn cell_at_clamps_into_grid() {
        let map = CollisionMap::from_ascii(BORDER_3X3).unwrap();
        assert_eq!(
            map.cell_at(Vec3::ZERO, Vec2::new(1.0, 1.0)),
            Some(CellCoord::new(1, 1))
        );
        assert_eq!(
            map.cell_at(Vec3::ZERO, Vec2::new(-10.0, 40.0)),
            Some(CellCoord::new(0, 2))
        );
        assert_eq!(CollisionMap::open(0, 0).cell_at(Vec3::ZERO, Vec2::ZERO), None);
    }

    #[test]
    fn open_map_never_collides() {
        let map = CollisionMap::open(4, 4);
        for i in -10..10 {
            let p = Vec2::new(i as f32 * 0.37, i as f32 * -0.21);
            assert!(!map.collides(Vec3::ZERO, p, 0.1));
        }
    }

    #[test]
    fn hits_lists_every_touched_cell() {
        let map = CollisionMap::from_ascii(BORDER_3X3).unwrap();
        // Near the top-left interior corner, touching (0,0), (1,0) and (0,1).
        let hits = map.hits(Vec3::ZERO, Vec2::new(0.55, 0.55), 0.1);
        assert_eq!(
            hits,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(1, 0),
                CellCoord::new(0, 1)
            ]
        );
    }

    #[test]
    fn touching_from_outside_the_grid_is_found() {
        let map = CollisionMap::from_ascii("#").unwrap();
        // Cell (0,0) spans x in [-0.5, 0.5]; the circle touches its right edge.
        assert!(map.collides(Vec3::ZERO, Vec2::new(0.75, 0.0), 0.25));
        assert!(!map.collides(Vec3::ZERO, Vec2::new(0.875, 0.0), 0.25));
    }

    #[test]
    fn bounded_scan_matches_exhaustive_scan() {
        let map = CollisionMap::from_ascii(
            "
            #####.#
            #...#.#
            #.#....
            #.#.##.
            #......
            ",
        )
        .unwrap();
        let origin = Vec3::new(0.3, 0.0, -0.7);
        for radius in [0.0, 0.1, 0.25, 0.6] {
            for iz in -8..48 {
                for ix in -8..64 {
                    let p = Vec2::new(ix as f32 * 0.13, iz as f32 * 0.127);
                    assert_eq!(
                        map.collides(origin, p, radius),
                        exhaustive(&map, origin, p, radius),
                        "p={p:?} r={radius}"
                    );
                }
            }
        }
    }

    #[test]
    fn non_finite_center_is_clear() {
        let map = CollisionMap::from_ascii(BORDER_3X3).unwrap();
        assert!(!map.collides(Vec3::ZERO, Vec2::new(f32::NAN, 1.0), 0.1));
    }
}

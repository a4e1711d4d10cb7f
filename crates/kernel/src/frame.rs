use crate::{CollisionMap, KernelError};
use glam::Vec3;
use mazeview_common::{CameraState, CellCoord};
use serde::{Deserialize, Serialize};

/// Collision radius of the player cylinder.
pub const DEFAULT_PLAYER_RADIUS: f32 = 0.1;

/// What happened to the camera position during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The new position was clear and kept.
    Moved,
    /// The new position touched `cell`; the previous position was restored.
    RolledBack { cell: CellCoord },
}

impl TickOutcome {
    pub fn is_rollback(&self) -> bool {
        matches!(self, Self::RolledBack { .. })
    }
}

/// Counters accumulated over the life of a frame loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStats {
    pub ticks: u64,
    pub rollbacks: u64,
}

/// Resolve the camera against the map after it moved away from `previous`.
///
/// If the player circle at the camera's ground position touches any blocked
/// cell, the whole move is undone: the position goes back to `previous` and
/// the target shifts by the same amount.
pub fn resolve(
    map: &CollisionMap,
    origin: Vec3,
    radius: f32,
    previous: Vec3,
    camera: &mut CameraState,
) -> TickOutcome {
    match map.first_hit(origin, camera.planar_position(), radius) {
        Some(cell) => {
            camera.translate_to(previous);
            TickOutcome::RolledBack { cell }
        }
        None => TickOutcome::Moved,
    }
}

/// Per-tick update of the maze viewer: camera update followed by collision
/// resolution.
///
/// Owns the camera and the collision map for the whole run. Drawing is not
/// done here; callers compose a frame from [`FrameLoop::camera`] after each
/// tick.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    camera: CameraState,
    map: CollisionMap,
    origin: Vec3,
    player_radius: f32,
    stats: LoopStats,
}

impl FrameLoop {
    /// `origin` is where the maze model is placed in the world.
    pub fn new(
        camera: CameraState,
        map: CollisionMap,
        origin: Vec3,
        player_radius: f32,
    ) -> Result<Self, KernelError> {
        if !player_radius.is_finite() || player_radius < 0.0 {
            return Err(KernelError::InvalidRadius(player_radius));
        }
        if map.collides(origin, camera.planar_position(), player_radius) {
            tracing::warn!(
                "camera starts inside a blocked cell at ({:.2}, {:.2}); \
                 it will not move until it leaves",
                camera.position.x,
                camera.position.z
            );
        }
        tracing::debug!(
            width = map.width(),
            height = map.height(),
            blocked = map.blocked_count(),
            "frame loop ready"
        );
        Ok(Self {
            camera,
            map,
            origin,
            player_radius,
            stats: LoopStats::default(),
        })
    }

    /// Run one tick. `update` is the input-driven camera step; it may move
    /// the camera by any amount.
    pub fn tick(&mut self, update: impl FnOnce(&mut CameraState)) -> TickOutcome {
        let previous = self.camera.position;
        update(&mut self.camera);

        let outcome = resolve(
            &self.map,
            self.origin,
            self.player_radius,
            previous,
            &mut self.camera,
        );

        self.stats.ticks += 1;
        if let TickOutcome::RolledBack { cell } = outcome {
            self.stats.rollbacks += 1;
            tracing::debug!(x = cell.x, y = cell.y, "collision, camera rolled back");
        }
        outcome
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn map(&self) -> &CollisionMap {
        &self.map
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn player_radius(&self) -> f32 {
        self.player_radius
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// The camera's cell, clamped into the grid.
    pub fn player_cell(&self) -> Option<CellCoord> {
        self.map.cell_at(self.origin, self.camera.planar_position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn border_map() -> CollisionMap {
        CollisionMap::from_ascii("###\n#.#\n###").unwrap()
    }

    fn camera_at(x: f32, z: f32) -> CameraState {
        CameraState {
            position: Vec3::new(x, 0.5, z),
            target: Vec3::new(x, 0.5, z - 1.0),
            ..CameraState::default()
        }
    }

    fn step_to(x: f32, z: f32) -> impl FnOnce(&mut CameraState) {
        move |cam: &mut CameraState| cam.translate_to(Vec3::new(x, cam.position.y, z))
    }

    #[test]
    fn open_map_never_rolls_back() {
        let map = CollisionMap::open(1, 1);
        let mut fl = FrameLoop::new(camera_at(0.0, 0.0), map, Vec3::ZERO, 0.1).unwrap();
        for (x, z) in [(5.0, 5.0), (-3.0, 0.2), (0.0, 0.0), (100.0, -40.0)] {
            assert_eq!(fl.tick(step_to(x, z)), TickOutcome::Moved);
            assert_eq!(fl.camera().position, Vec3::new(x, 0.5, z));
        }
        assert_eq!(fl.stats().rollbacks, 0);
        assert_eq!(fl.stats().ticks, 4);
    }

    #[test]
    fn moving_into_border_rolls_back_to_center() {
        let radius = DEFAULT_PLAYER_RADIUS;
        let step = 1.0 - radius + 0.05;
        let moves = [(step, 0.0), (-step, 0.0), (0.0, step), (0.0, -step)];
        for (dx, dz) in moves {
            let mut fl =
                FrameLoop::new(camera_at(1.0, 1.0), border_map(), Vec3::ZERO, radius).unwrap();
            let outcome = fl.tick(step_to(1.0 + dx, 1.0 + dz));
            assert!(outcome.is_rollback(), "move ({dx}, {dz})");
            assert_eq!(fl.camera().position, Vec3::new(1.0, 0.5, 1.0));
        }
    }

    #[test]
    fn small_move_inside_free_cell_is_kept() {
        let mut fl =
            FrameLoop::new(camera_at(1.0, 1.0), border_map(), Vec3::ZERO, 0.1).unwrap();
        assert_eq!(fl.tick(step_to(1.2, 0.9)), TickOutcome::Moved);
        assert_eq!(fl.camera().position, Vec3::new(1.2, 0.5, 0.9));
    }

    #[test]
    fn rollback_restores_exact_previous_position() {
        let mut fl =
            FrameLoop::new(camera_at(1.0, 1.0), border_map(), Vec3::ZERO, 0.1).unwrap();
        fl.tick(step_to(1.13, 0.87));
        let before = fl.camera().position;
        let outcome = fl.tick(step_to(0.0, 0.0));
        assert_eq!(
            outcome,
            TickOutcome::RolledBack {
                cell: CellCoord::new(0, 0)
            }
        );
        assert_eq!(fl.camera().position, before);
    }

    #[test]
    fn rollback_keeps_new_orientation() {
        let mut fl =
            FrameLoop::new(camera_at(1.0, 1.0), border_map(), Vec3::ZERO, 0.1).unwrap();
        fl.tick(|cam| {
            cam.target = cam.position + Vec3::X;
            cam.translate_to(Vec3::new(2.0, 0.5, 1.0));
        });
        let cam = fl.camera();
        assert_eq!(cam.position, Vec3::new(1.0, 0.5, 1.0));
        assert!((cam.target - cam.position - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn resolve_is_idempotent_from_clear_position() {
        let map = border_map();
        let mut cam = camera_at(1.1, 0.95);
        let first = resolve(&map, Vec3::ZERO, 0.1, cam.position, &mut cam);
        let after_first = cam.position;
        let second = resolve(&map, Vec3::ZERO, 0.1, cam.position, &mut cam);
        assert_eq!(first, TickOutcome::Moved);
        assert_eq!(second, TickOutcome::Moved);
        assert_eq!(cam.position, after_first);
    }

    #[test]
    fn position_inside_blocked_cell_restores_previous() {
        let map = border_map();
        let previous = Vec3::new(1.0, 0.5, 1.0);
        let mut cam = camera_at(0.0, 2.0); // centre of blocked cell (0, 2)
        let outcome = resolve(&map, Vec3::ZERO, 0.1, previous, &mut cam);
        assert!(outcome.is_rollback());
        assert_eq!(cam.position, previous);
    }

    #[test]
    fn boundary_distance_collides() {
        // Free centre cell spans [0.5, 1.5]; radius 0.25 touching x = 1.5.
        let mut fl =
            FrameLoop::new(camera_at(1.0, 1.0), border_map(), Vec3::ZERO, 0.25).unwrap();
        assert!(fl.tick(step_to(1.25, 1.0)).is_rollback());
        assert_eq!(fl.tick(step_to(1.125, 1.0)), TickOutcome::Moved);
    }

    #[test]
    fn map_origin_offsets_cells() {
        let map = CollisionMap::from_ascii("#").unwrap();
        let origin = Vec3::new(10.0, 0.0, -4.0);
        let mut fl = FrameLoop::new(camera_at(12.0, -4.0), map, origin, 0.1).unwrap();
        assert!(fl.tick(step_to(10.0, -4.0)).is_rollback());
        assert_eq!(fl.tick(step_to(11.0, -4.0)), TickOutcome::Moved);
    }

    #[test]
    fn invalid_radius_rejected() {
        let map = CollisionMap::open(2, 2);
        assert!(matches!(
            FrameLoop::new(CameraState::default(), map.clone(), Vec3::ZERO, -1.0),
            Err(KernelError::InvalidRadius(_))
        ));
        assert!(FrameLoop::new(CameraState::default(), map, Vec3::ZERO, f32::NAN).is_err());
    }

    #[test]
    fn player_cell_is_clamped() {
        let mut fl =
            FrameLoop::new(camera_at(1.0, 1.0), CollisionMap::open(3, 3), Vec3::ZERO, 0.1)
                .unwrap();
        assert_eq!(fl.player_cell(), Some(CellCoord::new(1, 1)));
        fl.tick(step_to(-7.0, 9.0));
        assert_eq!(fl.player_cell(), Some(CellCoord::new(0, 2)));
    }
}

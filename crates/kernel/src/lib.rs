//! Maze kernel: the collision map and the per-tick frame loop.
//!
//! # Invariants
//! - The collision map is immutable once built.
//! - A tick either keeps the camera's new position or restores the position it
//!   had before the tick. There is no partial correction.
//! - After a tick the camera's ground position is clear of every blocked cell,
//!   as long as it was clear before the tick.

pub mod collision;
pub mod frame;

pub use collision::{CollisionMap, circle_intersects_rect};
pub use frame::{DEFAULT_PLAYER_RADIUS, FrameLoop, LoopStats, TickOutcome, resolve};

/// Errors from building kernel state.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("collision map {width}x{height} needs {expected} cells, got {actual}")]
    CellCountMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("player radius must be finite and non-negative, got {0}")]
    InvalidRadius(f32),
}

pub fn crate_info() -> &'static str {
    "mazeview-kernel v0.1.0"
}

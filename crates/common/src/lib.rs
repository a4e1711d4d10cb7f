//! Shared value types used across the mazeview crates.

mod types;

pub use types::{CameraState, CellCoord, Color, Placement, Projection};

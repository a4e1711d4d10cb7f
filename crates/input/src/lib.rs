//! Input: desktop events mapped to viewer actions, and the first-person
//! controller that turns actions into camera motion.
//!
//! # Invariants
//! - The controller never changes the camera's height.
//! - Window-system types stay out of this crate; apps translate their key
//!   codes into [`Action`]s.

pub mod action;
pub mod controller;

pub use action::{Action, InputFrame, InputState};
pub use controller::{ControllerSettings, FirstPersonController};

pub fn crate_info() -> &'static str {
    "mazeview-input v0.1.0"
}

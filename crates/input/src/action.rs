use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A high-level action produced by the keyboard.
///
/// Apps map raw key codes to actions; everything downstream consumes actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    /// Show or hide the minimap overlay.
    ToggleMinimap,
    /// Close the viewer.
    Quit,
}

impl Action {
    /// Held-down actions that drive movement every tick.
    pub fn is_movement(self) -> bool {
        matches!(
            self,
            Self::MoveForward | Self::MoveBackward | Self::StrafeLeft | Self::StrafeRight
        )
    }
}

/// Input for a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    /// `x`: strafe (+right), `y`: walk (+forward). Each component is -1, 0 or 1.
    pub movement: Vec2,
    /// Mouse motion since the previous tick, in device counts.
    pub look: Vec2,
}

/// Accumulated input between ticks.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: BTreeSet<Action>,
    look: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press. Returns `true` when the action was not already held,
    /// which is when one-shot actions should fire.
    pub fn press(&mut self, action: Action) -> bool {
        self.held.insert(action)
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    /// Drop every held action, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    pub fn add_look(&mut self, dx: f32, dy: f32) {
        self.look += Vec2::new(dx, dy);
    }

    /// Snapshot the current tick's input and reset the mouse delta.
    pub fn take_frame(&mut self) -> InputFrame {
        let axis = |pos: Action, neg: Action| {
            self.is_held(pos) as i32 as f32 - self.is_held(neg) as i32 as f32
        };
        let movement = Vec2::new(
            axis(Action::StrafeRight, Action::StrafeLeft),
            axis(Action::MoveForward, Action::MoveBackward),
        );
        InputFrame {
            movement,
            look: std::mem::take(&mut self.look),
        }
    }
}

//! Rendering Adapter: renderer-agnostic draw commands.
//!
//! # Invariants
//! - Renderers read a [`Frame`]; they never touch the frame loop or the camera.
//! - A frame clears first and keeps all model draws between `Begin3d` and
//!   `End3d`; overlay commands come after.
//!
//! Backends: [`DebugTextRenderer`] here for the CLI and tests, and the wgpu
//! renderer in `mazeview-render-wgpu`.

mod frame;
mod renderer;

pub use frame::{
    DrawCommand, Frame, INSTRUCTIONS, MinimapView, ModelId, SceneLayout, SceneModel, compose_frame,
};
pub use renderer::{DebugTextRenderer, Renderer};

pub fn crate_info() -> &'static str {
    "mazeview-render v0.1.0"
}

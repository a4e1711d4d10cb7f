//! wgpu render backend for the maze viewer.
//!
//! Draws textured static models from a composed [`Frame`]. Overlay commands
//! (text, rectangles) are left to the app's UI layer.
//!
//! # Invariants
//! - Rendering reads the frame only; it never changes camera or scene state.
//! - GPU resources are owned by [`WgpuRenderer`] and released when it drops.
//!
//! [`Frame`]: mazeview_render::Frame

pub mod camera;
mod gpu;
mod shaders;

pub use gpu::{FrameTarget, WgpuRenderer};

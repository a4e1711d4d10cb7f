use crate::{DrawCommand, Frame};

/// Renderer-agnostic interface. All backends implement this trait.
///
/// A renderer consumes a composed [`Frame`] and produces its output. It never
/// mutates scene or camera state.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Execute every command of `frame` in order.
    fn render(&mut self, frame: &Frame) -> Self::Output;
}

/// Writes one line per draw command.
///
/// Used by the CLI to show what a frame would draw, and by tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, frame: &Frame) -> String {
        self.frames += 1;
        let mut out = format!("=== Frame {} ({} commands) ===\n", self.frames, frame.len());
        for cmd in frame.commands() {
            let line = match cmd {
                DrawCommand::Clear(c) => format!("clear rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a),
                DrawCommand::Begin3d(cam) => format!(
                    "begin3d eye=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) \
                     fovy={:.0} {:?}",
                    cam.position.x,
                    cam.position.y,
                    cam.position.z,
                    cam.target.x,
                    cam.target.y,
                    cam.target.z,
                    cam.fovy,
                    cam.projection
                ),
                DrawCommand::DrawModel {
                    model,
                    placement,
                    ..
                } => format!(
                    "  model #{} at ({:.2}, {:.2}, {:.2}) scale {}",
                    model.0,
                    placement.position.x,
                    placement.position.y,
                    placement.position.z,
                    placement.scale
                ),
                DrawCommand::End3d => "end3d".to_string(),
                DrawCommand::Text { text, x, y, size, .. } => {
                    format!("text ({x}, {y}) size {size}: {text}")
                }
                DrawCommand::Rect {
                    x,
                    y,
                    width,
                    height,
                    ..
                } => format!("rect ({x}, {y}) {width}x{height}"),
            };
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

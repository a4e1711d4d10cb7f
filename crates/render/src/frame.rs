use mazeview_common::{CameraState, CellCoord, Color, Placement};
use mazeview_kernel::CollisionMap;

/// Handle of a model uploaded to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub u32);

/// One draw call. Overlay coordinates are window pixels from the top-left.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Begin3d(CameraState),
    DrawModel {
        model: ModelId,
        placement: Placement,
        tint: Color,
    },
    End3d,
    Text {
        text: String,
        x: i32,
        y: i32,
        size: u32,
        color: Color,
    },
    Rect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        color: Color,
    },
}

/// Ordered list of draw commands for one presented frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self, color: Color) -> &mut Self {
        self.commands.push(DrawCommand::Clear(color));
        self
    }

    pub fn begin_3d(&mut self, camera: CameraState) -> &mut Self {
        self.commands.push(DrawCommand::Begin3d(camera));
        self
    }

    pub fn draw_model(&mut self, model: ModelId, placement: Placement, tint: Color) -> &mut Self {
        self.commands.push(DrawCommand::DrawModel {
            model,
            placement,
            tint,
        });
        self
    }

    pub fn end_3d(&mut self) -> &mut Self {
        self.commands.push(DrawCommand::End3d);
        self
    }

    pub fn text(
        &mut self,
        text: impl Into<String>,
        x: i32,
        y: i32,
        size: u32,
        color: Color,
    ) -> &mut Self {
        self.commands.push(DrawCommand::Text {
            text: text.into(),
            x,
            y,
            size,
            color,
        });
        self
    }

    pub fn rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) -> &mut Self {
        self.commands.push(DrawCommand::Rect {
            x,
            y,
            width,
            height,
            color,
        });
        self
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Colour of the last `Clear`, if any.
    pub fn clear_color(&self) -> Option<Color> {
        self.commands.iter().rev().find_map(|c| match c {
            DrawCommand::Clear(color) => Some(*color),
            _ => None,
        })
    }

    /// Camera of the first 3D block.
    pub fn camera(&self) -> Option<&CameraState> {
        self.commands.iter().find_map(|c| match c {
            DrawCommand::Begin3d(camera) => Some(camera),
            _ => None,
        })
    }

    /// Model draws in submission order.
    pub fn model_draws(&self) -> impl Iterator<Item = (ModelId, Placement, Color)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::DrawModel {
                model,
                placement,
                tint,
            } => Some((*model, *placement, *tint)),
            _ => None,
        })
    }

    /// Text and rectangle commands, drawn over the 3D scene.
    pub fn overlay(&self) -> impl Iterator<Item = &DrawCommand> + '_ {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Text { .. } | DrawCommand::Rect { .. }))
    }
}

/// A static model in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneModel {
    pub name: String,
    pub model: ModelId,
    pub placement: Placement,
    pub tint: Color,
}

/// Static content drawn every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLayout {
    pub clear_color: Color,
    pub maze: SceneModel,
    pub props: Vec<SceneModel>,
}

/// Control hints drawn at the top-left: text, x, y.
pub const INSTRUCTIONS: [(&str, i32, i32); 3] = [
    ("First person camera default controls:", 20, 20),
    ("- Move with keys: W, A, S, D", 40, 40),
    ("- Mouse move to look around", 40, 60),
];

const INSTRUCTION_SIZE: u32 = 10;

/// Top-down view of the collision map drawn as one rectangle per cell.
#[derive(Debug, Clone, Copy)]
pub struct MinimapView<'a> {
    pub map: &'a CollisionMap,
    /// Highlighted cell, normally the player's.
    pub player: Option<CellCoord>,
    pub x: i32,
    pub y: i32,
    /// Pixels per cell.
    pub cell_size: u32,
}

impl MinimapView<'_> {
    fn compose(&self, frame: &mut Frame) {
        let s = self.cell_size;
        for row in 0..self.map.height() {
            for col in 0..self.map.width() {
                let color = if self.map.is_blocked(col, row) {
                    Color::WHITE
                } else {
                    Color::DARK_GRAY
                };
                let (x, y) = self.cell_origin(col, row);
                frame.rect(x, y, s, s, color);
            }
        }
        if let Some(cell) = self.player {
            let (x, y) = self.cell_origin(cell.x, cell.y);
            frame.rect(x, y, s, s, Color::RED);
        }
    }

    fn cell_origin(&self, col: usize, row: usize) -> (i32, i32) {
        let s = self.cell_size as i32;
        (self.x + col as i32 * s, self.y + row as i32 * s)
    }
}

/// Build the draw list for one frame: clear, the 3D scene seen from
/// `camera`, then the instruction text and the optional minimap.
pub fn compose_frame(
    layout: &SceneLayout,
    camera: &CameraState,
    minimap: Option<MinimapView<'_>>,
) -> Frame {
    let mut frame = Frame::new();
    frame.clear(layout.clear_color).begin_3d(*camera);
    for model in std::iter::once(&layout.maze).chain(&layout.props) {
        frame.draw_model(model.model, model.placement, model.tint);
    }
    frame.end_3d();

    for (text, x, y) in INSTRUCTIONS {
        frame.text(text, x, y, INSTRUCTION_SIZE, Color::WHITE);
    }
    if let Some(minimap) = minimap {
        minimap.compose(&mut frame);
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn layout() -> SceneLayout {
        SceneLayout {
            clear_color: Color::BLACK,
            maze: SceneModel {
                name: "maze".into(),
                model: ModelId(0),
                placement: Placement::default(),
                tint: Color::WHITE,
            },
            props: vec![SceneModel {
                name: "castle".into(),
                model: ModelId(1),
                placement: Placement::new(Vec3::new(3.0, 0.0, 3.0), 0.02),
                tint: Color::WHITE,
            }],
        }
    }

    #[test]
    fn frame_order_is_clear_3d_overlay() {
        let camera = CameraState::default();
        let frame = compose_frame(&layout(), &camera, None);
        let cmds = frame.commands();
        assert_eq!(cmds[0], DrawCommand::Clear(Color::BLACK));
        assert_eq!(cmds[1], DrawCommand::Begin3d(camera));
        assert!(matches!(cmds[2], DrawCommand::DrawModel { model: ModelId(0), .. }));
        assert!(matches!(cmds[3], DrawCommand::DrawModel { model: ModelId(1), .. }));
        assert_eq!(cmds[4], DrawCommand::End3d);
        assert_eq!(frame.overlay().count(), 3);
        assert_eq!(frame.len(), 8);
    }

    #[test]
    fn prop_keeps_its_placement() {
        let frame = compose_frame(&layout(), &CameraState::default(), None);
        let draws: Vec<_> = frame.model_draws().collect();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[1].1.position, Vec3::new(3.0, 0.0, 3.0));
        assert_eq!(draws[1].1.scale, 0.02);
    }

    #[test]
    fn instructions_are_drawn_at_fixed_positions() {
        let frame = compose_frame(&layout(), &CameraState::default(), None);
        let texts: Vec<_> = frame
            .overlay()
            .filter_map(|c| match c {
                DrawCommand::Text { text, x, y, .. } => Some((text.as_str(), *x, *y)),
                _ => None,
            })
            .collect();
        assert_eq!(texts, INSTRUCTIONS.to_vec());
    }

    #[test]
    fn minimap_draws_every_cell_and_the_player() {
        let map = CollisionMap::from_ascii("##\n#.").unwrap();
        let minimap = MinimapView {
            map: &map,
            player: Some(CellCoord::new(1, 1)),
            x: 100,
            y: 20,
            cell_size: 4,
        };
        let frame = compose_frame(&layout(), &CameraState::default(), Some(minimap));
        let rects: Vec<_> = frame
            .overlay()
            .filter(|c| matches!(c, DrawCommand::Rect { .. }))
            .collect();
        assert_eq!(rects.len(), 5);
        assert_eq!(
            rects[4],
            &DrawCommand::Rect {
                x: 104,
                y: 24,
                width: 4,
                height: 4,
                color: Color::RED
            }
        );
    }

    #[test]
    fn frame_accessors() {
        let frame = compose_frame(&layout(), &CameraState::default(), None);
        assert_eq!(frame.clear_color(), Some(Color::BLACK));
        assert_eq!(frame.camera(), Some(&CameraState::default()));
        assert!(Frame::new().camera().is_none());
    }
}

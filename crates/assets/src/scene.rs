use crate::AssetError;
use glam::Vec3;
use mazeview_common::{CameraState, Placement};
use mazeview_input::ControllerSettings;
use mazeview_kernel::DEFAULT_PLAYER_RADIUS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything the viewer needs to set up a scene. Every field has a default,
/// so a scene file only lists what it changes.
///
/// ```yaml
/// maze:
///   map: resources/cubicmap.png
/// player:
///   radius: 0.15
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub window: WindowConfig,
    pub camera: CameraState,
    pub maze: MazeConfig,
    pub props: Vec<PropConfig>,
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "CHALLENGE 03: FIRST PERSON MAZE".into(),
            width: 1020,
            height: 800,
            target_fps: 60,
        }
    }
}

/// The maze image, its texture atlas and where the maze sits in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeConfig {
    pub map: PathBuf,
    pub atlas: PathBuf,
    pub placement: Placement,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            map: PathBuf::from("resources/cubicmap.png"),
            atlas: PathBuf::from("resources/cubemap_atlas.png"),
            placement: Placement::default(),
        }
    }
}

/// A decorative model drawn in the maze. It does not collide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropConfig {
    pub name: String,
    pub model: PathBuf,
    pub texture: PathBuf,
    pub placement: Placement,
}

impl PropConfig {
    fn castle() -> Self {
        Self {
            name: "castle".into(),
            model: PathBuf::from("resources/models/obj/castle.obj"),
            texture: PathBuf::from("resources/models/obj/castle_diffuse.png"),
            placement: Placement::new(Vec3::new(3.0, 0.0, 3.0), 0.02),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Radius of the player cylinder used for wall collision.
    pub radius: f32,
    #[serde(flatten)]
    pub controller: ControllerSettings,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_PLAYER_RADIUS,
            controller: ControllerSettings::default(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraState::default(),
            maze: MazeConfig::default(),
            props: vec![PropConfig::castle()],
            player: PlayerConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Parse a YAML scene file. Relative asset paths are resolved against
    /// the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        Self::resolve(Some(path.as_ref()), None)
    }

    /// Scene for the command line: the file at `scene` or the defaults, with
    /// relative paths resolved against `base_dir` when given, else against
    /// the scene file's directory, else the working directory.
    pub fn resolve(scene: Option<&Path>, base_dir: Option<&Path>) -> Result<Self, AssetError> {
        let config = match scene {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| AssetError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let config = Self::from_yaml(&text)?;
                tracing::info!("scene config loaded from {}", path.display());
                config
            }
            None => Self::default(),
        };
        let base = base_dir
            .or_else(|| scene.and_then(Path::parent))
            .unwrap_or_else(|| Path::new(""));
        Ok(config.with_base_dir(base))
    }

    pub fn from_yaml(text: &str) -> Result<Self, AssetError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml(&self) -> Result<String, AssetError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Prefix every relative asset path with `base`.
    pub fn with_base_dir(mut self, base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.maze.map);
        resolve(&mut self.maze.atlas);
        for prop in &mut self.props {
            resolve(&mut prop.model);
            resolve(&mut prop.texture);
        }
        self
    }
}

//! Asset loading for the maze viewer.
//!
//! Turns files on disk into plain in-memory data: a [`CollisionMap`] from the
//! maze image, [`MeshData`] for the maze and props, and RGBA8
//! [`TextureData`]. Nothing here touches the GPU.
//!
//! The collision map is required; textures and prop models have `_or_*`
//! loaders that log the failure and fall back to a white texture or an empty
//! mesh so the viewer still runs.
//!
//! [`CollisionMap`]: mazeview_kernel::CollisionMap

mod cubicmap;
mod map;
mod mesh;
mod obj;
mod scene;
mod texture;

pub use cubicmap::{AtlasRect, CubicmapAtlas, cubicmap_mesh};
pub use map::{collision_map_from_image, load_collision_map};
pub use mesh::{Bounds, MeshData};
pub use obj::{load_obj, load_obj_or_empty};
pub use scene::{MazeConfig, PlayerConfig, PropConfig, SceneConfig, WindowConfig};
pub use texture::{TextureData, load_texture, load_texture_or_white};

use std::path::PathBuf;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to load OBJ {}: {source}", path.display())]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("scene config error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid collision map: {0}")]
    Map(#[from] mazeview_kernel::KernelError),
}

pub fn crate_info() -> &'static str {
    "mazeview-assets v0.1.0"
}

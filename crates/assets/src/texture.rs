use crate::AssetError;
use image::DynamicImage;
use std::path::Path;

/// Decoded RGBA8 pixels, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    /// 1x1 opaque white, used when a texture fails to load.
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
        }
    }

    pub fn from_image(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            rgba: rgba.into_raw(),
        }
    }
}

pub fn load_texture(path: impl AsRef<Path>) -> Result<TextureData, AssetError> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let texture = TextureData::from_image(&image);
    tracing::debug!(
        "texture {} loaded: {}x{}",
        path.display(),
        texture.width,
        texture.height
    );
    Ok(texture)
}

/// Like [`load_texture`], but logs the failure and returns white instead.
pub fn load_texture_or_white(path: impl AsRef<Path>) -> TextureData {
    load_texture(path).unwrap_or_else(|e| {
        tracing::warn!("{e}; using a white texture");
        TextureData::white()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn rgb_is_expanded_to_rgba() {
        let img = ImageBuffer::from_pixel(2, 2, Rgb([10u8, 20, 30]));
        let tex = TextureData::from_image(&DynamicImage::ImageRgb8(img));
        assert_eq!((tex.width, tex.height), (2, 2));
        assert_eq!(tex.rgba.len(), 16);
        assert_eq!(&tex.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn missing_texture_falls_back_to_white() {
        let tex = load_texture_or_white("/nonexistent/atlas.png");
        assert_eq!(tex, TextureData::white());
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.png");
        ImageBuffer::from_pixel(4, 2, Rgb([1u8, 2, 3])).save(&path).unwrap();
        let tex = load_texture(&path).unwrap();
        assert_eq!((tex.width, tex.height), (4, 2));
    }
}

use crate::AssetError;
use image::DynamicImage;
use mazeview_kernel::CollisionMap;
use std::path::Path;

/// Load the maze image and derive its collision map.
pub fn load_collision_map(path: impl AsRef<Path>) -> Result<CollisionMap, AssetError> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let map = collision_map_from_image(&image)?;
    tracing::info!(
        "collision map {} loaded: {}x{}, {} blocked cells",
        path.display(),
        map.width(),
        map.height(),
        map.blocked_count()
    );
    Ok(map)
}

/// A cell is blocked when the pixel's red sample is at the maximum value for
/// the image's sample type. Other channels are ignored.
pub fn collision_map_from_image(image: &DynamicImage) -> Result<CollisionMap, AssetError> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let cells: Vec<bool> = match image {
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => image
            .to_rgba16()
            .pixels()
            .map(|p| p.0[0] == u16::MAX)
            .collect(),
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => image
            .to_rgba32f()
            .pixels()
            .map(|p| p.0[0] >= 1.0)
            .collect(),
        _ => image
            .to_rgba8()
            .pixels()
            .map(|p| p.0[0] == u8::MAX)
            .collect(),
    };
    Ok(CollisionMap::new(width, height, cells)?)
}

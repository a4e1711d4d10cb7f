use crate::{AssetError, MeshData};
use std::path::Path;

/// Load every mesh in a Wavefront OBJ file into one [`MeshData`].
///
/// Faces are triangulated and re-indexed so each vertex has a single index.
/// Vertices without normals get +Y, without texture coordinates (0, 0).
/// Materials referenced by the file are ignored; the diffuse texture comes
/// from the scene configuration.
pub fn load_obj(path: impl AsRef<Path>) -> Result<MeshData, AssetError> {
    let path = path.as_ref();
    let (models, materials) =
        tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS).map_err(|source| AssetError::Obj {
            path: path.to_path_buf(),
            source,
        })?;
    if let Err(e) = materials {
        tracing::debug!("ignoring materials of {}: {e}", path.display());
    }

    let mut mesh = MeshData::default();
    for model in &models {
        mesh.append(&convert(&model.mesh));
    }
    tracing::info!(
        "model {} loaded: {} meshes, {} vertices, {} triangles",
        path.display(),
        models.len(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Like [`load_obj`], but logs the failure and returns an empty mesh.
pub fn load_obj_or_empty(path: impl AsRef<Path>) -> MeshData {
    load_obj(path).unwrap_or_else(|e| {
        tracing::warn!("{e}; the model will not be drawn");
        MeshData::default()
    })
}

fn convert(src: &tobj::Mesh) -> MeshData {
    let count = src.positions.len() / 3;
    let has_normals = src.normals.len() == src.positions.len();
    let has_uvs = src.texcoords.len() / 2 == count;

    let mut mesh = MeshData {
        positions: Vec::with_capacity(count),
        normals: Vec::with_capacity(count),
        uvs: Vec::with_capacity(count),
        indices: src.indices.clone(),
    };
    for i in 0..count {
        mesh.positions.push([
            src.positions[3 * i],
            src.positions[3 * i + 1],
            src.positions[3 * i + 2],
        ]);
        mesh.normals.push(if has_normals {
            [
                src.normals[3 * i],
                src.normals[3 * i + 1],
                src.normals[3 * i + 2],
            ]
        } else {
            [0.0, 1.0, 0.0]
        });
        // OBJ puts v = 0 at the bottom of the image.
        mesh.uvs.push(if has_uvs {
            [src.texcoords[2 * i], 1.0 - src.texcoords[2 * i + 1]]
        } else {
            [0.0, 0.0]
        });
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD_OBJ: &str = "\
o quad
v 0.0 0.0 0.0
v 2.0 0.0 0.0
v 2.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn quad_is_triangulated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.obj");
        std::fs::write(&path, QUAD_OBJ).unwrap();

        let mesh = load_obj(&path).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.normals.iter().all(|n| *n == [0.0, 0.0, 1.0]));
        let b = mesh.bounds().unwrap();
        assert_eq!(b.max.x, 2.0);
    }

    #[test]
    fn texture_v_is_flipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.obj");
        std::fs::write(&path, QUAD_OBJ).unwrap();

        let mesh = load_obj(&path).unwrap();
        let origin = mesh
            .positions
            .iter()
            .position(|p| *p == [0.0, 0.0, 0.0])
            .unwrap();
        assert_eq!(mesh.uvs[origin], [0.0, 1.0]);
    }

    #[test]
    fn missing_normals_default_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 0 1\nf 1 2 3\n").unwrap();

        let mesh = load_obj(&path).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.normals.iter().all(|n| *n == [0.0, 1.0, 0.0]));
        assert!(mesh.uvs.iter().all(|uv| *uv == [0.0, 0.0]));
    }

    #[test]
    fn missing_model_is_empty_fallback() {
        assert!(load_obj_or_empty("/nonexistent/castle.obj").is_empty());
        assert!(matches!(
            load_obj("/nonexistent/castle.obj"),
            Err(AssetError::Obj { .. })
        ));
    }
}

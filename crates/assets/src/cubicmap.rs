use crate::MeshData;
use glam::Vec3;
use mazeview_kernel::CollisionMap;

/// A rectangle in normalized texture space (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasRect {
    pub u: f32,
    pub v: f32,
    pub width: f32,
    pub height: f32,
}

impl AtlasRect {
    pub const fn new(u: f32, v: f32, width: f32, height: f32) -> Self {
        Self { u, v, width, height }
    }

    fn min(&self) -> [f32; 2] {
        [self.u, self.v]
    }

    fn max(&self) -> [f32; 2] {
        [self.u + self.width, self.v + self.height]
    }
}

/// Which part of the texture atlas each kind of face samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicmapAtlas {
    pub right: AtlasRect,
    pub left: AtlasRect,
    pub front: AtlasRect,
    pub back: AtlasRect,
    /// Top of walls and the floor of free cells.
    pub top: AtlasRect,
    /// Bottom of walls and the ceiling of free cells.
    pub bottom: AtlasRect,
}

impl Default for CubicmapAtlas {
    /// The 2x2 atlas layout: wall sides in the top row, top and bottom in the
    /// bottom row.
    fn default() -> Self {
        Self {
            right: AtlasRect::new(0.0, 0.0, 0.5, 0.5),
            left: AtlasRect::new(0.5, 0.0, 0.5, 0.5),
            front: AtlasRect::new(0.0, 0.0, 0.5, 0.5),
            back: AtlasRect::new(0.5, 0.0, 0.5, 0.5),
            top: AtlasRect::new(0.0, 0.5, 0.5, 0.5),
            bottom: AtlasRect::new(0.5, 0.5, 0.5, 0.5),
        }
    }
}

/// Build the maze mesh from a collision map.
///
/// Each blocked cell becomes a box of `cube_size` centred on the cell, with a
/// side face only where the neighbouring cell is free or off the grid. Each
/// free cell gets a floor quad at `y = 0` and a ceiling quad at
/// `y = cube_size.y`. Map row `y` runs along world +Z.
pub fn cubicmap_mesh(map: &CollisionMap, cube_size: Vec3, atlas: &CubicmapAtlas) -> MeshData {
    let mut mesh = MeshData::default();
    let (w, h, l) = (cube_size.x, cube_size.y, cube_size.z);
    let open = |x: isize, z: isize| x < 0 || z < 0 || !map.is_blocked(x as usize, z as usize);

    for z in 0..map.height() {
        for x in 0..map.width() {
            let x0 = w * (x as f32 - 0.5);
            let x1 = w * (x as f32 + 0.5);
            let z0 = l * (z as f32 - 0.5);
            let z1 = l * (z as f32 + 0.5);
            let (ix, iz) = (x as isize, z as isize);

            if !map.is_blocked(x, z) {
                // Floor
                mesh.push_quad(
                    [
                        Vec3::new(x0, 0.0, z1),
                        Vec3::new(x1, 0.0, z1),
                        Vec3::new(x1, 0.0, z0),
                        Vec3::new(x0, 0.0, z0),
                    ],
                    Vec3::Y,
                    atlas.top.min(),
                    atlas.top.max(),
                );
                // Ceiling
                mesh.push_quad(
                    [
                        Vec3::new(x0, h, z0),
                        Vec3::new(x1, h, z0),
                        Vec3::new(x1, h, z1),
                        Vec3::new(x0, h, z1),
                    ],
                    Vec3::NEG_Y,
                    atlas.bottom.min(),
                    atlas.bottom.max(),
                );
                continue;
            }

            mesh.push_quad(
                [
                    Vec3::new(x0, h, z1),
                    Vec3::new(x1, h, z1),
                    Vec3::new(x1, h, z0),
                    Vec3::new(x0, h, z0),
                ],
                Vec3::Y,
                atlas.top.min(),
                atlas.top.max(),
            );
            mesh.push_quad(
                [
                    Vec3::new(x0, 0.0, z0),
                    Vec3::new(x1, 0.0, z0),
                    Vec3::new(x1, 0.0, z1),
                    Vec3::new(x0, 0.0, z1),
                ],
                Vec3::NEG_Y,
                atlas.bottom.min(),
                atlas.bottom.max(),
            );
            if open(ix, iz + 1) {
                mesh.push_quad(
                    [
                        Vec3::new(x0, 0.0, z1),
                        Vec3::new(x1, 0.0, z1),
                        Vec3::new(x1, h, z1),
                        Vec3::new(x0, h, z1),
                    ],
                    Vec3::Z,
                    atlas.front.min(),
                    atlas.front.max(),
                );
            }
            if open(ix, iz - 1) {
                mesh.push_quad(
                    [
                        Vec3::new(x1, 0.0, z0),
                        Vec3::new(x0, 0.0, z0),
                        Vec3::new(x0, h, z0),
                        Vec3::new(x1, h, z0),
                    ],
                    Vec3::NEG_Z,
                    atlas.back.min(),
                    atlas.back.max(),
                );
            }
            if open(ix + 1, iz) {
                mesh.push_quad(
                    [
                        Vec3::new(x1, 0.0, z1),
                        Vec3::new(x1, 0.0, z0),
                        Vec3::new(x1, h, z0),
                        Vec3::new(x1, h, z1),
                    ],
                    Vec3::X,
                    atlas.right.min(),
                    atlas.right.max(),
                );
            }
            if open(ix - 1, iz) {
                mesh.push_quad(
                    [
                        Vec3::new(x0, 0.0, z0),
                        Vec3::new(x0, 0.0, z1),
                        Vec3::new(x0, h, z1),
                        Vec3::new(x0, h, z0),
                    ],
                    Vec3::NEG_X,
                    atlas.left.min(),
                    atlas.left.max(),
                );
            }
        }
    }

    tracing::debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "cubicmap mesh generated"
    );
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quads(mesh: &MeshData) -> usize {
        mesh.indices.len() / 6
    }

    fn mesh_for(ascii: &str) -> MeshData {
        let map = CollisionMap::from_ascii(ascii).unwrap();
        cubicmap_mesh(&map, Vec3::ONE, &CubicmapAtlas::default())
    }

    #[test]
    fn single_wall_is_a_closed_box() {
        let mesh = mesh_for("#");
        assert_eq!(quads(&mesh), 6);
        assert_eq!(mesh.vertex_count(), 24);
        let b = mesh.bounds().unwrap();
        assert_eq!(b.min, Vec3::new(-0.5, 0.0, -0.5));
        assert_eq!(b.max, Vec3::new(0.5, 1.0, 0.5));
    }

    #[test]
    fn free_cell_gets_floor_and_ceiling() {
        let mesh = mesh_for(".");
        assert_eq!(quads(&mesh), 2);
        assert_eq!(mesh.normals[0], [0.0, 1.0, 0.0]);
        assert_eq!(mesh.normals[4], [0.0, -1.0, 0.0]);
    }

    #[test]
    fn border_map_skips_faces_between_walls() {
        // 8 tops, 8 bottoms, 12 outer sides, 4 sides facing the free centre,
        // floor and ceiling of the centre.
        let mesh = mesh_for("###\n#.#\n###");
        assert_eq!(quads(&mesh), 8 + 8 + 12 + 4 + 2);
    }

    #[test]
    fn faces_wind_towards_their_normals() {
        let mesh = mesh_for("#.\n.#");
        let p = |i: u32| Vec3::from_array(mesh.positions[i as usize]);
        for tri in mesh.indices.chunks(3) {
            let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            let normal = Vec3::from_array(mesh.normals[tri[0] as usize]);
            assert!(face.dot(normal) > 0.0, "triangle {tri:?}");
        }
    }

    #[test]
    fn uvs_stay_inside_atlas_quadrants() {
        let mesh = mesh_for("#.");
        assert!(
            mesh.uvs
                .iter()
                .all(|uv| (0.0..=1.0).contains(&uv[0]) && (0.0..=1.0).contains(&uv[1]))
        );
    }

    #[test]
    fn cube_size_scales_geometry() {
        let map = CollisionMap::from_ascii("#").unwrap();
        let mesh = cubicmap_mesh(&map, Vec3::new(2.0, 3.0, 2.0), &CubicmapAtlas::default());
        let b = mesh.bounds().unwrap();
        assert_eq!(b.size(), Vec3::new(2.0, 3.0, 2.0));
    }
}

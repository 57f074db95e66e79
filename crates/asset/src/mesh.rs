//! CPU-side mesh representation used by loaders.

use corelib::{BoundingBox, bounds};
use glam::{Vec2, Vec3};

/// Vertex attributes. Values are in object space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub color: [u8; 4],
}

impl Default for MeshVertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0, 0.0, 1.0],
            uv: [0.0; 2],
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
            color: [255; 4],
        }
    }
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            ..Self::default()
        }
    }
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Assemble a mesh from separate attribute streams, as engine-side geometry
    /// usually arrives. Missing or short streams fall back to vertex defaults;
    /// only the first texcoord set is kept.
    pub fn from_streams(
        indices: Vec<u32>,
        positions: &[[f32; 3]],
        normals: &[[f32; 3]],
        colors: &[[u8; 4]],
        texcoords: &[Vec<[f32; 3]>],
    ) -> Self {
        let uvs = texcoords.first().map(Vec::as_slice).unwrap_or(&[]);
        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let mut v = MeshVertex {
                    position,
                    ..MeshVertex::default()
                };
                if let Some(&n) = normals.get(i) {
                    v.normal = n;
                }
                if let Some(&c) = colors.get(i) {
                    v.color = c;
                }
                if let Some(&[u, w, _]) = uvs.get(i) {
                    v.uv = [u, w];
                }
                v
            })
            .collect();
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices.iter().map(|v| Vec3::from(v.position))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.positions())
    }

    pub fn centroid(&self) -> Vec3 {
        bounds::centroid(self.positions())
    }

    /// Accumulate per-triangle tangent frames onto vertices.
    /// Degenerate UV triangles are skipped; returns `false` when nothing
    /// could be computed (no triangles).
    pub fn compute_tangents(&mut self) -> bool {
        if !self.is_valid() || self.indices.len() < 3 {
            return false;
        }

        let mut tangents = vec![Vec3::ZERO; self.vertices.len()];
        let mut bitangents = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(v0), Some(v1), Some(v2)) = (
                self.vertices.get(i0),
                self.vertices.get(i1),
                self.vertices.get(i2),
            ) else {
                continue;
            };

            let p0 = Vec3::from(v0.position);
            let e1 = Vec3::from(v1.position) - p0;
            let e2 = Vec3::from(v2.position) - p0;
            let d1 = Vec2::from(v1.uv) - Vec2::from(v0.uv);
            let d2 = Vec2::from(v2.uv) - Vec2::from(v0.uv);

            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() < f32::EPSILON {
                continue;
            }
            let r = 1.0 / det;
            let t = (e1 * d2.y - e2 * d1.y) * r;
            let b = (e2 * d1.x - e1 * d2.x) * r;

            for i in [i0, i1, i2] {
                tangents[i] += t;
                bitangents[i] += b;
            }
        }

        for (v, (t, b)) in self
            .vertices
            .iter_mut()
            .zip(tangents.into_iter().zip(bitangents))
        {
            let n = Vec3::from(v.normal);
            // Gram-Schmidt against the normal.
            let t = (t - n * n.dot(t)).normalize_or_zero();
            v.tangent = t.into();
            v.bitangent = b.normalize_or_zero().into();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshData {
        let v = |p: [f32; 3], uv: [f32; 2]| MeshVertex::new(p, [0.0, 0.0, 1.0], uv);
        MeshData::new(
            vec![
                v([0.0, 0.0, 0.0], [0.0, 0.0]),
                v([2.0, 0.0, 0.0], [1.0, 0.0]),
                v([2.0, 2.0, 0.0], [1.0, 1.0]),
                v([0.0, 2.0, 0.0], [0.0, 1.0]),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[test]
    fn mesh_data_validity() {
        let data = MeshData::new(vec![MeshVertex::default()], vec![0]);
        assert!(data.is_valid());
        assert!(!MeshData::default().is_valid());
    }

    #[test]
    fn bounds_and_centroid_follow_positions() {
        let mesh = quad();
        let bbox = mesh.bounding_box();
        assert_eq!(bbox.min, Vec3::ZERO);
        assert_eq!(bbox.max, Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(mesh.centroid(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn tangents_align_with_uv_axes() {
        let mut mesh = quad();
        assert!(mesh.compute_tangents());
        for v in &mesh.vertices {
            assert!((Vec3::from(v.tangent) - Vec3::X).length() < 1e-5);
            assert!((Vec3::from(v.bitangent) - Vec3::Y).length() < 1e-5);
        }
    }

    #[test]
    fn streams_fill_missing_attributes_with_defaults() {
        let mesh = MeshData::from_streams(
            vec![0, 1, 2],
            &[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[],
            &[[10, 20, 30, 40]],
            &[vec![[0.5, 0.25, 0.0]]],
        );
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.vertices[0].color, [10, 20, 30, 40]);
        assert_eq!(mesh.vertices[1].color, [255; 4]);
        assert_eq!(mesh.vertices[0].uv, [0.5, 0.25]);
        assert_eq!(mesh.vertices[2].normal, [0.0, 0.0, 1.0]);
    }
}

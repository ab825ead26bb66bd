//! Triangle mesh buffers attached to scene nodes.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use snapfit_math::{Aabb3, Point3, Vec3};

/// Vertex and index buffers of a mesh node.
///
/// Layout follows the usual GPU buffer convention: flat `f32` arrays of
/// `[x0, y0, z0, x1, y1, z1, ...]`. Without an index buffer every three
/// consecutive vertices form a triangle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshGeometry {
    /// Flat array of vertex positions.
    pub positions: Vec<f32>,
    /// Flat array of vertex normals, same layout as positions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<f32>>,
    /// Flat array of triangle indices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<u32>>,
}

impl MeshGeometry {
    /// Create a mesh from positions and an optional index buffer.
    pub fn new(positions: Vec<f32>, indices: Option<Vec<u32>>) -> Self {
        Self {
            positions,
            normals: None,
            indices,
        }
    }

    /// Attach a normal buffer.
    pub fn with_normals(mut self, normals: Vec<f32>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Indexed quad from four corners in winding order.
    pub fn quad(corners: [Point3; 4]) -> Self {
        let positions = corners
            .iter()
            .flat_map(|c| [c.x as f32, c.y as f32, c.z as f32])
            .collect();
        Self::new(positions, Some(vec![0, 1, 2, 0, 2, 3]))
    }

    /// Indexed axis-aligned box with flat-shaded faces (24 vertices).
    pub fn cuboid(min: Point3, max: Point3) -> Self {
        let b = Aabb3::new(min, max);
        let c = b.corners();
        // Outward-facing winding for each face.
        let faces: [[usize; 4]; 6] = [
            [0, 2, 3, 1], // -Z
            [4, 5, 7, 6], // +Z
            [0, 1, 5, 4], // -Y
            [2, 6, 7, 3], // +Y
            [0, 4, 6, 2], // -X
            [1, 3, 7, 5], // +X
        ];
        let mut mesh = MeshGeometry::default();
        let mut indices = Vec::with_capacity(36);
        for (f, face) in faces.iter().enumerate() {
            for &ci in face {
                mesh.positions
                    .extend([c[ci].x as f32, c[ci].y as f32, c[ci].z as f32]);
            }
            let base = (f * 4) as u32;
            indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh.indices = Some(indices);
        let normals = mesh.compute_vertex_normals();
        mesh.with_normals(normals)
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.num_vertices() / 3,
        }
    }

    /// Position of vertex `i`.
    pub fn position(&self, i: u32) -> Option<Point3> {
        read_vec3(&self.positions, i).map(Point3::from)
    }

    /// Triangles as vertex index triples. Triangles referencing vertices
    /// outside the position buffer are skipped.
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        let n = self.num_vertices() as u32;
        let tris: Vec<[u32; 3]> = match &self.indices {
            Some(indices) => indices
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .collect(),
            None => (0..n / 3).map(|t| [t * 3, t * 3 + 1, t * 3 + 2]).collect(),
        };
        tris.into_iter()
            .filter(|t| t.iter().all(|&i| i < n))
            .collect()
    }

    /// Unnormalized face normal of a triangle (length is twice its area).
    pub fn face_normal(&self, tri: [u32; 3]) -> Option<Vec3> {
        let a = self.position(tri[0])?;
        let b = self.position(tri[1])?;
        let c = self.position(tri[2])?;
        Some((b - a).cross(&(c - a)))
    }

    /// Area-weighted smooth vertex normals.
    ///
    /// Vertices touched by no triangle (or only degenerate ones) get a zero
    /// normal.
    pub fn compute_vertex_normals(&self) -> Vec<f32> {
        let mut acc = vec![Vec3::zeros(); self.num_vertices()];
        for tri in self.triangles() {
            if let Some(n) = self.face_normal(tri) {
                for &i in &tri {
                    acc[i as usize] += n;
                }
            }
        }
        acc.iter()
            .flat_map(|n| {
                let n = n.try_normalize(1e-12).unwrap_or_else(Vec3::zeros);
                [n.x as f32, n.y as f32, n.z as f32]
            })
            .collect()
    }

    /// The stored normal buffer, or synthesized normals when it is absent
    /// or does not match the position buffer.
    pub fn normals_or_computed(&self) -> Cow<'_, [f32]> {
        match &self.normals {
            Some(n) if n.len() == self.positions.len() => Cow::Borrowed(n.as_slice()),
            _ => Cow::Owned(self.compute_vertex_normals()),
        }
    }

    /// Synthesize and store normals if missing.
    pub fn ensure_normals(&mut self) {
        if !matches!(&self.normals, Some(n) if n.len() == self.positions.len()) {
            self.normals = Some(self.compute_vertex_normals());
        }
    }

    /// Bounding box in the mesh's own frame.
    pub fn local_aabb(&self) -> Aabb3 {
        let mut aabb = Aabb3::empty();
        for i in 0..self.num_vertices() as u32 {
            if let Some(p) = self.position(i) {
                aabb.include_point(&p);
            }
        }
        aabb
    }
}

/// Read entry `i` of a flat `[x, y, z, ...]` buffer.
pub fn read_vec3(buf: &[f32], i: u32) -> Option<Vec3> {
    let base = i as usize * 3;
    let s = buf.get(base..base + 3)?;
    Some(Vec3::new(s[0] as f64, s[1] as f64, s[2] as f64))
}

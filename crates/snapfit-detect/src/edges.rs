//! Feature-edge extraction.
//!
//! Vertices are welded by position first, so meshes with split normals
//! (one vertex per face corner) still share edges between faces. An edge
//! is a feature edge when it borders a single face, more than two faces,
//! or two faces whose normals differ by at least the threshold angle.

use std::collections::HashMap;

use snapfit_math::Vec3;
use snapfit_scene::MeshGeometry;

const WELD_QUANTUM: f64 = 1e-5;

/// Maps every vertex to the first vertex sharing its position.
#[derive(Debug, Clone)]
pub struct Welding {
    canonical: Vec<u32>,
}

impl Welding {
    /// Weld the vertices of a mesh.
    pub fn new(geometry: &MeshGeometry) -> Self {
        let mut first: HashMap<[i64; 3], u32> = HashMap::new();
        let canonical = (0..geometry.num_vertices() as u32)
            .map(|i| match geometry.position(i) {
                Some(p) => {
                    let key = [p.x, p.y, p.z].map(|c| (c / WELD_QUANTUM).round() as i64);
                    *first.entry(key).or_insert(i)
                }
                None => i,
            })
            .collect();
        Self { canonical }
    }

    /// Canonical vertex for `i`.
    pub fn canonical(&self, i: u32) -> u32 {
        self.canonical.get(i as usize).copied().unwrap_or(i)
    }
}

/// An edge between two vertices of a mesh, as original buffer indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureEdge {
    /// First endpoint, in the winding order of the first face seen.
    pub a: u32,
    /// Second endpoint.
    pub b: u32,
}

struct EdgeRecord {
    edge: FeatureEdge,
    normals: Vec<Vec3>,
}

/// Feature edges of a mesh for a dihedral threshold in degrees, in order
/// of first appearance.
pub fn feature_edges(geometry: &MeshGeometry, threshold_degrees: f64) -> Vec<FeatureEdge> {
    let cos_threshold = threshold_degrees.to_radians().cos();
    let welding = Welding::new(geometry);

    let mut lookup: HashMap<(u32, u32), usize> = HashMap::new();
    let mut records: Vec<EdgeRecord> = Vec::new();
    for tri in geometry.triangles() {
        let Some(normal) = geometry
            .face_normal(tri)
            .and_then(|n| n.try_normalize(1e-12))
        else {
            continue;
        };
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let (wa, wb) = (welding.canonical(a), welding.canonical(b));
            if wa == wb {
                continue;
            }
            let key = (wa.min(wb), wa.max(wb));
            let slot = *lookup.entry(key).or_insert_with(|| {
                records.push(EdgeRecord {
                    edge: FeatureEdge { a, b },
                    normals: Vec::new(),
                });
                records.len() - 1
            });
            records[slot].normals.push(normal);
        }
    }

    records
        .into_iter()
        .filter(|r| match r.normals.as_slice() {
            [n1, n2] => n1.dot(n2) <= cos_threshold,
            _ => true,
        })
        .map(|r| r.edge)
        .collect()
}

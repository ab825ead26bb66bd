//! Greedy distance-based clustering of vertex samples.
//!
//! Each sample joins the first existing cluster whose running centroid lies
//! within `max_distance`, otherwise it starts a new cluster. This is an
//! approximation of connected components: membership near cluster
//! boundaries depends on the order of the input, and the same point set
//! presented in a different order can split differently. Assembly configs
//! tune their clustering distances against this behavior.

use snapfit_math::{Aabb3, Point3};

use crate::sample::VertexSample;

/// A spatially coherent group of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Running-mean centroid, in world space.
    pub centroid: Point3,
    /// Indices into the clustered input, in input order.
    pub members: Vec<usize>,
    /// Diagonal of the members' bounding box.
    pub diameter: f64,
}

impl Cluster {
    /// Number of member samples.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// Partition `points` into clusters.
///
/// Every input index ends up in exactly one cluster. A negative or NaN
/// `max_distance` behaves like zero, so only coincident points merge.
pub fn cluster(points: &[Point3], max_distance: f64) -> Vec<Cluster> {
    let max_distance = if max_distance.is_nan() { 0.0 } else { max_distance.max(0.0) };
    let mut clusters: Vec<Cluster> = Vec::new();

    for (i, p) in points.iter().enumerate() {
        match clusters
            .iter_mut()
            .find(|c| (c.centroid - p).norm() <= max_distance)
        {
            Some(c) => {
                c.members.push(i);
                let n = c.members.len() as f64;
                let delta = (p - c.centroid) / n;
                c.centroid += delta;
            }
            None => clusters.push(Cluster {
                centroid: *p,
                members: vec![i],
                diameter: 0.0,
            }),
        }
    }

    for c in &mut clusters {
        c.diameter = Aabb3::from_points(c.members.iter().map(|&i| &points[i])).diagonal();
    }
    clusters
}

/// Cluster the world positions of vertex samples.
pub fn cluster_samples(samples: &[VertexSample], max_distance: f64) -> Vec<Cluster> {
    let points: Vec<Point3> = samples.iter().map(|s| s.position).collect();
    cluster(&points, max_distance)
}

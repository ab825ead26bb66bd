//! Candidate selection rules.
//!
//! Existing manuals rely on these exact tie-breaks.

use snapfit_detect::Cluster;
use snapfit_math::{Aabb3, Axis, Point3};

/// True if a cluster is small enough to be a discrete feature rather than
/// a whole wall.
pub fn within_ceiling(cluster: &Cluster, max_vertices: usize) -> bool {
    cluster.member_count() <= max_vertices
}

/// The primary plug: most members under the ceiling, ties going to the
/// cluster highest along `up`, then to the earliest.
pub fn select_primary_plug(clusters: &[Cluster], max_vertices: usize, up: Axis) -> Option<&Cluster> {
    let i = up.index();
    clusters
        .iter()
        .filter(|c| within_ceiling(c, max_vertices))
        .fold(None::<&Cluster>, |best, c| match best {
            Some(b)
                if b.member_count() > c.member_count()
                    || (b.member_count() == c.member_count() && b.centroid[i] >= c.centroid[i]) =>
            {
                Some(b)
            }
            _ => Some(c),
        })
}

/// The hole under the ceiling nearest to `plug`, ties going to the
/// earliest.
pub fn select_nearest_hole<'a>(
    holes: &'a [Cluster],
    plug: &Point3,
    max_vertices: usize,
) -> Option<&'a Cluster> {
    holes
        .iter()
        .filter(|c| within_ceiling(c, max_vertices))
        .fold(None::<(&Cluster, f64)>, |best, c| {
            let d = (c.centroid - plug).norm_squared();
            match best {
                Some((b, bd)) if bd <= d => Some((b, bd)),
                _ => Some((c, d)),
            }
        })
        .map(|(c, _)| c)
}

/// Anchor point for the bounding-box fallback, in world space.
///
/// Picks the face of `hole` that looks toward `plug_center` (the dominant
/// axis of the offset, or the top face along `up` when the centers
/// coincide) and moves `inner_ratio` of the box extent inward from it.
/// The other two coordinates are the box center.
pub fn fallback_anchor(hole: &Aabb3, plug_center: &Point3, inner_ratio: f64, up: Axis) -> Point3 {
    let center = hole.center();
    let offset = plug_center - center;
    let (axis, sign) = if offset.norm() <= 1e-9 {
        (up, 1.0)
    } else {
        Axis::dominant(&offset)
    };
    let i = axis.index();
    let face = if sign > 0.0 { hole.max[i] } else { hole.min[i] };
    let mut anchor = center;
    anchor[i] = face - sign * inner_ratio * hole.extent(axis);
    anchor
}

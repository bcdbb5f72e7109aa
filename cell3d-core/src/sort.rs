/// Painter's algorithm ordering
///
/// There is no depth buffer: triangles are drawn far to near so closer ones
/// paint over farther ones. Interpenetrating triangles can still come out in
/// the wrong order.
use crate::geometry::Triangle;

/// Stable sort by descending mean vertex z
pub fn sort_back_to_front(triangles: &mut [Triangle]) {
    triangles.sort_by(|a, b| b.mean_depth().total_cmp(&a.mean_depth()));
}

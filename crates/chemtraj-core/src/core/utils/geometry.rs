use nalgebra::{Point3, Vector3};

/// Distance below which two positions, or a position and a line, are treated
/// as coincident.
pub const GEOMETRY_EPSILON: f64 = 1e-6;

/// Returns the distance from `point` to the line through `origin` along the
/// unit vector `axis`.
pub fn distance_to_line(point: &Point3<f64>, origin: &Point3<f64>, axis: &Vector3<f64>) -> f64 {
    let offset = point - origin;
    (offset - axis * offset.dot(axis)).norm()
}

/// Checks whether a set of positions carries no usable 3-D information.
///
/// Positions are degenerate when every one of them lies within `eps` of the
/// line through the first position and the first position farther than `eps`
/// from it. Empty and single-point sets are degenerate by definition, as are
/// sets where every point coincides with the first.
pub fn is_degenerate(positions: &[Point3<f64>], eps: f64) -> bool {
    let Some((origin, rest)) = positions.split_first() else {
        return true;
    };
    let Some(direction) = rest
        .iter()
        .map(|position| position - origin)
        .find(|offset| offset.norm() > eps)
    else {
        return true;
    };
    let axis = direction.normalize();
    rest.iter()
        .all(|position| distance_to_line(position, origin, &axis) <= eps)
}

/// Triangle clipping against a single plane
///
/// One triangle in, zero to two out. The same primitive clips against the
/// near plane in view space and against the four viewport edges in screen
/// space.
use std::collections::VecDeque;

use nalgebra::Vector4;

use crate::error::GeometryError;
use crate::geometry::{Plane, Triangle};
use crate::projection::Viewport;

/// Result of clipping one triangle against one plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clipped {
    /// All vertices were outside
    None,
    /// All vertices were inside; the input passes through untouched
    Unchanged(Triangle),
    /// One vertex was inside; the triangle shrank
    One(Triangle),
    /// Two vertices were inside; the remaining quad split in two
    Two(Triangle, Triangle),
}

impl Clipped {
    pub fn len(&self) -> usize {
        match self {
            Clipped::None => 0,
            Clipped::Unchanged(_) | Clipped::One(_) => 1,
            Clipped::Two(..) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Clipped::None)
    }
}

impl IntoIterator for Clipped {
    type Item = Triangle;
    type IntoIter = std::iter::Flatten<std::array::IntoIter<Option<Triangle>, 2>>;

    fn into_iter(self) -> Self::IntoIter {
        let pair = match self {
            Clipped::None => [None, None],
            Clipped::Unchanged(t) | Clipped::One(t) => [Some(t), None],
            Clipped::Two(a, b) => [Some(a), Some(b)],
        };
        pair.into_iter().flatten()
    }
}

/// Clip `triangle` to the inside half of `plane`
///
/// Vertices with a signed distance of zero count as inside. New vertices
/// interpolate all four components, so `w` survives clipping.
pub fn clip_against_plane(plane: &Plane, triangle: &Triangle) -> Result<Clipped, GeometryError> {
    let plane = plane.normalized()?;

    let mut inside = [Vector4::zeros(); 3];
    let mut outside = [Vector4::zeros(); 3];
    let (mut n_inside, mut n_outside) = (0, 0);

    for vertex in triangle.vertices {
        if plane.signed_distance(&vertex) >= 0.0 {
            inside[n_inside] = vertex;
            n_inside += 1;
        } else {
            outside[n_outside] = vertex;
            n_outside += 1;
        }
    }

    let appearance = triangle.appearance;
    let clipped = match n_inside {
        0 => Clipped::None,
        3 => Clipped::Unchanged(*triangle),
        1 => {
            let a = intersect_normalized(&plane, &inside[0], &outside[0])?;
            let b = intersect_normalized(&plane, &inside[0], &outside[1])?;
            Clipped::One(Triangle {
                vertices: [inside[0], a, b],
                appearance,
            })
        }
        2 => {
            let a = intersect_normalized(&plane, &inside[0], &outside[0])?;
            let b = intersect_normalized(&plane, &inside[1], &outside[0])?;
            Clipped::Two(
                Triangle {
                    vertices: [inside[0], inside[1], a],
                    appearance,
                },
                Triangle {
                    vertices: [inside[1], a, b],
                    appearance,
                },
            )
        }
        n => unreachable!("triangle classified with {n} inside vertices"),
    };
    Ok(clipped)
}

/// Point where the segment `start..end` crosses `plane`
pub fn intersect_plane(
    plane: &Plane,
    start: &Vector4<f32>,
    end: &Vector4<f32>,
) -> Result<Vector4<f32>, GeometryError> {
    intersect_normalized(&plane.normalized()?, start, end)
}

fn intersect_normalized(
    plane: &Plane,
    start: &Vector4<f32>,
    end: &Vector4<f32>,
) -> Result<Vector4<f32>, GeometryError> {
    let ad = plane.signed_distance(start);
    let bd = plane.signed_distance(end);
    let denominator = bd - ad;
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(GeometryError::ZeroLengthEdge);
    }

    let t = -ad / denominator;
    Ok(start + (end - start) * t)
}

/// Clip a screen-space triangle to the viewport edges
///
/// Runs one pass per edge over a worklist. Each pass consumes exactly the
/// triangles the previous pass produced, so a split in one pass is clipped
/// independently by the next. Triangles that hit a degenerate edge are dropped.
pub fn clip_to_viewport(triangle: &Triangle, viewport: &Viewport) -> Vec<Triangle> {
    let mut queue = VecDeque::from([*triangle]);

    for plane in viewport.edge_planes() {
        for _ in 0..queue.len() {
            let Some(current) = queue.pop_front() else {
                break;
            };
            match clip_against_plane(&plane, &current) {
                Ok(clipped) => queue.extend(clipped),
                Err(err) => log::trace!("dropping triangle at viewport edge: {err}"),
            }
        }
    }

    queue.into()
}

/// Geometry primitives for 3D rendering
use nalgebra::{Matrix4, Vector3, Vector4};

use crate::error::GeometryError;
use crate::shading::Appearance;
use crate::transform::{point, try_normalize_scaled, try_normalize_vec};

/// A triangle face: three homogeneous vertices and how to draw it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vector4<f32>; 3],
    pub appearance: Appearance,
}

impl Triangle {
    pub fn new(v0: Vector4<f32>, v1: Vector4<f32>, v2: Vector4<f32>) -> Self {
        Self {
            vertices: [v0, v1, v2],
            appearance: Appearance::default(),
        }
    }

    pub fn with_appearance(self, appearance: Appearance) -> Self {
        Self { appearance, ..self }
    }

    /// Apply `f` to each vertex, keeping the appearance
    pub fn map_vertices(&self, f: impl Fn(Vector4<f32>) -> Vector4<f32>) -> Self {
        Self {
            vertices: self.vertices.map(f),
            appearance: self.appearance,
        }
    }

    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        self.map_vertices(|v| matrix * v)
    }

    /// Calculate the face normal from the triangle's vertices
    ///
    /// Counter-clockwise winding (seen from the side the normal points to)
    /// under the right-handed cross product. Degeneracy is judged relative to
    /// the edge lengths, so small meshes keep their normals.
    pub fn face_normal(&self) -> Result<Vector3<f32>, GeometryError> {
        let [v0, v1, v2] = self.vertices.map(|v| v.xyz());
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        try_normalize_scaled(&edge1.cross(&edge2), edge1.norm() * edge2.norm())
    }

    /// Arithmetic mean of the vertices' z coordinates
    pub fn mean_depth(&self) -> f32 {
        self.vertices.iter().map(|v| v.z).sum::<f32>() / 3.0
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Triangle> {
        self.triangles.iter()
    }

    /// Unit cube spanning (0,0,0)..(1,1,1), two triangles per face, outward normals
    pub fn unit_cube() -> Self {
        const CORNERS: [[f32; 3]; 8] = [
            [0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
            [0.0, 0.0, 1.0],
        ];
        const FACES: [[usize; 3]; 12] = [
            // South
            [0, 1, 2],
            [0, 2, 3],
            // East
            [3, 2, 4],
            [3, 4, 5],
            // North
            [5, 4, 6],
            [5, 6, 7],
            // West
            [7, 6, 1],
            [7, 1, 0],
            // Top
            [1, 6, 4],
            [1, 4, 2],
            // Bottom
            [5, 7, 0],
            [5, 0, 3],
        ];

        let corner = |i: usize| {
            let [x, y, z] = CORNERS[i];
            point(x, y, z)
        };

        let mut mesh = Self::with_capacity(FACES.len());
        for [a, b, c] in FACES {
            mesh.add_triangle(Triangle::new(corner(a), corner(b), corner(c)));
        }
        mesh
    }
}

impl<'a> IntoIterator for &'a Mesh {
    type Item = &'a Triangle;
    type IntoIter = std::slice::Iter<'a, Triangle>;

    fn into_iter(self) -> Self::IntoIter {
        self.triangles.iter()
    }
}

/// A clipping plane: a point on the plane and the normal of its inside half
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Vector3<f32>,
    pub normal: Vector3<f32>,
}

impl Plane {
    pub fn new(point: Vector3<f32>, normal: Vector3<f32>) -> Self {
        Self { point, normal }
    }

    /// Copy of this plane with a unit-length normal
    pub fn normalized(&self) -> Result<Self, GeometryError> {
        Ok(Self {
            point: self.point,
            normal: try_normalize_vec(&self.normal)?,
        })
    }

    /// Signed distance from `p` (x, y, z only); positive on the inside
    ///
    /// Only a true distance when the normal is unit-length.
    pub fn signed_distance(&self, p: &Vector4<f32>) -> f32 {
        self.normal.dot(&p.xyz()) - self.normal.dot(&self.point)
    }
}

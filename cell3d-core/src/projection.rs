/// Camera, projection parameters and viewport mapping
use nalgebra::{Matrix4, Vector3, Vector4};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::geometry::Plane;
use crate::transform::{try_normalize_vec, Orientation, Transform};

/// Pitch is kept just short of straight up/down so the view basis stays valid
const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Perspective projection parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 90.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl ProjectionConfig {
    /// Projection matrix for `viewport`, rejecting degenerate parameters
    pub fn matrix(&self, viewport: &Viewport) -> Result<Matrix4<f32>, GeometryError> {
        Transform::projection(self.fov_degrees, viewport.aspect(), self.near, self.far)
    }

    /// View-space plane at the near distance, inside facing away from the eye
    pub fn near_plane(&self) -> Plane {
        Plane::new(Vector3::new(0.0, 0.0, self.near), Vector3::z())
    }
}

/// Output surface size in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::EmptyViewport);
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Height over width; scales projected x
    pub fn aspect(&self) -> f32 {
        self.height as f32 / self.width as f32
    }

    /// Map normalized device coordinates to cells, y growing downwards
    pub fn to_screen(&self, ndc: Vector4<f32>) -> Vector4<f32> {
        Vector4::new(
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc.y) * 0.5 * self.height as f32,
            ndc.z,
            ndc.w,
        )
    }

    /// Top, bottom, left and right edges with normals pointing inwards
    pub fn edge_planes(&self) -> [Plane; 4] {
        let right = (self.width - 1) as f32;
        let bottom = (self.height - 1) as f32;
        [
            Plane::new(Vector3::zeros(), Vector3::y()),
            Plane::new(Vector3::new(0.0, bottom, 0.0), -Vector3::y()),
            Plane::new(Vector3::zeros(), Vector3::x()),
            Plane::new(Vector3::new(right, 0.0, 0.0), -Vector3::x()),
        ]
    }
}

/// First-person camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vector3<f32>,
    pub orientation: Orientation,
    pub up: Vector3<f32>,
}

impl Camera {
    /// Camera at `position` looking down +z
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            position,
            orientation: Orientation::zero(),
            up: Vector3::y(),
        }
    }

    /// Unit look direction
    pub fn forward(&self) -> Vector3<f32> {
        (self.orientation.rotation_matrix() * Vector4::z()).xyz()
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Result<Matrix4<f32>, GeometryError> {
        let target = self.position + self.forward();
        Transform::look_at(&self.position, &target, &self.up)
    }

    pub fn translate(&mut self, delta: Vector3<f32>) {
        self.position += delta;
    }

    pub fn move_forward(&mut self, distance: f32) {
        self.position += self.forward() * distance;
    }

    /// Move sideways along `up × forward`; positive is to the right of the view
    pub fn strafe(&mut self, distance: f32) -> Result<(), GeometryError> {
        let right = try_normalize_vec(&self.up.cross(&self.forward()))?;
        self.position += right * distance;
        Ok(())
    }

    /// Turn by `dyaw` and `dpitch` radians; positive pitch looks down
    pub fn turn(&mut self, dyaw: f32, dpitch: f32) {
        self.orientation.rotate(0.0, dyaw, 0.0);
        self.orientation.pitch = (self.orientation.pitch + dpitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vector3::zeros())
    }
}

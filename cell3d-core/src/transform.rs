/// 3D transformation matrices and orientation state
///
/// Every matrix here follows the column-vector convention: a point `v`
/// transforms as `m * v`, so in `a * b` the matrix `b` is applied first.
use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

use crate::error::GeometryError;

/// Orientation as rotation angles about three axes (in radians)
///
/// Kept distinct from positional vectors; use [`Orientation::to_vector`] and
/// [`Orientation::from_vector`] to cross between the two.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Orientation {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dpitch: f32, dyaw: f32, droll: f32) {
        self.pitch += dpitch;
        self.yaw += dyaw;
        self.roll += droll;
    }

    /// Pack as `(pitch, yaw, roll)`
    pub fn to_vector(self) -> Vector3<f32> {
        Vector3::new(self.pitch, self.yaw, self.roll)
    }

    /// Unpack from `(pitch, yaw, roll)`
    pub fn from_vector(v: Vector3<f32>) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    /// Rotation applying roll, then pitch, then yaw
    pub fn rotation_matrix(&self) -> Matrix4<f32> {
        Transform::rotation_y(self.yaw)
            * Transform::rotation_x(self.pitch)
            * Transform::rotation_z(self.roll)
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Right-handed rotation about the x axis
    pub fn rotation_x(angle: f32) -> Matrix4<f32> {
        Matrix4::new_rotation(Vector3::new(angle, 0.0, 0.0))
    }

    /// Right-handed rotation about the y axis
    pub fn rotation_y(angle: f32) -> Matrix4<f32> {
        Matrix4::new_rotation(Vector3::new(0.0, angle, 0.0))
    }

    /// Right-handed rotation about the z axis
    pub fn rotation_z(angle: f32) -> Matrix4<f32> {
        Matrix4::new_rotation(Vector3::new(0.0, 0.0, angle))
    }

    /// Create a translation matrix
    pub fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    ///
    /// Not valid input for [`Transform::affine_inverse`].
    pub fn scale(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }

    /// Multiply matrices given in the order they should be applied
    ///
    /// `compose(&[a, b])` equals `b * a`.
    pub fn compose(matrices: &[Matrix4<f32>]) -> Matrix4<f32> {
        matrices
            .iter()
            .fold(Matrix4::identity(), |acc, m| m * acc)
    }

    /// Create a perspective projection matrix
    ///
    /// Projects onto a view looking down +z.
    /// The output `w` equals the input's view-space z, so dividing by `w`
    /// applies the perspective foreshortening. `aspect` scales x and is
    /// height / width of the viewport.
    pub fn projection(
        fov_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Result<Matrix4<f32>, GeometryError> {
        if !(fov_degrees.is_finite() && fov_degrees > 0.0 && fov_degrees < 180.0) {
            return Err(GeometryError::InvalidFieldOfView(fov_degrees));
        }
        if !(aspect.is_finite() && aspect > 0.0) {
            return Err(GeometryError::InvalidAspect(aspect));
        }
        if !(near.is_finite() && far.is_finite() && near > 0.0 && near < far) {
            return Err(GeometryError::InvalidDepthRange { near, far });
        }

        let f = 1.0 / (fov_degrees.to_radians() * 0.5).tan();
        let q = far / (far - near);

        #[rustfmt::skip]
        let m = Matrix4::new(
            aspect * f, 0.0, 0.0, 0.0,
            0.0,        f,   0.0, 0.0,
            0.0,        0.0, q,   -near * q,
            0.0,        0.0, 1.0, 0.0,
        );
        Ok(m)
    }

    /// Place an object at `position` facing `target`
    ///
    /// `up` is orthogonalized against the forward direction, so it only needs
    /// to be non-parallel to `target - position`.
    pub fn point_at(
        position: &Vector3<f32>,
        target: &Vector3<f32>,
        up: &Vector3<f32>,
    ) -> Result<Matrix4<f32>, GeometryError> {
        let forward = try_normalize_vec(&(target - position))?;
        let up = try_normalize_scaled(&(up - forward * up.dot(&forward)), up.norm())?;
        let right = up.cross(&forward);

        #[rustfmt::skip]
        let m = Matrix4::new(
            right.x, up.x, forward.x, position.x,
            right.y, up.y, forward.y, position.y,
            right.z, up.z, forward.z, position.z,
            0.0,     0.0,  0.0,       1.0,
        );
        Ok(m)
    }

    /// View matrix for a camera at `position` looking at `target`
    pub fn look_at(
        position: &Vector3<f32>,
        target: &Vector3<f32>,
        up: &Vector3<f32>,
    ) -> Result<Matrix4<f32>, GeometryError> {
        Self::point_at(position, target, up).map(|m| Self::affine_inverse(&m))
    }

    /// Inverse of a rotation + translation matrix
    ///
    /// Only correct when `m` carries no scale or shear; this is not checked.
    pub fn affine_inverse(m: &Matrix4<f32>) -> Matrix4<f32> {
        let rotation: Matrix3<f32> = m.fixed_view::<3, 3>(0, 0).transpose();
        let translation: Vector3<f32> = -(rotation * m.column(3).xyz());

        let mut inverse = Matrix4::identity();
        inverse.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
        inverse.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        inverse
    }
}

/// Normalize `v`, refusing zero-length and non-finite vectors
///
/// Any other length is accepted, however small.
pub fn try_normalize_vec(v: &Vector3<f32>) -> Result<Vector3<f32>, GeometryError> {
    let norm = v.norm();
    if norm == 0.0 || !norm.is_finite() {
        return Err(GeometryError::ZeroLengthVector);
    }
    Ok(v / norm)
}

/// Normalize `v`, treating it as zero when it is rounding noise next to `scale`
///
/// `scale` is the magnitude of the inputs `v` was computed from, e.g. the
/// product of two edge lengths for a cross product.
pub fn try_normalize_scaled(v: &Vector3<f32>, scale: f32) -> Result<Vector3<f32>, GeometryError> {
    if v.norm() <= f32::EPSILON * scale {
        return Err(GeometryError::ZeroLengthVector);
    }
    try_normalize_vec(v)
}

/// Divide x, y and z by w; vectors with `w == 0` come back unchanged
pub fn perspective_divide(v: Vector4<f32>) -> Vector4<f32> {
    if v.w == 0.0 {
        return v;
    }
    Vector4::new(v.x / v.w, v.y / v.w, v.z / v.w, v.w)
}

/// A point in homogeneous coordinates (`w = 1`)
pub fn point(x: f32, y: f32, z: f32) -> Vector4<f32> {
    Vector4::new(x, y, z, 1.0)
}

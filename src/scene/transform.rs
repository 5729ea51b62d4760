use glam::{EulerRot, Mat4, Quat, Vec3};

/// Local position/rotation/scale of a game object plus its cached matrices.
///
/// Setters mark the transform as modified; the scene recomputes the local and
/// global matrices during its next update.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    /// Euler XYZ angles in degrees, kept alongside the quaternion so the
    /// inspector does not jump between equivalent angle sets.
    rotation_degrees: Vec3,
    scale: Vec3,
    local: Mat4,
    global: Mat4,
    modified: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            rotation_degrees: Vec3::ZERO,
            scale: Vec3::ONE,
            local: Mat4::IDENTITY,
            global: Mat4::IDENTITY,
            modified: true,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let mut transform = Self::default();
        transform.position = position;
        transform.set_rotation(rotation);
        transform.scale = scale;
        transform
    }

    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self::new(position, rotation, scale)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn rotation_degrees(&self) -> Vec3 {
        self.rotation_degrees
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn local_matrix(&self) -> Mat4 {
        self.local
    }

    pub fn global_matrix(&self) -> Mat4 {
        self.global
    }

    pub fn world_position(&self) -> Vec3 {
        self.global.w_axis.truncate()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.modified = true;
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.set_position(self.position + offset);
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        self.rotation_degrees = Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees());
        self.modified = true;
    }

    pub fn set_rotation_degrees(&mut self, degrees: Vec3) {
        self.rotation_degrees = degrees;
        self.rotation = Quat::from_euler(
            EulerRot::XYZ,
            degrees.x.to_radians(),
            degrees.y.to_radians(),
            degrees.z.to_radians(),
        );
        self.modified = true;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.modified = true;
    }

    pub fn set_local_matrix(&mut self, matrix: Mat4) {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        self.position = position;
        self.set_rotation(rotation);
        self.scale = scale;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Forces a global recompute, e.g. after the object changed parent.
    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Rebuilds the local matrix when needed and derives the global one.
    pub(crate) fn refresh(&mut self, parent_global: Mat4) {
        if self.modified {
            self.local = Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position);
        }
        self.global = parent_global * self.local;
        self.modified = false;
    }
}

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a drawable in a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DrawableId(pub Uuid);

impl DrawableId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DrawableId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DrawableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form is enough to tell drawables apart in logs.
        let s = self.0.simple().to_string();
        f.write_str(&s[..8])
    }
}

/// Continuous rotation applied by the vertex stage: `angle = speed * elapsed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "SpinFields")]
pub struct Spin {
    /// Rotation axis, always unit length.
    axis: Vec3,
    /// Radians per second.
    pub speed: f32,
}

impl Spin {
    /// Build a spin around `axis`. A zero-length axis falls back to +Y.
    pub fn new(axis: Vec3, speed: f32) -> Self {
        Self {
            axis: axis.try_normalize().unwrap_or(Vec3::Y),
            speed,
        }
    }

    pub fn axis(&self) -> Vec3 {
        self.axis
    }
}

/// Deserialized form of [`Spin`]; the axis is normalized on conversion.
#[derive(Deserialize)]
struct SpinFields {
    axis: Vec3,
    speed: f32,
}

impl From<SpinFields> for Spin {
    fn from(fields: SpinFields) -> Self {
        Spin::new(fields.axis, fields.speed)
    }
}

impl Default for Spin {
    fn default() -> Self {
        Self {
            axis: Vec3::Y,
            speed: 0.0,
        }
    }
}

/// Spatial transform of a drawable: position, non-uniform scale and an
/// optional spin. Rotation never lives in the CPU-side model matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
    pub spin: Option<Spin>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            spin: None,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_spin(mut self, spin: Spin) -> Self {
        self.spin = Some(spin);
        self
    }

    /// Translation * scale. Spin is applied on the GPU.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_scale(self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawable_id_uniqueness() {
        let a = DrawableId::new();
        let b = DrawableId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn drawable_id_display_is_short() {
        let id = DrawableId::new();
        assert_eq!(id.to_string().len(), 8);
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert!(t.spin.is_none());
        assert_eq!(t.model_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn model_matrix_has_no_rotation() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0))
            .with_scale(Vec3::new(2.0, 3.0, 4.0))
            .with_spin(Spin::new(Vec3::X, 1.5));
        let m = t.model_matrix();
        assert_eq!(m.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m.x_axis.truncate(), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(m.y_axis.truncate(), Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(m.z_axis.truncate(), Vec3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn spin_axis_is_normalized() {
        let s = Spin::new(Vec3::new(0.0, 3.0, 4.0), 1.0);
        assert!((s.axis().length() - 1.0).abs() < 1e-6);
        let zero = Spin::new(Vec3::ZERO, 1.0);
        assert_eq!(zero.axis(), Vec3::Y);
    }

    #[test]
    fn deserialized_spin_axis_is_normalized() {
        let s: Spin = serde_yaml::from_str("axis: [0.0, 3.0, 4.0]\nspeed: 2.0").unwrap();
        assert!((s.axis() - Vec3::new(0.0, 0.6, 0.8)).length() < 1e-6);
        assert_eq!(s.speed, 2.0);

        let zero: Spin = serde_yaml::from_str("axis: [0.0, 0.0, 0.0]\nspeed: 1.0").unwrap();
        assert_eq!(zero.axis(), Vec3::Y);
    }

    #[test]
    fn spin_serializes_back_to_its_fields() {
        let s = Spin::new(Vec3::X, 0.5);
        let text = serde_yaml::to_string(&s).unwrap();
        let back: Spin = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, s);
    }
}

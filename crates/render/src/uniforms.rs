use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use scenery_common::Transform;

/// Frame tier (group 0): camera data, written once per frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub time: f32,
}

impl FrameUniforms {
    pub fn new(view_proj: Mat4, camera_position: Vec3, time: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_position: camera_position.to_array(),
            time,
        }
    }
}

/// Object tier (group 1): one block per drawable, rewritten every frame.
///
/// The model matrix holds translation and scale only. The vertex stage
/// rotates by `rotation_speed * time` around `rotation_axis`.
/// Layout matches the WGSL struct: `mat4x4`, `vec3 + f32`, `f32` padded to
/// 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct DrawableUniformBlock {
    pub model: [[f32; 4]; 4],
    pub rotation_axis: [f32; 3],
    pub rotation_speed: f32,
    pub time: f32,
    pub _pad: [f32; 3],
}

const _: () = assert!(std::mem::size_of::<DrawableUniformBlock>() % 16 == 0);
const _: () = assert!(std::mem::size_of::<FrameUniforms>() % 16 == 0);

impl DrawableUniformBlock {
    pub fn from_transform(transform: &Transform, time: f32) -> Self {
        let spin = transform.spin.unwrap_or_default();
        Self {
            model: transform.model_matrix().to_cols_array_2d(),
            rotation_axis: spin.axis().to_array(),
            rotation_speed: spin.speed,
            time,
            _pad: [0.0; 3],
        }
    }
}

/// Material tier (group 2) constants.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub color: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenery_common::Spin;

    #[test]
    fn block_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 80);
        assert_eq!(std::mem::size_of::<DrawableUniformBlock>(), 96);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 16);
    }

    #[test]
    fn block_carries_spin_separately_from_model() {
        let t = Transform::from_position(Vec3::new(1.0, 0.0, -2.0))
            .with_scale(Vec3::splat(2.0))
            .with_spin(Spin::new(Vec3::new(0.0, 0.0, 5.0), 0.75));
        let block = DrawableUniformBlock::from_transform(&t, 3.5);
        assert_eq!(block.model, t.model_matrix().to_cols_array_2d());
        assert_eq!(block.rotation_axis, [0.0, 0.0, 1.0]);
        assert_eq!(block.rotation_speed, 0.75);
        assert_eq!(block.time, 3.5);
    }

    #[test]
    fn model_columns_carry_per_axis_scale() {
        // The vertex stage rebuilds the inverse scale for normals from these.
        let t = Transform::from_position(Vec3::new(4.0, 0.0, 0.0))
            .with_scale(Vec3::new(2.0, 0.5, 3.0));
        let block = DrawableUniformBlock::from_transform(&t, 0.0);
        let lengths: Vec<f32> = block.model[..3]
            .iter()
            .map(|c| Vec3::new(c[0], c[1], c[2]).length())
            .collect();
        assert_eq!(lengths, vec![2.0, 0.5, 3.0]);
    }

    #[test]
    fn no_spin_means_zero_speed() {
        let block = DrawableUniformBlock::from_transform(&Transform::default(), 1.0);
        assert_eq!(block.rotation_speed, 0.0);
        assert_eq!(block.rotation_axis, [0.0, 1.0, 0.0]);
    }
}

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Squared length below which the look-at right vector is considered degenerate.
const DEGENERATE_RIGHT_SQ: f32 = 1e-12;

/// Projection mode and its mode-specific parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Projection {
    /// Symmetric frustum with vertical field of view in radians.
    Perspective { fov_y: f32 },
    /// Box projection; `extent` is the half-height of the view volume.
    Orthographic { extent: f32 },
}

/// Aspect ratio source for the projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    Fixed(f32),
    /// Width over height of the last reported output size.
    Auto,
}

/// View parameters plus lazily derived view and projection matrices.
///
/// Every mutator marks the matching cache dirty; readers rebuild on demand.
/// The rig is a pure numerical transform: NaN or zero clip planes are not
/// rejected and propagate into the matrices.
///
/// `position == target` has no defined view direction. The resulting view
/// matrix contains NaN; callers must keep the two apart.
#[derive(Debug, Clone)]
pub struct CameraRig {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    projection: Projection,
    aspect: Aspect,
    output_size: (u32, u32),
    near: f32,
    far: f32,
    view: Mat4,
    projection_matrix: Mat4,
    view_dirty: bool,
    projection_dirty: bool,
    view_rebuilds: u64,
    projection_rebuilds: u64,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::perspective(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            60.0_f32.to_radians(),
            0.1,
            1000.0,
        )
    }
}

impl CameraRig {
    /// A perspective rig with automatic aspect and +Y up.
    pub fn perspective(position: Vec3, target: Vec3, fov_y: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            projection: Projection::Perspective { fov_y },
            aspect: Aspect::Auto,
            output_size: (1, 1),
            near,
            far,
            view: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_dirty: true,
            projection_dirty: true,
            view_rebuilds: 0,
            projection_rebuilds: 0,
        }
    }

    /// An orthographic rig with automatic aspect and +Y up.
    pub fn orthographic(position: Vec3, target: Vec3, extent: f32, near: f32, far: f32) -> Self {
        let mut rig = Self::perspective(position, target, 0.0, near, far);
        rig.projection = Projection::Orthographic { extent };
        rig
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn output_size(&self) -> (u32, u32) {
        self.output_size
    }

    /// Effective aspect ratio used by the projection.
    pub fn aspect(&self) -> f32 {
        match self.aspect {
            Aspect::Fixed(a) => a,
            Aspect::Auto => self.output_size.0 as f32 / self.output_size.1.max(1) as f32,
        }
    }

    pub fn is_view_dirty(&self) -> bool {
        self.view_dirty
    }

    pub fn is_projection_dirty(&self) -> bool {
        self.projection_dirty
    }

    /// How many times the view matrix has been rebuilt.
    pub fn view_rebuilds(&self) -> u64 {
        self.view_rebuilds
    }

    /// How many times the projection matrix has been rebuilt.
    pub fn projection_rebuilds(&self) -> u64 {
        self.projection_rebuilds
    }

    // --- View parameters ---

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.view_dirty = true;
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        self.view_dirty = true;
    }

    /// Aim the camera at `target`. Same as [`CameraRig::set_target`].
    pub fn look_at(&mut self, target: Vec3) {
        self.set_target(target);
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
        self.view_dirty = true;
    }

    // --- Projection parameters ---

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
        self.projection_dirty = true;
    }

    /// Switch to (or stay in) perspective mode with a new vertical FOV.
    pub fn set_fov(&mut self, fov_y: f32) {
        self.set_projection(Projection::Perspective { fov_y });
    }

    /// Switch to (or stay in) orthographic mode with a new half-height.
    pub fn set_extent(&mut self, extent: f32) {
        self.set_projection(Projection::Orthographic { extent });
    }

    pub fn set_aspect(&mut self, aspect: Aspect) {
        self.aspect = aspect;
        self.projection_dirty = true;
    }

    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
        self.projection_dirty = true;
    }

    /// Record a new output size. Only an automatic aspect invalidates the
    /// projection.
    pub fn on_output_resized(&mut self, width: u32, height: u32) {
        self.output_size = (width, height);
        if self.aspect == Aspect::Auto {
            self.projection_dirty = true;
        }
    }

    // --- Derived data ---

    /// Unit vector from position towards target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Camera right vector, with the +X fallback when looking along `up`.
    pub fn right(&self) -> Vec3 {
        right_vector(self.forward(), self.up)
    }

    pub fn view_matrix(&mut self) -> Mat4 {
        if self.view_dirty {
            self.view = look_at_rh(self.position, self.target, self.up);
            self.view_dirty = false;
            self.view_rebuilds += 1;
        }
        self.view
    }

    /// Projection with wgpu's `[0, 1]` depth range.
    pub fn projection_matrix(&mut self) -> Mat4 {
        if self.projection_dirty {
            let aspect = self.aspect();
            self.projection_matrix = match self.projection {
                Projection::Perspective { fov_y } => {
                    Mat4::perspective_rh(fov_y, aspect, self.near, self.far)
                }
                Projection::Orthographic { extent } => Mat4::orthographic_rh(
                    -extent * aspect,
                    extent * aspect,
                    -extent,
                    extent,
                    self.near,
                    self.far,
                ),
            };
            self.projection_dirty = false;
            self.projection_rebuilds += 1;
        }
        self.projection_matrix
    }

    /// Always the product of the two cached matrices; never cached itself.
    pub fn view_projection_matrix(&mut self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Normalized `forward x up`, or world +X (made orthogonal to `forward`)
/// when `forward` is parallel to `up`.
pub(crate) fn right_vector(forward: Vec3, up: Vec3) -> Vec3 {
    let right = forward.cross(up);
    if right.length_squared() < DEGENERATE_RIGHT_SQ {
        (Vec3::X - forward * forward.dot(Vec3::X))
            .try_normalize()
            .unwrap_or(Vec3::X)
    } else {
        right.normalize()
    }
}

/// Right-handed look-at matrix.
fn look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let f = (target - eye).normalize();
    let s = right_vector(f, up);
    let u = s.cross(f);
    Mat4::from_cols(
        Vec4::new(s.x, u.x, -f.x, 0.0),
        Vec4::new(s.y, u.y, -f.y, 0.0),
        Vec4::new(s.z, u.z, -f.z, 0.0),
        Vec4::new(-s.dot(eye), -u.dot(eye), f.dot(eye), 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn assert_mat_eq(a: Mat4, b: Mat4) {
        for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array().iter()) {
            assert!((x - y).abs() < EPS, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn view_matrix_is_cached_until_mutation() {
        let mut rig = CameraRig::default();
        let a = rig.view_matrix();
        let b = rig.view_matrix();
        assert_eq!(a, b);
        assert_eq!(rig.view_rebuilds(), 1);

        rig.set_position(Vec3::new(1.0, 2.0, 5.0));
        assert!(rig.is_view_dirty());
        rig.view_matrix();
        assert_eq!(rig.view_rebuilds(), 2);
    }

    #[test]
    fn every_view_mutator_sets_dirty() {
        let mut rig = CameraRig::default();
        let mutators: [fn(&mut CameraRig); 4] = [
            |r| r.set_position(Vec3::new(0.0, 1.0, 5.0)),
            |r| r.set_target(Vec3::new(0.0, 1.0, 0.0)),
            |r| r.look_at(Vec3::new(1.0, 0.0, 0.0)),
            |r| r.set_up(Vec3::Z),
        ];
        for (i, mutate) in mutators.iter().enumerate() {
            rig.view_matrix();
            assert!(!rig.is_view_dirty());
            mutate(&mut rig);
            assert!(rig.is_view_dirty(), "mutator {i} did not dirty the view");
        }
        rig.view_matrix();
        assert_eq!(rig.view_rebuilds(), 5);
    }

    #[test]
    fn every_projection_mutator_sets_dirty() {
        let mut rig = CameraRig::default();
        let mutators: [fn(&mut CameraRig); 5] = [
            |r| r.set_fov(1.0),
            |r| r.set_extent(4.0),
            |r| r.set_aspect(Aspect::Fixed(2.0)),
            |r| r.set_clip_planes(0.5, 50.0),
            |r| r.set_projection(Projection::Perspective { fov_y: 0.5 }),
        ];
        for (i, mutate) in mutators.iter().enumerate() {
            rig.projection_matrix();
            assert!(!rig.is_projection_dirty());
            mutate(&mut rig);
            assert!(rig.is_projection_dirty(), "mutator {i} did not dirty the projection");
        }
        rig.projection_matrix();
        assert_eq!(rig.projection_rebuilds(), 6);
    }

    #[test]
    fn resize_only_dirties_auto_aspect() {
        let mut rig = CameraRig::default();
        rig.projection_matrix();
        rig.on_output_resized(1600, 900);
        assert!(rig.is_projection_dirty());
        assert!((rig.aspect() - 16.0 / 9.0).abs() < EPS);

        rig.set_aspect(Aspect::Fixed(1.0));
        rig.projection_matrix();
        rig.on_output_resized(800, 200);
        assert!(!rig.is_projection_dirty());
        assert_eq!(rig.aspect(), 1.0);
    }

    #[test]
    fn zero_height_output_does_not_divide_by_zero() {
        let mut rig = CameraRig::default();
        rig.on_output_resized(640, 0);
        assert_eq!(rig.aspect(), 640.0);
    }

    #[test]
    fn view_matrix_matches_glam_look_at() {
        let mut rig = CameraRig::default();
        rig.set_position(Vec3::new(3.0, 4.0, 5.0));
        rig.set_target(Vec3::new(-1.0, 0.5, 2.0));
        let expected = Mat4::look_at_rh(
            Vec3::new(3.0, 4.0, 5.0),
            Vec3::new(-1.0, 0.5, 2.0),
            Vec3::Y,
        );
        assert_mat_eq(rig.view_matrix(), expected);
    }

    #[test]
    fn target_lies_on_forward_axis() {
        let cases = [
            (Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO),
            (Vec3::new(3.0, -2.0, 7.0), Vec3::new(1.0, 1.0, 1.0)),
            (Vec3::new(-10.0, 4.0, 0.5), Vec3::new(2.0, 0.0, -3.0)),
            (Vec3::new(0.0, 8.0, 0.0), Vec3::ZERO),
        ];
        for (position, target) in cases {
            let mut rig = CameraRig::default();
            rig.set_position(position);
            rig.set_target(target);
            let v = rig.view_matrix().transform_point3(target);
            assert!(v.x.abs() < EPS && v.y.abs() < EPS, "{position:?} -> {v:?}");
            assert!(v.z < 0.0);
            assert!((v.z + position.distance(target)).abs() < EPS);
        }
    }

    #[test]
    fn looking_along_up_does_not_produce_nan() {
        let mut rig = CameraRig::default();
        rig.set_position(Vec3::new(0.0, 10.0, 0.0));
        rig.set_target(Vec3::ZERO);
        let view = rig.view_matrix();
        assert!(!view.is_nan());
        assert!((rig.right() - Vec3::X).length() < EPS);

        rig.set_position(Vec3::new(0.0, -10.0, 0.0));
        assert!(!rig.view_matrix().is_nan());
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let mut rig = CameraRig::perspective(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            60.0_f32.to_radians(),
            0.1,
            1000.0,
        );
        rig.set_aspect(Aspect::Fixed(1.0));
        let clip = rig.view_projection_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(clip.x.abs() < EPS);
        assert!(clip.y.abs() < EPS);
        assert!(clip.w > 0.0);
        let depth = clip.z / clip.w;
        assert!((0.0..=1.0).contains(&depth), "depth {depth}");
    }

    #[test]
    fn orthographic_extent_maps_to_ndc_edge() {
        let mut rig = CameraRig::orthographic(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 2.0, 0.1, 100.0);
        rig.set_aspect(Aspect::Fixed(2.0));
        let vp = rig.view_projection_matrix();
        let top = vp.project_point3(Vec3::new(0.0, 2.0, 0.0));
        let right = vp.project_point3(Vec3::new(4.0, 0.0, 0.0));
        assert!((top.y - 1.0).abs() < EPS);
        assert!((right.x - 1.0).abs() < EPS);
    }

    #[test]
    fn view_projection_is_product_of_cached_parts() {
        let mut rig = CameraRig::default();
        rig.on_output_resized(1280, 720);
        let vp = rig.view_projection_matrix();
        let expected = rig.projection_matrix() * rig.view_matrix();
        assert_mat_eq(vp, expected);
        assert_eq!(rig.view_rebuilds(), 1);
        assert_eq!(rig.projection_rebuilds(), 1);
    }
}

use crate::backend::{GpuBackend, TextureData};
use crate::error::RenderError;
use crate::frame::FrameRenderer;
use crate::material::{MaterialId, MaterialKind};
use crate::mesh::{GpuMesh, MeshData};
use crate::scene::{Drawable, SceneGraph};
use glam::Vec3;
use scenery_common::{Spin, Transform};

/// Showcase scene: a checkered ground plane, one spinning cube per material
/// kind and one cube with no material, which is never drawn.
#[derive(Debug)]
pub struct DemoScene {
    pub scene: SceneGraph,
    meshes: Vec<GpuMesh>,
    materials: Vec<MaterialId>,
}

impl DemoScene {
    pub fn build<B: GpuBackend>(renderer: &mut FrameRenderer<B>) -> Result<Self, RenderError> {
        let cube = renderer.upload_mesh(&MeshData::cube(1.0))?;
        let ground = renderer.upload_mesh(&MeshData::plane(20.0, 10.0))?;

        let checker = renderer.create_material(&MaterialKind::Textured {
            tint: [1.0, 1.0, 1.0, 1.0],
            texture: TextureData::checkerboard(64, 8, [90, 90, 100, 255], [160, 160, 170, 255]),
        })?;
        let flat = renderer.create_material(&MaterialKind::Flat {
            color: [0.9, 0.3, 0.2, 1.0],
        })?;
        let lambert = renderer.create_material(&MaterialKind::Lambert {
            color: [0.2, 0.6, 1.0, 1.0],
        })?;
        let crate_tex = renderer.create_material(&MaterialKind::Textured {
            tint: [1.0, 0.9, 0.6, 1.0],
            texture: TextureData::checkerboard(32, 4, [255, 255, 255, 255], [40, 40, 40, 255]),
        })?;

        let mut scene = SceneGraph::new();
        scene.add(Drawable::new(ground, checker, Transform::default()));
        scene.add(Drawable::new(
            cube,
            flat,
            Transform::from_position(Vec3::new(-2.5, 0.5, 0.0))
                .with_spin(Spin::new(Vec3::Y, 0.8)),
        ));
        scene.add(Drawable::new(
            cube,
            lambert,
            Transform::from_position(Vec3::new(0.0, 0.75, 0.0))
                .with_scale(Vec3::splat(1.5))
                .with_spin(Spin::new(Vec3::new(1.0, 1.0, 0.0), 0.5)),
        ));
        scene.add(Drawable::new(
            cube,
            crate_tex,
            Transform::from_position(Vec3::new(2.5, 0.5, 0.0))
                .with_spin(Spin::new(Vec3::new(0.0, 1.0, 1.0), 1.2)),
        ));
        let mut orphan = Drawable::new(
            cube,
            lambert,
            Transform::from_position(Vec3::new(0.0, 0.5, -3.0)),
        );
        orphan.material = None;
        scene.add(orphan);

        tracing::info!(drawables = scene.len(), "demo scene built");
        Ok(Self {
            scene,
            meshes: vec![cube, ground],
            materials: vec![checker, flat, lambert, crate_tex],
        })
    }

    /// Release the meshes and materials created by [`DemoScene::build`].
    pub fn release<B: GpuBackend>(self, renderer: &mut FrameRenderer<B>) {
        for mesh in self.meshes {
            renderer.release_mesh(mesh);
        }
        for material in self.materials {
            renderer.dispose_material(material);
        }
    }
}

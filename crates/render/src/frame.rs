use crate::backend::{
    BindGroupId, BindGroupSource, BufferId, BufferUsage, GpuBackend, PassDesc,
};
use crate::commands::{CommandList, PassRecorder};
use crate::error::{FrameAcquisitionError, InitializationError, RenderError};
use crate::material::{BindTier, MaterialBinding, MaterialId, MaterialKind, MaterialState};
use crate::mesh::{GpuMesh, MeshData};
use crate::scene::Scene;
use crate::uniforms::{DrawableUniformBlock, FrameUniforms};
use bytemuck::Zeroable;
use scenery_camera::CameraRig;
use scenery_common::DrawableId;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Instant;

/// Depth the attachment is cleared to. Depth test is "less", so this is far.
const CLEAR_DEPTH: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Background color the pass clears to.
    pub clear_color: [f64; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.1, 0.1, 0.15, 1.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    /// Resources exist; no frame submitted yet.
    Initialized,
    Running,
    /// Terminal.
    Disposed,
}

/// Per-frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draws: u32,
    /// Drawables without a mesh, a material, with an unknown material, or
    /// repeating an id already drawn this frame.
    pub skipped_missing: u32,
    /// Drawables whose material is still compiling or failed.
    pub skipped_not_ready: u32,
}

/// Result of one `render_frame` call. Only `Submitted` reached the GPU.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Submitted(FrameStats),
    /// No output image was available; nothing was submitted.
    NoImage(FrameAcquisitionError),
    /// The renderer is not initialized or already disposed.
    NotRunning,
}

impl FrameOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

/// Object-tier uniform buffer and bind group of one drawable.
#[derive(Debug)]
struct ObjectBinding {
    buffer: BufferId,
    group: BindGroupId,
    last_frame: u64,
}

/// Drives one forward pass per frame over a [`Scene`].
///
/// Owns the depth attachment, the frame-tier uniforms, the material registry
/// (including the default material) and per-drawable object bindings.
///
/// Single writer: the camera and the scene's transforms must not be mutated
/// elsewhere while `render_frame` runs.
pub struct FrameRenderer<B: GpuBackend> {
    backend: B,
    config: RendererConfig,
    state: RendererState,
    depth_size: (u32, u32),
    frame_buffer: Option<BufferId>,
    frame_group: Option<BindGroupId>,
    default_material: Option<MaterialId>,
    materials: BTreeMap<MaterialId, MaterialBinding>,
    next_material: u64,
    objects: HashMap<DrawableId, ObjectBinding>,
    not_ready_reported: BTreeSet<MaterialId>,
    duplicates_reported: HashSet<DrawableId>,
    frame_index: u64,
    started: Instant,
}

impl<B: GpuBackend> FrameRenderer<B> {
    pub fn new(backend: B, config: RendererConfig) -> Self {
        Self {
            backend,
            config,
            state: RendererState::Uninitialized,
            depth_size: (0, 0),
            frame_buffer: None,
            frame_group: None,
            default_material: None,
            materials: BTreeMap::new(),
            next_material: 0,
            objects: HashMap::new(),
            not_ready_reported: BTreeSet::new(),
            duplicates_reported: HashSet::new(),
            frame_index: 0,
            started: Instant::now(),
        }
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Number of frames submitted so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn default_material(&self) -> Option<MaterialId> {
        self.default_material
    }

    pub fn material(&self, id: MaterialId) -> Option<&MaterialBinding> {
        self.materials.get(&id)
    }

    pub fn object_binding_count(&self) -> usize {
        self.objects.len()
    }

    fn ensure_usable(&self) -> Result<(), RenderError> {
        match self.state {
            RendererState::Initialized | RendererState::Running => Ok(()),
            RendererState::Uninitialized => Err(RenderError::NotInitialized),
            RendererState::Disposed => Err(RenderError::ResourceDisposed {
                resource: "renderer",
            }),
        }
    }

    /// Create the depth attachment, frame-tier uniforms and the default
    /// material. On failure everything created so far is released and the
    /// renderer stays `Uninitialized`.
    ///
    /// The default pipeline is polled once; a compile failure reported by then
    /// is fatal. A pipeline still compiling is picked up by later frames.
    pub fn initialize(&mut self) -> Result<(), RenderError> {
        match self.state {
            RendererState::Uninitialized => {}
            RendererState::Disposed => {
                return Err(RenderError::ResourceDisposed {
                    resource: "renderer",
                });
            }
            _ => return Err(InitializationError::AlreadyInitialized.into()),
        }

        let (width, height) = self.backend.output_size();
        self.backend.resize_depth_target(width, height);
        self.depth_size = (width, height);

        let frame_buffer = self.backend.create_buffer(
            "frame_uniforms",
            BufferUsage::Uniform,
            bytemuck::bytes_of(&FrameUniforms::zeroed()),
        );
        self.frame_buffer = Some(frame_buffer);
        self.frame_group = Some(self.backend.create_bind_group(
            "frame_bind_group",
            &BindGroupSource::Frame {
                uniforms: frame_buffer,
            },
        ));

        let default = match self.create_material_unchecked(&MaterialKind::default()) {
            Ok(id) => id,
            Err(e) => return Err(self.abort_initialize(e)),
        };
        self.default_material = Some(default);

        let status = match self.materials.get_mut(&default) {
            Some(binding) => binding.poll(&mut self.backend).clone(),
            None => MaterialState::Compiling,
        };
        if let MaterialState::Failed(msg) = status {
            return Err(self.abort_initialize(InitializationError::Pipeline(msg).into()));
        }

        self.state = RendererState::Initialized;
        self.started = Instant::now();
        tracing::info!(width, height, "renderer initialized");
        Ok(())
    }

    fn abort_initialize(&mut self, error: RenderError) -> RenderError {
        tracing::error!(error = %error, "renderer initialization failed");
        self.release_all();
        self.state = RendererState::Uninitialized;
        error
    }

    /// Register a material and start compiling its pipeline. The material is
    /// drawn once a later frame polls it `Ready`.
    pub fn create_material(&mut self, kind: &MaterialKind) -> Result<MaterialId, RenderError> {
        self.ensure_usable()?;
        self.create_material_unchecked(kind)
    }

    fn create_material_unchecked(&mut self, kind: &MaterialKind) -> Result<MaterialId, RenderError> {
        let id = MaterialId(self.next_material);
        self.next_material += 1;
        let binding = MaterialBinding::create(&mut self.backend, id, kind, self.frame_group)?;
        self.materials.insert(id, binding);
        Ok(id)
    }

    /// Release a material. Unknown or already disposed ids are ignored.
    pub fn dispose_material(&mut self, id: MaterialId) {
        if let Some(mut binding) = self.materials.remove(&id) {
            binding.dispose(&mut self.backend);
        }
        self.not_ready_reported.remove(&id);
        if self.default_material == Some(id) {
            self.default_material = None;
        }
    }

    /// Advance every compiling material without blocking.
    pub fn poll_materials(&mut self) {
        for binding in self.materials.values_mut() {
            binding.poll(&mut self.backend);
        }
    }

    pub fn upload_mesh(&mut self, mesh: &MeshData) -> Result<GpuMesh, RenderError> {
        self.ensure_usable()?;
        let vertex_buffer = self.backend.create_buffer(
            "mesh_vertices",
            BufferUsage::Vertex,
            bytemuck::cast_slice(&mesh.vertices),
        );
        let index_buffer = self.backend.create_buffer(
            "mesh_indices",
            BufferUsage::Index,
            bytemuck::cast_slice(&mesh.indices),
        );
        tracing::debug!(
            vertices = mesh.vertices.len(),
            indices = mesh.indices.len(),
            "mesh uploaded"
        );
        Ok(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        })
    }

    pub fn release_mesh(&mut self, mesh: GpuMesh) {
        self.backend.release_buffer(mesh.vertex_buffer);
        self.backend.release_buffer(mesh.index_buffer);
    }

    /// Render `scene` as seen from `camera`, using wall-clock time since
    /// initialization for spinning drawables.
    pub fn render_frame<S: Scene + ?Sized>(
        &mut self,
        scene: &S,
        camera: &mut CameraRig,
    ) -> FrameOutcome {
        let time = self.started.elapsed().as_secs_f32();
        self.render_frame_at(scene, camera, time)
    }

    /// Render one frame at an explicit scene time in seconds.
    ///
    /// Recoverable problems never escape: a missing output image aborts the
    /// frame before anything is recorded, a drawable that cannot be drawn is
    /// skipped.
    pub fn render_frame_at<S: Scene + ?Sized>(
        &mut self,
        scene: &S,
        camera: &mut CameraRig,
        time: f32,
    ) -> FrameOutcome {
        let _span = tracing::trace_span!("render_frame", frame = self.frame_index + 1).entered();
        if self.ensure_usable().is_err() {
            return FrameOutcome::NotRunning;
        }

        let size = self.backend.output_size();
        if size != self.depth_size {
            tracing::debug!(width = size.0, height = size.1, "output resized");
            self.backend.resize_depth_target(size.0, size.1);
            self.depth_size = size;
        }
        if camera.output_size() != size {
            camera.on_output_resized(size.0, size.1);
        }

        if let Some(frame_buffer) = self.frame_buffer {
            let uniforms =
                FrameUniforms::new(camera.view_projection_matrix(), camera.position(), time);
            self.backend
                .write_buffer(frame_buffer, bytemuck::bytes_of(&uniforms));
        }

        let frame = match self.backend.acquire_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "no output image, skipping frame");
                return FrameOutcome::NoImage(e);
            }
        };

        self.poll_materials();
        let frame_index = self.frame_index + 1;

        let Self {
            backend,
            config,
            frame_group,
            materials,
            objects,
            not_ready_reported,
            duplicates_reported,
            ..
        } = &mut *self;

        let mut pass = CommandList::new();
        if let Some(group) = *frame_group {
            pass.set_bind_group(BindTier::Frame.slot(), group);
        }

        let mut stats = FrameStats::default();
        for drawable in scene.drawables() {
            let (Some(mesh), Some(material_id)) = (drawable.mesh, drawable.material) else {
                tracing::trace!(drawable = %drawable.id, "missing mesh or material, skipped");
                stats.skipped_missing += 1;
                continue;
            };
            let Some(material) = materials.get(&material_id) else {
                tracing::debug!(
                    drawable = %drawable.id,
                    error = %RenderError::UnknownMaterial { material: material_id },
                    "draw skipped"
                );
                stats.skipped_missing += 1;
                continue;
            };
            if objects
                .get(&drawable.id)
                .is_some_and(|binding| binding.last_frame == frame_index)
            {
                if duplicates_reported.insert(drawable.id) {
                    tracing::warn!(drawable = %drawable.id, "drawable id appears twice in scene, later copies skipped");
                }
                stats.skipped_missing += 1;
                continue;
            }

            let block = DrawableUniformBlock::from_transform(&drawable.transform, time);
            let object_group = match objects.entry(drawable.id) {
                Entry::Occupied(mut entry) => {
                    let binding = entry.get_mut();
                    binding.last_frame = frame_index;
                    backend.write_buffer(binding.buffer, bytemuck::bytes_of(&block));
                    binding.group
                }
                Entry::Vacant(entry) => {
                    let buffer = backend.create_buffer(
                        &format!("drawable_{}_uniforms", drawable.id),
                        BufferUsage::Uniform,
                        bytemuck::bytes_of(&block),
                    );
                    let group = backend.create_bind_group(
                        &format!("drawable_{}_bind_group", drawable.id),
                        &BindGroupSource::Object { uniforms: buffer },
                    );
                    entry.insert(ObjectBinding {
                        buffer,
                        group,
                        last_frame: frame_index,
                    });
                    group
                }
            };

            match record_draw(&mut pass, material, object_group, mesh) {
                Ok(()) => stats.draws += 1,
                Err(RenderError::MaterialNotReady { material }) => {
                    if not_ready_reported.insert(material) {
                        tracing::warn!(drawable = %drawable.id, material = %material, "material not ready, skipping draws");
                    }
                    stats.skipped_not_ready += 1;
                }
                Err(e) => {
                    tracing::warn!(drawable = %drawable.id, error = %e, "draw skipped");
                    stats.skipped_missing += 1;
                }
            }
        }

        backend.submit(
            frame,
            &PassDesc {
                clear_color: config.clear_color,
                clear_depth: CLEAR_DEPTH,
            },
            &pass,
        );

        objects.retain(|id, binding| {
            if binding.last_frame == frame_index {
                return true;
            }
            tracing::trace!(drawable = %id, "releasing object binding");
            backend.release_bind_group(binding.group);
            backend.release_buffer(binding.buffer);
            false
        });

        self.frame_index = frame_index;
        if self.state == RendererState::Initialized {
            tracing::debug!("first frame submitted");
            self.state = RendererState::Running;
        }
        tracing::trace!(
            draws = stats.draws,
            skipped_missing = stats.skipped_missing,
            skipped_not_ready = stats.skipped_not_ready,
            "frame submitted"
        );
        FrameOutcome::Submitted(stats)
    }

    fn release_all(&mut self) {
        for (_, mut binding) in std::mem::take(&mut self.materials) {
            binding.dispose(&mut self.backend);
        }
        for (_, binding) in self.objects.drain() {
            self.backend.release_bind_group(binding.group);
            self.backend.release_buffer(binding.buffer);
        }
        if let Some(group) = self.frame_group.take() {
            self.backend.release_bind_group(group);
        }
        if let Some(buffer) = self.frame_buffer.take() {
            self.backend.release_buffer(buffer);
        }
        self.backend.release_depth_target();
        self.default_material = None;
        self.not_ready_reported.clear();
        self.duplicates_reported.clear();
    }

    /// Release the depth attachment, materials and per-drawable bindings.
    /// Safe to call repeatedly and after a failed `initialize`. Meshes
    /// uploaded by the caller are released with [`Self::release_mesh`].
    pub fn dispose(&mut self) {
        if self.state == RendererState::Disposed {
            return;
        }
        self.release_all();
        self.state = RendererState::Disposed;
        tracing::info!(frames = self.frame_index, "renderer disposed");
    }
}

/// Pipeline, object and material tiers, buffers, then one indexed draw.
/// Nothing is recorded when the material is not ready.
fn record_draw(
    pass: &mut dyn PassRecorder,
    material: &MaterialBinding,
    object_group: BindGroupId,
    mesh: GpuMesh,
) -> Result<(), RenderError> {
    material.bind_pipeline(pass)?;
    pass.set_bind_group(BindTier::Object.slot(), object_group);
    material.bind(pass, BindTier::Material)?;
    pass.set_vertex_buffer(0, mesh.vertex_buffer);
    pass.set_index_buffer(mesh.index_buffer);
    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PipelineStatus;
    use crate::commands::PassCommand;
    use crate::recording::RecordingBackend;
    use crate::scene::{Drawable, SceneGraph};
    use glam::{Mat4, Vec3};
    use scenery_common::{Spin, Transform};

    fn ready_renderer() -> FrameRenderer<RecordingBackend> {
        let mut renderer = FrameRenderer::new(RecordingBackend::new(800, 600), RendererConfig::default());
        renderer.initialize().unwrap();
        renderer
    }

    fn cube(renderer: &mut FrameRenderer<RecordingBackend>) -> GpuMesh {
        renderer.upload_mesh(&MeshData::cube(1.0)).unwrap()
    }

    fn draws(commands: &[PassCommand]) -> usize {
        commands
            .iter()
            .filter(|c| matches!(c, PassCommand::DrawIndexed { .. }))
            .count()
    }

    #[test]
    fn initialize_creates_shared_resources() {
        let renderer = ready_renderer();
        assert_eq!(renderer.state(), RendererState::Initialized);
        assert!(renderer.default_material().is_some());
        let backend = renderer.backend();
        assert_eq!(backend.depth_target(), Some((800, 600)));
        // frame uniforms + default material uniforms
        assert_eq!(backend.live_buffers(), 2);
        assert_eq!(backend.live_pipelines(), 1);
    }

    #[test]
    fn initialize_twice_is_rejected() {
        let mut renderer = ready_renderer();
        assert!(matches!(
            renderer.initialize(),
            Err(RenderError::Initialization(InitializationError::AlreadyInitialized))
        ));
    }

    #[test]
    fn failed_initialize_releases_everything() {
        let mut backend = RecordingBackend::new(800, 600);
        backend.fail_pipelines = true;
        let mut renderer = FrameRenderer::new(backend, RendererConfig::default());

        assert!(matches!(renderer.initialize(), Err(RenderError::Initialization(_))));
        assert_eq!(renderer.state(), RendererState::Uninitialized);
        let backend = renderer.backend();
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.live_bind_groups(), 0);
        assert_eq!(backend.depth_target(), None);

        renderer.dispose();
        assert_eq!(renderer.state(), RendererState::Disposed);
    }

    #[test]
    fn failed_default_pipeline_is_fatal() {
        let mut backend = RecordingBackend::new(800, 600);
        backend.new_pipeline_status = PipelineStatus::Failed("bad shader".into());
        let mut renderer = FrameRenderer::new(backend, RendererConfig::default());

        match renderer.initialize() {
            Err(RenderError::Initialization(InitializationError::Pipeline(msg))) => {
                assert_eq!(msg, "bad shader");
            }
            other => panic!("expected a pipeline error, got {other:?}"),
        }
        assert_eq!(renderer.state(), RendererState::Uninitialized);
        assert!(renderer.default_material().is_none());
        let backend = renderer.backend();
        assert_eq!(backend.live_pipelines(), 0);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.depth_target(), None);

        let scene: Vec<Drawable> = Vec::new();
        let mut camera = CameraRig::default();
        assert_eq!(renderer.render_frame(&scene, &mut camera), FrameOutcome::NotRunning);
    }

    #[test]
    fn compiling_default_pipeline_is_not_fatal() {
        let mut backend = RecordingBackend::new(800, 600);
        backend.new_pipeline_status = PipelineStatus::Compiling;
        let mut renderer = FrameRenderer::new(backend, RendererConfig::default());
        renderer.initialize().unwrap();
        assert_eq!(renderer.state(), RendererState::Initialized);
        let default = renderer.default_material().unwrap();
        assert_eq!(renderer.material(default).unwrap().state(), &MaterialState::Compiling);
    }

    #[test]
    fn retry_after_failed_initialize() {
        let mut backend = RecordingBackend::new(800, 600);
        backend.fail_pipelines = true;
        let mut renderer = FrameRenderer::new(backend, RendererConfig::default());
        assert!(renderer.initialize().is_err());

        renderer.backend_mut().fail_pipelines = false;
        renderer.initialize().unwrap();
        assert_eq!(renderer.state(), RendererState::Initialized);
    }

    #[test]
    fn render_before_initialize_does_nothing() {
        let mut renderer = FrameRenderer::new(RecordingBackend::new(8, 8), RendererConfig::default());
        let mut camera = CameraRig::default();
        let scene: Vec<Drawable> = Vec::new();
        assert_eq!(renderer.render_frame(&scene, &mut camera), FrameOutcome::NotRunning);
        assert!(renderer.backend().submissions().is_empty());
    }

    #[test]
    fn first_submission_starts_running() {
        let mut renderer = ready_renderer();
        let mut camera = CameraRig::default();
        let scene: Vec<Drawable> = Vec::new();
        assert!(renderer.render_frame(&scene, &mut camera).is_submitted());
        assert_eq!(renderer.state(), RendererState::Running);
        assert_eq!(renderer.frame_index(), 1);

        let submission = &renderer.backend().submissions()[0];
        assert_eq!(submission.pass.clear_color, [0.1, 0.1, 0.15, 1.0]);
        assert_eq!(submission.pass.clear_depth, 1.0);
        // frame tier only
        assert_eq!(submission.commands.len(), 1);
        assert!(matches!(submission.commands[0], PassCommand::SetBindGroup { slot: 0, .. }));
    }

    #[test]
    fn missing_material_is_skipped_and_later_drawables_drawn() {
        let mut renderer = ready_renderer();
        let mesh = cube(&mut renderer);
        let material = renderer.default_material().unwrap();

        let mut scene = SceneGraph::new();
        scene.add(Drawable::new(mesh, material, Transform::default()));
        let mut orphan = Drawable::new(mesh, material, Transform::default());
        orphan.material = None;
        scene.add(orphan);
        scene.add(Drawable::new(mesh, MaterialId(4242), Transform::default()));
        scene.add(Drawable::new(mesh, material, Transform::default()));

        let mut camera = CameraRig::default();
        let outcome = renderer.render_frame(&scene, &mut camera);
        assert_eq!(
            outcome,
            FrameOutcome::Submitted(FrameStats {
                draws: 2,
                skipped_missing: 2,
                skipped_not_ready: 0,
            })
        );
        assert_eq!(draws(&renderer.backend().submissions()[0].commands), 2);
    }

    #[test]
    fn draw_binds_every_tier_at_its_slot() {
        let mut renderer = ready_renderer();
        let mesh = cube(&mut renderer);
        let material = renderer.default_material().unwrap();
        let scene = vec![Drawable::new(mesh, material, Transform::default())];
        renderer.render_frame(&scene, &mut CameraRig::default());

        let commands = &renderer.backend().submissions()[0].commands;
        assert!(matches!(commands[0], PassCommand::SetBindGroup { slot: 0, .. }));
        assert!(matches!(commands[1], PassCommand::SetPipeline(_)));
        assert!(matches!(commands[2], PassCommand::SetBindGroup { slot: 1, .. }));
        assert!(matches!(commands[3], PassCommand::SetBindGroup { slot: 2, .. }));
        assert_eq!(
            commands[4],
            PassCommand::SetVertexBuffer {
                slot: 0,
                buffer: mesh.vertex_buffer
            }
        );
        assert_eq!(commands[5], PassCommand::SetIndexBuffer(mesh.index_buffer));
        assert_eq!(
            commands[6],
            PassCommand::DrawIndexed {
                indices: 0..36,
                base_vertex: 0,
                instances: 0..1
            }
        );
    }

    #[test]
    fn no_image_aborts_without_submission() {
        let mut renderer = ready_renderer();
        let mesh = cube(&mut renderer);
        let material = renderer.default_material().unwrap();
        let scene = vec![Drawable::new(mesh, material, Transform::default())];
        renderer.backend_mut().fail_acquire = Some(FrameAcquisitionError::Outdated);

        let mut camera = CameraRig::default();
        let outcome = renderer.render_frame(&scene, &mut camera);
        assert_eq!(outcome, FrameOutcome::NoImage(FrameAcquisitionError::Outdated));
        assert!(renderer.backend().submissions().is_empty());
        assert_eq!(renderer.state(), RendererState::Initialized);

        renderer.backend_mut().fail_acquire = None;
        assert!(renderer.render_frame(&scene, &mut camera).is_submitted());
        assert_eq!(renderer.backend().submissions().len(), 1);
    }

    #[test]
    fn compiling_material_skips_until_ready() {
        let mut renderer = ready_renderer();
        let mesh = cube(&mut renderer);
        renderer.backend_mut().new_pipeline_status = PipelineStatus::Compiling;
        let flat = renderer
            .create_material(&MaterialKind::Flat { color: [1.0, 0.0, 0.0, 1.0] })
            .unwrap();
        let default = renderer.default_material().unwrap();
        let scene = vec![
            Drawable::new(mesh, flat, Transform::default()),
            Drawable::new(mesh, default, Transform::default()),
        ];
        let mut camera = CameraRig::default();

        let outcome = renderer.render_frame(&scene, &mut camera);
        assert_eq!(
            outcome,
            FrameOutcome::Submitted(FrameStats {
                draws: 1,
                skipped_missing: 0,
                skipped_not_ready: 1,
            })
        );

        let pipeline = renderer.material(flat).unwrap().pipeline().unwrap();
        renderer
            .backend_mut()
            .set_pipeline_status(pipeline, PipelineStatus::Ready);
        match renderer.render_frame(&scene, &mut camera) {
            FrameOutcome::Submitted(stats) => assert_eq!(stats.draws, 2),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn resize_recreates_depth_and_updates_camera() {
        let mut renderer = ready_renderer();
        let mut camera = CameraRig::default();
        let scene: Vec<Drawable> = Vec::new();
        renderer.render_frame(&scene, &mut camera);
        assert_eq!(renderer.backend().depth_recreations(), 1);
        assert_eq!(camera.output_size(), (800, 600));

        renderer.render_frame(&scene, &mut camera);
        assert_eq!(renderer.backend().depth_recreations(), 1);

        renderer.backend_mut().output_size = (1024, 256);
        renderer.render_frame(&scene, &mut camera);
        assert_eq!(renderer.backend().depth_recreations(), 2);
        assert_eq!(renderer.backend().depth_target(), Some((1024, 256)));
        assert!((camera.aspect() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn frame_uniforms_follow_camera() {
        let mut renderer = ready_renderer();
        let mut camera = CameraRig::default();
        let scene: Vec<Drawable> = Vec::new();
        renderer.render_frame_at(&scene, &mut camera, 2.5);

        let frame_buffer = renderer.frame_buffer.unwrap();
        let bytes = renderer.backend().buffer_contents(frame_buffer).unwrap();
        let uniforms: FrameUniforms = bytemuck::pod_read_unaligned(bytes);
        let expected: Mat4 = camera.view_projection_matrix();
        assert_eq!(uniforms.view_proj, expected.to_cols_array_2d());
        assert_eq!(uniforms.camera_position, [0.0, 0.0, 5.0]);
        assert_eq!(uniforms.time, 2.5);
    }

    #[test]
    fn drawable_block_is_refreshed_each_frame() {
        let mut renderer = ready_renderer();
        let mesh = cube(&mut renderer);
        let material = renderer.default_material().unwrap();
        let mut scene = SceneGraph::new();
        let id = scene.add(Drawable::new(
            mesh,
            material,
            Transform::from_position(Vec3::X).with_spin(Spin::new(Vec3::Y, 1.5)),
        ));
        let mut camera = CameraRig::default();
        renderer.render_frame_at(&scene, &mut camera, 1.0);

        scene.get_mut(id).unwrap().transform.position = Vec3::new(0.0, 2.0, 0.0);
        renderer.render_frame_at(&scene, &mut camera, 2.0);

        let buffer = renderer.objects[&id].buffer;
        let bytes = renderer.backend().buffer_contents(buffer).unwrap();
        let block: DrawableUniformBlock = bytemuck::pod_read_unaligned(bytes);
        assert_eq!(block.model[3], [0.0, 2.0, 0.0, 1.0]);
        assert_eq!(block.rotation_speed, 1.5);
        assert_eq!(block.time, 2.0);
    }

    #[test]
    fn repeated_drawable_id_is_drawn_once() {
        let mut renderer = ready_renderer();
        let mesh = cube(&mut renderer);
        let material = renderer.default_material().unwrap();
        let first = Drawable::new(mesh, material, Transform::from_position(Vec3::X));
        let mut copy = first.clone();
        copy.transform.position = Vec3::new(-5.0, 0.0, 0.0);
        let scene = vec![first.clone(), copy];
        let mut camera = CameraRig::default();

        for _ in 0..2 {
            assert_eq!(
                renderer.render_frame(&scene, &mut camera),
                FrameOutcome::Submitted(FrameStats {
                    draws: 1,
                    skipped_missing: 1,
                    skipped_not_ready: 0,
                })
            );
        }
        assert_eq!(renderer.object_binding_count(), 1);

        let buffer = renderer.objects[&first.id].buffer;
        let bytes = renderer.backend().buffer_contents(buffer).unwrap();
        let block: DrawableUniformBlock = bytemuck::pod_read_unaligned(bytes);
        assert_eq!(block.model[3], [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn removed_drawables_release_object_bindings() {
        let mut renderer = ready_renderer();
        let mesh = cube(&mut renderer);
        let material = renderer.default_material().unwrap();
        let mut scene = SceneGraph::new();
        let a = scene.add(Drawable::new(mesh, material, Transform::default()));
        scene.add(Drawable::new(mesh, material, Transform::default()));
        let mut camera = CameraRig::default();

        renderer.render_frame(&scene, &mut camera);
        assert_eq!(renderer.object_binding_count(), 2);
        let groups = renderer.backend().live_bind_groups();

        scene.remove(a);
        renderer.render_frame(&scene, &mut camera);
        assert_eq!(renderer.object_binding_count(), 1);
        assert_eq!(renderer.backend().live_bind_groups(), groups - 1);
    }

    #[test]
    fn dispose_is_idempotent_and_stops_rendering() {
        let mut renderer = ready_renderer();
        let mesh = cube(&mut renderer);
        let material = renderer.default_material().unwrap();
        let scene = vec![Drawable::new(mesh, material, Transform::default())];
        let mut camera = CameraRig::default();
        renderer.render_frame(&scene, &mut camera);

        renderer.release_mesh(mesh);
        renderer.dispose();
        renderer.dispose();
        assert_eq!(renderer.state(), RendererState::Disposed);
        let backend = renderer.backend();
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.live_bind_groups(), 0);
        assert_eq!(backend.live_pipelines(), 0);
        assert_eq!(backend.depth_target(), None);

        assert_eq!(renderer.render_frame(&scene, &mut camera), FrameOutcome::NotRunning);
        assert!(matches!(
            renderer.create_material(&MaterialKind::default()),
            Err(RenderError::ResourceDisposed { .. })
        ));
        assert!(matches!(renderer.initialize(), Err(RenderError::ResourceDisposed { .. })));
    }

    #[test]
    fn dispose_material_is_idempotent() {
        let mut renderer = ready_renderer();
        let id = renderer
            .create_material(&MaterialKind::Lambert { color: [0.2, 0.8, 0.2, 1.0] })
            .unwrap();
        assert_eq!(renderer.backend().live_pipelines(), 2);
        renderer.dispose_material(id);
        renderer.dispose_material(id);
        assert!(renderer.material(id).is_none());
        assert_eq!(renderer.backend().live_pipelines(), 1);
    }
}

use crate::backend::{
    BindGroupId, BindGroupSource, BufferId, BufferUsage, GpuBackend, PipelineDesc, PipelineId,
    PipelineStatus, TextureData, TextureId,
};
use crate::commands::PassRecorder;
use crate::error::RenderError;
use crate::uniforms::MaterialUniforms;

/// Handle to a material registered with the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u64);

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "material#{}", self.0)
    }
}

/// Bind group tier. Slot numbers are shared by every pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindTier {
    /// Camera uniforms, bound once per frame.
    Frame,
    /// Per-drawable uniforms, bound once per draw.
    Object,
    /// Material constants and textures.
    Material,
}

impl BindTier {
    pub const fn slot(self) -> u32 {
        match self {
            Self::Frame => 0,
            Self::Object => 1,
            Self::Material => 2,
        }
    }
}

/// Fragment shading model; selects the entry point and material layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shading {
    Flat,
    Lambert,
    Textured,
}

/// Closed set of material variants, resolved once at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialKind {
    /// Unlit solid color.
    Flat { color: [f32; 4] },
    /// Solid color with one directional light and an ambient term.
    Lambert { color: [f32; 4] },
    /// Texture modulated by `tint`, lit like `Lambert`.
    Textured { tint: [f32; 4], texture: TextureData },
}

impl Default for MaterialKind {
    fn default() -> Self {
        Self::Lambert {
            color: [0.7, 0.7, 0.7, 1.0],
        }
    }
}

impl MaterialKind {
    pub fn shading(&self) -> Shading {
        match self {
            Self::Flat { .. } => Shading::Flat,
            Self::Lambert { .. } => Shading::Lambert,
            Self::Textured { .. } => Shading::Textured,
        }
    }

    fn uniforms(&self) -> MaterialUniforms {
        let color = match self {
            Self::Flat { color } | Self::Lambert { color } => *color,
            Self::Textured { tint, .. } => *tint,
        };
        MaterialUniforms { color }
    }

    fn texture(&self) -> Option<&TextureData> {
        match self {
            Self::Textured { texture, .. } => Some(texture),
            _ => None,
        }
    }
}

/// Lifecycle of a material's GPU objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialState {
    /// Pipeline compilation pending; drawables using it are skipped.
    Compiling,
    Ready,
    /// Compilation failed; the material never becomes ready.
    Failed(String),
    /// Terminal.
    Disposed,
}

/// A pipeline plus the bind groups that feed it.
///
/// The frame group is shared with the renderer and is not released here.
/// The material group, its uniform buffer and texture are owned.
#[derive(Debug)]
pub struct MaterialBinding {
    id: MaterialId,
    shading: Shading,
    state: MaterialState,
    pipeline: Option<PipelineId>,
    frame_group: Option<BindGroupId>,
    material_group: Option<BindGroupId>,
    uniforms: Option<BufferId>,
    texture: Option<TextureId>,
}

impl MaterialBinding {
    /// Create GPU objects for `kind` and start compiling its pipeline.
    /// On failure everything created so far is released.
    pub fn create<B: GpuBackend>(
        backend: &mut B,
        id: MaterialId,
        kind: &MaterialKind,
        frame_group: Option<BindGroupId>,
    ) -> Result<Self, RenderError> {
        let label = format!("{id}");
        let mut binding = Self {
            id,
            shading: kind.shading(),
            state: MaterialState::Compiling,
            pipeline: None,
            frame_group,
            material_group: None,
            uniforms: None,
            texture: None,
        };

        let uniforms = backend.create_buffer(
            &format!("{label}_uniforms"),
            BufferUsage::Uniform,
            bytemuck::bytes_of(&kind.uniforms()),
        );
        binding.uniforms = Some(uniforms);
        binding.texture = kind
            .texture()
            .map(|data| backend.create_texture(&format!("{label}_texture"), data));
        binding.material_group = Some(backend.create_bind_group(
            &format!("{label}_bind_group"),
            &BindGroupSource::Material {
                uniforms,
                texture: binding.texture,
            },
        ));

        let desc = PipelineDesc {
            label: format!("{label}_pipeline"),
            shading: binding.shading,
        };
        match backend.create_pipeline(&desc) {
            Ok(pipeline) => binding.pipeline = Some(pipeline),
            Err(e) => {
                binding.dispose(backend);
                return Err(e.into());
            }
        }

        tracing::debug!(material = %id, shading = ?binding.shading, "material compiling");
        Ok(binding)
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    pub fn shading(&self) -> Shading {
        self.shading
    }

    pub fn state(&self) -> &MaterialState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == MaterialState::Ready
    }

    pub fn pipeline(&self) -> Option<PipelineId> {
        self.pipeline
    }

    /// Advance `Compiling` to `Ready` or `Failed` without blocking.
    pub fn poll<B: GpuBackend>(&mut self, backend: &mut B) -> &MaterialState {
        if self.state == MaterialState::Compiling {
            if let Some(pipeline) = self.pipeline {
                match backend.pipeline_status(pipeline) {
                    PipelineStatus::Compiling => {}
                    PipelineStatus::Ready => {
                        tracing::debug!(material = %self.id, "material ready");
                        self.state = MaterialState::Ready;
                    }
                    PipelineStatus::Failed(msg) => {
                        tracing::error!(material = %self.id, error = %msg, "material failed to compile");
                        self.state = MaterialState::Failed(msg);
                    }
                }
            }
        }
        &self.state
    }

    fn check_ready(&self) -> Result<(), RenderError> {
        match self.state {
            MaterialState::Ready => Ok(()),
            MaterialState::Disposed => Err(RenderError::ResourceDisposed {
                resource: "material",
            }),
            MaterialState::Compiling | MaterialState::Failed(_) => {
                Err(RenderError::MaterialNotReady { material: self.id })
            }
        }
    }

    /// Set this material's pipeline on the pass.
    pub fn bind_pipeline(&self, pass: &mut dyn PassRecorder) -> Result<(), RenderError> {
        self.check_ready()?;
        if let Some(pipeline) = self.pipeline {
            pass.set_pipeline(pipeline);
        }
        Ok(())
    }

    /// Bind the group this material supplies for `tier` at the tier's slot.
    /// Returns `false` when the material has no group for that tier (object
    /// groups are per drawable and owned by the renderer).
    pub fn bind(&self, pass: &mut dyn PassRecorder, tier: BindTier) -> Result<bool, RenderError> {
        self.check_ready()?;
        let group = match tier {
            BindTier::Frame => self.frame_group,
            BindTier::Object => None,
            BindTier::Material => self.material_group,
        };
        match group {
            Some(group) => {
                pass.set_bind_group(tier.slot(), group);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Release the pipeline and owned GPU objects. Safe to call repeatedly.
    pub fn dispose<B: GpuBackend>(&mut self, backend: &mut B) {
        if self.state == MaterialState::Disposed {
            return;
        }
        if let Some(group) = self.material_group.take() {
            backend.release_bind_group(group);
        }
        if let Some(buffer) = self.uniforms.take() {
            backend.release_buffer(buffer);
        }
        if let Some(texture) = self.texture.take() {
            backend.release_texture(texture);
        }
        if let Some(pipeline) = self.pipeline.take() {
            backend.release_pipeline(pipeline);
        }
        self.frame_group = None;
        self.state = MaterialState::Disposed;
        tracing::debug!(material = %self.id, "material disposed");
    }
}

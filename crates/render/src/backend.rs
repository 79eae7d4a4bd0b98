use crate::commands::CommandList;
use crate::error::{FrameAcquisitionError, InitializationError};
use crate::material::{BindTier, Shading};

/// Opaque handle to a GPU buffer owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// Opaque handle to a bind group owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindGroupId(pub u64);

/// Opaque handle to a render pipeline owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineId(pub u64);

/// Opaque handle to a sampled texture owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
    /// Uniform data rewritten with `write_buffer`.
    Uniform,
}

/// Decoded RGBA8 image handed over by the asset side.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    /// Two-color checkerboard, `cells` squares per side.
    pub fn checkerboard(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let size = size.max(1);
        let cell = (size / cells.max(1)).max(1);
        let mut rgba = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let texel = if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b };
                rgba.extend_from_slice(&texel);
            }
        }
        Self {
            width: size,
            height: size,
            rgba,
        }
    }
}

/// What a bind group is built from. The variant fixes its tier.
#[derive(Debug, Clone, PartialEq)]
pub enum BindGroupSource {
    Frame { uniforms: BufferId },
    Object { uniforms: BufferId },
    Material {
        uniforms: BufferId,
        texture: Option<TextureId>,
    },
}

impl BindGroupSource {
    pub fn tier(&self) -> BindTier {
        match self {
            Self::Frame { .. } => BindTier::Frame,
            Self::Object { .. } => BindTier::Object,
            Self::Material { .. } => BindTier::Material,
        }
    }
}

/// Pipeline creation parameters. Every pipeline shares the three-tier layout.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDesc {
    pub label: String,
    pub shading: Shading,
}

/// Progress of asynchronous pipeline compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    Compiling,
    Ready,
    Failed(String),
}

/// Clear values for the single forward pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassDesc {
    pub clear_color: [f64; 4],
    /// Far plane value the depth attachment is cleared to.
    pub clear_depth: f32,
}

/// The GPU side of the renderer.
///
/// Implementations own every GPU object and hand out opaque ids. Releasing
/// an unknown or already released id is a no-op. None of these calls block.
pub trait GpuBackend {
    /// Acquired output image, consumed by [`GpuBackend::submit`].
    type Frame;

    /// Current output size in physical pixels.
    fn output_size(&self) -> (u32, u32);

    /// (Re)create the shared depth attachment. Zero sizes are clamped to one.
    fn resize_depth_target(&mut self, width: u32, height: u32);

    fn release_depth_target(&mut self);

    fn create_buffer(&mut self, label: &str, usage: BufferUsage, contents: &[u8]) -> BufferId;

    fn write_buffer(&mut self, buffer: BufferId, data: &[u8]);

    fn create_texture(&mut self, label: &str, data: &TextureData) -> TextureId;

    fn create_bind_group(&mut self, label: &str, source: &BindGroupSource) -> BindGroupId;

    /// Start compiling a pipeline. Compilation completes asynchronously;
    /// poll with [`GpuBackend::pipeline_status`].
    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineId, InitializationError>;

    fn pipeline_status(&mut self, pipeline: PipelineId) -> PipelineStatus;

    fn release_buffer(&mut self, buffer: BufferId);

    fn release_texture(&mut self, texture: TextureId);

    fn release_bind_group(&mut self, group: BindGroupId);

    fn release_pipeline(&mut self, pipeline: PipelineId);

    /// Get the next output image.
    fn acquire_frame(&mut self) -> Result<Self::Frame, FrameAcquisitionError>;

    /// Replay `commands` into one render pass on `frame`, submit and present.
    fn submit(&mut self, frame: Self::Frame, pass: &PassDesc, commands: &CommandList);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_alternates_cells() {
        let black = [0, 0, 0, 255];
        let white = [255, 255, 255, 255];
        let tex = TextureData::checkerboard(4, 2, black, white);
        assert_eq!(tex.rgba.len(), 4 * 4 * 4);
        assert_eq!(&tex.rgba[0..4], &black);
        // texel (2, 0) is in the second cell
        assert_eq!(&tex.rgba[8..12], &white);
    }

    #[test]
    fn bind_group_source_tier() {
        let buf = BufferId(1);
        assert_eq!(BindGroupSource::Frame { uniforms: buf }.tier(), BindTier::Frame);
        assert_eq!(BindGroupSource::Object { uniforms: buf }.tier(), BindTier::Object);
        assert_eq!(
            BindGroupSource::Material {
                uniforms: buf,
                texture: None
            }
            .tier(),
            BindTier::Material
        );
    }
}

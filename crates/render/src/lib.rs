//! Backend-agnostic frame orchestration.
//!
//! # Invariants
//! - Bind group slots are fixed for every pipeline: frame = 0, object = 1,
//!   material = 2.
//! - A frame either submits one complete pass or nothing at all.
//! - Drawables that cannot be drawn are skipped; they never abort a frame.
//!
//! GPU work goes through [`GpuBackend`]. Pass commands are recorded into a
//! [`CommandList`] and replayed by the backend on submit, so everything here
//! runs headless against [`RecordingBackend`].

pub mod backend;
pub mod commands;
mod demo;
mod error;
mod frame;
mod material;
mod mesh;
pub mod recording;
mod scene;
mod uniforms;

pub use backend::{
    BindGroupId, BindGroupSource, BufferId, BufferUsage, GpuBackend, PassDesc, PipelineDesc,
    PipelineId, PipelineStatus, TextureData, TextureId,
};
pub use commands::{CommandList, PassCommand, PassRecorder};
pub use demo::DemoScene;
pub use error::{FrameAcquisitionError, InitializationError, RenderError};
pub use frame::{FrameOutcome, FrameRenderer, FrameStats, RendererConfig, RendererState};
pub use material::{BindTier, MaterialBinding, MaterialId, MaterialKind, MaterialState, Shading};
pub use mesh::{GpuMesh, MeshData, Vertex};
pub use recording::RecordingBackend;
pub use scene::{Drawable, Scene, SceneGraph};
pub use uniforms::{DrawableUniformBlock, FrameUniforms, MaterialUniforms};

//! wgpu backend for the scenery renderer.
//!
//! Owns the surface, device and queue, the shared depth attachment and every
//! GPU object the renderer asks for. One WGSL module serves all materials.
//!
//! # Invariants
//! - Depth format is `Depth32Float`, compare "less", write enabled.
//! - Pipeline compilation is never awaited; its validation scope is polled.
//! - Lost or outdated surfaces are reconfigured on acquisition failure.

mod gpu;
mod shaders;

pub use gpu::WgpuBackend;
pub use shaders::SCENE_SHADER;

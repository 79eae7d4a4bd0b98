use crate::material::MaterialId;

/// Fatal setup failure. The renderer returns to `Uninitialized`.
#[derive(Debug, thiserror::Error)]
pub enum InitializationError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("device request failed: {0}")]
    Device(String),
    #[error("surface setup failed: {0}")]
    Surface(String),
    #[error("pipeline creation failed: {0}")]
    Pipeline(String),
    #[error("renderer is already initialized")]
    AlreadyInitialized,
}

/// The output surface had no image for this frame. Retried next tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameAcquisitionError {
    #[error("timed out waiting for the next surface image")]
    Timeout,
    #[error("surface is outdated and was reconfigured")]
    Outdated,
    #[error("surface was lost and was reconfigured")]
    Lost,
    #[error("out of memory acquiring surface image")]
    OutOfMemory,
    #[error("surface error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Initialization(#[from] InitializationError),
    #[error("unknown material {material}")]
    UnknownMaterial { material: MaterialId },
    #[error("material {material} is not ready")]
    MaterialNotReady { material: MaterialId },
    #[error("{resource} used after dispose")]
    ResourceDisposed { resource: &'static str },
    #[error("renderer is not initialized")]
    NotInitialized,
}

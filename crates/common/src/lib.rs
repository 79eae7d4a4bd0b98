//! Shared value types for the scenery workspace.

mod types;

pub use types::{DrawableId, Spin, Transform};

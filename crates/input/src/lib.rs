//! Input normalization: pointer, wheel and touch events reduced to deltas.
//!
//! # Invariants
//! - No platform event type crosses this crate's boundary.
//! - Deltas are in physical pixels; controllers normalize by [`Viewport`].

pub mod event;
pub mod tracker;

pub use event::{InputEvent, PointerButton, Viewport};
pub use tracker::{PointerTracker, TouchTracker};

//! Camera rig and orbit controller.
//!
//! # Invariants
//! - Cached matrices are valid only while their dirty flag is clear; every
//!   mutator sets the flag.
//! - The orbit controller writes into the rig, never the reverse.
//! - After every controller update the polar angle and radius lie inside
//!   their constraints.
//! - Camera motion happens on the same task that renders the frame.

mod camera;
pub mod orbit;
pub mod rig;

pub use camera::Camera;
pub use orbit::{OrbitConstraints, OrbitController, OrbitSettings, PendingMotion, Spherical};
pub use rig::{Aspect, CameraRig, Projection};

use crate::orbit::OrbitController;
use crate::rig::CameraRig;

/// A viewpoint: the rig the renderer reads plus an optional controller that
/// drives it.
#[derive(Debug, Clone, Default)]
pub struct Camera {
    pub rig: CameraRig,
    orbit: Option<OrbitController>,
}

impl Camera {
    pub fn new(rig: CameraRig) -> Self {
        Self { rig, orbit: None }
    }

    /// Attach an orbit controller built from the rig's current pose,
    /// replacing any previous one.
    pub fn attach_orbit(&mut self) -> &mut OrbitController {
        let controller = OrbitController::new(&self.rig);
        self.orbit.insert(controller)
    }

    /// Attach a preconfigured controller.
    pub fn attach(&mut self, controller: OrbitController) -> &mut OrbitController {
        self.orbit.insert(controller)
    }

    /// Stop driving the rig. Returns the controller so the caller can drop
    /// its input bindings.
    pub fn detach_orbit(&mut self) -> Option<OrbitController> {
        self.orbit.take()
    }

    pub fn orbit(&self) -> Option<&OrbitController> {
        self.orbit.as_ref()
    }

    /// Controller and rig borrowed together, for feeding input.
    pub fn orbit_mut(&mut self) -> Option<(&mut OrbitController, &CameraRig)> {
        self.orbit.as_mut().map(|o| (o, &self.rig))
    }

    /// Return the attached controller to its saved state.
    pub fn reset_orbit(&mut self) {
        if let Some(orbit) = &mut self.orbit {
            orbit.reset(&mut self.rig);
        }
    }

    /// Advance the attached controller by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if let Some(orbit) = &mut self.orbit {
            orbit.update(&mut self.rig, dt);
        }
    }
}

use glam::Vec2;

/// Pointer button that started a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Left mouse button or single-finger touch. Rotates.
    Primary,
    /// Right mouse button. Pans.
    Secondary,
    /// Middle mouse button. Dollies.
    Middle,
}

/// A normalized input event. Controllers consume these, never raw
/// platform events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer moved by `delta` physical pixels while `button` was held.
    Drag { button: PointerButton, delta: Vec2 },
    /// Wheel scrolled. Positive notches zoom in.
    Wheel { notches: f32 },
    /// Two-finger pinch. `ratio` is current finger distance over previous;
    /// above one means the fingers moved apart.
    Pinch { ratio: f32 },
    /// Two-finger drag of the touch centroid, in physical pixels.
    TouchPan { delta: Vec2 },
}

/// Size of the surface the pointer moves over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A viewport with a zero or negative side cannot normalize deltas.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_viewport() {
        assert!(Viewport::new(0.0, 10.0).is_degenerate());
        assert!(Viewport::new(10.0, 0.0).is_degenerate());
        assert!(Viewport::new(f32::NAN, 10.0).is_degenerate());
        assert!(!Viewport::new(800.0, 600.0).is_degenerate());
    }

    #[test]
    fn drag_event_is_constructible() {
        let e = InputEvent::Drag {
            button: PointerButton::Primary,
            delta: Vec2::new(3.0, -1.0),
        };
        assert!(matches!(e, InputEvent::Drag { .. }));
    }
}

use crate::event::{InputEvent, PointerButton};
use glam::Vec2;
use std::collections::BTreeMap;

/// Turns button state and absolute cursor positions into drag deltas.
#[derive(Debug, Default)]
pub struct PointerTracker {
    held: Vec<PointerButton>,
    last_position: Option<Vec2>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, button: PointerButton) {
        if !self.held.contains(&button) {
            self.held.push(button);
        }
    }

    pub fn release(&mut self, button: PointerButton) {
        self.held.retain(|b| *b != button);
    }

    /// Cursor left the window; the next move starts a fresh delta.
    pub fn leave(&mut self) {
        self.last_position = None;
    }

    /// The button driving the current drag. The earliest pressed button wins.
    pub fn active_button(&self) -> Option<PointerButton> {
        self.held.first().copied()
    }

    /// Record a cursor position. Returns a drag event when a button is held.
    pub fn moved(&mut self, position: Vec2) -> Option<InputEvent> {
        let previous = self.last_position.replace(position)?;
        let button = self.active_button()?;
        let delta = position - previous;
        if delta == Vec2::ZERO {
            return None;
        }
        Some(InputEvent::Drag { button, delta })
    }

    pub fn wheel(&self, notches: f32) -> InputEvent {
        InputEvent::Wheel { notches }
    }
}

/// Turns touch points into rotate drags (one finger) or pinch + pan
/// (two fingers). Additional fingers are ignored.
#[derive(Debug, Default)]
pub struct TouchTracker {
    touches: BTreeMap<u64, Vec2>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, id: u64, position: Vec2) {
        self.touches.insert(id, position);
    }

    pub fn end(&mut self, id: u64) {
        self.touches.remove(&id);
    }

    pub fn active(&self) -> usize {
        self.touches.len()
    }

    pub fn moved(&mut self, id: u64, position: Vec2) -> Vec<InputEvent> {
        let Some(previous) = self.touches.get(&id).copied() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        match self.touches.len() {
            1 => {
                let delta = position - previous;
                if delta != Vec2::ZERO {
                    events.push(InputEvent::Drag {
                        button: PointerButton::Primary,
                        delta,
                    });
                }
            }
            2 => {
                let (old_distance, old_centroid) = self.pair_metrics();
                self.touches.insert(id, position);
                let (new_distance, new_centroid) = self.pair_metrics();

                if old_distance > f32::EPSILON {
                    let ratio = new_distance / old_distance;
                    if ratio != 1.0 {
                        events.push(InputEvent::Pinch { ratio });
                    }
                }
                let delta = new_centroid - old_centroid;
                if delta != Vec2::ZERO {
                    events.push(InputEvent::TouchPan { delta });
                }
                return events;
            }
            n => {
                tracing::trace!(touches = n, "ignoring multi-touch gesture");
            }
        }

        self.touches.insert(id, position);
        events
    }

    fn pair_metrics(&self) -> (f32, Vec2) {
        let mut points = self.touches.values();
        match (points.next(), points.next()) {
            (Some(a), Some(b)) => (a.distance(*b), (*a + *b) * 0.5),
            _ => (0.0, Vec2::ZERO),
        }
    }
}

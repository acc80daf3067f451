use std::collections::BTreeSet;

use glam::{Vec2, Vec3};

use crate::api::types::ObjectId;

/// Input events the runtime understands.
/// Key labels are normalized with [`key_label`] before they are queued.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A key was pressed.
    KeyDown { key: String },
    /// A key was released.
    KeyUp { key: String },
    /// The user clicked a scene object.
    Click { object: ObjectId },
    /// Mouse-look movement in screen pixels.
    PointerDelta { dx: f32, dy: f32 },
    /// Point-and-click destination on the ground.
    PointerTarget { point: Vec3 },
}

impl InputEvent {
    pub fn key_down(raw: &str) -> Self {
        InputEvent::KeyDown { key: key_label(raw) }
    }

    pub fn key_up(raw: &str) -> Self {
        InputEvent::KeyUp { key: key_label(raw) }
    }
}

/// Canonical key label: the space bar is `space`, everything else lowercase
/// (`ArrowUp` → `arrowup`, `W` → `w`).
pub fn key_label(raw: &str) -> String {
    if raw == " " {
        return "space".into();
    }
    raw.trim().to_lowercase()
}

/// A queue of input events.
/// The host pushes events between frames; the runtime drains them each tick.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Held keys and accumulated pointer state, read by conditions and physics.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    held: BTreeSet<String>,
    /// Pointer movement since physics last consumed it.
    pub look_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: &str) {
        self.held.insert(key.to_string());
    }

    pub fn release(&mut self, key: &str) {
        self.held.remove(key);
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held.contains(key)
    }

    pub fn any_held(&self) -> bool {
        !self.held.is_empty()
    }

    /// Take and reset the accumulated look delta.
    pub fn take_look_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.look_delta)
    }

    pub fn clear(&mut self) {
        self.held.clear();
        self.look_delta = Vec2::ZERO;
    }
}

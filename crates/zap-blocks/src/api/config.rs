use serde::Deserialize;

use crate::error::Result;

/// Engine constants for a run. Provided by the host, defaults match the editor.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Fixed timestep for physics and animation in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Downward acceleration for the player and gravity effects (units/s²).
    pub gravity: f32,
    /// Player-to-object centre distance that raises `onCollide`.
    pub interaction_radius: f32,
    /// Whether a solid ground plane exists at y = 0.
    pub ground_plane: bool,
    /// Players falling below this altitude respawn.
    pub death_plane_y: f32,
    /// How often `wait until` re-checks its condition (seconds).
    pub poll_interval: f64,
    /// Yield between iterations of `forever` and `while` (seconds).
    pub loop_yield: f64,
    /// Queued script events dispatched per frame before carrying over.
    pub max_events_per_frame: usize,
    /// Upper bound on live tasks; spawns beyond it are dropped.
    pub max_tasks: usize,
    /// Seed for the run's random source.
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            gravity: 30.0,
            interaction_radius: 1.5,
            ground_plane: true,
            death_plane_y: -30.0,
            poll_interval: 0.05,
            loop_yield: 1.0 / 60.0,
            max_events_per_frame: 256,
            max_tasks: 4096,
            seed: 42,
        }
    }
}

/// Player movement and camera mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlScheme {
    #[default]
    FirstPerson,
    ThirdPerson,
    TopDown,
    PointClick,
}

/// Key labels bound to player actions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
    pub jump: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "w".into(),
            backward: "s".into(),
            left: "a".into(),
            right: "d".into(),
            jump: "space".into(),
        }
    }
}

/// Per-run settings chosen by the user when pressing play.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunSettings {
    pub control_scheme: ControlScheme,
    /// Horizontal walking speed (units/s).
    pub speed: f32,
    /// Upward velocity applied on jump (units/s).
    pub jump_force: f32,
    /// Mouse-look radians per pointer pixel.
    pub sensitivity: f32,
    pub key_bindings: KeyBindings,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            control_scheme: ControlScheme::FirstPerson,
            speed: 8.0,
            jump_force: 12.0,
            sensitivity: 0.002,
            key_bindings: KeyBindings::default(),
        }
    }
}

impl RunSettings {
    /// Parse settings from the editor's JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_fill_missing_fields() {
        let s = RunSettings::from_json(r#"{"controlScheme":"topDown","speed":4}"#).unwrap();
        assert_eq!(s.control_scheme, ControlScheme::TopDown);
        assert_eq!(s.speed, 4.0);
        assert_eq!(s.jump_force, 12.0);
        assert_eq!(s.key_bindings.jump, "space");
    }

    #[test]
    fn settings_reject_malformed_json() {
        assert!(RunSettings::from_json("{nope").is_err());
    }
}

use serde::{Deserialize, Serialize};

/// Unique identifier for an object in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// A side effect the runtime asks its host to perform.
/// The host (renderer, audio, DOM overlay) drains these once per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HostCommand {
    /// Play a named sound clip.
    PlaySound { name: String },
    /// Play a synthesized tone.
    PlayTone { frequency: f32, seconds: f32 },
    /// A HUD-visible variable changed.
    UpdateHud { variable: String, value: f64 },
    /// Show a transient full-screen message.
    ShowMessage { text: String, seconds: f32 },
    /// Place a 2D speech overlay above a 3D point.
    PositionOverlay {
        object: ObjectId,
        text: String,
        world: [f32; 3],
        seconds: f32,
    },
    /// An object was added to the scene during the run.
    ObjectSpawned { id: ObjectId },
    /// An object was removed from the scene during the run.
    ObjectRemoved { id: ObjectId },
}

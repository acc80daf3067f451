// extensions/mod.rs
//
// Pure helper modules shared by the animation engine, camera and compiler.
// No scene or runtime dependencies.

pub mod color;
pub mod easing;

pub use easing::{Easing, lerp, lerp_vec3, ease_vec3};

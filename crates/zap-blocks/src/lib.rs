pub mod api;
pub mod core;
pub mod program;
pub mod runtime;
pub mod systems;
pub mod bridge;
pub mod input;
pub mod extensions;
pub mod error;

// Re-export key types at crate root for convenience
pub use api::config::{ControlScheme, KeyBindings, RunConfig, RunSettings};
pub use api::types::{HostCommand, ObjectId};
pub use core::camera::Camera3D;
pub use core::object::SceneObject;
pub use core::physics::{Aabb, PlayerState};
pub use core::scene::Scene;
pub use core::time::FixedTimestep;
pub use error::{ProgramError, Result};
pub use input::queue::{key_label, InputEvent, InputQueue};
pub use program::{
    compile, compile_stack, BlockCatalog, BlockDefinition, BlockInstance, BlockKind, Category,
    Command, CompiledCommand, CompiledScript, Event, ObjectProgram, ParamSpec, Project,
    ScriptStack, Trigger,
};
pub use runtime::{RunContext, Runtime, VariableStore};
pub use systems::animation::{AnimationState, Effect};
pub use systems::rng::Rng;
pub use bridge::{InstanceBuffer, ObjectInstance, ParticleInstance};

// Extensions: pure helpers with no scene dependencies
pub use extensions::{ease_vec3, lerp, lerp_vec3, Easing};

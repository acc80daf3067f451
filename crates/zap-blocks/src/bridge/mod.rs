pub mod instance;

pub use instance::{InstanceBuffer, ObjectInstance, ParticleInstance};

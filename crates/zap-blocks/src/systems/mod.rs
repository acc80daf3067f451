pub mod animation;
pub mod particle;
pub mod rng;

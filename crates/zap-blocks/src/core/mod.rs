pub mod camera;
pub mod object;
pub mod physics;
pub mod scene;
pub mod time;

pub mod runner;

pub use runner::{BlockRunner, FrameOutput, ScreenOverlay};

use std::cell::RefCell;

use glam::Vec3;
use wasm_bindgen::prelude::*;
use zap_blocks::{InputEvent, ObjectId};

thread_local! {
    static RUNNER: RefCell<BlockRunner> = RefCell::new(BlockRunner::new());
}

fn with_runner<R>(f: impl FnOnce(&mut BlockRunner) -> R) -> R {
    RUNNER.with(|cell| f(&mut cell.borrow_mut()))
}

#[wasm_bindgen]
pub fn blocks_init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("zap-blocks: initialized");
}

// ---- Project and run lifecycle ----

/// Load a saved project. Errors come back as a JS exception string.
#[wasm_bindgen]
pub fn blocks_load_project(json: &str) -> Result<(), JsValue> {
    with_runner(|r| r.load_project(json)).map_err(|e| JsValue::from_str(&e))
}

#[wasm_bindgen]
pub fn blocks_save_project() -> Result<String, JsValue> {
    with_runner(|r| r.save_project()).map_err(|e| JsValue::from_str(&e))
}

#[wasm_bindgen]
pub fn blocks_start(settings_json: &str) {
    with_runner(|r| r.start(settings_json));
}

#[wasm_bindgen]
pub fn blocks_stop() {
    with_runner(|r| r.stop());
}

#[wasm_bindgen]
pub fn blocks_is_running() -> bool {
    with_runner(|r| r.is_running())
}

#[wasm_bindgen]
pub fn blocks_tick(dt: f32) {
    with_runner(|r| r.tick(dt));
}

#[wasm_bindgen]
pub fn blocks_resize(width: f32, height: f32) {
    with_runner(|r| r.resize(width, height));
}

// ---- Input ----

#[wasm_bindgen]
pub fn blocks_key_down(key: &str) {
    with_runner(|r| r.push_input(InputEvent::key_down(key)));
}

#[wasm_bindgen]
pub fn blocks_key_up(key: &str) {
    with_runner(|r| r.push_input(InputEvent::key_up(key)));
}

#[wasm_bindgen]
pub fn blocks_click(object: u32) {
    with_runner(|r| r.push_input(InputEvent::Click { object: ObjectId(object) }));
}

#[wasm_bindgen]
pub fn blocks_pointer_delta(dx: f32, dy: f32) {
    with_runner(|r| r.push_input(InputEvent::PointerDelta { dx, dy }));
}

#[wasm_bindgen]
pub fn blocks_pointer_target(x: f32, y: f32, z: f32) {
    with_runner(|r| r.push_input(InputEvent::PointerTarget { point: Vec3::new(x, y, z) }));
}

// ---- Data accessors ----

/// Host commands and projected overlays from the last frame, as JSON.
#[wasm_bindgen]
pub fn get_frame_output() -> String {
    with_runner(|r| r.output_json().to_string())
}

#[wasm_bindgen]
pub fn get_objects_ptr() -> *const f32 {
    with_runner(|r| r.objects_ptr())
}

#[wasm_bindgen]
pub fn get_object_count() -> u32 {
    with_runner(|r| r.object_count())
}

#[wasm_bindgen]
pub fn get_particles_ptr() -> *const f32 {
    with_runner(|r| r.particles_ptr())
}

#[wasm_bindgen]
pub fn get_particle_count() -> u32 {
    with_runner(|r| r.particle_count())
}

#[wasm_bindgen]
pub fn get_view_projection() -> Vec<f32> {
    with_runner(|r| r.view_projection().to_vec())
}

#[wasm_bindgen]
pub fn get_variable(name: &str) -> f64 {
    with_runner(|r| r.variable(name))
}

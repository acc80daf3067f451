use glam::{Vec2, Vec3};
use serde::Serialize;
use zap_blocks::{HostCommand, InputEvent, InstanceBuffer, ObjectId, RunSettings, Runtime};

/// A speech overlay already projected to screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenOverlay {
    pub object: ObjectId,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub seconds: f32,
}

/// Everything the page must act on after one frame.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameOutput {
    pub commands: Vec<HostCommand>,
    pub overlays: Vec<ScreenOverlay>,
    pub running: bool,
}

/// Wires one block runtime to the browser.
///
/// Lives in a `thread_local!` in `lib.rs` and is driven through free
/// `#[wasm_bindgen]` functions.
pub struct BlockRunner {
    runtime: Runtime,
    buffers: InstanceBuffer,
    viewport: Vec2,
    /// JSON of the last frame's output, kept alive for the JS read.
    output_json: String,
}

impl BlockRunner {
    pub fn new() -> Self {
        Self {
            runtime: Runtime::new(),
            buffers: InstanceBuffer::new(),
            viewport: Vec2::new(1280.0, 720.0),
            output_json: String::from("{}"),
        }
    }

    pub fn load_project(&mut self, json: &str) -> Result<(), String> {
        self.runtime.load_project(json).map_err(|e| e.to_string())?;
        self.rebuild_buffers();
        Ok(())
    }

    pub fn save_project(&self) -> Result<String, String> {
        self.runtime.save_project().map_err(|e| e.to_string())
    }

    /// Start a run. Malformed settings fall back to defaults.
    pub fn start(&mut self, settings_json: &str) {
        let settings = if settings_json.trim().is_empty() {
            RunSettings::default()
        } else {
            RunSettings::from_json(settings_json).unwrap_or_else(|e| {
                log::warn!("run settings rejected ({}), using defaults", e);
                RunSettings::default()
            })
        };
        self.runtime.start(settings);
        self.collect_output();
    }

    pub fn stop(&mut self) {
        self.runtime.stop();
        self.rebuild_buffers();
        self.collect_output();
    }

    pub fn is_running(&self) -> bool {
        self.runtime.is_running()
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.runtime.push_input(event);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.viewport = Vec2::new(width, height);
        self.runtime.camera_mut().resize(width, height);
    }

    /// Run one frame, rebuild buffers and collect host output.
    pub fn tick(&mut self, dt: f32) {
        self.runtime.tick(dt);
        self.rebuild_buffers();
        self.collect_output();
    }

    fn rebuild_buffers(&mut self) {
        let ctx = self.runtime.context();
        self.buffers.rebuild(&ctx.scene, &ctx.animations);
    }

    /// Drain host commands, projecting overlay anchors through the camera.
    /// Overlays behind the camera are dropped.
    fn collect_output(&mut self) {
        let mut output = FrameOutput {
            running: self.runtime.is_running(),
            ..FrameOutput::default()
        };
        for command in self.runtime.drain_host_commands() {
            match command {
                HostCommand::PositionOverlay { object, text, world, seconds } => {
                    let anchor = Vec3::from_array(world);
                    if let Some(screen) = self.runtime.camera().project(anchor, self.viewport) {
                        output.overlays.push(ScreenOverlay {
                            object,
                            text,
                            x: screen.x,
                            y: screen.y,
                            seconds,
                        });
                    }
                }
                other => output.commands.push(other),
            }
        }
        self.output_json = serde_json::to_string(&output).unwrap_or_else(|e| {
            log::error!("frame output not serializable: {}", e);
            String::from("{}")
        });
    }

    // ---- Accessors for direct memory reads ----

    pub fn output_json(&self) -> &str {
        &self.output_json
    }

    pub fn objects_ptr(&self) -> *const f32 {
        self.buffers.objects_ptr()
    }

    pub fn object_count(&self) -> u32 {
        self.buffers.object_count()
    }

    pub fn particles_ptr(&self) -> *const f32 {
        self.buffers.particles_ptr()
    }

    pub fn particle_count(&self) -> u32 {
        self.buffers.particle_count()
    }

    /// Column-major view-projection matrix for the renderer.
    pub fn view_projection(&self) -> [f32; 16] {
        self.runtime.camera().view_projection().to_cols_array()
    }

    pub fn variable(&self, name: &str) -> f64 {
        self.runtime.variables().get(name)
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}

impl Default for BlockRunner {
    fn default() -> Self {
        Self::new()
    }
}

//! The frame loop tying scene, scripts, physics and animation together.

use crate::api::config::{RunConfig, RunSettings};
use crate::api::types::{HostCommand, ObjectId};
use crate::core::camera::Camera3D;
use crate::core::physics::{nearby_objects, step_player, MoveInput, PlayerState};
use crate::core::scene::Scene;
use crate::core::time::FixedTimestep;
use crate::error::Result;
use crate::input::queue::{key_label, InputEvent, InputQueue};
use crate::program::catalog::BlockCatalog;
use crate::program::command::Event;
use crate::program::model::{Project, ScriptStack};
use crate::runtime::context::RunContext;
use crate::runtime::dispatcher::{Dispatcher, RunState};
use crate::runtime::program::Program;
use crate::runtime::scheduler::Scheduler;
use crate::runtime::variables::VariableStore;

/// Longest frame the clock will advance by; a stalled tab resumes, not fast-forwards.
pub const MAX_FRAME_DT: f64 = 0.25;

/// Key that stops a run.
const ESCAPE: &str = "escape";

/// Owns a scene and runs its scripts.
pub struct Runtime {
    catalog: BlockCatalog,
    ctx: RunContext,
    dispatcher: Dispatcher,
    scheduler: Scheduler,
    input: InputQueue,
    timestep: FixedTimestep,
    camera: Camera3D,
    settings: RunSettings,
    /// Scene as it was when the run started; restored on stop.
    snapshot: Option<Scene>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RunConfig::default())
    }

    pub fn with_config(config: RunConfig) -> Self {
        let timestep = FixedTimestep::new(config.fixed_dt);
        Self {
            catalog: BlockCatalog::builtin(),
            ctx: RunContext::new(config),
            dispatcher: Dispatcher::new(),
            scheduler: Scheduler::new(),
            input: InputQueue::new(),
            timestep,
            camera: Camera3D::new(16.0 / 9.0),
            settings: RunSettings::default(),
            snapshot: None,
        }
    }

    // -- Scene editing --

    /// Replace the scene with a saved project. Stops any run first.
    pub fn load_project(&mut self, json: &str) -> Result<()> {
        let project = Project::from_json(json)?;
        self.stop();
        self.ctx.scene = project.into_scene();
        log::info!("project loaded: {} objects", self.ctx.scene.len());
        Ok(())
    }

    pub fn save_project(&self) -> Result<String> {
        let scene = self.snapshot.as_ref().unwrap_or(&self.ctx.scene);
        Project::from_scene(scene).to_json()
    }

    pub fn scene(&self) -> &Scene {
        &self.ctx.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.ctx.scene
    }

    /// Replace an object's scripts. Takes effect at the next run.
    pub fn set_scripts(&mut self, id: ObjectId, scripts: Vec<ScriptStack>) -> Result<()> {
        self.ctx.scene.set_scripts(id, scripts)
    }

    pub fn catalog(&self) -> &BlockCatalog {
        &self.catalog
    }

    // -- Run lifecycle --

    /// Snapshot the scene, compile every script and fire `onStart`/`onLevelStart`.
    pub fn start(&mut self, mut settings: RunSettings) {
        if self.is_running() {
            self.stop();
        }
        let keys = &mut settings.key_bindings;
        for key in [
            &mut keys.forward,
            &mut keys.backward,
            &mut keys.left,
            &mut keys.right,
            &mut keys.jump,
        ] {
            *key = key_label(key);
        }

        self.snapshot = Some(self.ctx.scene.clone());
        let player = PlayerState::new(self.ctx.scene.spawn_point, &settings, self.ctx.config.gravity);
        self.ctx.reset_for_run(player);
        self.ctx.running = true;
        self.camera.snap_to(&self.ctx.player);
        self.timestep.reset();
        self.input.clear();
        self.settings = settings;

        let program = Program::build(&self.ctx.scene, &self.catalog);
        self.dispatcher.start(program, self.ctx.now);
        self.ctx.show_all_vars();

        self.dispatch(Event::Start, None);
        self.dispatch(Event::LevelStart, None);
        self.flush_events();
    }

    /// Cancel every task and put the scene back the way it was.
    pub fn stop(&mut self) {
        self.ctx.running = false;
        self.dispatcher.stop();
        self.scheduler.clear();
        self.ctx.clear_pending();
        self.input.clear();
        if let Some(scene) = self.snapshot.take() {
            self.ctx.scene = scene;
        }
    }

    pub fn is_running(&self) -> bool {
        self.ctx.running && self.dispatcher.state() == RunState::Running
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Advance one rendered frame.
    pub fn tick(&mut self, dt: f32) {
        if !self.is_running() {
            self.input.clear();
            return;
        }
        let dt = (dt as f64).clamp(0.0, MAX_FRAME_DT);
        self.ctx.now += dt;

        self.process_input();
        if !self.is_running() {
            return;
        }

        self.dispatcher.fire_timers(&mut self.scheduler, &mut self.ctx);

        let look = self.ctx.input.take_look_delta();
        self.ctx.player.apply_look(look);

        let steps = self.timestep.accumulate(dt as f32);
        let step_dt = self.timestep.dt();
        let movement = MoveInput::from_keys(&self.ctx.input, &self.settings.key_bindings);
        for _ in 0..steps {
            step_player(&mut self.ctx.player, &movement, &self.ctx.scene, &self.ctx.config, step_dt);
        }

        let nearby = nearby_objects(&self.ctx.player, &self.ctx.scene, self.ctx.config.interaction_radius);
        for id in nearby {
            self.dispatch(Event::Collide { with: "player".into() }, Some(id));
        }

        let ctx = &mut self.ctx;
        for _ in 0..steps {
            ctx.animations
                .tick(step_dt, &mut ctx.scene, ctx.player.position, ctx.config.gravity);
        }

        self.camera.follow(&self.ctx.player, dt as f32);
        self.ctx.advance_countdown(dt);
        self.scheduler.tick(&mut self.ctx, self.dispatcher.program());
        self.flush_events();
    }

    fn process_input(&mut self) {
        for event in self.input.drain() {
            match event {
                InputEvent::KeyDown { key } => {
                    let key = key_label(&key);
                    if key == ESCAPE {
                        log::info!("escape pressed");
                        self.stop();
                        return;
                    }
                    self.ctx.input.press(&key);
                    self.dispatch(Event::Key(key), None);
                }
                InputEvent::KeyUp { key } => self.ctx.input.release(&key_label(&key)),
                InputEvent::Click { object } => {
                    self.dispatch(Event::Click, Some(object));
                }
                InputEvent::PointerDelta { dx, dy } => {
                    self.ctx.input.look_delta += glam::Vec2::new(dx, dy);
                }
                InputEvent::PointerTarget { point } => self.ctx.player.move_target = Some(point),
            }
        }
    }

    /// Launch every script whose hat matches `event`.
    pub fn dispatch(&mut self, event: Event, target: Option<ObjectId>) -> usize {
        self.dispatcher
            .dispatch(&event, target, &mut self.scheduler, &mut self.ctx)
    }

    /// Dispatch events raised by scripts, up to the per-frame budget.
    /// Anything left over waits for the next frame.
    fn flush_events(&mut self) {
        for _ in 0..self.ctx.config.max_events_per_frame {
            let Some(queued) = self.ctx.pop_event() else {
                return;
            };
            self.dispatch(queued.event, queued.target);
        }
        if self.ctx.queued_events() > 0 {
            log::debug!("{} events carried to next frame", self.ctx.queued_events());
        }
    }

    /// Remove an object mid-run, cancelling its tasks and effects.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        self.scheduler.cancel_owner(id);
        self.ctx.remove_object(id)
    }

    /// Side effects produced since the last drain.
    pub fn drain_host_commands(&mut self) -> Vec<HostCommand> {
        self.ctx.drain_host()
    }

    // -- Accessors --

    pub fn player(&self) -> &PlayerState {
        &self.ctx.player
    }

    pub fn camera(&self) -> &Camera3D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera3D {
        &mut self.camera
    }

    pub fn variables(&self) -> &VariableStore {
        &self.ctx.variables
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Seconds since the current run started.
    pub fn now(&self) -> f64 {
        self.ctx.now
    }

    pub fn task_count(&self) -> usize {
        self.scheduler.len()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::object::SceneObject;
    use crate::error::ProgramError;
    use crate::program::model::BlockInstance;
    use glam::Vec3;

    const FRAME: f32 = 1.0 / 60.0;

    fn stack(hat: BlockInstance, body: Vec<BlockInstance>) -> ScriptStack {
        let mut blocks = vec![hat];
        blocks.extend(body);
        ScriptStack::new(1, blocks)
    }

    fn on_start(body: Vec<BlockInstance>) -> ScriptStack {
        stack(BlockInstance::new(0, "onStart"), body)
    }

    fn block(id: &str) -> BlockInstance {
        BlockInstance::new(0, id)
    }

    fn change(var: &str, amount: f64) -> BlockInstance {
        block("changeVar").with_value("var", var).with_value("amount", amount)
    }

    /// Runtime with one object per script list, placed far from the player.
    fn runtime(objects: Vec<Vec<ScriptStack>>) -> (Runtime, Vec<ObjectId>) {
        let mut rt = Runtime::new();
        let mut ids = Vec::new();
        for (i, scripts) in objects.into_iter().enumerate() {
            let scene = rt.scene_mut();
            let id = scene.allocate_id();
            scene.spawn(
                SceneObject::new(id)
                    .with_position(Vec3::new(20.0 + i as f32 * 3.0, 0.5, -20.0))
                    .with_scripts(scripts),
            );
            ids.push(id);
        }
        (rt, ids)
    }

    fn frames(rt: &mut Runtime, n: usize) {
        for _ in 0..n {
            rt.tick(FRAME);
        }
    }

    fn score(rt: &Runtime) -> f64 {
        rt.variables().get("score")
    }

    #[test]
    fn repeat_runs_exact_count() {
        let (mut rt, _) = runtime(vec![vec![on_start(vec![block("repeat")
            .with_value("times", 10)
            .with_children(vec![change("score", 1.0)])])]]);
        rt.start(RunSettings::default());
        assert_eq!(score(&rt), 10.0);
    }

    #[test]
    fn forever_does_not_block_the_rest_of_the_script() {
        let (mut rt, _) = runtime(vec![vec![on_start(vec![
            block("forever").with_children(vec![change("coins", 1.0)]),
            block("setVar").with_value("var", "coins").with_value("value", 100),
        ])]]);
        rt.start(RunSettings::default());
        assert_eq!(rt.variables().get("coins"), 101.0);
        assert_eq!(rt.task_count(), 1);
    }

    #[test]
    fn stop_cancels_pending_work() {
        let (mut rt, _) = runtime(vec![vec![on_start(vec![
            block("wait").with_value("seconds", 0.5),
            block("playSound").with_value("sound", "coin"),
        ])]]);
        rt.start(RunSettings::default());
        rt.stop();
        frames(&mut rt, 60);
        assert!(rt.drain_host_commands().is_empty());
        assert_eq!(rt.task_count(), 0);
        assert!(!rt.is_running());
    }

    #[test]
    fn timer_fires_on_interval_until_stopped() {
        let (mut rt, _) = runtime(vec![vec![stack(
            block("onTimer").with_value("seconds", 0.5),
            vec![change("score", 1.0)],
        )]]);
        rt.start(RunSettings::default());
        frames(&mut rt, 120);
        assert_eq!(score(&rt), 4.0);
        rt.stop();
        frames(&mut rt, 120);
        assert_eq!(score(&rt), 4.0);
    }

    #[test]
    fn broadcast_reaches_every_listener() {
        let listener = stack(
            block("onMessage").with_value("msg", "go"),
            vec![block("addScore").with_value("amount", 10)],
        );
        let (mut rt, _) = runtime(vec![
            vec![on_start(vec![block("broadcast").with_value("msg", "go")])],
            vec![listener.clone()],
            vec![listener],
        ]);
        rt.start(RunSettings::default());
        assert_eq!(score(&rt), 20.0);
    }

    #[test]
    fn glide_moves_then_resumes() {
        let (mut rt, ids) = runtime(vec![vec![on_start(vec![
            block("glide")
                .with_value("x", 24)
                .with_value("y", 0.5)
                .with_value("z", -20)
                .with_value("seconds", 0.5),
            change("coins", 1.0),
        ])]]);
        rt.start(RunSettings::default());
        assert_eq!(rt.variables().get("coins"), 0.0);
        frames(&mut rt, 15);
        let x = rt.scene().get(ids[0]).unwrap().position.x;
        assert!(x > 20.0 && x < 24.0, "x = {x}");
        frames(&mut rt, 20);
        let position = rt.scene().get(ids[0]).unwrap().position;
        assert!((position - Vec3::new(24.0, 0.5, -20.0)).length() < 1e-3);
        assert_eq!(rt.variables().get("coins"), 1.0);
    }

    #[test]
    fn glide_finishes_before_next_command_at_uneven_frame_rates() {
        for dt in [FRAME, 1.0 / 144.0, 1.0 / 45.0, 0.037] {
            let (mut rt, ids) = runtime(vec![vec![on_start(vec![
                block("glide")
                    .with_value("x", 24)
                    .with_value("y", 0.5)
                    .with_value("z", -20)
                    .with_value("seconds", 0.5),
                block("setPosition")
                    .with_value("x", 30)
                    .with_value("y", 0.5)
                    .with_value("z", -20),
            ])]]);
            rt.start(RunSettings::default());
            let mut elapsed = 0.0;
            while elapsed < 2.0 {
                rt.tick(dt);
                elapsed += dt;
            }
            assert_eq!(
                rt.scene().get(ids[0]).unwrap().position,
                Vec3::new(30.0, 0.5, -20.0),
                "dt = {dt}"
            );
            assert_eq!(rt.task_count(), 0);
        }
    }

    #[test]
    fn wait_resumes_on_time_at_144_hz() {
        let (mut rt, _) = runtime(vec![vec![on_start(vec![
            block("wait").with_value("seconds", 0.5),
            change("score", 1.0),
        ])]]);
        rt.start(RunSettings::default());
        for _ in 0..65 {
            rt.tick(1.0 / 144.0);
        }
        assert_eq!(score(&rt), 0.0);
        for _ in 0..15 {
            rt.tick(1.0 / 144.0);
        }
        assert_eq!(score(&rt), 1.0);
    }

    #[test]
    fn stop_block_ends_only_its_own_script() {
        let (mut rt, _) = runtime(vec![
            vec![on_start(vec![block("stop"), change("score", 5.0)])],
            vec![on_start(vec![change("score", 1.0)])],
        ]);
        rt.start(RunSettings::default());
        assert_eq!(score(&rt), 1.0);
    }

    #[test]
    fn call_block_runs_definition_inline() {
        let (mut rt, _) = runtime(vec![vec![
            stack(block("defineBlock").with_value("name", "hop"), vec![change("score", 2.0)]),
            on_start(vec![
                block("callBlock").with_value("name", "hop"),
                block("callBlock").with_value("name", "hop"),
                block("callBlock").with_value("name", "missing"),
                change("coins", 1.0),
            ]),
        ]]);
        rt.start(RunSettings::default());
        assert_eq!(score(&rt), 4.0);
        assert_eq!(rt.variables().get("coins"), 1.0);
    }

    #[test]
    fn destroy_cancels_the_objects_loops() {
        let (mut rt, ids) = runtime(vec![vec![
            on_start(vec![block("forever").with_children(vec![change("coins", 1.0)])]),
            stack(block("onKey").with_value("key", "k"), vec![block("destroy")]),
        ]]);
        rt.start(RunSettings::default());
        frames(&mut rt, 5);
        rt.push_input(InputEvent::key_down("K"));
        rt.tick(FRAME);
        assert!(!rt.scene().contains(ids[0]));
        let coins = rt.variables().get("coins");
        frames(&mut rt, 30);
        assert_eq!(rt.variables().get("coins"), coins);
        assert_eq!(rt.task_count(), 0);
    }

    #[test]
    fn escape_stops_the_run() {
        let (mut rt, _) = runtime(vec![vec![on_start(vec![block("forever")
            .with_children(vec![change("coins", 1.0)])])]]);
        rt.start(RunSettings::default());
        rt.push_input(InputEvent::key_down("Escape"));
        rt.tick(FRAME);
        assert!(!rt.is_running());
        assert_eq!(rt.task_count(), 0);
    }

    #[test]
    fn stop_restores_the_scene() {
        let (mut rt, ids) = runtime(vec![vec![on_start(vec![
            block("setPosition").with_value("x", 5).with_value("y", 5).with_value("z", 5),
            block("hide"),
            block("spawnObject").with_value("shape", "sphere"),
        ])]]);
        let before = rt.scene().get(ids[0]).unwrap().position;
        rt.start(RunSettings::default());
        assert_eq!(rt.scene().len(), 2);
        assert!(!rt.scene().get(ids[0]).unwrap().visible);
        rt.stop();
        assert_eq!(rt.scene().len(), 1);
        let object = rt.scene().get(ids[0]).unwrap();
        assert_eq!(object.position, before);
        assert!(object.visible);
    }

    #[test]
    fn proximity_raises_collide() {
        let mut rt = Runtime::new();
        let scene = rt.scene_mut();
        let id = scene.allocate_id();
        let spawn = scene.spawn_point;
        scene.spawn(
            SceneObject::new(id)
                .with_position(spawn - Vec3::Y)
                .with_collidable(false)
                .with_scripts(vec![stack(
                    block("onCollide").with_value("object", "player"),
                    vec![change("score", 1.0)],
                )]),
        );
        rt.start(RunSettings::default());
        rt.tick(FRAME);
        assert!(score(&rt) >= 1.0);
    }

    #[test]
    fn clicks_only_reach_the_clicked_object() {
        let clicked = stack(block("onClick"), vec![change("score", 1.0)]);
        let (mut rt, ids) = runtime(vec![vec![clicked.clone()], vec![clicked]]);
        rt.start(RunSettings::default());
        rt.push_input(InputEvent::Click { object: ids[1] });
        rt.tick(FRAME);
        assert_eq!(score(&rt), 1.0);
    }

    #[test]
    fn damage_past_zero_raises_health_zero() {
        let (mut rt, _) = runtime(vec![vec![
            on_start(vec![block("damage").with_value("amount", 150)]),
            stack(
                block("onHealthZero"),
                vec![block("showMessage").with_value("text", "Game over")],
            ),
        ]]);
        rt.start(RunSettings::default());
        let out = rt.drain_host_commands();
        assert!(out.iter().any(|c| matches!(
            c,
            HostCommand::ShowMessage { text, .. } if text == "Game over"
        )));
    }

    #[test]
    fn set_scripts_rejects_unknown_object() {
        let mut rt = Runtime::new();
        assert!(matches!(
            rt.set_scripts(ObjectId(7), Vec::new()),
            Err(ProgramError::UnknownObject(ObjectId(7)))
        ));
    }
}

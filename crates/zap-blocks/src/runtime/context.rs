use std::collections::VecDeque;

use glam::Vec3;

use crate::api::config::RunConfig;
use crate::api::types::{HostCommand, ObjectId};
use crate::core::physics::PlayerState;
use crate::core::scene::Scene;
use crate::input::queue::InputState;
use crate::program::command::Event;
use crate::runtime::variables::VariableStore;
use crate::systems::animation::AnimationState;
use crate::systems::rng::Rng;

/// An event raised from inside a task, dispatched after the frame's tasks run.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedEvent {
    pub event: Event,
    /// Restrict dispatch to scripts on this object.
    pub target: Option<ObjectId>,
}

/// `startTimer` countdown on the `timer` variable.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Countdown {
    remaining: f64,
}

/// Mutable state of one run, passed to every command handler.
pub struct RunContext {
    pub scene: Scene,
    pub variables: VariableStore,
    pub player: PlayerState,
    pub animations: AnimationState,
    pub input: InputState,
    pub rng: Rng,
    pub config: RunConfig,
    /// Seconds since the run started.
    pub now: f64,
    /// The global cancellation flag.
    pub running: bool,
    host: Vec<HostCommand>,
    events: VecDeque<QueuedEvent>,
    countdown: Option<Countdown>,
}

impl RunContext {
    pub fn new(config: RunConfig) -> Self {
        Self {
            scene: Scene::new(),
            variables: VariableStore::new(),
            player: PlayerState::default(),
            animations: AnimationState::new(),
            input: InputState::new(),
            rng: Rng::new(config.seed),
            config,
            now: 0.0,
            running: false,
            host: Vec::new(),
            events: VecDeque::new(),
            countdown: None,
        }
    }

    /// Forget everything a previous run left behind, keeping the scene.
    pub fn reset_for_run(&mut self, player: PlayerState) {
        self.variables.reset_all();
        self.player = player;
        self.animations.clear();
        self.input.clear();
        self.rng = Rng::new(self.config.seed);
        self.now = 0.0;
        self.host.clear();
        self.events.clear();
        self.countdown = None;
    }

    /// Drop pending outputs and events (run stop).
    pub fn clear_pending(&mut self) {
        self.animations.clear();
        self.input.clear();
        self.host.clear();
        self.events.clear();
        self.countdown = None;
    }

    // -- Host outputs --

    pub fn emit(&mut self, command: HostCommand) {
        self.host.push(command);
    }

    pub fn drain_host(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.host)
    }

    pub fn pending_host(&self) -> &[HostCommand] {
        &self.host
    }

    // -- Events --

    pub fn raise(&mut self, event: Event, target: Option<ObjectId>) {
        self.events.push_back(QueuedEvent { event, target });
    }

    pub fn pop_event(&mut self) -> Option<QueuedEvent> {
        self.events.pop_front()
    }

    pub fn queued_events(&self) -> usize {
        self.events.len()
    }

    // -- Variables (every write is mirrored to the HUD) --

    pub fn set_var(&mut self, name: &str, value: f64) -> f64 {
        let value = self.variables.set(name, value);
        self.show_var(name);
        value
    }

    pub fn change_var(&mut self, name: &str, amount: f64) -> f64 {
        let value = self.variables.change(name, amount);
        self.show_var(name);
        value
    }

    pub fn reset_var(&mut self, name: &str) -> f64 {
        let value = self.variables.reset(name);
        self.show_var(name);
        value
    }

    pub fn show_var(&mut self, name: &str) {
        let value = self.variables.get(name);
        self.emit(HostCommand::UpdateHud {
            variable: name.to_string(),
            value,
        });
    }

    pub fn show_all_vars(&mut self) {
        let all: Vec<(String, f64)> = self
            .variables
            .iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        for (variable, value) in all {
            self.emit(HostCommand::UpdateHud { variable, value });
        }
    }

    // -- Countdown --

    pub fn start_countdown(&mut self, seconds: f64) {
        self.countdown = Some(Countdown { remaining: seconds });
        self.set_var("timer", seconds.ceil());
    }

    /// Tick the countdown; raises `TimerDone` when it reaches zero.
    pub fn advance_countdown(&mut self, dt: f64) {
        let Some(countdown) = self.countdown.as_mut() else {
            return;
        };
        countdown.remaining -= dt;
        let remaining = countdown.remaining;
        let shown = remaining.max(0.0).ceil();
        if shown != self.variables.get("timer") {
            self.set_var("timer", shown);
        }
        if remaining <= 0.0 {
            self.countdown = None;
            self.raise(Event::TimerDone, None);
        }
    }

    // -- Objects --

    /// Remove an object mid-run along with its effects.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        if self.scene.despawn(id).is_none() {
            return false;
        }
        self.animations.remove_object(id);
        self.emit(HostCommand::ObjectRemoved { id });
        log::debug!("object {:?} removed during run", id);
        true
    }

    pub fn object_position(&self, id: ObjectId) -> Option<Vec3> {
        self.scene.get(id).map(|o| o.position)
    }

    pub fn distance_to_player(&self, id: ObjectId) -> Option<f32> {
        self.object_position(id)
            .map(|p| p.distance(self.player.position))
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(RunConfig::default())
    }
}

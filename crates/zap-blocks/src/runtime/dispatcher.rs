use crate::api::types::ObjectId;
use crate::program::command::{Event, Trigger};
use crate::runtime::context::RunContext;
use crate::runtime::program::Program;
use crate::runtime::scheduler::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Stopped,
}

/// A repeating `onTimer` script.
#[derive(Debug, Clone, PartialEq)]
struct Timer {
    entry: usize,
    interval: f64,
    next_fire: f64,
}

/// Routes events to the scripts whose hats match them.
#[derive(Debug)]
pub struct Dispatcher {
    state: RunState,
    program: Program,
    timers: Vec<Timer>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            state: RunState::Idle,
            program: Program::default(),
            timers: Vec::new(),
        }
    }

    /// Install a program and arm its timers. The first fire is one interval in.
    pub fn start(&mut self, program: Program, now: f64) {
        self.timers = program
            .entries()
            .iter()
            .enumerate()
            .filter_map(|(entry, e)| match e.script.trigger {
                Trigger::Timer(interval) => Some(Timer {
                    entry,
                    interval,
                    next_fire: now + interval,
                }),
                _ => None,
            })
            .collect();
        log::info!(
            "run started: {} scripts, {} timers",
            program.len(),
            self.timers.len()
        );
        self.program = program;
        self.state = RunState::Running;
    }

    pub fn stop(&mut self) {
        if self.state == RunState::Running {
            log::info!("run stopped");
        }
        self.state = RunState::Stopped;
        self.timers.clear();
        self.program = Program::default();
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Launch every script matching `event`, each as its own task.
    /// Scripts whose object has left the scene are skipped.
    pub fn dispatch(
        &self,
        event: &Event,
        target: Option<ObjectId>,
        scheduler: &mut Scheduler,
        ctx: &mut RunContext,
    ) -> usize {
        if self.state != RunState::Running {
            return 0;
        }
        let mut launched = 0;
        for entry in self.program.matching(event, target) {
            if !ctx.scene.contains(entry.target) {
                continue;
            }
            scheduler.launch(entry.target, entry.script.commands.clone(), ctx, &self.program);
            launched += 1;
        }
        log::trace!("{:?} -> {} scripts", event, launched);
        launched
    }

    /// Fire due timers, at most once each per call.
    pub fn fire_timers(&mut self, scheduler: &mut Scheduler, ctx: &mut RunContext) {
        if self.state != RunState::Running {
            return;
        }
        for timer in self.timers.iter_mut() {
            if ctx.now + 1e-9 < timer.next_fire {
                continue;
            }
            timer.next_fire += timer.interval;
            if timer.next_fire <= ctx.now {
                timer.next_fire = ctx.now + timer.interval;
            }
            let Some(entry) = self.program.entries().get(timer.entry) else {
                continue;
            };
            if ctx.scene.contains(entry.target) {
                scheduler.launch(entry.target, entry.script.commands.clone(), ctx, &self.program);
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::object::SceneObject;
    use crate::program::catalog::BlockCatalog;
    use crate::program::model::{BlockInstance, ScriptStack};

    fn scored(hat: BlockInstance) -> ScriptStack {
        ScriptStack::new(
            1,
            vec![
                hat,
                BlockInstance::new(2, "changeVar")
                    .with_value("var", "score")
                    .with_value("amount", 1),
            ],
        )
    }

    fn setup(scripts: Vec<ScriptStack>) -> (Dispatcher, Scheduler, RunContext, ObjectId) {
        let mut ctx = RunContext::default();
        let id = ctx.scene.allocate_id();
        ctx.scene.spawn(SceneObject::new(id).with_scripts(scripts));
        ctx.running = true;
        let mut dispatcher = Dispatcher::new();
        dispatcher.start(Program::build(&ctx.scene, &BlockCatalog::builtin()), 0.0);
        (dispatcher, Scheduler::new(), ctx, id)
    }

    #[test]
    fn dispatch_requires_running_state() {
        let (mut dispatcher, mut sched, mut ctx, _) =
            setup(vec![scored(BlockInstance::new(1, "onStart"))]);
        assert_eq!(dispatcher.dispatch(&Event::Start, None, &mut sched, &mut ctx), 1);
        dispatcher.stop();
        assert_eq!(dispatcher.state(), RunState::Stopped);
        assert_eq!(dispatcher.dispatch(&Event::Start, None, &mut sched, &mut ctx), 0);
        assert_eq!(ctx.variables.get("score"), 1.0);
    }

    #[test]
    fn targeted_dispatch_skips_other_objects() {
        let (dispatcher, mut sched, mut ctx, id) =
            setup(vec![scored(BlockInstance::new(1, "onClick"))]);
        assert_eq!(dispatcher.dispatch(&Event::Click, Some(ObjectId(99)), &mut sched, &mut ctx), 0);
        assert_eq!(dispatcher.dispatch(&Event::Click, Some(id), &mut sched, &mut ctx), 1);
    }

    #[test]
    fn timers_fire_once_per_interval() {
        let (mut dispatcher, mut sched, mut ctx, _) =
            setup(vec![scored(BlockInstance::new(1, "onTimer").with_value("seconds", 0.5))]);
        for _ in 0..120 {
            ctx.now += 1.0 / 60.0;
            dispatcher.fire_timers(&mut sched, &mut ctx);
        }
        assert_eq!(ctx.variables.get("score"), 4.0);
    }

    #[test]
    fn late_timer_fires_once_then_rearms() {
        let (mut dispatcher, mut sched, mut ctx, _) =
            setup(vec![scored(BlockInstance::new(1, "onTimer").with_value("seconds", 0.5))]);
        ctx.now = 3.0;
        dispatcher.fire_timers(&mut sched, &mut ctx);
        dispatcher.fire_timers(&mut sched, &mut ctx);
        assert_eq!(ctx.variables.get("score"), 1.0);
        ctx.now = 3.5;
        dispatcher.fire_timers(&mut sched, &mut ctx);
        assert_eq!(ctx.variables.get("score"), 2.0);
    }
}

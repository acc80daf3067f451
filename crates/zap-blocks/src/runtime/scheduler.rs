//! Cooperative tasks as explicit state machines.
//!
//! A task is a stack of frames. Driving a task advances the top frame until
//! a command suspends it, it stops, or the stack empties. Suspended tasks
//! are re-checked once per frame by [`Scheduler::tick`].

use std::collections::VecDeque;

use crate::api::types::ObjectId;
use crate::program::command::{CommandList, Condition};
use crate::runtime::condition::evaluate;
use crate::runtime::context::RunContext;
use crate::runtime::interpreter::execute;
use crate::runtime::program::Program;
use crate::systems::animation::AnimationId;

/// Deepest frame stack a task may build (nested containers plus custom-block calls).
pub const MAX_FRAME_DEPTH: usize = 256;

/// Tolerance for comparing the run clock against wake times.
const TIME_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// Why a suspended task is waiting.
#[derive(Debug, Clone, PartialEq)]
pub enum Wake {
    /// Resume once the run clock reaches this time.
    At(f64),
    /// Re-check `condition` every poll interval; resume when it holds.
    Poll { condition: Condition, next_check: f64 },
    /// Resume once the animation record is gone (finished or dropped).
    Animation(AnimationId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    Ready,
    Suspended(Wake),
    Done,
}

/// One level of a task's execution stack.
#[derive(Debug, Clone)]
pub enum Frame {
    Sequence { commands: CommandList, pc: usize },
    Repeat { body: CommandList, remaining: u32 },
    /// `forever`; `resting` means the next visit yields before iterating again.
    Loop { body: CommandList, resting: bool },
    While { condition: Condition, body: CommandList, resting: bool },
    ForEach { var: String, next: i64, end: i64, step: i64, body: CommandList },
}

impl Frame {
    pub fn sequence(commands: CommandList) -> Self {
        Frame::Sequence { commands, pc: 0 }
    }

    pub fn repeat(body: CommandList, times: u32) -> Self {
        Frame::Repeat { body, remaining: times }
    }

    pub fn forever(body: CommandList) -> Self {
        Frame::Loop { body, resting: false }
    }

    pub fn while_loop(condition: Condition, body: CommandList) -> Self {
        Frame::While {
            condition,
            body,
            resting: false,
        }
    }

    /// Inclusive range; counts down when `end < start`.
    pub fn for_each(var: String, start: i64, end: i64, body: CommandList) -> Self {
        Frame::ForEach {
            var,
            next: start,
            end,
            step: if end >= start { 1 } else { -1 },
            body,
        }
    }

    fn advance(&mut self, owner: ObjectId, ctx: &mut RunContext) -> Step {
        match self {
            Frame::Sequence { commands, pc } => {
                if *pc >= commands.len() {
                    return Step::Pop;
                }
                let index = *pc;
                *pc += 1;
                Step::Run(commands.clone(), index)
            }
            Frame::Repeat { body, remaining } => {
                if *remaining == 0 {
                    return Step::Pop;
                }
                *remaining -= 1;
                Step::Push(Frame::sequence(body.clone()))
            }
            Frame::Loop { body, resting } => {
                if *resting {
                    *resting = false;
                    return Step::Yield(Wake::At(ctx.now + ctx.config.loop_yield));
                }
                *resting = true;
                Step::Push(Frame::sequence(body.clone()))
            }
            Frame::While { condition, body, resting } => {
                if *resting {
                    *resting = false;
                    return Step::Yield(Wake::At(ctx.now + ctx.config.loop_yield));
                }
                if !evaluate(condition, owner, ctx) {
                    return Step::Pop;
                }
                *resting = true;
                Step::Push(Frame::sequence(body.clone()))
            }
            Frame::ForEach { var, next, end, step, body } => {
                let finished = if *step > 0 { *next > *end } else { *next < *end };
                if finished {
                    return Step::Pop;
                }
                ctx.set_var(var, *next as f64);
                let body = Frame::sequence(body.clone());
                match next.checked_add(*step) {
                    Some(n) => *next = n,
                    // Stepping past i64: finish on the next visit.
                    None => *end = *next - *step,
                }
                Step::Push(body)
            }
        }
    }
}

/// What a command asks of the task running it.
#[derive(Debug, Clone)]
pub enum Flow {
    /// Continue with the next command.
    Next,
    Suspend(Wake),
    /// Run a nested frame to completion before continuing.
    Enter(Frame),
    /// Start a separate task with the same owner; continue immediately.
    Spawn(Frame),
    /// End this task.
    Stop,
}

enum Step {
    Run(CommandList, usize),
    Push(Frame),
    Pop,
    Yield(Wake),
}

#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    /// The object whose script this is. Removing it cancels the task.
    pub owner: ObjectId,
    frames: Vec<Frame>,
    state: TaskState,
}

impl Task {
    fn new(id: TaskId, owner: ObjectId, frame: Frame) -> Self {
        Self {
            id,
            owner,
            frames: vec![frame],
            state: TaskState::Ready,
        }
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == TaskState::Done
    }

    /// Whether the wake condition holds now. Polls reschedule themselves.
    fn wake_due(&mut self, ctx: &mut RunContext) -> bool {
        match &mut self.state {
            TaskState::Ready => true,
            TaskState::Done => false,
            TaskState::Suspended(Wake::At(time)) => ctx.now + TIME_EPS >= *time,
            TaskState::Suspended(Wake::Animation(id)) => !ctx.animations.contains(*id),
            TaskState::Suspended(Wake::Poll { condition, next_check }) => {
                if ctx.now + TIME_EPS < *next_check {
                    return false;
                }
                if evaluate(condition, self.owner, ctx) {
                    return true;
                }
                *next_check = ctx.now + ctx.config.poll_interval;
                false
            }
        }
    }

    /// Run until the next suspension point or completion.
    fn drive(&mut self, ctx: &mut RunContext, program: &Program, spawned: &mut Vec<Frame>) {
        self.state = TaskState::Ready;
        loop {
            if !ctx.running {
                self.state = TaskState::Done;
                return;
            }
            if self.frames.len() > MAX_FRAME_DEPTH {
                log::warn!("task {:?} exceeded frame depth {}; stopped", self.id, MAX_FRAME_DEPTH);
                self.state = TaskState::Done;
                return;
            }
            let step = match self.frames.last_mut() {
                Some(frame) => frame.advance(self.owner, ctx),
                None => {
                    self.state = TaskState::Done;
                    return;
                }
            };
            match step {
                Step::Pop => {
                    self.frames.pop();
                }
                Step::Push(frame) => self.frames.push(frame),
                Step::Yield(wake) => {
                    self.state = TaskState::Suspended(wake);
                    return;
                }
                Step::Run(commands, index) => match execute(&commands[index], self.owner, ctx, program) {
                    Flow::Next => {}
                    Flow::Enter(frame) => self.frames.push(frame),
                    Flow::Spawn(frame) => spawned.push(frame),
                    Flow::Suspend(wake) => {
                        self.state = TaskState::Suspended(wake);
                        return;
                    }
                    Flow::Stop => {
                        self.state = TaskState::Done;
                        return;
                    }
                },
            }
        }
    }
}

/// Owns every live task of a run.
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a task for `commands` and run it to its first suspension.
    pub fn launch(
        &mut self,
        owner: ObjectId,
        commands: CommandList,
        ctx: &mut RunContext,
        program: &Program,
    ) {
        if !ctx.running || commands.is_empty() || !ctx.scene.contains(owner) {
            return;
        }
        self.start(owner, Frame::sequence(commands), ctx, program);
    }

    /// Drive `frame` as a new task, then any tasks it spawns, in spawn order.
    fn start(&mut self, owner: ObjectId, frame: Frame, ctx: &mut RunContext, program: &Program) {
        let mut queue = VecDeque::from([frame]);
        while let Some(frame) = queue.pop_front() {
            if self.tasks.len() >= ctx.config.max_tasks {
                log::warn!("task limit {} reached; task for {:?} dropped", ctx.config.max_tasks, owner);
                continue;
            }
            let id = TaskId(self.next_id);
            self.next_id += 1;
            let mut task = Task::new(id, owner, frame);
            let mut spawned = Vec::new();
            task.drive(ctx, program, &mut spawned);
            queue.extend(spawned);
            if !task.is_done() {
                self.tasks.push(task);
            }
        }
    }

    /// Resume every suspended task whose wake condition holds.
    /// Each task is driven at most once per call.
    pub fn tick(&mut self, ctx: &mut RunContext, program: &Program) {
        if !ctx.running {
            self.tasks.clear();
            return;
        }
        let mut spawned = Vec::new();
        for task in self.tasks.iter_mut() {
            if task.is_done() {
                continue;
            }
            if !ctx.scene.contains(task.owner) {
                log::trace!("task {:?} cancelled: owner {:?} removed", task.id, task.owner);
                task.state = TaskState::Done;
                continue;
            }
            if !task.wake_due(ctx) {
                continue;
            }
            let mut frames = Vec::new();
            task.drive(ctx, program, &mut frames);
            spawned.extend(frames.into_iter().map(|frame| (task.owner, frame)));
        }
        self.tasks.retain(|task| !task.is_done());
        for (owner, frame) in spawned {
            self.start(owner, frame, ctx, program);
        }
    }

    /// Cancel every task owned by `owner`. Returns how many were cancelled.
    pub fn cancel_owner(&mut self, owner: ObjectId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.owner != owner);
        before - self.tasks.len()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

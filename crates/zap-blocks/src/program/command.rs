//! Compiled form: typed triggers, conditions and a closed command set.
//!
//! String opcodes are matched once, here, at compile time. The interpreter
//! only ever sees [`Command`].

use std::rc::Rc;

use glam::Vec3;
use serde::{Serialize, Serializer};

use crate::program::block::BlockKind;
use crate::program::value::{Axis, ParamMap, Params};

/// Shortest accepted `onTimer` interval in seconds.
pub const MIN_TIMER_INTERVAL: f64 = 0.05;
/// Upper bound on `repeat` counts.
pub const MAX_REPEAT: u32 = 100_000;
/// Upper bound on particles per burst.
pub const MAX_PARTICLES: u32 = 500;

/// What starts a script.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    Start,
    Click,
    Key(String),
    /// Collided-with category filter; `"any"` matches everything.
    Collide(String),
    /// Period in seconds.
    Timer(f64),
    Message(String),
    HealthZero,
    EnemyDefeated,
    ItemCollected,
    LevelStart,
    TimerDone,
    LivesZero,
    /// Body of a custom block, run only through `callBlock`.
    Define(String),
}

impl Trigger {
    /// Build from a hat opcode and its validated parameters.
    pub fn from_hat(opcode: &str, values: &ParamMap) -> Option<Trigger> {
        let trigger = match opcode {
            "onStart" => Trigger::Start,
            "onClick" => Trigger::Click,
            "onKey" => Trigger::Key(values.text("key").to_string()),
            "onCollide" => Trigger::Collide(values.text("object").to_string()),
            "onTimer" => Trigger::Timer(timer_interval(values.number("seconds"))),
            "onMessage" => Trigger::Message(values.text("msg").to_string()),
            "onHealthZero" => Trigger::HealthZero,
            "onEnemyDefeated" => Trigger::EnemyDefeated,
            "onItemCollected" => Trigger::ItemCollected,
            "onLevelStart" => Trigger::LevelStart,
            "onTimerDone" => Trigger::TimerDone,
            "onLivesZero" => Trigger::LivesZero,
            "defineBlock" => Trigger::Define(values.text("name").to_string()),
            _ => return None,
        };
        Some(trigger)
    }

    pub fn opcode(&self) -> &'static str {
        match self {
            Trigger::Start => "onStart",
            Trigger::Click => "onClick",
            Trigger::Key(_) => "onKey",
            Trigger::Collide(_) => "onCollide",
            Trigger::Timer(_) => "onTimer",
            Trigger::Message(_) => "onMessage",
            Trigger::HealthZero => "onHealthZero",
            Trigger::EnemyDefeated => "onEnemyDefeated",
            Trigger::ItemCollected => "onItemCollected",
            Trigger::LevelStart => "onLevelStart",
            Trigger::TimerDone => "onTimerDone",
            Trigger::LivesZero => "onLivesZero",
            Trigger::Define(_) => "defineBlock",
        }
    }

    /// Whether a dispatched event starts this script.
    /// Timers are fired by the dispatcher directly and never match an event.
    pub fn matches(&self, event: &Event) -> bool {
        match (self, event) {
            (Trigger::Start, Event::Start)
            | (Trigger::Click, Event::Click)
            | (Trigger::HealthZero, Event::HealthZero)
            | (Trigger::EnemyDefeated, Event::EnemyDefeated)
            | (Trigger::ItemCollected, Event::ItemCollected)
            | (Trigger::LevelStart, Event::LevelStart)
            | (Trigger::TimerDone, Event::TimerDone)
            | (Trigger::LivesZero, Event::LivesZero) => true,
            (Trigger::Key(want), Event::Key(got)) => want == got,
            (Trigger::Collide(filter), Event::Collide { with }) => filter == "any" || filter == with,
            (Trigger::Message(want), Event::Message(got)) => want == got,
            _ => false,
        }
    }
}

impl Serialize for Trigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.opcode())
    }
}

/// Clamp a timer period: malformed or non-positive becomes 1 s, then the floor applies.
pub fn timer_interval(seconds: f64) -> f64 {
    let seconds = if seconds.is_finite() && seconds > 0.0 { seconds } else { 1.0 };
    seconds.max(MIN_TIMER_INTERVAL)
}

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start,
    Click,
    Key(String),
    /// The target object touched something of category `with`.
    Collide { with: String },
    Message(String),
    HealthZero,
    EnemyDefeated,
    ItemCollected,
    LevelStart,
    TimerDone,
    LivesZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Comparison {
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "=" | "==" => Comparison::Eq,
            "!=" | "≠" => Comparison::Ne,
            "<" => Comparison::Lt,
            "<=" | "≤" => Comparison::Le,
            ">=" | "≥" => Comparison::Ge,
            _ => Comparison::Gt,
        }
    }

    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        const EPS: f64 = 1e-9;
        match self {
            Comparison::Eq => (lhs - rhs).abs() < EPS,
            Comparison::Ne => (lhs - rhs).abs() >= EPS,
            Comparison::Lt => lhs < rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Ge => lhs >= rhs,
        }
    }
}

/// The fixed condition vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Owner centre within `distance` of the player.
    NearPlayer(f32),
    FarFromPlayer(f32),
    KeyPressed(String),
    AnyKey,
    Variable { name: String, op: Comparison, value: f64 },
    /// Percent probability per evaluation.
    Chance(f64),
}

impl Condition {
    pub fn from_params(values: &ParamMap) -> Self {
        match values.text("condition") {
            "farFromPlayer" => Condition::FarFromPlayer(values.float("distance")),
            "keyPressed" => Condition::KeyPressed(values.text("key").to_string()),
            "anyKey" => Condition::AnyKey,
            "variable" => Condition::Variable {
                name: values.text("var").to_string(),
                op: Comparison::from_symbol(values.text("op")),
                value: values.number("value"),
            },
            "chance" => Condition::Chance(values.number("percent").clamp(0.0, 100.0)),
            _ => Condition::NearPlayer(values.float("distance")),
        }
    }
}

/// Every executable command. Containers carry their bodies on
/// [`CompiledCommand`], not here.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Motion
    Move(Vec3),
    SetPosition(Vec3),
    /// Radians.
    Rotate(Vec3),
    SetRotation(Vec3),
    Glide { target: Vec3, seconds: f64, relative: bool },
    LookAtPlayer,
    TeleportPlayer(Vec3),
    SetSpawnPoint,
    LaunchPlayer(f32),
    // Looks
    SetColor(Vec3),
    SetOpacity(f32),
    Show,
    Hide,
    SetScale(Vec3),
    ChangeScale(f32),
    Say { text: String, seconds: f32 },
    // Effects
    Spin { axis: Axis, speed: f32 },
    Bounce { height: f32, speed: f32 },
    Patrol { axis: Axis, distance: f32, speed: f32 },
    FollowPlayer { speed: f32 },
    ColorShift { speed: f32 },
    Gravity,
    Orbit { radius: f32, speed: f32 },
    ScalePulse { min: f32, max: f32, speed: f32 },
    Particles { color: Vec3, count: u32 },
    Trail { color: Vec3 },
    StopParticles,
    StopEffects,
    // Control
    Wait(f64),
    WaitUntil(Condition),
    Repeat(u32),
    Forever,
    If(Condition),
    IfElse(Condition),
    While(Condition),
    ForEach { var: String, start: i64, end: i64 },
    Stop,
    Call(String),
    // Variables
    SetVar { name: String, value: f64 },
    ChangeVar { name: String, amount: f64 },
    ResetVar(String),
    ShowVar(String),
    // Sound, events, UI
    PlaySound(String),
    PlayTone { frequency: f32, seconds: f32 },
    Broadcast(String),
    ShowMessage { text: String, seconds: f32 },
    // Objects
    SpawnObject { shape: String, position: Vec3 },
    Duplicate,
    Destroy,
    // Game
    Damage(f64),
    Heal(f64),
    AddScore(f64),
    CollectItem,
    DefeatEnemy,
    LoseLife,
    StartTimer(f64),
    SetPlayerSpeed(f32),
    SetJumpForce(f32),
}

impl Command {
    /// Lower an opcode with validated parameters. None for opcodes outside
    /// the vocabulary.
    pub fn lower(opcode: &str, v: &ParamMap) -> Option<Command> {
        let xyz = || v.vec3("x", "y", "z");
        let command = match opcode {
            "move" => Command::Move(xyz()),
            "setPosition" => Command::SetPosition(xyz()),
            "rotate" => Command::Rotate(degrees(xyz())),
            "setRotation" => Command::SetRotation(degrees(xyz())),
            "glide" | "smoothMove" => Command::Glide {
                target: xyz(),
                seconds: v.number("seconds"),
                relative: opcode == "smoothMove",
            },
            "lookAtPlayer" => Command::LookAtPlayer,
            "teleportPlayer" => Command::TeleportPlayer(xyz()),
            "setSpawnPoint" => Command::SetSpawnPoint,
            "launchPlayer" => Command::LaunchPlayer(v.float("force")),

            "setColor" => Command::SetColor(v.color("color")),
            "setOpacity" => Command::SetOpacity(v.float("value").clamp(0.0, 1.0)),
            "show" => Command::Show,
            "hide" => Command::Hide,
            "setScale" => Command::SetScale(xyz()),
            "changeScale" => Command::ChangeScale(v.float("factor")),
            "say" => Command::Say {
                text: v.text("text").to_string(),
                seconds: v.float("seconds").max(0.0),
            },

            "spin" => Command::Spin {
                axis: Axis::from_label(v.text("axis")),
                speed: v.float("speed"),
            },
            "bounce" => Command::Bounce {
                height: v.float("height"),
                speed: v.float("speed"),
            },
            "patrol" => Command::Patrol {
                axis: Axis::from_label(v.text("axis")),
                distance: v.float("distance"),
                speed: v.float("speed"),
            },
            "followPlayer" => Command::FollowPlayer { speed: v.float("speed") },
            "colorShift" => Command::ColorShift { speed: v.float("speed") },
            "gravity" => Command::Gravity,
            "orbit" => Command::Orbit {
                radius: v.float("radius"),
                speed: v.float("speed"),
            },
            "scalePulse" => Command::ScalePulse {
                min: v.float("min"),
                max: v.float("max"),
                speed: v.float("speed"),
            },
            "particles" => Command::Particles {
                color: v.color("color"),
                count: count(v.number("count"), MAX_PARTICLES),
            },
            "trail" => Command::Trail { color: v.color("color") },
            "stopParticles" => Command::StopParticles,
            "stopEffects" => Command::StopEffects,

            "wait" => Command::Wait(v.number("seconds").max(0.0)),
            "waitUntil" => Command::WaitUntil(Condition::from_params(v)),
            "repeat" => Command::Repeat(count(v.number("times"), MAX_REPEAT)),
            "forever" => Command::Forever,
            "if" => Command::If(Condition::from_params(v)),
            "ifElse" => Command::IfElse(Condition::from_params(v)),
            "while" => Command::While(Condition::from_params(v)),
            "forEach" => Command::ForEach {
                var: v.text("var").to_string(),
                start: v.number("start").round() as i64,
                end: v.number("end").round() as i64,
            },
            "stop" => Command::Stop,
            "callBlock" => Command::Call(v.text("name").to_string()),

            "setVar" => Command::SetVar {
                name: v.text("var").to_string(),
                value: v.number("value"),
            },
            "changeVar" => Command::ChangeVar {
                name: v.text("var").to_string(),
                amount: v.number("amount"),
            },
            "resetVar" => Command::ResetVar(v.text("var").to_string()),
            "showVar" => Command::ShowVar(v.text("var").to_string()),

            "playSound" => Command::PlaySound(v.text("sound").to_string()),
            "playTone" => Command::PlayTone {
                frequency: v.float("frequency"),
                seconds: v.float("seconds").max(0.0),
            },
            "broadcast" => Command::Broadcast(v.text("msg").to_string()),
            "showMessage" => Command::ShowMessage {
                text: v.text("text").to_string(),
                seconds: v.float("seconds").max(0.0),
            },

            "spawnObject" => Command::SpawnObject {
                shape: v.text("shape").to_string(),
                position: xyz(),
            },
            "clone" => Command::Duplicate,
            "destroy" => Command::Destroy,

            "damage" => Command::Damage(v.number("amount")),
            "heal" => Command::Heal(v.number("amount")),
            "addScore" => Command::AddScore(v.number("amount")),
            "collectItem" => Command::CollectItem,
            "defeatEnemy" => Command::DefeatEnemy,
            "loseLife" => Command::LoseLife,
            "startTimer" => Command::StartTimer(v.number("seconds").max(0.0)),
            "setPlayerSpeed" => Command::SetPlayerSpeed(v.float("speed").max(0.0)),
            "setJumpForce" => Command::SetJumpForce(v.float("force").max(0.0)),
            _ => return None,
        };
        Some(command)
    }
}

fn degrees(v: Vec3) -> Vec3 {
    v * (std::f32::consts::PI / 180.0)
}

/// Round to a whole count in 0..=max.
fn count(n: f64, max: u32) -> u32 {
    n.round().clamp(0.0, max as f64) as u32
}

/// Shared, immutable command sequence.
pub type CommandList = Rc<[CompiledCommand]>;

pub fn empty_list() -> CommandList {
    Rc::from(Vec::new())
}

fn is_empty_list(list: &CommandList) -> bool {
    list.is_empty()
}

/// One lowered block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledCommand {
    pub code: &'static str,
    pub values: ParamMap,
    #[serde(rename = "type")]
    pub block_type: BlockKind,
    #[serde(skip)]
    pub op: Command,
    #[serde(skip_serializing_if = "is_empty_list")]
    pub children: CommandList,
    #[serde(skip_serializing_if = "is_empty_list")]
    pub else_children: CommandList,
}

/// One hat plus its body, ready to launch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledScript {
    pub trigger: Trigger,
    pub trigger_values: ParamMap,
    pub commands: CommandList,
}

//! The fixed block vocabulary and lookup by block id.

use std::collections::HashMap;

use crate::program::block::{BlockDefinition, BlockKind, Category, ParamSpec};
use crate::program::value::Axis;

use Category::*;

/// Condition kinds understood by `if`, `ifElse`, `while` and `waitUntil`.
pub const CONDITIONS: &[&str] = &[
    "nearPlayer",
    "farFromPlayer",
    "keyPressed",
    "anyKey",
    "variable",
    "chance",
];

/// Comparison operators for variable conditions, with their ASCII spellings.
pub const OPERATORS: &[&str] = &["=", "<", ">", "≠", "≤", "≥", "==", "!=", "<=", ">="];

const CONDITION_PARAMS: &[ParamSpec] = &[
    ParamSpec::choice("condition", CONDITIONS, "nearPlayer"),
    ParamSpec::number("distance", 3.0),
    ParamSpec::text("key", "space"),
    ParamSpec::text("var", "score"),
    ParamSpec::choice("op", OPERATORS, ">"),
    ParamSpec::number("value", 0.0),
    ParamSpec::number("percent", 50.0),
];

const XYZ_ZERO: &[ParamSpec] = &[
    ParamSpec::number("x", 0.0),
    ParamSpec::number("y", 0.0),
    ParamSpec::number("z", 0.0),
];

const XYZ_ONE: &[ParamSpec] = &[
    ParamSpec::number("x", 1.0),
    ParamSpec::number("y", 1.0),
    ParamSpec::number("z", 1.0),
];

const GLIDE_PARAMS: &[ParamSpec] = &[
    ParamSpec::number("x", 0.0),
    ParamSpec::number("y", 0.0),
    ParamSpec::number("z", 0.0),
    ParamSpec::number("seconds", 1.0),
];

const NONE: &[ParamSpec] = &[];

const fn def(
    id: &'static str,
    category: Category,
    kind: BlockKind,
    params: &'static [ParamSpec],
) -> BlockDefinition {
    BlockDefinition {
        id,
        category,
        kind,
        params,
        opcode: id,
    }
}

const fn hat(id: &'static str, params: &'static [ParamSpec]) -> BlockDefinition {
    def(id, Category::Events, BlockKind::Hat, params)
}

const fn cmd(category: Category, id: &'static str, params: &'static [ParamSpec]) -> BlockDefinition {
    def(id, category, BlockKind::Command, params)
}

const fn container(id: &'static str, params: &'static [ParamSpec]) -> BlockDefinition {
    def(id, Category::Control, BlockKind::ContainerCommand, params)
}

static BUILTIN: &[BlockDefinition] = &[
    // Events
    hat("onStart", NONE),
    hat("onClick", NONE),
    hat("onKey", &[ParamSpec::text("key", "space")]),
    hat("onCollide", &[ParamSpec::text("object", "any")]),
    hat("onTimer", &[ParamSpec::number("seconds", 1.0)]),
    hat("onMessage", &[ParamSpec::text("msg", "go")]),
    hat("onHealthZero", NONE),
    hat("onEnemyDefeated", NONE),
    hat("onItemCollected", NONE),
    hat("onLevelStart", NONE),
    hat("onTimerDone", NONE),
    hat("onLivesZero", NONE),
    def("defineBlock", Custom, BlockKind::Hat, &[ParamSpec::text("name", "myBlock")]),
    cmd(Events, "broadcast", &[ParamSpec::text("msg", "go")]),
    // Motion
    cmd(Motion, "move", XYZ_ZERO),
    cmd(Motion, "setPosition", XYZ_ZERO),
    cmd(Motion, "rotate", &[
        ParamSpec::number("x", 0.0),
        ParamSpec::number("y", 45.0),
        ParamSpec::number("z", 0.0),
    ]),
    cmd(Motion, "setRotation", XYZ_ZERO),
    cmd(Motion, "glide", GLIDE_PARAMS),
    cmd(Motion, "smoothMove", GLIDE_PARAMS),
    cmd(Motion, "lookAtPlayer", NONE),
    cmd(Motion, "teleportPlayer", &[
        ParamSpec::number("x", 0.0),
        ParamSpec::number("y", 2.0),
        ParamSpec::number("z", 0.0),
    ]),
    cmd(Motion, "setSpawnPoint", NONE),
    cmd(Motion, "launchPlayer", &[ParamSpec::number("force", 15.0)]),
    // Looks
    cmd(Looks, "setColor", &[ParamSpec::color("color", 0xff0000)]),
    cmd(Looks, "setOpacity", &[ParamSpec::number("value", 1.0)]),
    cmd(Looks, "show", NONE),
    cmd(Looks, "hide", NONE),
    cmd(Looks, "setScale", XYZ_ONE),
    cmd(Looks, "changeScale", &[ParamSpec::number("factor", 1.5)]),
    cmd(Looks, "say", &[ParamSpec::text("text", "Hello!"), ParamSpec::number("seconds", 2.0)]),
    // Effects
    cmd(Effects, "spin", &[
        ParamSpec::choice("axis", Axis::LABELS, "y"),
        ParamSpec::number("speed", 2.0),
    ]),
    cmd(Effects, "bounce", &[ParamSpec::number("height", 1.0), ParamSpec::number("speed", 3.0)]),
    cmd(Effects, "patrol", &[
        ParamSpec::choice("axis", Axis::LABELS, "x"),
        ParamSpec::number("distance", 3.0),
        ParamSpec::number("speed", 1.0),
    ]),
    cmd(Effects, "followPlayer", &[ParamSpec::number("speed", 2.0)]),
    cmd(Effects, "colorShift", &[ParamSpec::number("speed", 0.5)]),
    cmd(Effects, "gravity", NONE),
    cmd(Effects, "orbit", &[ParamSpec::number("radius", 3.0), ParamSpec::number("speed", 1.0)]),
    cmd(Effects, "scalePulse", &[
        ParamSpec::number("min", 0.8),
        ParamSpec::number("max", 1.2),
        ParamSpec::number("speed", 2.0),
    ]),
    cmd(Effects, "particles", &[
        ParamSpec::color("color", 0xffd700),
        ParamSpec::number("count", 20.0),
    ]),
    cmd(Effects, "trail", &[ParamSpec::color("color", 0x66ccff)]),
    cmd(Effects, "stopParticles", NONE),
    cmd(Effects, "stopEffects", NONE),
    // Control
    cmd(Control, "wait", &[ParamSpec::number("seconds", 1.0)]),
    cmd(Control, "waitUntil", CONDITION_PARAMS),
    container("repeat", &[ParamSpec::number("times", 10.0)]),
    container("forever", NONE),
    container("if", CONDITION_PARAMS),
    container("ifElse", CONDITION_PARAMS),
    container("while", CONDITION_PARAMS),
    container("forEach", &[
        ParamSpec::text("var", "i"),
        ParamSpec::number("start", 1.0),
        ParamSpec::number("end", 10.0),
    ]),
    cmd(Control, "stop", NONE),
    cmd(Custom, "callBlock", &[ParamSpec::text("name", "myBlock")]),
    // Variables
    cmd(Variables, "setVar", &[ParamSpec::text("var", "score"), ParamSpec::number("value", 0.0)]),
    cmd(Variables, "changeVar", &[ParamSpec::text("var", "score"), ParamSpec::number("amount", 1.0)]),
    cmd(Variables, "resetVar", &[ParamSpec::text("var", "score")]),
    cmd(Variables, "showVar", &[ParamSpec::text("var", "score")]),
    def("varValue", Variables, BlockKind::Reporter, &[ParamSpec::text("var", "score")]),
    def("randomNumber", Variables, BlockKind::Reporter, &[
        ParamSpec::number("min", 1.0),
        ParamSpec::number("max", 10.0),
    ]),
    // Sound
    cmd(Sound, "playSound", &[ParamSpec::text("sound", "pop")]),
    cmd(Sound, "playTone", &[ParamSpec::number("frequency", 440.0), ParamSpec::number("seconds", 0.3)]),
    // UI
    cmd(Ui, "showMessage", &[ParamSpec::text("text", "Hello!"), ParamSpec::number("seconds", 2.0)]),
    // Objects
    cmd(Objects, "spawnObject", &[
        ParamSpec::text("shape", "box"),
        ParamSpec::number("x", 0.0),
        ParamSpec::number("y", 5.0),
        ParamSpec::number("z", 0.0),
    ]),
    cmd(Objects, "clone", NONE),
    cmd(Objects, "destroy", NONE),
    // Game
    cmd(Game, "damage", &[ParamSpec::number("amount", 10.0)]),
    cmd(Game, "heal", &[ParamSpec::number("amount", 10.0)]),
    cmd(Game, "addScore", &[ParamSpec::number("amount", 10.0)]),
    cmd(Game, "collectItem", NONE),
    cmd(Game, "defeatEnemy", NONE),
    cmd(Game, "loseLife", NONE),
    cmd(Game, "startTimer", &[ParamSpec::number("seconds", 60.0)]),
    cmd(Game, "setPlayerSpeed", &[ParamSpec::number("speed", 8.0)]),
    cmd(Game, "setJumpForce", &[ParamSpec::number("force", 12.0)]),
];

/// Block definitions indexed by id.
#[derive(Debug, Clone)]
pub struct BlockCatalog {
    defs: Vec<BlockDefinition>,
    index: HashMap<&'static str, usize>,
}

impl BlockCatalog {
    pub fn new(defs: impl IntoIterator<Item = BlockDefinition>) -> Self {
        let defs: Vec<BlockDefinition> = defs.into_iter().collect();
        let mut index = HashMap::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if index.insert(def.id, i).is_some() {
                log::warn!("duplicate block id '{}', later definition wins", def.id);
            }
        }
        Self { defs, index }
    }

    /// The built-in palette.
    pub fn builtin() -> Self {
        Self::new(BUILTIN.iter().copied())
    }

    pub fn get(&self, id: &str) -> Option<&BlockDefinition> {
        self.index.get(id).map(|&i| &self.defs[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockDefinition> {
        self.defs.iter()
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &BlockDefinition> {
        self.defs.iter().filter(move |d| d.category == category)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl Default for BlockCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_are_unique() {
        let catalog = BlockCatalog::builtin();
        assert_eq!(catalog.index.len(), catalog.len());
    }

    #[test]
    fn lookup_by_id() {
        let catalog = BlockCatalog::builtin();
        let repeat = catalog.get("repeat").unwrap();
        assert_eq!(repeat.kind, BlockKind::ContainerCommand);
        assert!(repeat.params.iter().any(|p| p.name == "times"));
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn every_hat_lives_in_events_or_custom() {
        let catalog = BlockCatalog::builtin();
        for hat in catalog.iter().filter(|d| d.is_hat()) {
            assert!(matches!(hat.category, Category::Events | Category::Custom), "{}", hat.id);
        }
        assert_eq!(catalog.in_category(Category::Events).filter(|d| d.is_hat()).count(), 12);
    }
}

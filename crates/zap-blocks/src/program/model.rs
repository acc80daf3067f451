//! Persistence shape exchanged with the block editor.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::types::ObjectId;
use crate::core::object::SceneObject;
use crate::core::scene::Scene;
use crate::error::Result;
use crate::extensions::color;

/// One placed block. `values` are raw editor values; the compiler
/// validates them against the block's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInstance {
    #[serde(default)]
    pub instance_id: u64,
    pub block_id: String,
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
    #[serde(default)]
    pub children: Vec<BlockInstance>,
    /// Second branch of `ifElse`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub else_children: Vec<BlockInstance>,
}

impl BlockInstance {
    pub fn new(instance_id: u64, block_id: impl Into<String>) -> Self {
        Self {
            instance_id,
            block_id: block_id.into(),
            values: BTreeMap::new(),
            children: Vec::new(),
            else_children: Vec::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<BlockInstance>) -> Self {
        self.children = children;
        self
    }

    pub fn with_else(mut self, children: Vec<BlockInstance>) -> Self {
        self.else_children = children;
        self
    }

    /// Largest instance id in this subtree.
    fn max_instance_id(&self) -> u64 {
        self.children
            .iter()
            .chain(&self.else_children)
            .map(BlockInstance::max_instance_id)
            .fold(self.instance_id, u64::max)
    }
}

/// An ordered block sequence placed on the editor canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStack {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub blocks: Vec<BlockInstance>,
}

impl ScriptStack {
    pub fn new(id: u64, blocks: Vec<BlockInstance>) -> Self {
        Self {
            id,
            x: 0.0,
            y: 0.0,
            blocks,
        }
    }
}

fn default_shape() -> String {
    "box".into()
}

fn unit_scale() -> [f32; 3] {
    [1.0; 3]
}

fn one() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

/// One scene object as the editor saves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectProgram {
    #[serde(rename = "type", default = "default_shape")]
    pub shape: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub position: [f32; 3],
    /// Euler radians.
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
    /// `#rrggbb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default = "yes")]
    pub collidable: bool,
    #[serde(default)]
    pub anchored: bool,
    #[serde(default)]
    pub scripts: Vec<ScriptStack>,
}

impl ObjectProgram {
    /// Drop stacks with no blocks.
    pub fn prune_empty(&mut self) {
        prune_empty_stacks(&mut self.scripts);
    }

    /// Next unused block instance id in this object's scripts.
    pub fn next_instance_id(&self) -> u64 {
        next_instance_id(&self.scripts)
    }

    /// Build the runtime object. A malformed colour keeps the default.
    pub fn to_object(&self, id: ObjectId) -> SceneObject {
        let mut object = SceneObject::new(id)
            .with_shape(self.shape.clone())
            .with_name(self.name.clone())
            .with_position(Vec3::from_array(self.position))
            .with_rotation(Vec3::from_array(self.rotation))
            .with_scale(Vec3::from_array(self.scale))
            .with_opacity(self.opacity.clamp(0.0, 1.0))
            .with_visible(self.visible)
            .with_collidable(self.collidable)
            .with_anchored(self.anchored)
            .with_scripts(self.scripts.clone());
        if let Some(category) = &self.category {
            object.category = category.clone();
        }
        if let Some(rgb) = self.color.as_deref().and_then(color::parse_hex) {
            object.color = rgb;
        }
        object
    }

    pub fn from_object(object: &SceneObject) -> Self {
        Self {
            shape: object.shape.clone(),
            name: object.name.clone(),
            category: (object.category != object.shape).then(|| object.category.clone()),
            position: object.position.to_array(),
            rotation: object.rotation.to_array(),
            scale: object.scale.to_array(),
            color: Some(color::to_hex(object.color)),
            opacity: object.opacity,
            visible: object.visible,
            collidable: object.collidable,
            anchored: object.anchored,
            scripts: object.scripts.clone(),
        }
    }
}

/// Remove stacks with zero blocks.
pub fn prune_empty_stacks(stacks: &mut Vec<ScriptStack>) {
    stacks.retain(|s| !s.blocks.is_empty());
}

/// One past the largest instance id in `stacks` (1 for an empty program).
pub fn next_instance_id(stacks: &[ScriptStack]) -> u64 {
    stacks
        .iter()
        .flat_map(|s| &s.blocks)
        .map(BlockInstance::max_instance_id)
        .max()
        .map_or(1, |m| m + 1)
}

/// A whole saved scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub objects: Vec<ObjectProgram>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn_point: Option<[f32; 3]>,
}

impl Project {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Build a scene; objects get ids 1..=n in file order. Empty stacks are pruned.
    pub fn into_scene(self) -> Scene {
        let mut scene = Scene::new();
        if let Some(spawn) = self.spawn_point {
            scene.spawn_point = Vec3::from_array(spawn);
        }
        for mut program in self.objects {
            program.prune_empty();
            let id = scene.allocate_id();
            scene.spawn(program.to_object(id));
        }
        scene
    }

    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            objects: scene.iter().map(ObjectProgram::from_object).collect(),
            spawn_point: Some(scene.spawn_point.to_array()),
        }
    }
}

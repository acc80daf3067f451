use glam::Vec3;

use crate::api::types::ObjectId;
use crate::core::object::SceneObject;
use crate::core::physics::Aabb;
use crate::error::{ProgramError, Result};
use crate::program::model::ScriptStack;

/// Default player spawn: a little above the origin.
pub const DEFAULT_SPAWN_POINT: Vec3 = Vec3::new(0.0, 2.0, 5.0);

/// Scene object storage using a flat Vec.
/// Sized for editor scenes (hundreds of objects, not millions).
#[derive(Debug, Clone)]
pub struct Scene {
    objects: Vec<SceneObject>,
    next_id: u32,
    /// Where the player starts and respawns.
    pub spawn_point: Vec3,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::with_capacity(64),
            next_id: 1,
            spawn_point: DEFAULT_SPAWN_POINT,
        }
    }

    /// Reserve the next unused object ID.
    pub fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add an object. IDs handed out later never collide with it.
    pub fn spawn(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id;
        self.next_id = self.next_id.max(id.0 + 1);
        self.objects.push(object);
        id
    }

    /// Remove an object by ID, keeping the order of the rest.
    pub fn despawn(&mut self, id: ObjectId) -> Option<SceneObject> {
        let idx = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(idx))
    }

    /// Copy an object (transform, material and scripts) under a fresh ID.
    pub fn duplicate(&mut self, id: ObjectId) -> Option<ObjectId> {
        let mut copy = self.get(id)?.clone();
        copy.id = self.allocate_id();
        Some(self.spawn(copy))
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.iter_mut()
    }

    /// Find the first object with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// IDs of all objects whose bounding box overlaps `region`.
    pub fn query_aabb(&self, region: &Aabb) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|o| o.aabb().intersects(region))
            .map(|o| o.id)
            .collect()
    }

    /// Replace the stored scripts of one object (editor save).
    pub fn set_scripts(&mut self, id: ObjectId, scripts: Vec<ScriptStack>) -> Result<()> {
        let object = self.get_mut(id).ok_or(ProgramError::UnknownObject(id))?;
        object.scripts = scripts;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

use glam::Vec3;

use crate::api::types::ObjectId;
use crate::core::physics::Aabb;
use crate::program::model::ScriptStack;

/// Fat scene object: transform, material and stored scripts in one struct.
/// Mirrors what the scene provider exposes to the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// Unique identifier.
    pub id: ObjectId,
    /// Display name from the editor.
    pub name: String,
    /// Primitive shape (`box`, `sphere`, …). Used when spawning copies.
    pub shape: String,
    /// Gameplay category matched by `onCollide` filters.
    pub category: String,
    /// Centre position in world space.
    pub position: Vec3,
    /// Euler rotation in radians.
    pub rotation: Vec3,
    pub scale: Vec3,
    /// Half size of the unscaled geometry.
    pub half_extents: Vec3,
    /// Material colour, linear RGB in [0, 1].
    pub color: Vec3,
    pub opacity: f32,
    pub visible: bool,
    /// Whether the player collides with this object.
    pub collidable: bool,
    /// Anchored objects ignore gravity effects.
    pub anchored: bool,
    /// Block scripts stored on the object (`userData.scripts`).
    pub scripts: Vec<ScriptStack>,
}

impl SceneObject {
    /// Create a unit box at the origin.
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            name: String::new(),
            shape: "box".into(),
            category: "box".into(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            half_extents: Vec3::splat(0.5),
            color: Vec3::new(0.29, 0.56, 0.85),
            opacity: 1.0,
            visible: true,
            collidable: true,
            anchored: false,
            scripts: Vec::new(),
        }
    }

    // -- Builder pattern --

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the shape; the category follows unless set explicitly afterwards.
    pub fn with_shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = shape.into();
        self.category = self.shape.clone();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_collidable(mut self, collidable: bool) -> Self {
        self.collidable = collidable;
        self
    }

    pub fn with_anchored(mut self, anchored: bool) -> Self {
        self.anchored = anchored;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_scripts(mut self, scripts: Vec<ScriptStack>) -> Self {
        self.scripts = scripts;
        self
    }

    /// World-space half size (geometry × scale). Rotation is ignored.
    pub fn world_half_extents(&self) -> Vec3 {
        self.half_extents * self.scale.abs()
    }

    /// Axis-aligned bounding box in world space.
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.world_half_extents())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_follows_scale() {
        let obj = SceneObject::new(ObjectId(1))
            .with_position(Vec3::new(0.0, 1.0, 0.0))
            .with_scale(Vec3::new(4.0, 2.0, 1.0));
        let b = obj.aabb();
        assert_eq!(b.min, Vec3::new(-2.0, 0.0, -0.5));
        assert_eq!(b.max, Vec3::new(2.0, 2.0, 0.5));
    }

    #[test]
    fn shape_sets_default_category() {
        let obj = SceneObject::new(ObjectId(1)).with_shape("sphere");
        assert_eq!(obj.category, "sphere");
        let obj = obj.with_category("coin");
        assert_eq!(obj.shape, "sphere");
        assert_eq!(obj.category, "coin");
    }
}

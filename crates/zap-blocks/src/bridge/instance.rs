use bytemuck::{Pod, Zeroable};

use crate::core::scene::Scene;
use crate::systems::animation::AnimationState;

/// Per-object render data read by the TypeScript renderer each frame.
/// Must match the TypeScript protocol: 16 floats = 64 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ObjectInstance {
    /// Object id, as a float.
    pub id: f32,
    /// Primitive code, see [`shape_code`].
    pub shape: f32,
    pub position: [f32; 3],
    /// Euler angles in radians (XYZ order).
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    /// Linear RGB in 0..1.
    pub color: [f32; 3],
    pub opacity: f32,
    /// 1.0 when visible.
    pub visible: f32,
}

impl ObjectInstance {
    pub const FLOATS: usize = 16;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// One live particle: 8 floats = 32 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    pub opacity: f32,
}

impl ParticleInstance {
    pub const FLOATS: usize = 8;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// Renderer primitive code for a shape name. Unknown shapes draw as boxes.
pub fn shape_code(shape: &str) -> f32 {
    match shape {
        "sphere" => 1.0,
        "cylinder" => 2.0,
        "cone" => 3.0,
        "torus" => 4.0,
        "plane" => 5.0,
        _ => 0.0,
    }
}

/// Flat instance buffers rebuilt once per frame.
#[derive(Debug, Default)]
pub struct InstanceBuffer {
    pub objects: Vec<ObjectInstance>,
    pub particles: Vec<ParticleInstance>,
}

impl InstanceBuffer {
    pub fn new() -> Self {
        Self {
            objects: Vec::with_capacity(256),
            particles: Vec::with_capacity(512),
        }
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.particles.clear();
    }

    /// Rebuild from the scene and the live particle effects.
    pub fn rebuild(&mut self, scene: &Scene, animations: &AnimationState) {
        self.clear();
        self.objects.extend(scene.iter().map(|o| ObjectInstance {
            id: o.id.0 as f32,
            shape: shape_code(&o.shape),
            position: o.position.to_array(),
            rotation: o.rotation.to_array(),
            scale: o.scale.to_array(),
            color: o.color.to_array(),
            opacity: o.opacity,
            visible: if o.visible { 1.0 } else { 0.0 },
        }));
        self.particles
            .extend(animations.particles().map(|p| ParticleInstance {
                position: p.position.to_array(),
                size: p.size,
                color: p.color.to_array(),
                opacity: p.opacity,
            }));
    }

    pub fn object_count(&self) -> u32 {
        self.objects.len() as u32
    }

    pub fn particle_count(&self) -> u32 {
        self.particles.len() as u32
    }

    /// Raw pointer to object data for direct memory reads.
    pub fn objects_ptr(&self) -> *const f32 {
        self.objects.as_ptr() as *const f32
    }

    pub fn particles_ptr(&self) -> *const f32 {
        self.particles.as_ptr() as *const f32
    }

    pub fn object_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.objects)
    }
}

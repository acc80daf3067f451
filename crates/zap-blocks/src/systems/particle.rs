//! World-space particles for bursts and trails.

use glam::Vec3;

use crate::systems::rng::Rng;

/// Fraction of world gravity applied to particles.
const PARTICLE_GRAVITY_SCALE: f32 = 0.3;

/// A single particle with physics and rendering state.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub color: Vec3,
    pub size: f32,
    /// Seconds lived so far.
    pub age: f32,
    /// Seconds until expiry.
    pub life: f32,
    pub opacity: f32,
}

impl Particle {
    pub const BURST_SPEED: f32 = 4.0;
    pub const BURST_SIZE: f32 = 0.15;
    pub const TRAIL_SIZE: f32 = 0.1;
    pub const TRAIL_LIFE: f32 = 0.5;

    pub fn new(position: Vec3, velocity: Vec3, color: Vec3, size: f32, life: f32) -> Self {
        Particle {
            position,
            velocity,
            color,
            size,
            age: 0.0,
            life: life.max(f32::EPSILON),
            opacity: 1.0,
        }
    }

    /// Advance particle physics. Returns false when expired.
    pub fn tick(&mut self, dt: f32, gravity: f32) -> bool {
        self.age += dt;
        if self.age >= self.life {
            self.opacity = 0.0;
            return false;
        }
        self.velocity.y -= gravity * PARTICLE_GRAVITY_SCALE * dt;
        self.position += self.velocity * dt;
        self.opacity = 1.0 - self.age / self.life;
        true
    }
}

/// Spray `count` particles outward from `origin`.
pub fn burst(origin: Vec3, color: Vec3, count: u32, rng: &mut Rng) -> Vec<Particle> {
    (0..count)
        .map(|_| {
            let velocity = rng.spread(0.5) * Particle::BURST_SPEED;
            let life = rng.range(0.6, 1.2);
            Particle::new(origin, velocity, color, Particle::BURST_SIZE, life)
        })
        .collect()
}

//! Per-frame effect registry: spins, bounces, glides, gravity, particles.
//!
//! Each record targets one scene object by id and carries its own elapsed
//! time. Records never hold references into the scene, so a removed object
//! just makes its records drop out on the next tick.

use glam::Vec3;

use crate::api::types::ObjectId;
use crate::core::object::SceneObject;
use crate::core::scene::Scene;
use crate::extensions::color::{hsl_to_rgb, rgb_to_hsl};
use crate::extensions::easing::{ease_vec3, lerp, Easing};
use crate::program::value::Axis;
use crate::systems::particle::{burst, Particle};
use crate::systems::rng::Rng;

/// Followers stop this far (XZ) from the player.
pub const FOLLOW_STOP_DISTANCE: f32 = 1.5;
/// Seconds between trail particles.
pub const TRAIL_INTERVAL: f32 = 0.05;

/// What a record does each step. One case per effect kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Rotate one axis at `speed` rad/s.
    Spin { axis: Axis, speed: f32 },
    /// `y = base_y + |sin(elapsed · speed)| · height`.
    Bounce { base_y: f32, height: f32, speed: f32 },
    /// Eased move from `from` to `to`; removes itself on arrival.
    Glide { from: Vec3, to: Vec3, duration: f32 },
    /// Oscillate along one axis around `origin`.
    Patrol { axis: Axis, origin: f32, distance: f32, speed: f32 },
    /// Walk toward the player on XZ.
    FollowPlayer { speed: f32 },
    /// Cycle hue at `speed` revolutions per second, from the base HSL.
    ColorShift { base: Vec3, speed: f32 },
    /// Fall under world gravity until the box bottom meets y = 0.
    Gravity { velocity: f32 },
    /// Circle `center` in the XZ plane.
    Orbit { center: Vec3, radius: f32, speed: f32 },
    /// Oscillate scale between `min` and `max` times `base`.
    ScalePulse { base: Vec3, min: f32, max: f32, speed: f32 },
    /// One-shot spray; ends when the last particle dies.
    ParticleBurst { particles: Vec<Particle> },
    /// Continuous emission at the object's position.
    Trail { color: Vec3, particles: Vec<Particle>, cooldown: f32 },
}

impl Effect {
    pub fn spin(axis: Axis, speed: f32) -> Self {
        Effect::Spin { axis, speed }
    }

    pub fn bounce(object: &SceneObject, height: f32, speed: f32) -> Self {
        Effect::Bounce {
            base_y: object.position.y,
            height,
            speed,
        }
    }

    pub fn glide(from: Vec3, to: Vec3, duration: f32) -> Self {
        Effect::Glide { from, to, duration }
    }

    pub fn patrol(object: &SceneObject, axis: Axis, distance: f32, speed: f32) -> Self {
        Effect::Patrol {
            axis,
            origin: object.position[axis.index()],
            distance,
            speed,
        }
    }

    pub fn color_shift(object: &SceneObject, speed: f32) -> Self {
        Effect::ColorShift {
            base: rgb_to_hsl(object.color),
            speed,
        }
    }

    pub fn orbit(object: &SceneObject, radius: f32, speed: f32) -> Self {
        Effect::Orbit {
            center: object.position,
            radius,
            speed,
        }
    }

    pub fn scale_pulse(object: &SceneObject, min: f32, max: f32, speed: f32) -> Self {
        Effect::ScalePulse {
            base: object.scale,
            min,
            max,
            speed,
        }
    }

    pub fn particle_burst(object: &SceneObject, color: Vec3, count: u32, rng: &mut Rng) -> Self {
        Effect::ParticleBurst {
            particles: burst(object.position, color, count, rng),
        }
    }

    pub fn trail(color: Vec3) -> Self {
        Effect::Trail {
            color,
            particles: Vec::new(),
            cooldown: 0.0,
        }
    }

    fn is_particles(&self) -> bool {
        matches!(self, Effect::ParticleBurst { .. } | Effect::Trail { .. })
    }

    /// Apply one step to `object`. Returns false when the record is finished.
    fn step(&mut self, object: &mut SceneObject, elapsed: f32, dt: f32, env: &StepEnv) -> bool {
        match self {
            Effect::Spin { axis, speed } => {
                object.rotation[axis.index()] += *speed * dt;
            }
            Effect::Bounce { base_y, height, speed } => {
                object.position.y = *base_y + (elapsed * *speed).sin().abs() * *height;
            }
            Effect::Glide { from, to, duration } => {
                let progress = if *duration > 0.0 { elapsed / *duration } else { 1.0 };
                if progress >= 1.0 {
                    object.position = *to;
                    return false;
                }
                object.position = ease_vec3(*from, *to, progress, Easing::QuadInOut);
            }
            Effect::Patrol { axis, origin, distance, speed } => {
                object.position[axis.index()] = *origin + (elapsed * *speed).sin() * *distance;
            }
            Effect::FollowPlayer { speed } => {
                let mut to_player = env.player - object.position;
                to_player.y = 0.0;
                let distance = to_player.length();
                if distance > FOLLOW_STOP_DISTANCE {
                    let step = (*speed * dt).min(distance - FOLLOW_STOP_DISTANCE);
                    object.position += to_player / distance * step;
                }
            }
            Effect::ColorShift { base, speed } => {
                let hue = base.x + elapsed * *speed;
                object.color = hsl_to_rgb(hue, base.y.max(0.5), base.z.clamp(0.25, 0.75));
            }
            Effect::Gravity { velocity } => {
                *velocity -= env.gravity * dt;
                object.position.y += *velocity * dt;
                let half_height = object.world_half_extents().y;
                if object.position.y - half_height < 0.0 {
                    object.position.y = half_height;
                    *velocity = 0.0;
                }
            }
            Effect::Orbit { center, radius, speed } => {
                let angle = elapsed * *speed;
                object.position.x = center.x + angle.cos() * *radius;
                object.position.z = center.z + angle.sin() * *radius;
            }
            Effect::ScalePulse { base, min, max, speed } => {
                let t = ((elapsed * *speed).sin() + 1.0) * 0.5;
                object.scale = *base * lerp(*min, *max, t);
            }
            Effect::ParticleBurst { particles } => {
                particles.retain_mut(|p| p.tick(dt, env.gravity));
                return !particles.is_empty();
            }
            Effect::Trail { color, particles, cooldown } => {
                particles.retain_mut(|p| p.tick(dt, env.gravity));
                *cooldown -= dt;
                if *cooldown <= 0.0 {
                    *cooldown += TRAIL_INTERVAL;
                    particles.push(Particle::new(
                        object.position,
                        Vec3::ZERO,
                        *color,
                        Particle::TRAIL_SIZE,
                        Particle::TRAIL_LIFE,
                    ));
                }
            }
        }
        true
    }

    fn particles(&self) -> &[Particle] {
        match self {
            Effect::ParticleBurst { particles } | Effect::Trail { particles, .. } => particles,
            _ => &[],
        }
    }
}

/// World inputs shared by every record during one step.
struct StepEnv {
    player: Vec3,
    gravity: f32,
}

/// Handle to a record for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationRecord {
    pub id: AnimationId,
    pub target: ObjectId,
    pub elapsed: f32,
    pub effect: Effect,
}

/// Manages all active records.
#[derive(Debug, Default)]
pub struct AnimationState {
    records: Vec<AnimationRecord>,
    next_id: u64,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, target: ObjectId, effect: Effect) -> AnimationId {
        let id = AnimationId(self.next_id);
        self.next_id += 1;
        self.records.push(AnimationRecord {
            id,
            target,
            elapsed: 0.0,
            effect,
        });
        id
    }

    /// Whether the record is still live.
    pub fn contains(&self, id: AnimationId) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    /// Drop every record targeting `target`.
    pub fn remove_object(&mut self, target: ObjectId) {
        self.records.retain(|r| r.target != target);
    }

    /// Drop bursts and trails targeting `target`, keeping motion effects.
    pub fn stop_particles(&mut self, target: ObjectId) {
        self.records
            .retain(|r| r.target != target || !r.effect.is_particles());
    }

    /// Advance all records one fixed step and write results into the scene.
    pub fn tick(&mut self, dt: f32, scene: &mut Scene, player: Vec3, gravity: f32) {
        let env = StepEnv { player, gravity };
        self.records.retain_mut(|record| {
            let Some(object) = scene.get_mut(record.target) else {
                log::trace!("dropping animation {:?}: target {:?} gone", record.id, record.target);
                return false;
            };
            record.elapsed += dt;
            record.effect.step(object, record.elapsed, dt, &env)
        });
    }

    /// Every live particle across all records.
    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.records.iter().flat_map(|r| r.effect.particles())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn scene_with(object: SceneObject) -> (Scene, ObjectId) {
        let mut scene = Scene::new();
        let id = object.id;
        scene.spawn(object);
        (scene, id)
    }

    #[test]
    fn glide_lands_exactly_and_removes_itself() {
        let (mut scene, id) = scene_with(SceneObject::new(ObjectId(1)));
        let mut anims = AnimationState::new();
        let to = Vec3::new(3.0, 1.0, -2.0);
        let glide = anims.add(id, Effect::glide(Vec3::ZERO, to, 1.0));

        anims.tick(0.5, &mut scene, Vec3::ZERO, 30.0);
        let mid = scene.get(id).unwrap().position;
        assert!((mid - to * 0.5).length() < 1e-5, "quad in-out is half way at t = 0.5");

        for _ in 0..40 {
            anims.tick(DT, &mut scene, Vec3::ZERO, 30.0);
        }
        assert_eq!(scene.get(id).unwrap().position, to);
        assert!(!anims.contains(glide));
        assert!(anims.is_empty());

        scene.get_mut(id).unwrap().position = Vec3::ZERO;
        anims.tick(DT, &mut scene, Vec3::ZERO, 30.0);
        assert_eq!(scene.get(id).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn spin_and_color_shift_coexist() {
        let (mut scene, id) = scene_with(SceneObject::new(ObjectId(1)));
        let mut anims = AnimationState::new();
        let start_color = scene.get(id).unwrap().color;
        anims.add(id, Effect::spin(Axis::Y, 2.0));
        let shift = Effect::color_shift(scene.get(id).unwrap(), 0.5);
        anims.add(id, shift);

        anims.tick(0.5, &mut scene, Vec3::ZERO, 30.0);

        let obj = scene.get(id).unwrap();
        assert!((obj.rotation.y - 1.0).abs() < 1e-6);
        assert_ne!(obj.color, start_color);
        assert_eq!(anims.len(), 2);
    }

    #[test]
    fn bounce_stays_above_base() {
        let object = SceneObject::new(ObjectId(1)).with_position(Vec3::new(0.0, 2.0, 0.0));
        let mut anims = AnimationState::new();
        anims.add(object.id, Effect::bounce(&object, 1.0, 3.0));
        let (mut scene, id) = scene_with(object);
        for _ in 0..120 {
            anims.tick(DT, &mut scene, Vec3::ZERO, 30.0);
            let y = scene.get(id).unwrap().position.y;
            assert!((2.0..=3.0 + 1e-5).contains(&y));
        }
    }

    #[test]
    fn gravity_rests_on_ground() {
        let object = SceneObject::new(ObjectId(1)).with_position(Vec3::new(0.0, 5.0, 0.0));
        let (mut scene, id) = scene_with(object);
        let mut anims = AnimationState::new();
        anims.add(id, Effect::Gravity { velocity: 0.0 });
        for _ in 0..240 {
            anims.tick(DT, &mut scene, Vec3::ZERO, 30.0);
        }
        assert_eq!(scene.get(id).unwrap().position.y, 0.5);
    }

    #[test]
    fn follow_player_stops_short() {
        let (mut scene, id) = scene_with(SceneObject::new(ObjectId(1)));
        let mut anims = AnimationState::new();
        anims.add(id, Effect::FollowPlayer { speed: 100.0 });
        let player = Vec3::new(10.0, 3.0, 0.0);
        anims.tick(1.0, &mut scene, player, 30.0);
        let pos = scene.get(id).unwrap().position;
        assert!((pos.x - (10.0 - FOLLOW_STOP_DISTANCE)).abs() < 1e-4);
        assert_eq!(pos.y, 0.0);
    }

    #[test]
    fn orbit_keeps_radius() {
        let (mut scene, id) = scene_with(SceneObject::new(ObjectId(1)).with_position(Vec3::new(1.0, 0.0, 1.0)));
        let mut anims = AnimationState::new();
        let orbit = Effect::orbit(scene.get(id).unwrap(), 2.0, 1.0);
        anims.add(id, orbit);
        for _ in 0..30 {
            anims.tick(DT, &mut scene, Vec3::ZERO, 30.0);
        }
        let pos = scene.get(id).unwrap().position;
        let flat = Vec3::new(pos.x - 1.0, 0.0, pos.z - 1.0);
        assert!((flat.length() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn burst_removes_itself_after_particles_die() {
        let mut rng = Rng::new(9);
        let (mut scene, id) = scene_with(SceneObject::new(ObjectId(1)));
        let mut anims = AnimationState::new();
        let effect = Effect::particle_burst(scene.get(id).unwrap(), Vec3::X, 10, &mut rng);
        anims.add(id, effect);
        assert_eq!(anims.particles().count(), 10);
        for _ in 0..90 {
            anims.tick(DT, &mut scene, Vec3::ZERO, 30.0);
        }
        assert!(anims.is_empty());
    }

    #[test]
    fn stop_particles_keeps_motion_effects() {
        let (mut scene, id) = scene_with(SceneObject::new(ObjectId(1)));
        let mut anims = AnimationState::new();
        anims.add(id, Effect::spin(Axis::X, 1.0));
        anims.add(id, Effect::trail(Vec3::ONE));
        anims.tick(DT, &mut scene, Vec3::ZERO, 30.0);
        assert_eq!(anims.particles().count(), 1);

        anims.stop_particles(id);
        assert_eq!(anims.len(), 1);
        assert_eq!(anims.particles().count(), 0);
    }

    #[test]
    fn records_for_removed_objects_are_dropped() {
        let (mut scene, id) = scene_with(SceneObject::new(ObjectId(1)));
        let mut anims = AnimationState::new();
        anims.add(id, Effect::spin(Axis::Y, 1.0));
        scene.despawn(id);
        anims.tick(DT, &mut scene, Vec3::ZERO, 30.0);
        assert!(anims.is_empty());
    }
}

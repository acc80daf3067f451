//! Player controller: kinematic movement, gravity and axis-aligned box
//! collision against scene objects. No rigid-body solver; every rule here is
//! a heuristic over AABBs.

use glam::{Vec2, Vec3};

use crate::api::config::{ControlScheme, KeyBindings, RunConfig, RunSettings};
use crate::api::types::ObjectId;
use crate::core::scene::Scene;
use crate::input::queue::InputState;

/// Half size of the player's collision box. The player position is its centre.
pub const PLAYER_HALF_EXTENTS: Vec3 = Vec3::new(0.4, 0.9, 0.4);
/// How far below a box's top face the player's feet may sink and still land on it.
pub const LANDING_BAND: f32 = 0.5;
/// Point-click steering stops within this distance of the target.
pub const ARRIVE_RADIUS: f32 = 0.3;
/// Pitch limit so the look vector never aligns with world up.
pub const MAX_PITCH: f32 = 1.55;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap on all three axes (touching faces do not count).
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmplt(other.max).all() && self.max.cmpgt(other.min).all()
    }

    /// Strict overlap of the X/Z footprints.
    pub fn overlaps_xz(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

/// Player kinematic state. Owned by the physics step; scripts only touch
/// it through teleport/launch/speed commands.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Heading in radians; 0 faces -Z.
    pub yaw: f32,
    /// Look elevation in radians; positive looks up.
    pub pitch: f32,
    pub speed: f32,
    pub jump_force: f32,
    pub gravity: f32,
    pub sensitivity: f32,
    pub grounded: bool,
    pub scheme: ControlScheme,
    /// Respawn location after falling through the death plane.
    pub spawn_point: Vec3,
    /// Point-click destination, cleared on arrival.
    pub move_target: Option<Vec3>,
}

impl PlayerState {
    pub fn new(spawn_point: Vec3, settings: &RunSettings, gravity: f32) -> Self {
        Self {
            position: spawn_point,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            speed: settings.speed,
            jump_force: settings.jump_force,
            gravity,
            sensitivity: settings.sensitivity,
            grounded: false,
            scheme: settings.control_scheme,
            spawn_point,
            move_target: None,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, PLAYER_HALF_EXTENTS)
    }

    /// Teleport back to the spawn point and stop.
    pub fn respawn(&mut self) {
        self.position = self.spawn_point;
        self.velocity = Vec3::ZERO;
        self.grounded = false;
        self.move_target = None;
    }

    /// Unit look vector from yaw and pitch.
    pub fn look_direction(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(-sy * cp, sp, -cy * cp)
    }

    /// Apply pointer movement (pixels) to yaw/pitch.
    pub fn apply_look(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        self.yaw -= delta.x * self.sensitivity;
        self.pitch = (self.pitch - delta.y * self.sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(Vec3::ZERO, &RunSettings::default(), RunConfig::default().gravity)
    }
}

/// Movement intent for one physics step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveInput {
    /// +1 forward, -1 backward.
    pub forward: f32,
    /// +1 right, -1 left.
    pub right: f32,
    pub jump: bool,
}

impl MoveInput {
    pub fn from_keys(input: &InputState, keys: &KeyBindings) -> Self {
        let axis = |pos: &str, neg: &str| {
            (input.is_held(pos) as i32 - input.is_held(neg) as i32) as f32
        };
        Self {
            forward: axis(&keys.forward, &keys.backward),
            right: axis(&keys.right, &keys.left),
            jump: input.is_held(&keys.jump),
        }
    }
}

/// Advance the player one fixed step: move, fall, collide, clamp, respawn.
pub fn step_player(
    player: &mut PlayerState,
    input: &MoveInput,
    scene: &Scene,
    config: &RunConfig,
    dt: f32,
) {
    let displacement = horizontal_displacement(player, input, dt);

    if input.jump && player.grounded {
        player.velocity.y = player.jump_force;
        player.grounded = false;
    }
    player.velocity.y -= player.gravity * dt;

    player.position.x += displacement.x;
    player.position.z += displacement.z;
    player.position.y += player.velocity.y * dt;
    if dt > 0.0 {
        player.velocity.x = displacement.x / dt;
        player.velocity.z = displacement.z / dt;
    }

    resolve_collisions(player, scene);

    if config.ground_plane {
        let floor = PLAYER_HALF_EXTENTS.y;
        if player.position.y < floor {
            player.position.y = floor;
            player.velocity.y = player.velocity.y.max(0.0);
            player.grounded = true;
        }
    }

    if player.position.y < config.death_plane_y {
        log::debug!("player fell below death plane, respawning");
        player.respawn();
    }
}

/// Desired horizontal movement for this step under the active control scheme.
fn horizontal_displacement(player: &mut PlayerState, input: &MoveInput, dt: f32) -> Vec3 {
    let step = player.speed * dt;
    match player.scheme {
        ControlScheme::FirstPerson | ControlScheme::ThirdPerson => {
            let (s, c) = player.yaw.sin_cos();
            let forward = Vec3::new(-s, 0.0, -c);
            let right = Vec3::new(c, 0.0, -s);
            (forward * input.forward + right * input.right).normalize_or_zero() * step
        }
        ControlScheme::TopDown => {
            (Vec3::NEG_Z * input.forward + Vec3::X * input.right).normalize_or_zero() * step
        }
        ControlScheme::PointClick => {
            let Some(target) = player.move_target else {
                return Vec3::ZERO;
            };
            let mut to_target = target - player.position;
            to_target.y = 0.0;
            let distance = to_target.length();
            if distance < ARRIVE_RADIUS {
                player.move_target = None;
                return Vec3::ZERO;
            }
            to_target / distance * step.min(distance)
        }
    }
}

/// Resolve the player's box against every collidable, visible object.
///
/// Per object, first rule that applies wins:
/// 1. falling with feet inside the landing band under the top face → stand on it;
/// 2. rising with head just past the bottom face → bonk, stop rising;
/// 3. vertical overlap → push out along X or Z, whichever overlaps less.
pub fn resolve_collisions(player: &mut PlayerState, scene: &Scene) {
    player.grounded = false;
    let half = PLAYER_HALF_EXTENTS;

    for object in scene.iter().filter(|o| o.collidable && o.visible) {
        let bounds = object.aabb();
        let body = player.aabb();
        if !body.overlaps_xz(&bounds) {
            continue;
        }
        let feet = body.min.y;
        let head = body.max.y;

        if player.velocity.y <= 0.0 && feet <= bounds.max.y && feet >= bounds.max.y - LANDING_BAND {
            player.position.y = bounds.max.y + half.y;
            player.velocity.y = 0.0;
            player.grounded = true;
        } else if player.velocity.y > 0.0 && head >= bounds.min.y && head <= bounds.min.y + LANDING_BAND {
            player.position.y = bounds.min.y - half.y;
            player.velocity.y = 0.0;
        } else if feet < bounds.max.y && head > bounds.min.y {
            push_out(player, &body, &bounds);
        }
    }
}

fn push_out(player: &mut PlayerState, body: &Aabb, bounds: &Aabb) {
    let to_pos_x = bounds.max.x - body.min.x;
    let to_neg_x = body.max.x - bounds.min.x;
    let to_pos_z = bounds.max.z - body.min.z;
    let to_neg_z = body.max.z - bounds.min.z;

    if to_pos_x.min(to_neg_x) <= to_pos_z.min(to_neg_z) {
        if to_neg_x < to_pos_x {
            player.position.x -= to_neg_x;
        } else {
            player.position.x += to_pos_x;
        }
    } else if to_neg_z < to_pos_z {
        player.position.z -= to_neg_z;
    } else {
        player.position.z += to_pos_z;
    }
}

/// Visible objects whose centre lies within `radius` of the player centre.
pub fn nearby_objects(player: &PlayerState, scene: &Scene, radius: f32) -> Vec<ObjectId> {
    scene
        .iter()
        .filter(|o| o.visible && o.position.distance(player.position) <= radius)
        .map(|o| o.id)
        .collect()
}

use glam::{Mat4, Vec2, Vec3};

use crate::api::config::ControlScheme;
use crate::core::physics::PlayerState;
use crate::extensions::easing::lerp_vec3;

/// Eye offset above the player centre in first person.
pub const EYE_HEIGHT: f32 = 0.7;
/// Boom length behind the player in third person.
pub const THIRD_PERSON_DISTANCE: f32 = 6.0;
/// Height above the player in top-down view.
pub const TOP_DOWN_HEIGHT: f32 = 20.0;
/// Fixed isometric-ish offset for point-and-click.
pub const POINT_CLICK_OFFSET: Vec3 = Vec3::new(0.0, 10.0, 10.0);
/// `smoothing` is the share of the remaining distance kept per 1/60 s.
const SMOOTHING_RATE: f32 = 60.0;

/// Perspective camera driven by the player each frame.
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Viewport width / height.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Follow smoothing for point-and-click (0.0 = instant, 1.0 = never moves).
    /// Scaled by frame time, so the follow speed is the same at any frame rate.
    pub smoothing: f32,
}

impl Camera3D {
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 5.0),
            target: Vec3::ZERO,
            fov_y: 75f32.to_radians(),
            aspect,
            near: 0.1,
            far: 1000.0,
            smoothing: 0.9,
        }
    }

    /// Place the camera for the player's control scheme after `dt` seconds.
    pub fn follow(&mut self, player: &PlayerState, dt: f32) {
        let keep = self.smoothing.clamp(0.0, 1.0).powf(dt.max(0.0) * SMOOTHING_RATE);
        self.place(player, keep);
    }

    /// Jump straight to the follow pose without smoothing (run start).
    pub fn snap_to(&mut self, player: &PlayerState) {
        self.place(player, 0.0);
    }

    /// `keep` is the share of the point-click distance left to cover.
    fn place(&mut self, player: &PlayerState, keep: f32) {
        let p = player.position;
        match player.scheme {
            ControlScheme::FirstPerson => {
                self.position = p + Vec3::Y * EYE_HEIGHT;
                self.target = self.position + player.look_direction();
            }
            ControlScheme::ThirdPerson => {
                let (sy, cy) = player.yaw.sin_cos();
                let (sp, cp) = player.pitch.sin_cos();
                let boom = Vec3::new(sy * cp, -sp, cy * cp) * THIRD_PERSON_DISTANCE;
                self.target = p + Vec3::Y;
                self.position = self.target + boom + Vec3::Y * 1.5;
            }
            ControlScheme::TopDown => {
                // Small Z offset keeps the view direction off the up axis.
                self.position = p + Vec3::new(0.0, TOP_DOWN_HEIGHT, 0.01);
                self.target = p;
            }
            ControlScheme::PointClick => {
                let desired = p + POINT_CLICK_OFFSET;
                self.position = lerp_vec3(desired, self.position, keep);
                self.target = p;
            }
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world point to viewport pixels (origin top-left).
    /// Returns None for points behind the camera.
    pub fn project(&self, world: Vec3, viewport: Vec2) -> Option<Vec2> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.x,
            (1.0 - ndc.y) * 0.5 * viewport.y,
        ))
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }
}

impl Default for Camera3D {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

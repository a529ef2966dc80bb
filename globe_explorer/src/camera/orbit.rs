//! OrbitCamera component and system: drag to rotate, scroll to zoom, damped.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;

/// Pixels of trackpad scroll that count as one wheel line.
const PIXELS_PER_LINE: f32 = 100.0;

/// Set by the UI while the pointer is over a panel so the camera ignores it.
#[derive(Resource, Default)]
pub struct PointerOverUi(pub bool);

/// Orbits the origin on a sphere. `polar` is measured from +Y.
#[derive(Component, Clone, Debug)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub polar: f32,
    pub distance: f32,
    /// Fraction of the pending rotation applied per 60 Hz frame.
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    /// Scale per wheel line.
    pub zoom_step: f32,
    pending_yaw: f32,
    pending_polar: f32,
}

impl OrbitCamera {
    pub fn from_position(position: Vec3) -> Self {
        let distance = position.length().max(f32::EPSILON);
        let mut camera = Self {
            yaw: position.x.atan2(position.z),
            polar: (position.y / distance).clamp(-1.0, 1.0).acos(),
            distance,
            damping: 0.05,
            min_distance: 10.0,
            max_distance: 20.0,
            min_polar: FRAC_PI_4,
            max_polar: FRAC_PI_2,
            zoom_step: 0.95,
            pending_yaw: 0.0,
            pending_polar: 0.0,
        };
        camera.clamp();
        camera
    }

    /// Queues a rotation from a pointer drag. `viewport_height` maps one full
    /// screen height of drag to a full turn.
    pub fn drag(&mut self, delta: Vec2, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.pending_yaw -= TAU * delta.x / height;
        self.pending_polar -= TAU * delta.y / height;
    }

    /// Zooms immediately; positive `lines` moves closer.
    pub fn zoom(&mut self, lines: f32) {
        self.distance *= self.zoom_step.powf(lines);
        self.clamp();
    }

    /// Applies part of the pending rotation and decays the rest.
    pub fn step(&mut self, dt: f32) {
        let keep = (1.0 - self.damping).powf(dt * 60.0);
        let applied = 1.0 - keep;
        self.yaw += self.pending_yaw * applied;
        self.polar += self.pending_polar * applied;
        self.pending_yaw *= keep;
        self.pending_polar *= keep;
        self.clamp();
    }

    fn clamp(&mut self) {
        self.polar = self.polar.clamp(self.min_polar, self.max_polar);
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
    }

    pub fn translation(&self) -> Vec3 {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        self.distance * Vec3::new(sin_polar * sin_yaw, cos_polar, sin_polar * cos_yaw)
    }
}

pub fn orbit_camera_plugin(app: &mut App) {
    app.init_resource::<PointerOverUi>()
        .add_systems(Update, orbit_camera_system);
}

fn orbit_camera_system(
    time: Res<Time>,
    buttons: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    scroll: Res<AccumulatedMouseScroll>,
    pointer_over_ui: Res<PointerOverUi>,
    windows: Query<&Window>,
    mut cameras: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    let height = windows
        .get_single()
        .map_or(720.0, |window| window.resolution.height());

    for (mut orbit, mut transform) in &mut cameras {
        if !pointer_over_ui.0 {
            if buttons.pressed(MouseButton::Left) && motion.delta != Vec2::ZERO {
                orbit.drag(motion.delta, height);
            }
            if scroll.delta.y != 0.0 {
                let lines = match scroll.unit {
                    MouseScrollUnit::Line => scroll.delta.y,
                    MouseScrollUnit::Pixel => scroll.delta.y / PIXELS_PER_LINE,
                };
                orbit.zoom(lines);
            }
        }
        orbit.step(time.delta_secs());
        *transform = Transform::from_translation(orbit.translation()).looking_at(Vec3::ZERO, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: Vec3 = Vec3::new(0.0, 10.0, 15.0);

    #[test]
    fn starting_position_round_trips() {
        let orbit = OrbitCamera::from_position(START);
        assert!(orbit.translation().abs_diff_eq(START, 1e-4));
    }

    #[test]
    fn zoom_is_clamped_to_the_distance_range() {
        let mut orbit = OrbitCamera::from_position(START);
        orbit.zoom(100.0);
        assert_eq!(orbit.distance, 10.0);
        orbit.zoom(-100.0);
        assert_eq!(orbit.distance, 20.0);
    }

    #[test]
    fn polar_angle_stays_between_quarter_and_half_pi() {
        let mut orbit = OrbitCamera::from_position(START);
        orbit.drag(Vec2::new(0.0, 10_000.0), 720.0);
        for _ in 0..600 {
            orbit.step(1.0 / 60.0);
        }
        assert!((orbit.polar - FRAC_PI_4).abs() < 1e-6);

        orbit.drag(Vec2::new(0.0, -100_000.0), 720.0);
        for _ in 0..600 {
            orbit.step(1.0 / 60.0);
        }
        assert!((orbit.polar - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn damping_spreads_a_drag_over_several_frames() {
        let mut orbit = OrbitCamera::from_position(START);
        let yaw0 = orbit.yaw;
        orbit.drag(Vec2::new(-72.0, 0.0), 720.0);

        orbit.step(1.0 / 60.0);
        let after_one = orbit.yaw - yaw0;
        for _ in 0..2000 {
            orbit.step(1.0 / 60.0);
        }
        let settled = orbit.yaw - yaw0;

        assert!(after_one > 0.0 && after_one < settled);
        assert!((settled - TAU * 0.1).abs() < 1e-3);
    }

    #[test]
    fn camera_never_pans_off_the_origin() {
        let mut orbit = OrbitCamera::from_position(START);
        orbit.drag(Vec2::new(300.0, 40.0), 720.0);
        orbit.step(1.0);
        let look = Transform::from_translation(orbit.translation()).looking_at(Vec3::ZERO, Vec3::Y);
        let toward_origin = (-look.translation).normalize();
        assert!(look.forward().as_vec3().abs_diff_eq(toward_origin, 1e-4));
    }
}

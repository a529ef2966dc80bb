//! Marker factory: points, haloed points, and pulsating location glyphs.

use std::f32::consts::TAU;

use bevy::prelude::*;

use crate::geo::GeoPoint;
use crate::scene::globe::GlobeContext;

const POINT_RADIUS: f32 = 0.02;
const HALO_RADIUS: f32 = 0.04;
const GLYPH_SIZE: (f32, f32) = (0.12, 0.18);
const GLOW_RADIUS: f32 = 0.09;
const PULSE_ALTITUDE: f32 = 0.05;
const PULSE_SPEED: f32 = 3.0;

const POINT_COLOR: Color = Color::srgb(0.0, 1.0, 0.0);
const GLYPH_COLOR: Color = Color::srgb(1.0, 0.55, 0.1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerStyle {
    /// Solid point.
    Point,
    /// Solid point wrapped in a faint additive glow.
    Halo,
    /// Rhombus glyph with an animated glow.
    Pulsating,
}

#[derive(Component, Clone, Debug)]
pub struct Marker {
    pub point: GeoPoint,
    pub style: MarkerStyle,
}

/// Hover metadata shown by the tooltip.
#[derive(Component, Clone, Debug, PartialEq)]
pub struct MarkerLabel {
    pub country: String,
    pub connected_count: Option<u32>,
}

impl MarkerLabel {
    pub fn unknown_count(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            connected_count: None,
        }
    }

    pub fn lines(&self) -> [String; 2] {
        let count = self
            .connected_count
            .map_or_else(|| "unknown".to_string(), |n| n.to_string());
        [format!("Country: {}", self.country), format!("Connected: {count}")]
    }
}

/// Animated glow state. One system advances every `Pulse`; despawning the
/// marker removes it from the animation.
#[derive(Component, Debug)]
pub struct Pulse {
    pub phase: f32,
    pub speed: f32,
    pub base_scale: f32,
}

impl Pulse {
    pub fn advance(&mut self, dt: f32) {
        self.phase = (self.phase + dt * self.speed) % TAU;
    }
}

/// Normalized pulse strength in [0, 1].
pub fn pulse_factor(phase: f32) -> f32 {
    0.5 + 0.5 * phase.sin()
}

/// Meshes and materials shared by every marker of a globe.
pub(crate) struct MarkerAssets {
    point_mesh: Handle<Mesh>,
    halo_mesh: Handle<Mesh>,
    glyph_mesh: Handle<Mesh>,
    glow_mesh: Handle<Mesh>,
    point_material: Handle<StandardMaterial>,
    halo_material: Handle<StandardMaterial>,
    glyph_material: Handle<StandardMaterial>,
}

impl MarkerAssets {
    pub(crate) fn new(meshes: &mut Assets<Mesh>, materials: &mut Assets<StandardMaterial>) -> Self {
        Self {
            point_mesh: meshes.add(Sphere::new(POINT_RADIUS).mesh().uv(8, 8)),
            halo_mesh: meshes.add(Sphere::new(HALO_RADIUS).mesh().uv(8, 8)),
            glyph_mesh: meshes.add(Rhombus::new(GLYPH_SIZE.0, GLYPH_SIZE.1)),
            glow_mesh: meshes.add(Sphere::new(GLOW_RADIUS).mesh().uv(16, 16)),
            point_material: materials.add(StandardMaterial {
                base_color: POINT_COLOR,
                unlit: true,
                ..default()
            }),
            halo_material: materials.add(StandardMaterial {
                base_color: POINT_COLOR.with_alpha(0.3),
                unlit: true,
                alpha_mode: AlphaMode::Add,
                ..default()
            }),
            glyph_material: materials.add(StandardMaterial {
                base_color: GLYPH_COLOR,
                emissive: LinearRgba::rgb(1.5, 0.6, 0.1),
                unlit: true,
                double_sided: true,
                cull_mode: None,
                ..default()
            }),
        }
    }
}

/// Builds a marker at `point` and attaches it to the globe root.
pub fn spawn_marker(
    commands: &mut Commands,
    ctx: &GlobeContext,
    materials: &mut Assets<StandardMaterial>,
    point: GeoPoint,
    style: MarkerStyle,
    label: Option<MarkerLabel>,
) -> Entity {
    let assets = &ctx.markers;
    let altitude = match style {
        MarkerStyle::Point | MarkerStyle::Halo => 0.0,
        MarkerStyle::Pulsating => PULSE_ALTITUDE,
    };
    let position = point.to_globe(altitude);
    let outward = position.normalize_or(Vec3::Y);

    let mut marker = commands.spawn((
        Marker { point, style },
        Transform::from_translation(position)
            .with_rotation(Quat::from_rotation_arc(Vec3::Z, outward)),
        Visibility::Visible,
    ));
    if let Some(label) = label {
        marker.insert(label);
    }

    marker.with_children(|parent| match style {
        MarkerStyle::Point => {
            parent.spawn((
                Mesh3d(assets.point_mesh.clone()),
                MeshMaterial3d(assets.point_material.clone()),
            ));
        }
        MarkerStyle::Halo => {
            parent.spawn((
                Mesh3d(assets.point_mesh.clone()),
                MeshMaterial3d(assets.point_material.clone()),
            ));
            parent.spawn((
                Mesh3d(assets.halo_mesh.clone()),
                MeshMaterial3d(assets.halo_material.clone()),
            ));
        }
        MarkerStyle::Pulsating => {
            parent.spawn((
                Mesh3d(assets.glyph_mesh.clone()),
                MeshMaterial3d(assets.glyph_material.clone()),
            ));
            // Each glow owns its material so its phase can drive the alpha.
            let glow_material = materials.add(StandardMaterial {
                base_color: GLYPH_COLOR.with_alpha(0.4),
                unlit: true,
                alpha_mode: AlphaMode::Add,
                ..default()
            });
            parent.spawn((
                Mesh3d(assets.glow_mesh.clone()),
                MeshMaterial3d(glow_material),
                Transform::default(),
                Pulse {
                    phase: 0.0,
                    speed: PULSE_SPEED,
                    base_scale: 1.0,
                },
            ));
        }
    });

    let id = marker.id();
    commands.entity(ctx.root).add_child(id);
    id
}

/// Advances every pulse from the real clock and applies scale and glow.
pub fn animate_pulses_system(
    time: Res<Time<Real>>,
    mut pulses: Query<(&mut Pulse, &mut Transform, &MeshMaterial3d<StandardMaterial>)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let dt = time.delta_secs();
    for (mut pulse, mut transform, material) in &mut pulses {
        pulse.advance(dt);
        let strength = pulse_factor(pulse.phase);
        transform.scale = Vec3::splat(pulse.base_scale * (0.8 + 0.6 * strength));
        if let Some(material) = materials.get_mut(&material.0) {
            material.base_color.set_alpha(0.15 + 0.5 * strength);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_phase_wraps() {
        let mut pulse = Pulse {
            phase: 6.0,
            speed: 1.0,
            base_scale: 1.0,
        };
        pulse.advance(1.0);
        assert!(pulse.phase < TAU);
        assert!((pulse.phase - (7.0 - TAU)).abs() < 1e-5);
    }

    #[test]
    fn pulse_factor_stays_normalized() {
        for step in 0..64 {
            let f = pulse_factor(step as f32 * 0.1);
            assert!((0.0..=1.0).contains(&f));
        }
    }

    #[test]
    fn label_without_count_reads_unknown() {
        let label = MarkerLabel::unknown_count("NL");
        assert_eq!(label.lines(), ["Country: NL".to_string(), "Connected: unknown".to_string()]);
    }

    #[test]
    fn label_with_count_prints_it() {
        let label = MarkerLabel {
            country: "JP".into(),
            connected_count: Some(3),
        };
        assert_eq!(label.lines()[1], "Connected: 3");
    }
}

//! Marker tooltip: one shared egui surface driven by a pointer hit-test.
//!
//! Hover is resolved with a ray-sphere test per labeled marker; egui owns the
//! pointer, so mesh picking stays off.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::geo::GLOBE_RADIUS;
use crate::scene::{AlertState, GlobeRoot, MarkerLabel};

/// Hit radius around a labeled marker, in globe units.
const PICK_RADIUS: f32 = 0.15;
const CURSOR_OFFSET: f32 = 14.0;

/// Result of the latest pointer hit-test.
#[derive(Resource, Default, Debug)]
pub struct HoveredMarker {
    pub entity: Option<Entity>,
    pub cursor: Vec2,
}

pub fn tooltip_plugin(app: &mut App) {
    app.init_resource::<HoveredMarker>()
        .add_systems(Update, (hover_hit_test_system, tooltip_system).chain());
}

fn hover_hit_test_system(
    mut moved: EventReader<CursorMoved>,
    cameras: Query<(&Camera, &GlobalTransform)>,
    globes: Query<&GlobalTransform, With<GlobeRoot>>,
    markers: Query<(Entity, &GlobalTransform), With<MarkerLabel>>,
    mut hovered: ResMut<HoveredMarker>,
) {
    let Some(cursor) = moved.read().last().map(|event| event.position) else {
        return;
    };
    hovered.cursor = cursor;
    hovered.entity = None;

    let Ok((camera, cam_transform)) = cameras.get_single() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(cam_transform, cursor) else {
        return;
    };
    let origin = ray.origin;
    let dir: Vec3 = *ray.direction;

    let globe_center = globes
        .get_single()
        .map_or(Vec3::ZERO, GlobalTransform::translation);
    let globe_hit = ray_sphere_intersect(origin, dir, globe_center, GLOBE_RADIUS);

    let mut best: Option<(Entity, f32)> = None;
    for (entity, transform) in &markers {
        let Some(dist) = ray_sphere_intersect(origin, dir, transform.translation(), PICK_RADIUS)
        else {
            continue;
        };
        // Behind the globe from this viewpoint.
        if globe_hit.is_some_and(|g| g < dist) {
            continue;
        }
        if best.is_none_or(|(_, d)| dist < d) {
            best = Some((entity, dist));
        }
    }
    hovered.entity = best.map(|(entity, _)| entity);
}

/// Distance along a normalized ray to its first hit on the sphere, if any.
pub fn ray_sphere_intersect(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let near = -b - root;
    let far = -b + root;
    if far < 0.0 {
        return None;
    }
    Some(near.max(0.0))
}

fn tooltip_system(
    mut contexts: EguiContexts,
    hovered: Res<HoveredMarker>,
    labels: Query<&MarkerLabel>,
    alert: Res<AlertState>,
) {
    if alert.message.is_some() {
        return;
    }
    let Some(label) = hovered.entity.and_then(|entity| labels.get(entity).ok()) else {
        return;
    };

    let pos = egui::pos2(
        hovered.cursor.x + CURSOR_OFFSET,
        hovered.cursor.y + CURSOR_OFFSET,
    );
    egui::Area::new(egui::Id::new("marker_tooltip"))
        .order(egui::Order::Tooltip)
        .fixed_pos(pos)
        .interactable(false)
        .show(contexts.ctx_mut(), |ui| {
            egui::Frame::popup(ui.style())
                .fill(egui::Color32::from_rgba_premultiplied(15, 15, 25, 230))
                .show(ui, |ui| {
                    ui.style_mut().override_text_style = Some(egui::TextStyle::Monospace);
                    for line in label.lines() {
                        ui.label(
                            egui::RichText::new(line).color(egui::Color32::from_rgb(200, 220, 240)),
                        );
                    }
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_sphere_in_front() {
        let hit = ray_sphere_intersect(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z, Vec3::ZERO, 5.0);
        assert_eq!(hit, Some(5.0));
    }

    #[test]
    fn ray_misses_offset_sphere() {
        let hit = ray_sphere_intersect(
            Vec3::new(0.0, 0.0, 10.0),
            -Vec3::Z,
            Vec3::new(3.0, 0.0, 0.0),
            1.0,
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn sphere_behind_the_ray_is_ignored() {
        let hit = ray_sphere_intersect(Vec3::new(0.0, 0.0, 10.0), Vec3::Z, Vec3::ZERO, 5.0);
        assert_eq!(hit, None);
    }

    #[test]
    fn origin_inside_sphere_hits_at_zero() {
        let hit = ray_sphere_intersect(Vec3::ZERO, Vec3::X, Vec3::ZERO, 1.0);
        assert_eq!(hit, Some(0.0));
    }

    #[test]
    fn far_side_marker_is_occluded_by_the_globe() {
        let origin = Vec3::new(0.0, 0.0, 15.0);
        let globe = ray_sphere_intersect(origin, -Vec3::Z, Vec3::ZERO, GLOBE_RADIUS).unwrap();
        let back = ray_sphere_intersect(origin, -Vec3::Z, Vec3::new(0.0, 0.0, -5.05), PICK_RADIUS)
            .unwrap();
        let front = ray_sphere_intersect(origin, -Vec3::Z, Vec3::new(0.0, 0.0, 5.05), PICK_RADIUS)
            .unwrap();
        assert!(globe < back);
        assert!(front < globe);
    }
}

//! Connection arcs: one straight line entity per connection, toggled with `V`.

use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy::render::render_asset::RenderAssetUsages;

use crate::geo::Connection;
use crate::scene::globe::GlobeContext;

const ARC_COLOR: Color = Color::srgb(1.0, 0.0, 0.0);

#[derive(Component, Clone, Debug)]
pub struct ConnectionArc {
    pub connection: Connection,
}

/// Controls arc visibility. Toggled with `V`.
#[derive(Resource)]
pub struct ArcSettings {
    pub enabled: bool,
}

impl Default for ArcSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

pub fn arc_plugin(app: &mut App) {
    app.init_resource::<ArcSettings>()
        .add_systems(Update, (toggle_arcs_system, apply_arc_visibility_system).chain());
}

pub(crate) fn arc_material(materials: &mut Assets<StandardMaterial>) -> Handle<StandardMaterial> {
    materials.add(StandardMaterial {
        base_color: ARC_COLOR,
        unlit: true,
        ..default()
    })
}

/// Two-vertex line list from `from` to `to`.
pub fn arc_mesh(from: Vec3, to: Vec3) -> Mesh {
    Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, vec![from.to_array(), to.to_array()])
}

/// Builds a straight segment between the two surface points and attaches it to the globe.
pub fn spawn_arc(
    commands: &mut Commands,
    ctx: &GlobeContext,
    meshes: &mut Assets<Mesh>,
    connection: Connection,
) -> Entity {
    let from = connection.from.to_globe(0.0);
    let to = connection.to.to_globe(0.0);
    let id = commands
        .spawn((
            ConnectionArc { connection },
            Mesh3d(meshes.add(arc_mesh(from, to))),
            MeshMaterial3d(ctx.arc_material.clone()),
            Transform::default(),
            Visibility::Visible,
        ))
        .id();
    commands.entity(ctx.root).add_child(id);
    id
}

fn toggle_arcs_system(keys: Res<ButtonInput<KeyCode>>, mut settings: ResMut<ArcSettings>) {
    if keys.just_pressed(KeyCode::KeyV) {
        settings.enabled = !settings.enabled;
    }
}

/// Applies the toggle to every arc, including ones spawned while hidden.
fn apply_arc_visibility_system(
    settings: Res<ArcSettings>,
    mut arcs: Query<&mut Visibility, With<ConnectionArc>>,
    added: Query<(), Added<ConnectionArc>>,
) {
    if !settings.is_changed() && added.is_empty() {
        return;
    }
    let visibility = if settings.enabled {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };
    for mut vis in &mut arcs {
        vis.set_if_neq(visibility);
    }
}

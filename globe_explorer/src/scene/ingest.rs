//! Scene setup, loader-event ingestion, and globe reset.

use bevy::prelude::*;

use crate::camera::OrbitCamera;
use crate::data::{FlowState, LoaderChannel, LoaderCommand, LoaderEvent};
use crate::scene::arcs::spawn_arc;
use crate::scene::globe::{GlobeContext, GlobeSettings, GlobeTextures};
use crate::scene::markers::{spawn_marker, MarkerLabel, MarkerStyle};
use crate::scene::model::{spawn_decorative_model, ModelSettings};

const MAX_EVENTS_PER_FRAME: usize = 8;
const CAMERA_START: Vec3 = Vec3::new(0.0, 10.0, 15.0);
const SUN_POSITION: Vec3 = Vec3::new(5.0, 3.0, 5.0);
const SUN_ILLUMINANCE: f32 = 3_300.0;

/// Session counters shown in the HUD.
#[derive(Resource, Default, Debug, Clone, PartialEq, Eq)]
pub struct GlobeStats {
    pub points: u32,
    pub connections: u32,
    pub located: u32,
    /// Visitors whose geolocation lookup failed.
    pub unknown: u32,
}

#[derive(Resource, Default, Debug)]
pub struct LocationFlowStatus {
    pub state: FlowState,
}

/// Static-data generation the current globe accepts. Reset bumps it so results
/// of earlier requests are dropped on arrival.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadGeneration(pub u64);

/// Queues point and connection loads tagged with `generation`.
pub fn request_static_data(channel: &LoaderChannel, generation: LoadGeneration) {
    channel.request(LoaderCommand::LoadPoints {
        generation: generation.0,
    });
    channel.request(LoaderCommand::LoadConnections {
        generation: generation.0,
    });
}

/// Pending blocking alert, if any.
#[derive(Resource, Default, Debug)]
pub struct AlertState {
    pub message: Option<String>,
}

pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
    asset_server: Res<AssetServer>,
    settings: Res<GlobeSettings>,
    model: Res<ModelSettings>,
) {
    commands.init_resource::<GlobeStats>();
    commands.init_resource::<LocationFlowStatus>();
    commands.init_resource::<AlertState>();
    commands.init_resource::<LoadGeneration>();

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 75f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            ..default()
        }),
        Transform::from_translation(CAMERA_START).looking_at(Vec3::ZERO, Vec3::Y),
        OrbitCamera::from_position(CAMERA_START),
    ));
    commands.insert_resource(AmbientLight {
        color: Color::srgb_u8(0x40, 0x40, 0x40),
        brightness: 150.0,
    });
    spawn_sun(&mut commands);

    let ctx = assemble_globe(
        &mut commands,
        &mut meshes,
        &mut materials,
        &mut graphs,
        &asset_server,
        &settings,
        &model,
    );
    commands.insert_resource(ctx);
}

/// Scene-level key light. It is not part of the globe, so it stays put while
/// the globe spins and survives a reset.
fn spawn_sun(commands: &mut Commands) -> Entity {
    commands
        .spawn((
            DirectionalLight {
                illuminance: SUN_ILLUMINANCE,
                ..default()
            },
            Transform::from_translation(SUN_POSITION).looking_at(Vec3::ZERO, Vec3::Y),
        ))
        .id()
}

fn assemble_globe(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    graphs: &mut Assets<AnimationGraph>,
    asset_server: &AssetServer,
    settings: &GlobeSettings,
    model: &ModelSettings,
) -> GlobeContext {
    let textures = GlobeTextures::load(asset_server, settings);
    let ctx = GlobeContext::init(commands, meshes, materials, settings, &textures);
    if let Some(model) = &model.0 {
        spawn_decorative_model(commands, &ctx, asset_server, graphs, model);
    }
    ctx
}

/// Drains a bounded number of loader events per frame and turns them into scene entities.
#[allow(clippy::too_many_arguments)]
pub fn ingest_loader_events(
    mut commands: Commands,
    channel: Res<LoaderChannel>,
    ctx: Res<GlobeContext>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut stats: ResMut<GlobeStats>,
    mut flow: ResMut<LocationFlowStatus>,
    mut alert: ResMut<AlertState>,
    current: Res<LoadGeneration>,
) {
    for event in channel.events.try_iter().take(MAX_EVENTS_PER_FRAME) {
        match event {
            LoaderEvent::Points { generation, .. } | LoaderEvent::Connections { generation, .. }
                if generation != current.0 =>
            {
                debug!(generation, current = current.0, "dropping static data from before reset");
            }
            LoaderEvent::Points { points, .. } => {
                for point in points {
                    spawn_marker(
                        &mut commands,
                        &ctx,
                        &mut materials,
                        point,
                        MarkerStyle::Halo,
                        None,
                    );
                    stats.points += 1;
                }
            }
            LoaderEvent::Connections { connections, .. } => {
                for connection in connections {
                    spawn_arc(&mut commands, &ctx, &mut meshes, connection);
                    stats.connections += 1;
                }
            }
            LoaderEvent::Location(location) => {
                spawn_marker(
                    &mut commands,
                    &ctx,
                    &mut materials,
                    location.point,
                    MarkerStyle::Pulsating,
                    Some(MarkerLabel::unknown_count(location.country)),
                );
                stats.located += 1;
            }
            LoaderEvent::LocationUnknown => {
                stats.unknown += 1;
            }
            LoaderEvent::Flow(next) => {
                if flow.state.can_transition_to(next) {
                    flow.state = next;
                } else {
                    warn!(from = %flow.state, to = %next, "ignoring out-of-order flow update");
                }
            }
            LoaderEvent::Alert(message) => {
                alert.message = Some(message);
            }
        }
    }
}

/// `R` disposes the globe, assembles a fresh one, and reloads the static data
/// under a new generation.
#[allow(clippy::too_many_arguments)]
pub fn reset_globe_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut commands: Commands,
    ctx: Res<GlobeContext>,
    channel: Res<LoaderChannel>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
    asset_server: Res<AssetServer>,
    settings: Res<GlobeSettings>,
    model: Res<ModelSettings>,
    mut stats: ResMut<GlobeStats>,
    mut generation: ResMut<LoadGeneration>,
) {
    if !keys.just_pressed(KeyCode::KeyR) {
        return;
    }
    info!("resetting globe");
    ctx.dispose(&mut commands);
    let fresh = assemble_globe(
        &mut commands,
        &mut meshes,
        &mut materials,
        &mut graphs,
        &asset_server,
        &settings,
        &model,
    );
    commands.insert_resource(fresh);
    let unknown = stats.unknown;
    *stats = GlobeStats {
        unknown,
        ..default()
    };
    generation.0 += 1;
    request_static_data(&channel, *generation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::VisitorLocation;
    use crate::geo::{Connection, GeoPoint};
    use crate::scene::arcs::ConnectionArc;
    use crate::scene::markers::{Marker, Pulse};
    use bevy::ecs::system::RunSystemOnce;
    use crossbeam_channel::Sender;

    fn init_context(
        mut commands: Commands,
        mut meshes: ResMut<Assets<Mesh>>,
        mut materials: ResMut<Assets<StandardMaterial>>,
    ) {
        let ctx = GlobeContext::init(
            &mut commands,
            &mut meshes,
            &mut materials,
            &GlobeSettings::default(),
            &GlobeTextures::default(),
        );
        commands.insert_resource(ctx);
    }

    fn ingest_app() -> (App, Sender<LoaderEvent>) {
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let (command_tx, _command_rx) = crossbeam_channel::unbounded();

        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .init_resource::<GlobeStats>()
            .init_resource::<LocationFlowStatus>()
            .init_resource::<AlertState>()
            .init_resource::<LoadGeneration>()
            .insert_resource(LoaderChannel {
                events: event_rx,
                commands: command_tx,
            })
            .add_systems(Startup, init_context)
            .add_systems(Update, ingest_loader_events);
        app.update();
        (app, event_tx)
    }

    fn count<C: Component>(app: &mut App) -> usize {
        let world = app.world_mut();
        world.query::<&C>().iter(world).count()
    }

    #[test]
    fn points_become_markers_under_the_globe() {
        let (mut app, tx) = ingest_app();
        tx.send(LoaderEvent::Points {
            generation: 0,
            points: vec![GeoPoint::new(40.7, -74.0), GeoPoint::new(-33.9, 151.2)],
        })
        .unwrap();

        app.update();

        assert_eq!(count::<Marker>(&mut app), 2);
        assert_eq!(app.world().resource::<GlobeStats>().points, 2);

        let root = app.world().resource::<GlobeContext>().root;
        let world = app.world_mut();
        let parented = world
            .query_filtered::<&Parent, With<Marker>>()
            .iter(world)
            .all(|parent| parent.get() == root);
        assert!(parented);
    }

    #[test]
    fn connections_become_arcs() {
        let (mut app, tx) = ingest_app();
        tx.send(LoaderEvent::Connections {
            generation: 0,
            connections: vec![Connection {
                from: GeoPoint::new(51.5, -0.1),
                to: GeoPoint::new(35.7, 139.7),
            }],
        })
        .unwrap();

        app.update();

        assert_eq!(count::<ConnectionArc>(&mut app), 1);
        assert_eq!(app.world().resource::<GlobeStats>().connections, 1);
    }

    #[test]
    fn empty_payloads_add_nothing() {
        let (mut app, tx) = ingest_app();
        tx.send(LoaderEvent::Points {
            generation: 0,
            points: Vec::new(),
        })
        .unwrap();
        tx.send(LoaderEvent::Connections {
            generation: 0,
            connections: Vec::new(),
        })
        .unwrap();

        app.update();

        assert_eq!(count::<Marker>(&mut app), 0);
        assert_eq!(count::<ConnectionArc>(&mut app), 0);
    }

    #[test]
    fn location_spawns_a_labeled_pulsating_marker() {
        let (mut app, tx) = ingest_app();
        tx.send(LoaderEvent::Location(VisitorLocation {
            point: GeoPoint::new(48.85, 2.35),
            country: "FR".into(),
        }))
        .unwrap();

        app.update();

        let world = app.world_mut();
        let labels: Vec<MarkerLabel> = world
            .query::<&MarkerLabel>()
            .iter(world)
            .cloned()
            .collect();
        assert_eq!(labels, vec![MarkerLabel::unknown_count("FR")]);
        assert_eq!(count::<Pulse>(&mut app), 1);
        assert_eq!(app.world().resource::<GlobeStats>().located, 1);
    }

    #[test]
    fn failed_lookup_increments_unknown_without_a_marker() {
        let (mut app, tx) = ingest_app();
        tx.send(LoaderEvent::LocationUnknown).unwrap();

        app.update();

        assert_eq!(app.world().resource::<GlobeStats>().unknown, 1);
        assert_eq!(count::<Marker>(&mut app), 0);
    }

    #[test]
    fn flow_updates_and_alerts_are_recorded() {
        let (mut app, tx) = ingest_app();
        tx.send(LoaderEvent::Flow(FlowState::Connecting)).unwrap();
        tx.send(LoaderEvent::Alert("no wallet".into())).unwrap();
        tx.send(LoaderEvent::Flow(FlowState::Rejected)).unwrap();

        app.update();

        assert_eq!(
            app.world().resource::<LocationFlowStatus>().state,
            FlowState::Rejected
        );
        assert_eq!(
            app.world().resource::<AlertState>().message.as_deref(),
            Some("no wallet")
        );
    }

    #[test]
    fn out_of_order_flow_update_is_ignored() {
        let (mut app, tx) = ingest_app();
        tx.send(LoaderEvent::Flow(FlowState::LocationFetched)).unwrap();

        app.update();

        assert_eq!(
            app.world().resource::<LocationFlowStatus>().state,
            FlowState::Disconnected
        );
    }

    #[test]
    fn dispose_removes_markers_and_arcs() {
        let (mut app, tx) = ingest_app();
        tx.send(LoaderEvent::Points {
            generation: 0,
            points: vec![GeoPoint::new(1.0, 2.0)],
        })
        .unwrap();
        tx.send(LoaderEvent::Location(VisitorLocation {
            point: GeoPoint::new(3.0, 4.0),
            country: "KE".into(),
        }))
        .unwrap();
        app.update();
        assert_eq!(count::<Marker>(&mut app), 2);

        app.world_mut()
            .run_system_once(|mut commands: Commands, ctx: Res<GlobeContext>| {
                ctx.dispose(&mut commands);
            })
            .unwrap();

        assert_eq!(count::<Marker>(&mut app), 0);
        assert_eq!(count::<Pulse>(&mut app), 0);
    }

    #[test]
    fn static_data_from_before_a_reset_is_dropped() {
        let (mut app, tx) = ingest_app();
        app.world_mut().resource_mut::<LoadGeneration>().0 = 1;
        let stale = vec![GeoPoint::new(40.7, -74.0), GeoPoint::new(-33.9, 151.2)];
        tx.send(LoaderEvent::Points {
            generation: 0,
            points: stale.clone(),
        })
        .unwrap();
        tx.send(LoaderEvent::Connections {
            generation: 0,
            connections: vec![Connection {
                from: stale[0],
                to: stale[1],
            }],
        })
        .unwrap();
        tx.send(LoaderEvent::Points {
            generation: 1,
            points: stale,
        })
        .unwrap();

        app.update();

        assert_eq!(count::<Marker>(&mut app), 2);
        assert_eq!(count::<ConnectionArc>(&mut app), 0);
        let stats = app.world().resource::<GlobeStats>();
        assert_eq!(stats.points, 2);
        assert_eq!(stats.connections, 0);
    }

    #[test]
    fn static_data_requests_carry_the_generation() {
        let (_event_tx, event_rx) = crossbeam_channel::unbounded();
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let channel = LoaderChannel {
            events: event_rx,
            commands: command_tx,
        };

        request_static_data(&channel, LoadGeneration(3));

        let commands: Vec<LoaderCommand> = command_rx.try_iter().collect();
        assert_eq!(
            commands,
            vec![
                LoaderCommand::LoadPoints { generation: 3 },
                LoaderCommand::LoadConnections { generation: 3 },
            ]
        );
    }

    #[test]
    fn sun_outlives_a_disposed_globe() {
        let (mut app, _tx) = ingest_app();
        let sun = app
            .world_mut()
            .run_system_once(|mut commands: Commands| spawn_sun(&mut commands))
            .unwrap();
        assert_eq!(count::<DirectionalLight>(&mut app), 3);

        app.world_mut()
            .run_system_once(|mut commands: Commands, ctx: Res<GlobeContext>| {
                ctx.dispose(&mut commands);
            })
            .unwrap();

        assert_eq!(count::<DirectionalLight>(&mut app), 1);
        let transform = app.world().get::<Transform>(sun).unwrap();
        assert_eq!(transform.translation, SUN_POSITION);
        assert!(app.world().get::<Parent>(sun).is_none());
    }
}

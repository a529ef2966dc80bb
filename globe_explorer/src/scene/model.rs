//! Decorative animated glTF model pinned to a fixed coordinate on the globe.

use bevy::prelude::*;

use crate::config::ModelConfig;
use crate::scene::globe::GlobeContext;

const MODEL_ALTITUDE: f32 = 0.3;
const MODEL_SCALE: f32 = 0.05;

/// Optional model shown on the globe. `None` disables it.
#[derive(Resource, Clone, Debug, Default)]
pub struct ModelSettings(pub Option<ModelConfig>);

/// Root of the spawned model scene, with the clip to loop once it loads.
#[derive(Component)]
pub struct DecorativeModel {
    graph: Handle<AnimationGraph>,
    clip: AnimationNodeIndex,
}

pub fn spawn_decorative_model(
    commands: &mut Commands,
    ctx: &GlobeContext,
    asset_server: &AssetServer,
    graphs: &mut Assets<AnimationGraph>,
    config: &ModelConfig,
) -> Entity {
    let (graph, clip) = AnimationGraph::from_clip(
        asset_server.load(GltfAssetLabel::Animation(0).from_asset(config.path.clone())),
    );
    let position = config.location.to_globe(MODEL_ALTITUDE);
    let outward = position.normalize_or(Vec3::Y);

    let id = commands
        .spawn((
            DecorativeModel {
                graph: graphs.add(graph),
                clip,
            },
            SceneRoot(asset_server.load(GltfAssetLabel::Scene(0).from_asset(config.path.clone()))),
            Transform::from_translation(position)
                .with_rotation(Quat::from_rotation_arc(Vec3::Y, outward))
                .with_scale(Vec3::splat(MODEL_SCALE)),
        ))
        .id();
    commands.entity(ctx.root).add_child(id);
    id
}

/// Starts the looping clip on animation players that appear under a model.
pub fn play_model_animation_system(
    mut commands: Commands,
    mut players: Query<(Entity, &mut AnimationPlayer), Added<AnimationPlayer>>,
    parents: Query<&Parent>,
    models: Query<&DecorativeModel>,
) {
    for (entity, mut player) in &mut players {
        let Some(model) = parents
            .iter_ancestors(entity)
            .find_map(|ancestor| models.get(ancestor).ok())
        else {
            continue;
        };
        player.play(model.clip).repeat();
        commands
            .entity(entity)
            .insert(AnimationGraphHandle(model.graph.clone()));
    }
}

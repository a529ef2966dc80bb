//! Globe assembly: day sphere, night-lights shell, atmosphere rim, lighting rig.
//!
//! Everything hangs off a single root entity owned by [`GlobeContext`]. Markers
//! and arcs are attached to the same root, so they share its frame and spin.

use bevy::prelude::*;
use bevy::render::mesh::VertexAttributeValues;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, Face, TextureDimension, TextureFormat};

use crate::geo::GLOBE_RADIUS;
use crate::scene::arcs::arc_material;
use crate::scene::markers::MarkerAssets;

const SPHERE_SEGMENTS: u32 = 64;
const NIGHT_SHELL_RADIUS: f32 = GLOBE_RADIUS + 0.01;
const ATMOSPHERE_RADIUS: f32 = GLOBE_RADIUS + 0.5;
const ATMOSPHERE_TINT: [f32; 3] = [0.3, 0.7, 1.0];

/// Night texels darker than this are dropped entirely.
pub const NIGHT_BRIGHTNESS_CUTOFF: f32 = 0.05;
/// Gain applied to surviving night texels.
pub const NIGHT_EMISSIVE_BOOST: f32 = 2.5;

#[derive(Resource, Clone, Debug)]
pub struct GlobeSettings {
    pub day_texture: String,
    pub night_texture: String,
    /// Spin about +Y, radians per second.
    pub spin_speed: f32,
}

impl Default for GlobeSettings {
    fn default() -> Self {
        Self {
            day_texture: "textures/earth_dark.jpg".into(),
            night_texture: "textures/earth_night.jpg".into(),
            spin_speed: 0.06,
        }
    }
}

/// Texture handles for the two globe surfaces. Default handles render untextured.
#[derive(Clone, Debug, Default)]
pub struct GlobeTextures {
    pub day: Handle<Image>,
    pub night: Handle<Image>,
}

impl GlobeTextures {
    pub fn load(asset_server: &AssetServer, settings: &GlobeSettings) -> Self {
        Self {
            day: asset_server.load(settings.day_texture.clone()),
            night: asset_server.load(settings.night_texture.clone()),
        }
    }
}

/// Rotation from Bevy's UV-sphere frame (poles on ±Z, u=0 at +X) into the
/// frame `geo::project` places markers in (poles on ±Y, u=0 at −X), so each
/// lat/lon lands on its texel of an equirectangular map.
pub fn surface_rotation() -> Quat {
    Quat::from_mat3(&Mat3::from_cols(Vec3::NEG_X, Vec3::Z, Vec3::Y))
}

/// Root of the globe hierarchy.
#[derive(Component)]
pub struct GlobeRoot;

#[derive(Component)]
pub struct Spin {
    pub radians_per_sec: f32,
}

/// Night-lights shell waiting for its source texture to be baked.
#[derive(Component)]
pub struct NightShell {
    source: Handle<Image>,
    baked: bool,
}

#[derive(Component)]
pub struct AtmosphereShell;

/// Application context for the globe: the root entity plus the shared assets
/// markers and arcs are built from.
#[derive(Resource)]
pub struct GlobeContext {
    pub root: Entity,
    pub(crate) markers: MarkerAssets,
    pub(crate) arc_material: Handle<StandardMaterial>,
}

impl GlobeContext {
    /// Spawns the globe hierarchy and returns the context that owns it.
    pub fn init(
        commands: &mut Commands,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<StandardMaterial>,
        settings: &GlobeSettings,
        textures: &GlobeTextures,
    ) -> Self {
        let day = commands
            .spawn((
                Mesh3d(meshes.add(Sphere::new(GLOBE_RADIUS).mesh().uv(SPHERE_SEGMENTS, SPHERE_SEGMENTS))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb_u8(0x99, 0x99, 0x99),
                    base_color_texture: Some(textures.day.clone()),
                    emissive: LinearRgba::rgb(0.0094, 0.0094, 0.0094),
                    perceptual_roughness: 0.8,
                    reflectance: 0.2,
                    ..default()
                })),
                Transform::from_rotation(surface_rotation()),
            ))
            .id();

        // Adds nothing until the night texture has been baked.
        let night = commands
            .spawn((
                Mesh3d(meshes.add(
                    Sphere::new(NIGHT_SHELL_RADIUS).mesh().uv(SPHERE_SEGMENTS, SPHERE_SEGMENTS),
                )),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::BLACK,
                    unlit: true,
                    alpha_mode: AlphaMode::Add,
                    ..default()
                })),
                Transform::from_rotation(surface_rotation()),
                NightShell {
                    source: textures.night.clone(),
                    baked: false,
                },
            ))
            .id();

        let atmosphere = commands
            .spawn((
                Mesh3d(meshes.add(atmosphere_mesh())),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::WHITE,
                    unlit: true,
                    alpha_mode: AlphaMode::Add,
                    cull_mode: Some(Face::Front),
                    ..default()
                })),
                AtmosphereShell,
            ))
            .id();

        let lights = spawn_lighting_rig(commands);

        let root = commands
            .spawn((
                GlobeRoot,
                Spin {
                    radians_per_sec: settings.spin_speed,
                },
                Transform::default(),
                Visibility::Visible,
            ))
            .add_children(&[day, night, atmosphere])
            .add_children(&lights)
            .id();

        Self {
            root,
            markers: MarkerAssets::new(meshes, materials),
            arc_material: arc_material(materials),
        }
    }

    /// Despawns the globe and everything attached to it.
    pub fn dispose(&self, commands: &mut Commands) {
        commands.entity(self.root).despawn_recursive();
    }
}

fn spawn_lighting_rig(commands: &mut Commands) -> Vec<Entity> {
    let point = commands
        .spawn((
            PointLight {
                intensity: 2.0e9,
                range: 1000.0,
                ..default()
            },
            Transform::from_xyz(200.0, 300.0, 400.0),
        ))
        .id();
    let key = commands
        .spawn((
            DirectionalLight {
                illuminance: 2_000.0,
                shadows_enabled: true,
                ..default()
            },
            Transform::from_xyz(-300.0, 200.0, 400.0).looking_at(Vec3::ZERO, Vec3::Y),
        ))
        .id();
    let fill = commands
        .spawn((
            DirectionalLight {
                illuminance: 2_000.0,
                shadows_enabled: true,
                ..default()
            },
            Transform::from_xyz(300.0, -200.0, -400.0).looking_at(Vec3::ZERO, Vec3::Y),
        ))
        .id();
    vec![point, key, fill]
}

fn atmosphere_mesh() -> Mesh {
    let mut mesh = Sphere::new(ATMOSPHERE_RADIUS)
        .mesh()
        .uv(SPHERE_SEGMENTS, SPHERE_SEGMENTS);
    if let Some(VertexAttributeValues::Float32x3(normals)) = mesh.attribute(Mesh::ATTRIBUTE_NORMAL) {
        let colors = rim_colors(normals, Quat::IDENTITY);
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    }
    mesh
}

/// Glow strength for a view-space normal: strongest where the shell is seen edge-on
/// or from behind.
pub fn rim_intensity(view_normal: Vec3) -> f32 {
    (0.9 - view_normal.z).max(0.0).powi(3)
}

fn rim_colors(normals: &[[f32; 3]], to_view: Quat) -> Vec<[f32; 4]> {
    normals
        .iter()
        .map(|n| {
            let i = rim_intensity(to_view * Vec3::from(*n));
            [
                ATMOSPHERE_TINT[0] * i,
                ATMOSPHERE_TINT[1] * i,
                ATMOSPHERE_TINT[2] * i,
                1.0,
            ]
        })
        .collect()
}

/// Converts night-map RGBA8 texels into additive emissive texels.
pub fn bake_night_pixels(rgba: &[u8], boost: f32) -> Vec<u8> {
    let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    rgba.chunks_exact(4)
        .flat_map(|px| {
            let [r, g, b] = [px[0], px[1], px[2]].map(|c| f32::from(c) / 255.0);
            let brightness = 0.2126 * r + 0.7152 * g + 0.0722 * b;
            if brightness < NIGHT_BRIGHTNESS_CUTOFF {
                return [0, 0, 0, 0];
            }
            let gain = boost * brightness;
            [
                to_byte(r * gain),
                to_byte(g * gain),
                to_byte(b * gain),
                to_byte(brightness),
            ]
        })
        .collect()
}

/// Bakes a loaded night texture; `None` for formats other than 8-bit RGBA.
pub fn bake_night_image(source: &Image) -> Option<Image> {
    let format = source.texture_descriptor.format;
    if !matches!(
        format,
        TextureFormat::Rgba8UnormSrgb | TextureFormat::Rgba8Unorm
    ) {
        return None;
    }
    let data = bake_night_pixels(&source.data, NIGHT_EMISSIVE_BOOST);
    Some(Image::new(
        Extent3d {
            width: source.width(),
            height: source.height(),
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        format,
        RenderAssetUsages::RENDER_WORLD,
    ))
}

/// Swaps the night shell onto its baked texture once the source has loaded.
/// A texture that never loads leaves the shell invisible.
pub fn bake_night_lights_system(
    mut shells: Query<(&mut NightShell, &MeshMaterial3d<StandardMaterial>)>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (mut shell, material) in &mut shells {
        if shell.baked {
            continue;
        }
        let Some(source) = images.get(&shell.source) else {
            continue;
        };
        shell.baked = true;
        let Some(baked) = bake_night_image(source) else {
            warn!(format = ?source.texture_descriptor.format, "unsupported night texture format");
            continue;
        };
        let baked = images.add(baked);
        if let Some(material) = materials.get_mut(&material.0) {
            material.base_color = Color::WHITE;
            material.base_color_texture = Some(baked);
        }
    }
}

/// Re-tints the atmosphere vertices for the current view direction.
pub fn atmosphere_rim_system(
    cameras: Query<&GlobalTransform, With<Camera3d>>,
    shells: Query<(&Mesh3d, &GlobalTransform), With<AtmosphereShell>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    let Ok(camera) = cameras.get_single() else {
        return;
    };
    let view_rotation = camera.compute_transform().rotation.inverse();
    for (mesh3d, transform) in &shells {
        let Some(mesh) = meshes.get_mut(&mesh3d.0) else {
            continue;
        };
        let Some(VertexAttributeValues::Float32x3(normals)) = mesh.attribute(Mesh::ATTRIBUTE_NORMAL)
        else {
            continue;
        };
        let colors = rim_colors(normals, view_rotation * transform.compute_transform().rotation);
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    }
}

pub fn spin_globe_system(time: Res<Time>, mut roots: Query<(&Spin, &mut Transform)>) {
    for (spin, mut transform) in &mut roots {
        transform.rotate_y(spin.radians_per_sec * time.delta_secs());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_texels_are_discarded() {
        let baked = bake_night_pixels(&[5, 5, 5, 255], NIGHT_EMISSIVE_BOOST);
        assert_eq!(baked, vec![0, 0, 0, 0]);
    }

    #[test]
    fn bright_texels_are_boosted_by_their_brightness() {
        let baked = bake_night_pixels(&[128, 128, 128, 255], NIGHT_EMISSIVE_BOOST);
        // brightness ≈ 0.502, gain ≈ 1.255 → 0.63 → 161
        assert_eq!(baked[..3], [161, 161, 161]);
        assert_eq!(baked[3], 128);
    }

    #[test]
    fn saturated_texels_clamp_to_white() {
        let baked = bake_night_pixels(&[255, 255, 255, 255], NIGHT_EMISSIVE_BOOST);
        assert_eq!(baked, vec![255, 255, 255, 255]);
    }

    #[test]
    fn bake_keeps_one_output_texel_per_input_texel() {
        let src = vec![200u8; 4 * 16];
        assert_eq!(bake_night_pixels(&src, NIGHT_EMISSIVE_BOOST).len(), src.len());
    }

    #[test]
    fn non_rgba8_textures_are_not_baked() {
        let image = Image::new_fill(
            Extent3d::default(),
            TextureDimension::D2,
            &[0; 16],
            TextureFormat::Rgba32Float,
            RenderAssetUsages::default(),
        );
        assert!(bake_night_image(&image).is_none());
    }

    #[test]
    fn rim_is_brightest_facing_away_from_the_camera() {
        let facing = rim_intensity(Vec3::Z);
        let edge = rim_intensity(Vec3::X);
        let away = rim_intensity(-Vec3::Z);
        assert_eq!(facing, 0.0);
        assert!((edge - 0.729).abs() < 1e-4);
        assert!(away > edge);
    }

    #[test]
    fn atmosphere_mesh_carries_vertex_colors() {
        let mesh = atmosphere_mesh();
        assert!(mesh.attribute(Mesh::ATTRIBUTE_COLOR).is_some());
    }

    fn uv_nearest(mesh: &Mesh, target: Vec3) -> [f32; 2] {
        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("sphere mesh has positions");
        };
        let Some(VertexAttributeValues::Float32x2(uvs)) = mesh.attribute(Mesh::ATTRIBUTE_UV_0)
        else {
            panic!("sphere mesh has uvs");
        };
        let rotation = surface_rotation();
        let nearest = positions
            .iter()
            .map(|p| (rotation * Vec3::from(*p)).distance_squared(target))
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
            .unwrap();
        uvs[nearest]
    }

    fn equirect_uv(lat: f64, lon: f64) -> [f32; 2] {
        [((lon + 180.0) / 360.0) as f32, ((90.0 - lat) / 180.0) as f32]
    }

    #[test]
    fn surface_rotation_is_proper() {
        let rotation = surface_rotation();
        assert!(rotation.is_normalized());
        assert!((rotation * Vec3::Z).abs_diff_eq(Vec3::Y, 1e-6));
        assert!((rotation * Vec3::X).abs_diff_eq(Vec3::NEG_X, 1e-6));
        assert!((rotation * Vec3::Y).abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn projected_points_land_on_their_texels() {
        let mesh = Sphere::new(GLOBE_RADIUS)
            .mesh()
            .uv(SPHERE_SEGMENTS, SPHERE_SEGMENTS);
        let step = 1.0 / SPHERE_SEGMENTS as f32;
        for (lat, lon) in [(0.0, 0.0), (51.5, -0.13), (-33.87, 151.21), (40.71, -74.0)] {
            let uv = uv_nearest(&mesh, crate::geo::project(lat, lon, GLOBE_RADIUS, 0.0));
            let expected = equirect_uv(lat, lon);
            assert!(
                (uv[0] - expected[0]).abs() <= step && (uv[1] - expected[1]).abs() <= step,
                "({lat}, {lon}) -> mesh uv {uv:?}, expected {expected:?}"
            );
        }
    }

    #[test]
    fn north_pole_lands_on_the_top_texel_row() {
        let mesh = Sphere::new(GLOBE_RADIUS)
            .mesh()
            .uv(SPHERE_SEGMENTS, SPHERE_SEGMENTS);
        let uv = uv_nearest(&mesh, crate::geo::project(90.0, 0.0, GLOBE_RADIUS, 0.0));
        assert!(uv[1].abs() < 1e-6, "north pole mesh uv {uv:?}");
        let uv = uv_nearest(&mesh, crate::geo::project(-90.0, 0.0, GLOBE_RADIUS, 0.0));
        assert!((uv[1] - 1.0).abs() < 1e-6, "south pole mesh uv {uv:?}");
    }
}

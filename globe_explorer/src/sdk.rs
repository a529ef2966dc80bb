//! SDK entry points and builder for composing the globe explorer app.

use bevy::prelude::*;

use crate::camera::orbit_camera_plugin;
use crate::config::{self, GlobeConfig, LocationMode};
use crate::data::{spawn_loader, LoaderChannel, LoaderCommand};
use crate::scene::{
    animate_pulses_system, arc_plugin, atmosphere_rim_system, bake_night_lights_system,
    ingest_loader_events, play_model_animation_system, request_static_data, reset_globe_system,
    setup_scene, spin_globe_system, AlertState, GlobeSettings, GlobeStats, LoadGeneration,
    LocationFlowStatus, ModelSettings,
};
use crate::ui::{hud_plugin, tooltip_plugin, ui_plugin, ActiveLocationMode};

/// Builder for constructing a globe explorer app with customizable plugins.
pub struct GlobeExplorerBuilder {
    config: Option<GlobeConfig>,
    globe: GlobeSettings,
    window_title: String,
    window_resolution: (f32, f32),
    clear_color: Color,
    enable_orbit_camera: bool,
    enable_hud: bool,
    enable_tooltip: bool,
    enable_arcs: bool,
    enable_model: bool,
}

impl Default for GlobeExplorerBuilder {
    fn default() -> Self {
        Self {
            config: None,
            globe: GlobeSettings::default(),
            window_title: "Geosphere".to_string(),
            window_resolution: (1280.0, 720.0),
            clear_color: Color::BLACK,
            enable_orbit_camera: true,
            enable_hud: true,
            enable_tooltip: true,
            enable_arcs: true,
            enable_model: true,
        }
    }
}

impl GlobeExplorerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit configuration instead of reading the environment.
    pub fn config(mut self, config: GlobeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override textures and spin speed.
    pub fn globe_settings(mut self, settings: GlobeSettings) -> Self {
        self.globe = settings;
        self
    }

    pub fn window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = title.into();
        self
    }

    pub fn window_resolution(mut self, width: f32, height: f32) -> Self {
        self.window_resolution = (width, height);
        self
    }

    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn disable_orbit_camera(mut self) -> Self {
        self.enable_orbit_camera = false;
        self
    }

    pub fn disable_hud(mut self) -> Self {
        self.enable_hud = false;
        self
    }

    pub fn disable_tooltip(mut self) -> Self {
        self.enable_tooltip = false;
        self
    }

    pub fn disable_arcs(mut self) -> Self {
        self.enable_arcs = false;
        self
    }

    pub fn disable_model(mut self) -> Self {
        self.enable_model = false;
        self
    }

    /// Build the Bevy app with the selected configuration and plugins.
    pub fn build(self) -> App {
        let mut app = App::new();
        // Logging comes up with the default plugins, before config warnings.
        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: self.window_title,
                resolution: self.window_resolution.into(),
                ..default()
            }),
            ..default()
        }));

        let config = self.config.unwrap_or_else(config::globe_config);
        info!(
            points = %config.points,
            connections = %config.connections,
            mode = ?config.location.mode,
            "starting globe explorer"
        );
        let channel = spawn_loader(&config);
        let model = if self.enable_model { config.model } else { None };

        app.insert_resource(ClearColor(self.clear_color))
            .insert_resource(channel)
            .insert_resource(self.globe)
            .insert_resource(ModelSettings(model))
            .insert_resource(ActiveLocationMode(config.location.mode))
            .init_resource::<GlobeStats>()
            .init_resource::<LocationFlowStatus>()
            .init_resource::<AlertState>()
            .init_resource::<LoadGeneration>()
            .add_systems(Startup, (setup_scene, request_initial_data))
            .add_systems(
                Update,
                (
                    (reset_globe_system, ingest_loader_events).chain(),
                    spin_globe_system,
                    bake_night_lights_system,
                    atmosphere_rim_system,
                    animate_pulses_system,
                    play_model_animation_system,
                ),
            )
            .add_plugins(ui_plugin);

        if self.enable_orbit_camera {
            app.add_plugins(orbit_camera_plugin);
        }
        if self.enable_hud {
            app.add_plugins(hud_plugin);
        }
        if self.enable_tooltip {
            app.add_plugins(tooltip_plugin);
        }
        if self.enable_arcs {
            app.add_plugins(arc_plugin);
        }

        app
    }
}

/// Queues the static data loads and, in plain mode, the one-shot visitor lookup.
fn request_initial_data(
    channel: Res<LoaderChannel>,
    generation: Res<LoadGeneration>,
    mode: Res<ActiveLocationMode>,
) {
    request_static_data(&channel, *generation);
    if mode.0 == LocationMode::Plain {
        channel.request(LoaderCommand::LocateVisitor);
    }
}

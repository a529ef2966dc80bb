pub(crate) mod arcs;
pub(crate) mod globe;
pub(crate) mod ingest;
pub(crate) mod markers;
pub(crate) mod model;

pub use arcs::{arc_plugin, spawn_arc, ArcSettings, ConnectionArc};
pub use globe::{
    atmosphere_rim_system, bake_night_lights_system, spin_globe_system, GlobeContext, GlobeRoot,
    GlobeSettings, GlobeTextures,
};
pub use ingest::{
    ingest_loader_events, request_static_data, reset_globe_system, setup_scene, AlertState,
    GlobeStats, LoadGeneration, LocationFlowStatus,
};
pub use markers::{
    animate_pulses_system, spawn_marker, Marker, MarkerLabel, MarkerStyle, Pulse,
};
pub use model::{play_model_animation_system, ModelSettings};

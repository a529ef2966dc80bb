//! Globe explorer: geographic points and connections on an interactive 3D Earth.
//!
//! Library root: geo math, data loading, config, and the SDK builder.

mod camera;
pub mod config;
pub mod data;
pub mod geo;
mod scene;
mod ui;

pub mod prelude;
pub mod sdk;

pub use camera::{orbit_camera_plugin, OrbitCamera};
pub use data::{spawn_loader, LoaderChannel};
pub use geo::{project, Connection, GeoPoint, GLOBE_RADIUS};
pub use scene::{GlobeContext, GlobeStats, Marker, MarkerLabel};

mod orbit;

pub use orbit::{orbit_camera_plugin, OrbitCamera, PointerOverUi};

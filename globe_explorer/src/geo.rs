//! Geographic points and the lat/lon → globe-space projection.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

/// Radius of the globe sphere. Every marker and arc lives in this frame.
pub const GLOBE_RADIUS: f32 = 5.0;

/// A latitude/longitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Position of this point on the globe, lifted by `altitude`.
    pub fn to_globe(self, altitude: f32) -> Vec3 {
        project(self.latitude, self.longitude, GLOBE_RADIUS, altitude)
    }
}

/// An ordered pair of points drawn as a single line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub from: GeoPoint,
    pub to: GeoPoint,
}

/// Maps latitude/longitude (degrees) onto a sphere of `radius + altitude`.
///
/// The +180° longitude offset and the negated X axis line the projection up
/// with the seam of the equirectangular globe textures. Inputs are not range
/// checked: out-of-range values still yield a point at the right distance.
pub fn project(lat: f64, lon: f64, radius: f32, altitude: f32) -> Vec3 {
    let r = f64::from(radius + altitude);
    let phi = (90.0 - lat).to_radians();
    let theta = (lon + 180.0).to_radians();

    let x = -r * phi.sin() * theta.cos();
    let y = r * phi.cos();
    let z = r * phi.sin() * theta.sin();
    Vec3::new(x as f32, y as f32, z as f32)
}

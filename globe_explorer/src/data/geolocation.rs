//! IP geolocation lookup (ipinfo-style `{loc: "lat,lon", country}` responses).

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::data::model::VisitorLocation;
use crate::geo::GeoPoint;

#[derive(Debug, Error)]
pub enum GeolocationError {
    #[error("geolocation request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid loc field {0:?}")]
    InvalidLoc(String),
}

/// Resolves the caller's location.
pub trait GeoLookup: Send + Sync {
    fn locate(&self) -> impl Future<Output = Result<VisitorLocation, GeolocationError>> + Send;
}

#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    loc: String,
    #[serde(default)]
    country: String,
}

/// Geolocation keyed by the caller's public IP.
pub struct IpGeolocation {
    client: reqwest::Client,
    endpoint: Url,
}

impl IpGeolocation {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

impl GeoLookup for IpGeolocation {
    async fn locate(&self) -> Result<VisitorLocation, GeolocationError> {
        let response: IpInfoResponse = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let point = parse_loc(&response.loc)?;
        Ok(VisitorLocation {
            point,
            country: response.country,
        })
    }
}

/// Parses `"lat,lon"` into a point.
pub fn parse_loc(loc: &str) -> Result<GeoPoint, GeolocationError> {
    let invalid = || GeolocationError::InvalidLoc(loc.to_string());
    let (lat, lon) = loc.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;
    Ok(GeoPoint::new(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lat_lon_pair() {
        let point = parse_loc("37.3860,-122.0838").unwrap();
        assert_eq!(point, GeoPoint::new(37.386, -122.0838));
    }

    #[test]
    fn tolerates_whitespace() {
        let point = parse_loc(" 48.85 , 2.35 ").unwrap();
        assert_eq!(point, GeoPoint::new(48.85, 2.35));
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(matches!(
            parse_loc("37.3860"),
            Err(GeolocationError::InvalidLoc(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_parts() {
        assert!(parse_loc("north,west").is_err());
        assert!(parse_loc(",").is_err());
    }
}

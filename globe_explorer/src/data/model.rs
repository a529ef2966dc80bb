// Payloads that cross the loader → ECS channel, plus their JSON decoding.
// Raw HTTP/RPC types stay in their own modules; conversion happens here.

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::data::flow::FlowState;
use crate::geo::{Connection, GeoPoint};

/// Failure to turn a static payload into points or connections.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("payload is empty")]
    Empty,
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The viewer's location as reported by the geolocation service.
#[derive(Clone, Debug, PartialEq)]
pub struct VisitorLocation {
    pub point: GeoPoint,
    pub country: String,
}

/// Messages sent from the loader thread to the scene.
#[derive(Clone, Debug, PartialEq)]
pub enum LoaderEvent {
    /// Static data tagged with the load generation that requested it.
    Points {
        generation: u64,
        points: Vec<GeoPoint>,
    },
    Connections {
        generation: u64,
        connections: Vec<Connection>,
    },
    Location(VisitorLocation),
    /// A geolocation lookup failed; the visitor is counted as unknown.
    LocationUnknown,
    Flow(FlowState),
    /// User-facing message for the blocking alert dialog.
    Alert(String),
}

/// Requests sent from the scene to the loader thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoaderCommand {
    LoadPoints { generation: u64 },
    LoadConnections { generation: u64 },
    LocateVisitor,
    ConnectWallet,
}

pub fn parse_points(bytes: &[u8]) -> Result<Vec<GeoPoint>, LoadError> {
    parse_list(bytes)
}

pub fn parse_connections(bytes: &[u8]) -> Result<Vec<Connection>, LoadError> {
    parse_list(bytes)
}

fn parse_list<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>, LoadError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(LoadError::Empty);
    }
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_points() {
        let points = parse_points(br#"[{"lat": 40.7, "lon": -74.0}, {"lat": 0, "lon": 0}]"#)
            .expect("valid payload");
        assert_eq!(
            points,
            vec![GeoPoint::new(40.7, -74.0), GeoPoint::new(0.0, 0.0)]
        );
    }

    #[test]
    fn parses_connections() {
        let connections = parse_connections(
            br#"[{"from": {"lat": 51.5, "lon": -0.1}, "to": {"lat": 35.7, "lon": 139.7}}]"#,
        )
        .expect("valid payload");
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].from, GeoPoint::new(51.5, -0.1));
        assert_eq!(connections[0].to, GeoPoint::new(35.7, 139.7));
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert!(matches!(parse_points(b""), Err(LoadError::Empty)));
        assert!(matches!(parse_connections(b"  \n"), Err(LoadError::Empty)));
    }

    #[test]
    fn malformed_payload_is_rejected() {
        assert!(matches!(
            parse_points(br#"[{"lat": "north"}]"#),
            Err(LoadError::Malformed(_))
        ));
        assert!(matches!(
            parse_connections(br#"{"from": 1}"#),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn empty_array_yields_no_points() {
        assert!(parse_points(b"[]").expect("valid payload").is_empty());
    }
}

//! Env parsing, defaults, and constants.

use std::str::FromStr;

use bevy::log::warn;
use url::Url;

use crate::data::DataSource;
use crate::geo::GeoPoint;

const DEFAULT_POINTS: &str = "assets/data/points.json";
const DEFAULT_CONNECTIONS: &str = "assets/data/connections.json";
const DEFAULT_GEOLOCATION_URL: &str = "https://ipinfo.io/json";
const DEFAULT_RPC: &str = "https://api.mainnet-beta.solana.com";
const DEFAULT_MODEL_LOCATION: GeoPoint = GeoPoint::new(37.2431, -115.7930);

/// Which visitor-location flow the app runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LocationMode {
    Off,
    /// Look the visitor up once at startup.
    #[default]
    Plain,
    /// Look the visitor up only after a wallet proves token ownership.
    TokenGated,
}

impl FromStr for LocationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "plain" => Ok(Self::Plain),
            "token-gated" | "gated" => Ok(Self::TokenGated),
            other => Err(format!("unknown location mode {other:?}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LocationConfig {
    pub mode: LocationMode,
    pub geolocation_url: Url,
    pub rpc_url: Url,
    pub token_mint: Option<String>,
    pub wallet_address: Option<String>,
}

/// Decorative model pinned to a fixed coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelConfig {
    /// Asset path relative to `assets/`.
    pub path: String,
    pub location: GeoPoint,
}

#[derive(Clone, Debug)]
pub struct GlobeConfig {
    pub points: DataSource,
    pub connections: DataSource,
    pub location: LocationConfig,
    pub model: Option<ModelConfig>,
}

/// Builds the app configuration from environment variables.
/// Invalid values are logged and replaced by their defaults.
pub fn globe_config() -> GlobeConfig {
    let mut mode = env_parsed("LOCATION_MODE").unwrap_or_default();
    let token_mint = env_non_empty("TOKEN_MINT");
    if mode == LocationMode::TokenGated && token_mint.is_none() {
        warn!("LOCATION_MODE=token-gated requires TOKEN_MINT; location flow disabled");
        mode = LocationMode::Off;
    }

    let location = LocationConfig {
        mode,
        geolocation_url: env_url("GEOLOCATION_URL", DEFAULT_GEOLOCATION_URL),
        rpc_url: env_url("SOLANA_RPC_URL", DEFAULT_RPC),
        token_mint,
        wallet_address: env_non_empty("WALLET_ADDRESS"),
    };

    GlobeConfig {
        points: DataSource::parse(&env_or("POINTS_SOURCE", DEFAULT_POINTS)),
        connections: DataSource::parse(&env_or("CONNECTIONS_SOURCE", DEFAULT_CONNECTIONS)),
        location,
        model: model_config(),
    }
}

/// The model is opt-in: no glTF ships with the app.
fn model_config() -> Option<ModelConfig> {
    let path = env_non_empty("MODEL_PATH")?;
    if path.eq_ignore_ascii_case("none") {
        return None;
    }
    let location = GeoPoint::new(
        env_parsed("MODEL_LAT").unwrap_or(DEFAULT_MODEL_LOCATION.latitude),
        env_parsed("MODEL_LON").unwrap_or(DEFAULT_MODEL_LOCATION.longitude),
    );
    Some(ModelConfig { path, location })
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_non_empty(key).unwrap_or_else(|| default.to_string())
}

fn env_parsed<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env_non_empty(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("invalid {key} {raw:?}: {err}");
            None
        }
    }
}

fn env_url(key: &str, default: &str) -> Url {
    env_parsed(key).unwrap_or_else(|| {
        Url::parse(default).unwrap_or_else(|err| panic!("default {key} {default:?}: {err}"))
    })
}

//! Visitor-location flows: plain lookup and the wallet/token-gated variant.

use std::fmt;

use bevy::log::{info, warn};
use crossbeam_channel::{SendError, Sender};

use crate::data::geolocation::GeoLookup;
use crate::data::model::LoaderEvent;
use crate::data::token_gate::TokenOwnership;
use crate::data::wallet::{WalletError, WalletProvider};

/// Progress of the wallet-gated location flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlowState {
    #[default]
    Disconnected,
    Connecting,
    TokenOwned,
    TokenNotOwned,
    LocationFetched,
    Rejected,
}

impl FlowState {
    /// Whether the flow may move from `self` to `next`.
    pub fn can_transition_to(self, next: FlowState) -> bool {
        use FlowState::*;
        matches!(
            (self, next),
            (Disconnected | Rejected | LocationFetched | TokenOwned, Connecting)
                | (Connecting, TokenOwned | TokenNotOwned | Rejected)
                | (TokenOwned, LocationFetched)
                | (TokenNotOwned, Rejected)
        )
    }

    /// True while a connect request is in flight.
    pub fn is_busy(self) -> bool {
        matches!(self, FlowState::Connecting)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlowState::Disconnected => "disconnected",
            FlowState::Connecting => "connecting",
            FlowState::TokenOwned => "token owned",
            FlowState::TokenNotOwned => "token not owned",
            FlowState::LocationFetched => "location fetched",
            FlowState::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

pub(crate) const WALLET_NOT_FOUND: &str = "No wallet found. Set WALLET_ADDRESS and try again.";
pub(crate) const TOKEN_NOT_OWNED: &str = "This wallet does not hold the required token.";
pub(crate) const TOKEN_CHECK_FAILED: &str = "Could not verify token ownership.";

/// One geolocation lookup. Failure is logged and reported as an unknown visitor.
/// Returns whether a location was delivered.
pub async fn locate_visitor(
    geo: &impl GeoLookup,
    tx: &Sender<LoaderEvent>,
) -> Result<bool, SendError<LoaderEvent>> {
    match geo.locate().await {
        Ok(location) => {
            info!(
                country = %location.country,
                lat = location.point.latitude,
                lon = location.point.longitude,
                "visitor located"
            );
            tx.send(LoaderEvent::Location(location))?;
            Ok(true)
        }
        Err(err) => {
            warn!("geolocation lookup failed: {err}");
            tx.send(LoaderEvent::LocationUnknown)?;
            Ok(false)
        }
    }
}

/// Wallet → token check → geolocation. Every step runs once; any rejection
/// ends the flow with an alert.
pub async fn run_gated_flow(
    wallet: &impl WalletProvider,
    gate: &impl TokenOwnership,
    geo: &impl GeoLookup,
    tx: &Sender<LoaderEvent>,
) -> Result<FlowState, SendError<LoaderEvent>> {
    tx.send(LoaderEvent::Flow(FlowState::Connecting))?;

    let owner = match wallet.connect().await {
        Ok(owner) => owner,
        Err(err) => {
            warn!("wallet connect failed: {err}");
            let message = match err {
                WalletError::NotFound => WALLET_NOT_FOUND.to_string(),
                WalletError::InvalidAddress(_) => err.to_string(),
            };
            return reject(tx, message);
        }
    };
    info!(%owner, "wallet connected");

    match gate.owns_token(&owner).await {
        Ok(true) => {}
        Ok(false) => {
            info!(%owner, "wallet holds no matching token accounts");
            tx.send(LoaderEvent::Flow(FlowState::TokenNotOwned))?;
            return reject(tx, TOKEN_NOT_OWNED.to_string());
        }
        Err(err) => {
            warn!("token ownership check failed: {err}");
            return reject(tx, TOKEN_CHECK_FAILED.to_string());
        }
    }
    tx.send(LoaderEvent::Flow(FlowState::TokenOwned))?;

    if locate_visitor(geo, tx).await? {
        tx.send(LoaderEvent::Flow(FlowState::LocationFetched))?;
        Ok(FlowState::LocationFetched)
    } else {
        Ok(FlowState::TokenOwned)
    }
}

fn reject(
    tx: &Sender<LoaderEvent>,
    message: String,
) -> Result<FlowState, SendError<LoaderEvent>> {
    tx.send(LoaderEvent::Alert(message))?;
    tx.send(LoaderEvent::Flow(FlowState::Rejected))?;
    Ok(FlowState::Rejected)
}

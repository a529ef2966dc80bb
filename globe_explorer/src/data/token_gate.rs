//! On-chain token ownership check over Solana JSON-RPC.

use std::future::Future;

use alloy::rpc::client::RpcClient;
use alloy::transports::TransportError;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum TokenGateError {
    #[error("token account query failed: {0}")]
    Rpc(#[from] TransportError),
}

/// Decides whether a wallet holds the gating token.
pub trait TokenOwnership: Send + Sync {
    fn owns_token(&self, owner: &str) -> impl Future<Output = Result<bool, TokenGateError>> + Send;
}

#[derive(Debug, Deserialize)]
struct TokenAccounts {
    value: Vec<serde_json::Value>,
}

/// Queries `getTokenAccountsByOwner` filtered by a fixed mint.
/// One or more matching accounts authorizes the owner.
pub struct SolanaTokenGate {
    client: RpcClient,
    mint: String,
}

impl SolanaTokenGate {
    pub fn new(rpc_url: Url, mint: impl Into<String>) -> Self {
        Self {
            client: RpcClient::new_http(rpc_url),
            mint: mint.into(),
        }
    }

    /// Number of token accounts `owner` holds for the configured mint.
    pub async fn token_account_count(&self, owner: &str) -> Result<usize, TokenGateError> {
        let params = (
            owner.to_string(),
            json!({ "mint": self.mint }),
            json!({ "encoding": "jsonParsed" }),
        );
        let accounts: TokenAccounts = self
            .client
            .request("getTokenAccountsByOwner", params)
            .await?;
        Ok(accounts.value.len())
    }
}

impl TokenOwnership for SolanaTokenGate {
    async fn owns_token(&self, owner: &str) -> Result<bool, TokenGateError> {
        Ok(self.token_account_count(owner).await? > 0)
    }
}

//! Wallet provider boundary: yields the public address of the connected wallet.

use std::future::Future;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("no wallet found")]
    NotFound,
    #[error("invalid wallet address {0:?}")]
    InvalidAddress(String),
}

pub trait WalletProvider: Send + Sync {
    /// Connects and returns the wallet's public address.
    fn connect(&self) -> impl Future<Output = Result<String, WalletError>> + Send;
}

/// Wallet backed by an address supplied through configuration.
#[derive(Clone, Debug, Default)]
pub struct ConfiguredWallet {
    address: Option<String>,
}

impl ConfiguredWallet {
    pub fn new(address: Option<String>) -> Self {
        Self { address }
    }
}

impl WalletProvider for ConfiguredWallet {
    async fn connect(&self) -> Result<String, WalletError> {
        let address = self.address.as_deref().ok_or(WalletError::NotFound)?;
        if !is_base58_pubkey(address) {
            return Err(WalletError::InvalidAddress(address.to_string()));
        }
        Ok(address.to_string())
    }
}

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Shape check for a base58-encoded 32-byte public key.
pub fn is_base58_pubkey(address: &str) -> bool {
    (32..=44).contains(&address.len()) && address.chars().all(|c| BASE58_ALPHABET.contains(c))
}

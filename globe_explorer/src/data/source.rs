//! Where a static JSON payload comes from: a local file or an HTTP(S) URL.

use std::fmt;
use std::path::PathBuf;

use url::Url;

use crate::data::model::LoadError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    Path(PathBuf),
    Url(Url),
}

impl DataSource {
    /// Interprets `raw` as a URL when it has an http(s) scheme, otherwise as a path.
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Url(url),
            _ => Self::Path(PathBuf::from(raw)),
        }
    }

    /// Reads the whole payload. No retry and no timeout.
    pub async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<u8>, LoadError> {
        match self {
            Self::Path(path) => std::fs::read(path).map_err(|source| LoadError::Read {
                path: path.display().to_string(),
                source,
            }),
            Self::Url(url) => {
                let fetch_err = |source| LoadError::Fetch {
                    url: url.to_string(),
                    source,
                };
                let response = client
                    .get(url.clone())
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(fetch_err)?;
                let bytes = response.bytes().await.map_err(fetch_err)?;
                Ok(bytes.to_vec())
            }
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

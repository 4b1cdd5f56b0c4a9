//! The "fetch JSON from URL" primitive.
//!
//! The relation resolver and paginator only depend on the [`Fetch`] trait. Each
//! call is a one-shot attempt: no retries happen here, and the only timeout is
//! the one configured on the underlying HTTP client.

use async_trait::async_trait;
use serde_json::Value;
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

use crate::metrics_defs::{UPSTREAM_REQUEST_DURATION, UPSTREAM_REQUEST_FAILURE};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("request failed: {message}")]
    Transport {
        message: String,
        /// OS error code or failure class, when the transport exposes one
        code: Option<String>,
    },

    #[error("upstream responded with status {status}")]
    Status { status: u16 },

    #[error("could not decode response body: {message}")]
    Parse { message: String },

    /// The payload decoded fine but is not a sequence of records.
    #[error("expected a sequence of records, got {found}")]
    Shape { found: &'static str },
}

impl FetchError {
    pub fn code(&self) -> Option<&str> {
        match self {
            FetchError::Transport { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return FetchError::Parse {
                message: display_chain(&error),
            };
        }

        FetchError::Transport {
            message: display_chain(&error),
            code: transport_code(&error),
        }
    }
}

#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches `url` and decodes the body as JSON.
    async fn fetch(&self, url: &Url) -> Result<Value, FetchError>;
}

/// [`Fetch`] implementation backed by a shared reqwest client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn fetch_json(&self, url: &Url) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(FetchError::from_reqwest)?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Parse {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Value, FetchError> {
        let host = url.host_str().unwrap_or("unknown").to_string();
        let started = Instant::now();

        let result = self.fetch_json(url).await;

        shared::histogram!(UPSTREAM_REQUEST_DURATION, "host" => host.clone())
            .record(started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            shared::counter!(UPSTREAM_REQUEST_FAILURE, "host" => host).increment(1);
            tracing::warn!(url = %url, error = %e, "Upstream request failed");
        }

        result
    }
}

/// Joins an error and all of its sources into one line.
fn display_chain(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(err) = source {
        let text = err.to_string();
        // hyper and reqwest frequently repeat the inner message
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = err.source();
    }
    message
}

fn transport_code(error: &reqwest::Error) -> Option<String> {
    let mut source = error.source();
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return Some(match io.raw_os_error() {
                Some(code) => format!("os error {code}"),
                None => format!("{:?}", io.kind()),
            });
        }
        source = err.source();
    }

    if error.is_timeout() {
        Some("timeout".to_string())
    } else if error.is_connect() {
        Some("connect".to_string())
    } else {
        None
    }
}

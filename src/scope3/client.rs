//! Scope3 API Client
//!
//! Thin reqwest wrapper around the Scope3 v2 REST API: connection pooling,
//! request timeout, bearer auth and the JSON POST plumbing.

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::Serialize;
use thiserror::Error;

// == Client Error ==
/// Failure classification for upstream calls.
///
/// `Server` covers everything the proxy treats as best-effort and can mask
/// with cached data: unreachable host, timeout, non-2xx status, a body that
/// does not parse. `RowValidation` is Scope3 rejecting the caller's input
/// inside a 2xx response; that one always surfaces.
#[derive(Debug, Error)]
pub enum Scope3Error {
    #[error("scope3 server error: {0}")]
    Server(String),

    #[error("scope3 rejected measure row: {0}")]
    RowValidation(String),
}

// == Client Config ==
#[derive(Debug, Clone)]
pub struct Scope3ClientConfig {
    /// Upstream host; `https://` is assumed when no scheme is given
    pub host: String,
    /// Bearer token sent on every request
    pub api_key: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Connection pool ceiling
    pub max_idle_connections: usize,
    /// Idle connection reaping interval
    pub idle_conn_timeout: Duration,
}

// == Scope3 Client ==
/// HTTP client for the Scope3 measure API.
#[derive(Debug)]
pub struct Scope3Client {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl Scope3Client {
    // == Constructor ==
    pub fn new(config: Scope3ClientConfig) -> Result<Self, reqwest::Error> {
        let mut base_url = config.host;
        if !base_url.starts_with("http") {
            base_url = format!("https://{}", base_url);
        }
        base_url.push_str("/v2");

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .pool_idle_timeout(config.idle_conn_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // == Post ==
    /// POSTs a JSON body to `base_url + path`. Transport-level failures map
    /// to `Scope3Error::Server`; status handling is left to the caller.
    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, Scope3Error> {
        let url = format!("{}{}", self.base_url, path);
        self.http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| Scope3Error::Server(format!("failed to call {}: {}", url, err)))
    }
}

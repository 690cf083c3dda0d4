//! Remote feature registry client.
//!
//! Talks to `<url>/api/features`, which returns a JSON array of features
//! shaped like [`Feature`]. Name lookups pass `?name=<name>` to narrow the
//! result server-side; the exact-name match is still checked here because
//! the registry filters by substring.

use std::time::Duration;

use featurize_common::cancel::CancelToken;
use featurize_common::config::RegistryConfig;
use featurize_common::error::{FeaturizeError, Result};
use featurize_common::types::{Feature, FeatureMeta};
use regex::Regex;
use reqwest::StatusCode;
use reqwest::blocking::Client;

use crate::FeatureStore;

const KIND: &str = "registry";

/// Feature store backed by an HTTP registry.
#[derive(Debug)]
pub struct RegistryStore {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl RegistryStore {
    /// Creates a client for the registry described by `config`.
    ///
    /// No request is made until the first lookup.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the URL is not http(s), or `StoreUnavailable` if
    /// the HTTP client cannot be built.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let base_url = config.url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(FeaturizeError::Config {
                message: format!("registry URL must be http(s): {base_url}"),
            });
        }
        let client = Client::builder()
            .user_agent(concat!("featurize/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeaturizeError::unavailable(KIND, e.to_string()))?;
        tracing::info!(url = %base_url, "configured registry store");
        Ok(Self {
            base_url,
            token: config.token.clone(),
            client,
        })
    }

    /// Returns the endpoint listing features, optionally filtered by name.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the resulting URL does not parse.
    pub fn features_url(&self, name: Option<&str>) -> Result<reqwest::Url> {
        let endpoint = format!("{}/api/features", self.base_url);
        let parsed = match name {
            Some(n) => reqwest::Url::parse_with_params(&endpoint, &[("name", n)]),
            None => reqwest::Url::parse(&endpoint),
        };
        parsed.map_err(|e| FeaturizeError::Config {
            message: format!("invalid registry URL {endpoint}: {e}"),
        })
    }

    fn fetch(&self, name: Option<&str>, cancel: &CancelToken) -> Result<Vec<Feature>> {
        cancel.check()?;
        let url = self.features_url(name)?;
        tracing::debug!(url = %url, "querying registry");

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(remaining) = cancel.remaining() {
            request = request.timeout(remaining.max(Duration::from_millis(1)));
        }

        let response = request.send().map_err(|e| transport_error(&e, cancel))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return match name {
                Some(n) => Err(FeaturizeError::not_found(n)),
                None => Ok(Vec::new()),
            };
        }
        if !status.is_success() {
            return Err(FeaturizeError::unavailable(
                KIND,
                format!("registry answered HTTP {status}"),
            ));
        }

        let body = response.text().map_err(|e| transport_error(&e, cancel))?;
        decode_features(&body)
    }
}

fn transport_error(err: &reqwest::Error, cancel: &CancelToken) -> FeaturizeError {
    if err.is_timeout() && cancel.is_cancelled() {
        return FeaturizeError::Cancelled {
            feature: None,
            reason: "deadline exceeded".into(),
        };
    }
    FeaturizeError::unavailable(KIND, err.to_string())
}

/// Decodes a registry response body.
///
/// # Errors
///
/// Returns `StoreUnavailable` if the body is not a JSON array of features.
pub fn decode_features(body: &str) -> Result<Vec<Feature>> {
    serde_json::from_str(body)
        .map_err(|e| FeaturizeError::unavailable(KIND, format!("invalid registry payload: {e}")))
}

/// Picks the feature named exactly `name` out of a substring-filtered result.
fn select_exact(features: Vec<Feature>, name: &str) -> Result<Feature> {
    features
        .into_iter()
        .find(|f| f.meta.name == name)
        .ok_or_else(|| FeaturizeError::not_found(name))
}

impl FeatureStore for RegistryStore {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn search_meta(&self, pattern: &Regex, cancel: &CancelToken) -> Result<Vec<FeatureMeta>> {
        Ok(self
            .fetch(None, cancel)?
            .into_iter()
            .filter(|f| pattern.is_match(&f.meta.name))
            .map(|f| f.meta)
            .collect())
    }

    fn get_meta(&self, name: &str, cancel: &CancelToken) -> Result<FeatureMeta> {
        self.get_feature(name, cancel).map(|f| f.meta)
    }

    fn get_feature(&self, name: &str, cancel: &CancelToken) -> Result<Feature> {
        select_exact(self.fetch(Some(name), cancel)?, name)
    }
}

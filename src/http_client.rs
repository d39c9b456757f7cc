//! HTTP client handed to scrapers
//!
//! A thin wrapper around a blocking reqwest client that carries the
//! configured default headers and timeout, and logs requests without
//! leaking IP addresses.

use crate::config::HttpConfig;
use regex::Regex;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, REFERER};
use std::borrow::Cow;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while building the client or sending requests
#[derive(Debug, Error)]
pub enum HttpError {
    /// A configured header name or value is not valid
    #[error("Invalid HTTP header '{name}' in config")]
    InvalidHeader { name: String },

    /// The underlying client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// A request failed to complete
    #[error("Request to '{url}' failed: {source}")]
    Request { url: String, source: reqwest::Error },
}

static IPV4: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}").expect("valid regex"));

static IPV6: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-f0-9]+:+)+[a-f0-9]+").expect("valid regex"));

const IP_PLACEHOLDER: &str = "{the-cat-snatched-your-ip-address}";

/// Replaces IPv4 and IPv6 addresses in `text` when `enabled`
pub fn hide_ip(text: &str, enabled: bool) -> Cow<'_, str> {
    if !enabled {
        return Cow::Borrowed(text);
    }

    match IPV4.replace_all(text, IP_PLACEHOLDER) {
        Cow::Borrowed(text) => IPV6.replace_all(text, IP_PLACEHOLDER),
        Cow::Owned(text) => Cow::Owned(IPV6.replace_all(&text, IP_PLACEHOLDER).into_owned()),
    }
}

/// Blocking HTTP client shared by every scraper of a run
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    default_headers: HeaderMap,
    hide_ip: bool,
}

impl HttpClient {
    /// Creates a client from the `[http]` config section
    pub fn new(config: &HttpConfig, hide_ip: bool) -> Result<Self, HttpError> {
        let mut default_headers = HeaderMap::new();

        for (name, value) in &config.headers {
            let invalid = || HttpError::InvalidHeader { name: name.clone() };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            default_headers.insert(header_name, header_value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self {
            client,
            default_headers,
            hide_ip,
        })
    }

    /// Starts a GET request with the default headers and the url as referer
    pub fn get(&self, url: &str) -> RequestBuilder {
        debug!("GET -> {}", hide_ip(url, self.hide_ip));

        let mut headers = self.default_headers.clone();
        if let Ok(referer) = HeaderValue::from_str(url) {
            headers.entry(REFERER).or_insert(referer);
        }

        self.client.get(url).headers(headers)
    }

    /// Sends a GET request and returns the response, logging failed statuses
    pub fn fetch(&self, url: &str) -> Result<Response, HttpError> {
        let response = self.get(url).send().map_err(|e| HttpError::Request {
            url: hide_ip(url, self.hide_ip).into_owned(),
            source: e,
        })?;

        if !response.status().is_success() {
            debug!(
                "GET request to '{}' failed! ({})",
                hide_ip(url, self.hide_ip),
                response.status()
            );
        }

        Ok(response)
    }

    /// Access to the raw client for requests that need full control
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

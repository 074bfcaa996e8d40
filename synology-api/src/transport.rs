//! HTTP transport.
//!
//! Every DSM Web API call is a flat key/value request against
//! `{base_url}{path}`, sent either as a GET query string or as a POST form
//! body. The [`Transport`] trait is the seam between the session/dispatch
//! layer and the network; [`HttpTransport`] is the `reqwest` implementation.

use crate::config::ClientConfig;
use crate::error::Result;
use reqwest::blocking::Client;

const USER_AGENT: &str = concat!("synology-api/", env!("CARGO_PKG_VERSION"));

/// HTTP verb used to carry the parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    /// Parameters in the query string (the gateway default).
    #[default]
    Get,
    /// Parameters as an `application/x-www-form-urlencoded` body.
    Post,
}

/// A fully resolved outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Parameters in insertion order, already rendered as text.
    pub params: Vec<(String, String)>,
}

impl HttpRequest {
    /// Value of the first parameter named `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a completed round-trip.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Single-shot request/response primitive.
///
/// Implementations must not retry; a timeout is an error.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Blocking `reqwest` transport.
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Build a client honouring the timeout and certificate settings of
    /// `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.secure && !config.cert_verify)
            .build()?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let builder = match request.method {
            HttpMethod::Get => self.http.get(&request.url).query(&request.params),
            HttpMethod::Post => self.http.post(&request.url).form(&request.params),
        };
        let resp = builder.send()?;
        let status = resp.status().as_u16();
        let body = resp.bytes()?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

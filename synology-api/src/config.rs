//! Client configuration.
//!
//! A flat settings object handed to [`Session::new`](crate::Session::new).
//! It derives [`Deserialize`] so an application can load it from whatever
//! settings store it already uses; this crate never reads files itself.
//!
//! ```json
//! {
//!   "host": "nas.local",
//!   "port": 5001,
//!   "secure": true,
//!   "cert_verify": false,
//!   "username": "admin",
//!   "password": "secret",
//!   "otp_code": "123456"
//! }
//! ```

use crate::error::{Result, SynoError};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Connection, credential and behaviour settings for one DSM host.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    /// Hostname or IP address of the NAS.
    pub host: String,
    /// DSM web port (typically 5000 for HTTP, 5001 for HTTPS).
    pub port: u16,
    /// Use HTTPS.
    #[serde(default)]
    pub secure: bool,
    /// Verify the server certificate when `secure` is set.
    #[serde(default)]
    pub cert_verify: bool,
    pub username: String,
    pub password: String,
    /// One-time password, sent only when the server asks for a second factor.
    #[serde(default)]
    pub otp_code: Option<String>,
    /// Pin the `SYNO.API.Auth` version instead of using the highest one
    /// advertised by the server.
    #[serde(default)]
    pub auth_version: Option<u32>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Log server-reported failures at `warn` level.
    #[serde(default)]
    pub debug: bool,
}

impl ClientConfig {
    /// Plain-HTTP configuration with default settings.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            secure: false,
            cert_verify: false,
            username: username.into(),
            password: password.into(),
            otp_code: None,
            auth_version: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            debug: false,
        }
    }

    /// Enable HTTPS, optionally verifying the certificate.
    #[must_use]
    pub fn with_tls(mut self, cert_verify: bool) -> Self {
        self.secure = true;
        self.cert_verify = cert_verify;
        self
    }

    #[must_use]
    pub fn with_otp_code(mut self, code: impl Into<String>) -> Self {
        self.otp_code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_auth_version(mut self, version: u32) -> Self {
        self.auth_version = Some(version);
        self
    }

    /// Per-request timeout, rounded up to whole seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Root of the Web API, e.g. `https://nas.local:5001/webapi/`.
    ///
    /// IPv6 literals are bracketed: `http://[fd00::2]:5000/webapi/`.
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        let host = self.host.trim();
        if host.contains(':') && !host.starts_with('[') {
            format!("{scheme}://[{host}]:{}/webapi/", self.port)
        } else {
            format!("{scheme}://{host}:{}/webapi/", self.port)
        }
    }

    /// Reject settings that cannot produce a working session.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(SynoError::Config("host is empty".into()));
        }
        if self.port == 0 {
            return Err(SynoError::Config("port must be non-zero".into()));
        }
        if self.username.is_empty() {
            return Err(SynoError::Config("username is empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(SynoError::Config("timeout must be non-zero".into()));
        }
        if self.otp_code.as_deref().is_some_and(str::is_empty) {
            return Err(SynoError::Config("otp_code is set but empty".into()));
        }
        Ok(())
    }
}

// Credentials stay out of logs and panic messages.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("cert_verify", &self.cert_verify)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("otp_code", &self.otp_code.as_ref().map(|_| "<redacted>"))
            .field("auth_version", &self.auth_version)
            .field("timeout_secs", &self.timeout_secs)
            .field("debug", &self.debug)
            .finish()
    }
}

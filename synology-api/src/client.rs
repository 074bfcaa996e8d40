//! High-level client.
//!
//! [`SynoClient`] wraps a [`Session`], logs into `Core` and loads both
//! catalogs on connect. Endpoint helpers are implemented in separate modules
//! (`core_user`, `surveillance`) as `impl SynoClient` blocks.
//!
//! Unlike the bare [`Session`], the client applies a retry policy: a call
//! that fails with [`AuthErrorKind::SessionExpired`](crate::AuthErrorKind::SessionExpired)
//! triggers one re-login of that namespace and one retry of the call.

use crate::catalog::{Catalog, Namespace};
use crate::config::ClientConfig;
use crate::dispatch::ApiRequest;
use crate::error::Result;
use crate::session::Session;
use serde_json::Value;
use std::sync::Arc;

/// Namespace used for the general catalog when none is more specific.
const GENERAL_NAMESPACE: &str = "SurveillanceStation";

/// Blocking client for one DSM host.
pub struct SynoClient {
    session: Session,
}

impl SynoClient {
    /// Connect: log into `Core` and load the administrative and general
    /// catalogs. Fails if any of these steps fails.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        Self::with_session(Session::new(config)?)
    }

    /// Same as [`connect`](Self::connect) over an existing session
    /// (useful for testing or a custom transport).
    pub fn with_session(session: Session) -> Result<Self> {
        let core = Namespace::core();
        session.login(&core)?;
        session.fetch_catalog(&core)?;
        session.fetch_catalog(&Namespace::new(GENERAL_NAMESPACE))?;
        Ok(Self { session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Administrative (`SYNO.Core.*`) catalog.
    pub fn core_catalog(&self) -> Result<Arc<Catalog>> {
        self.session.fetch_catalog(&Namespace::core())
    }

    /// General (application) catalog.
    pub fn general_catalog(&self) -> Result<Arc<Catalog>> {
        self.session.fetch_catalog(&Namespace::new(GENERAL_NAMESPACE))
    }

    /// Log out of every namespace this client logged into.
    ///
    /// All namespaces are attempted; the first error is returned.
    pub fn logout(&self) -> Result<()> {
        let mut first_err = None;
        for namespace in self.session.authenticated_namespaces() {
            if let Err(err) = self.session.logout(&namespace) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// JSON call in `namespace`, logging in on first use and re-logging in
    /// once if the session expired.
    pub fn request(&self, namespace: &Namespace, request: &ApiRequest) -> Result<Value> {
        self.with_relogin(namespace, || self.session.call(namespace, request))
    }

    /// Binary call in `namespace`, with the same login policy as
    /// [`request`](Self::request).
    pub fn request_raw(&self, namespace: &Namespace, request: &ApiRequest) -> Result<Vec<u8>> {
        self.with_relogin(namespace, || self.session.call_raw(namespace, request))
    }

    fn with_relogin<T>(&self, namespace: &Namespace, call: impl Fn() -> Result<T>) -> Result<T> {
        if !self.session.is_authenticated(namespace) {
            self.session.login(namespace)?;
        }
        match call() {
            Err(err) if err.is_session_expired() => {
                tracing::debug!(namespace = %namespace, "session expired, logging in again");
                self.session.login(namespace)?;
                call()
            }
            other => other,
        }
    }
}

//! Session lifecycle: catalog discovery, login and logout.
//!
//! Login is a two-step exchange against `SYNO.API.Auth`:
//!
//! 1. The auth endpoint's path and versions come from the catalog, so the
//!    namespace's catalog is fetched first.
//! 2. `method=login` is sent with `account`, `passwd`, `session` and
//!    `format=sid`. If the server answers `403` or `406` (second factor
//!    required) and an OTP code is configured, the request is resubmitted
//!    once with `otp_code`.
//!
//! Success response:
//! ```json
//! { "success": true, "data": { "sid": "Ml6x0sM3E2..." } }
//! ```
//!
//! Session identifiers are held per namespace. A sid obtained for `Core` is
//! not attached to `SurveillanceStation` calls.

use crate::catalog::{Catalog, EndpointDescriptor, INFO_API, INFO_PATH, INFO_VERSION, Namespace, Scope};
use crate::config::ClientConfig;
use crate::decoder::decode_body;
use crate::dispatch::base_params;
use crate::error::{AuthErrorKind, RequestErrorKind, Result, SynoError};
use crate::transport::{HttpMethod, HttpTransport, Transport};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Name of the authentication API.
pub const AUTH_API: &str = "SYNO.API.Auth";

/// Authenticated connection to one DSM host.
///
/// `Session` is `Send + Sync`; share it by reference or in an [`Arc`].
/// Login and logout are serialized against each other. Dispatches run
/// concurrently and read the session identifier atomically.
pub struct Session {
    config: ClientConfig,
    base_url: String,
    transport: Arc<dyn Transport>,
    sids: RwLock<HashMap<Namespace, Arc<str>>>,
    auth_lock: Mutex<()>,
    catalogs: RwLock<HashMap<Scope, Arc<Catalog>>>,
    catalog_lock: Mutex<()>,
}

impl Session {
    /// Create a session using the `reqwest` transport. No request is sent.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a session over a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url(),
            config,
            transport,
            sids: RwLock::new(HashMap::new()),
            auth_lock: Mutex::new(()),
            catalogs: RwLock::new(HashMap::new()),
            catalog_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    // ---- catalog ----

    /// Catalog for the namespace's scope, fetched on first use.
    ///
    /// At most one discovery request is issued per scope until
    /// [`invalidate_catalog`](Self::invalidate_catalog) is called, even
    /// under concurrent first use.
    ///
    /// # Errors
    ///
    /// [`SynoError::CatalogUnavailable`] if the discovery request fails or
    /// returns inconsistent data. Nothing is cached in that case.
    pub fn fetch_catalog(&self, namespace: &Namespace) -> Result<Arc<Catalog>> {
        let scope = namespace.scope();
        if let Some(catalog) = self.cached_catalog(scope) {
            return Ok(catalog);
        }
        let _guard = lock(&self.catalog_lock);
        if let Some(catalog) = self.cached_catalog(scope) {
            return Ok(catalog);
        }
        let catalog = Arc::new(self.discover(namespace, scope)?);
        write(&self.catalogs).insert(scope, Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Same as [`fetch_catalog`](Self::fetch_catalog).
    pub fn ensure_catalog(&self, namespace: &Namespace) -> Result<Arc<Catalog>> {
        self.fetch_catalog(namespace)
    }

    /// Drop the cached catalog for the namespace's scope.
    pub fn invalidate_catalog(&self, namespace: &Namespace) {
        let _guard = lock(&self.catalog_lock);
        write(&self.catalogs).remove(&namespace.scope());
    }

    /// Discard and re-fetch the namespace's catalog.
    pub fn refresh_catalog(&self, namespace: &Namespace) -> Result<Arc<Catalog>> {
        self.invalidate_catalog(namespace);
        self.fetch_catalog(namespace)
    }

    /// Descriptor for `api_name` in the namespace's catalog.
    pub fn endpoint(&self, namespace: &Namespace, api_name: &str) -> Result<EndpointDescriptor> {
        let catalog = self.fetch_catalog(namespace)?;
        catalog.require(api_name).cloned()
    }

    fn cached_catalog(&self, scope: Scope) -> Option<Arc<Catalog>> {
        read(&self.catalogs).get(&scope).cloned()
    }

    fn discover(&self, namespace: &Namespace, scope: Scope) -> Result<Catalog> {
        let unavailable = |reason: String| SynoError::CatalogUnavailable {
            namespace: namespace.to_string(),
            reason,
        };

        tracing::debug!(namespace = %namespace, ?scope, "fetching API catalog");
        let mut params = base_params(INFO_API, "query", INFO_VERSION);
        params.push(("query".to_owned(), "all".to_owned()));
        let data = self
            .execute(INFO_PATH, HttpMethod::Get, params)
            .and_then(|resp| decode_body(INFO_API, &resp.body))
            .map_err(|e| unavailable(e.to_string()))?;

        let catalog = Catalog::from_discovery(scope, &data).map_err(unavailable)?;
        tracing::debug!(namespace = %namespace, ?scope, apis = catalog.len(), "API catalog loaded");
        Ok(catalog)
    }

    // ---- authentication ----

    /// Log into `namespace`, replacing any session identifier already held
    /// for it.
    ///
    /// # Errors
    ///
    /// - [`SynoError::Auth`]: `InvalidCredentials`, `OtpRequired` (server
    ///   demands a second factor and none is configured), `OtpInvalid`,
    ///   `AccountLocked`, `PasswordExpired`
    /// - [`SynoError::CatalogUnavailable`]: discovery failed
    ///
    /// On failure the namespace is left logged out.
    pub fn login(&self, namespace: &Namespace) -> Result<()> {
        let _guard = lock(&self.auth_lock);
        let result = self.handshake(namespace);
        let mut sids = write(&self.sids);
        match result {
            Ok(sid) => {
                sids.insert(namespace.clone(), sid);
                tracing::debug!(namespace = %namespace, "logged in");
                Ok(())
            }
            Err(err) => {
                sids.remove(namespace);
                if self.config.debug {
                    tracing::warn!(namespace = %namespace, category = err.category(), "login failed: {err}");
                }
                Err(err)
            }
        }
    }

    fn handshake(&self, namespace: &Namespace) -> Result<Arc<str>> {
        let auth = self.endpoint(namespace, AUTH_API)?;
        let version = auth.resolve_version(self.config.auth_version)?;

        let mut params = base_params(AUTH_API, "login", version);
        params.extend([
            ("account".to_owned(), self.config.username.clone()),
            ("passwd".to_owned(), self.config.password.clone()),
            ("session".to_owned(), namespace.to_string()),
            ("format".to_owned(), "sid".to_owned()),
        ]);

        let data = match self.auth_request(&auth, params.clone()) {
            Err(SynoError::Auth {
                kind: AuthErrorKind::OtpRequired,
                code,
            }) => {
                let Some(otp) = self.config.otp_code.as_deref() else {
                    return Err(SynoError::Auth {
                        kind: AuthErrorKind::OtpRequired,
                        code,
                    });
                };
                tracing::debug!(namespace = %namespace, code, "second factor requested, resubmitting with OTP");
                params.push(("otp_code".to_owned(), otp.to_owned()));
                self.auth_request(&auth, params)?
            }
            other => other?,
        };

        data.get("sid")
            .and_then(Value::as_str)
            .filter(|sid| !sid.is_empty())
            .map(Arc::from)
            .ok_or_else(|| {
                SynoError::request(
                    RequestErrorKind::Unclassified,
                    None,
                    "login succeeded without a session identifier",
                )
            })
    }

    fn auth_request(&self, auth: &EndpointDescriptor, params: Vec<(String, String)>) -> Result<Value> {
        let resp = self.execute(&auth.relative_path, HttpMethod::Get, params)?;
        decode_body(AUTH_API, &resp.body)
    }

    /// Log out of `namespace`.
    ///
    /// The local session identifier is dropped even if the server reports an
    /// error; that error is still returned. Logging out of a namespace with
    /// no session is a no-op.
    pub fn logout(&self, namespace: &Namespace) -> Result<()> {
        let _guard = lock(&self.auth_lock);
        let Some(sid) = self.current_session_id(namespace) else {
            tracing::debug!(namespace = %namespace, "logout without a session, nothing to do");
            return Ok(());
        };

        let result = self.invalidate(namespace, &sid);
        write(&self.sids).remove(namespace);
        match &result {
            Ok(()) => tracing::debug!(namespace = %namespace, "logged out"),
            Err(err) if self.config.debug => {
                tracing::warn!(namespace = %namespace, "server-side logout failed: {err}");
            }
            Err(_) => {}
        }
        result
    }

    fn invalidate(&self, namespace: &Namespace, sid: &str) -> Result<()> {
        let auth = self.endpoint(namespace, AUTH_API)?;
        let version = auth.resolve_version(self.config.auth_version)?;
        let mut params = base_params(AUTH_API, "logout", version);
        params.extend([
            ("session".to_owned(), namespace.to_string()),
            ("_sid".to_owned(), sid.to_owned()),
        ]);
        self.auth_request(&auth, params).map(drop)
    }

    /// Session identifier held for `namespace`, if logged in.
    pub fn current_session_id(&self, namespace: &Namespace) -> Option<Arc<str>> {
        read(&self.sids).get(namespace).cloned()
    }

    pub fn is_authenticated(&self, namespace: &Namespace) -> bool {
        read(&self.sids).contains_key(namespace)
    }

    /// Namespaces currently logged in, sorted.
    pub fn authenticated_namespaces(&self) -> Vec<Namespace> {
        let mut namespaces: Vec<Namespace> = read(&self.sids).keys().cloned().collect();
        namespaces.sort();
        namespaces
    }
}

// State behind these locks is only ever replaced whole, so a poisoned lock
// still holds a consistent value.
fn lock(mutex: &Mutex<()>) -> MutexGuard<'_, ()> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

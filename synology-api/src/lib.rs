//! Synology DSM Web API client library.
//!
//! Provides the session and dispatch layer every DSM endpoint goes through:
//! API catalog discovery, login (with one-time-password challenge), per-
//! namespace session scoping, version negotiation, envelope decoding and a
//! typed error taxonomy.
//!
//! # Quick start
//!
//! ```no_run
//! use synology_api::{ApiRequest, ClientConfig, SynoClient};
//! use synology_api::catalog::Namespace;
//!
//! let config = ClientConfig::new("nas.local", 5001, "admin", "secret").with_tls(false);
//! let client = SynoClient::connect(config).unwrap();
//!
//! let info = client.surveillance_info().unwrap();
//! println!("{} running {}", info.model, info.version.display());
//!
//! let req = ApiRequest::new("SYNO.Core.System", "info");
//! let data = client.request(&Namespace::core(), &req).unwrap();
//! println!("{data}");
//!
//! client.logout().unwrap();
//! ```
//!
//! # Layers
//!
//! | Type / module              | Role                                                |
//! |----------------------------|-----------------------------------------------------|
//! | [`catalog`]                | `SYNO.API.Info` discovery, version selection        |
//! | [`Session`]                | login/logout, per-namespace sids, catalog cache     |
//! | [`Session::dispatch`]      | request construction, JSON or raw response          |
//! | [`decoder`]                | `{success, data\|error}` envelope → `SynoError`     |
//! | [`transport`]              | `Transport` seam, `reqwest` implementation          |
//! | [`SynoClient`]             | connect/logout facade, re-login on expiry, helpers  |
//!
//! # Endpoint helpers
//!
//! | Method                                  | API                                   |
//! |-----------------------------------------|---------------------------------------|
//! | [`SynoClient::create_user`]             | `SYNO.Core.User` `create`             |
//! | [`SynoClient::surveillance_info`]       | `SYNO.SurveillanceStation.Info`       |
//! | [`SynoClient::camera_list`]             | `SYNO.SurveillanceStation.Camera`     |
//! | [`SynoClient::enable_cameras`]          | `SYNO.SurveillanceStation.Camera`     |
//! | [`SynoClient::disable_cameras`]         | `SYNO.SurveillanceStation.Camera`     |
//! | [`SynoClient::snapshot`]                | `SYNO.SurveillanceStation.Camera` (binary) |
//!
//! # Logging
//!
//! Events are emitted through [`tracing`]; installing a subscriber is left to
//! the application.

pub mod catalog;
pub mod client;
pub mod config;
mod core_user;
pub mod decoder;
pub mod dispatch;
pub mod error;
pub mod session;
mod surveillance;
pub mod transport;
pub mod types;

pub use catalog::{Catalog, EndpointDescriptor, Namespace, Scope};
pub use client::SynoClient;
pub use config::ClientConfig;
pub use dispatch::{ApiRequest, Response, ResponseMode};
pub use error::{AuthErrorKind, RequestErrorKind, Result, SynoError};
pub use session::Session;
pub use transport::{HttpTransport, Transport};

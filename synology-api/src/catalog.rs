//! API catalog discovery.
//!
//! Endpoint: `GET /webapi/query.cgi`
//!
//! Request: `{ "api": "SYNO.API.Info", "method": "query", "version": 1, "query": "all" }`
//!
//! Response:
//! ```json
//! {
//!   "success": true,
//!   "data": {
//!     "SYNO.API.Auth":  { "path": "auth.cgi",  "minVersion": 1, "maxVersion": 7 },
//!     "SYNO.Core.User": { "path": "entry.cgi", "minVersion": 1, "maxVersion": 1 },
//!     "SYNO.SurveillanceStation.Camera": { "path": "entry.cgi", "minVersion": 1, "maxVersion": 9 }
//!   }
//! }
//! ```
//!
//! The discovered names are split into two named catalogs. The
//! administrative scope holds `SYNO.Core.*`; the general scope holds
//! everything else. The bootstrap `SYNO.API.*` entries (discovery and auth)
//! appear in both so either scope can log in on its own.

use crate::error::{RequestErrorKind, Result, SynoError};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;

/// Name of the discovery API.
pub const INFO_API: &str = "SYNO.API.Info";
/// Fixed path of the discovery API, relative to `/webapi/`.
pub const INFO_PATH: &str = "query.cgi";
pub(crate) const INFO_VERSION: u32 = 1;

const CORE_PREFIX: &str = "SYNO.Core.";
const BOOTSTRAP_PREFIX: &str = "SYNO.API.";

/// An authentication and catalog scope on the server, passed as the
/// `session` field at login (`Core`, `SurveillanceStation`, `FileStation`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The administrative namespace.
    pub fn core() -> Self {
        Self::new("Core")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Which of the two catalogs this namespace reads from.
    pub fn scope(&self) -> Scope {
        if self.0.eq_ignore_ascii_case("Core") {
            Scope::Administrative
        } else {
            Scope::General
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Namespace {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// One of the two named catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// `SYNO.Core.*` administration APIs.
    Administrative,
    /// Application APIs (Surveillance Station, File Station, ...).
    General,
}

impl Scope {
    fn admits(self, api_name: &str) -> bool {
        let core = api_name.starts_with(CORE_PREFIX);
        match self {
            Self::Administrative => core || api_name.starts_with(BOOTSTRAP_PREFIX),
            Self::General => !core,
        }
    }
}

/// Where an API lives and which versions it speaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub api_name: String,
    /// Path relative to `/webapi/`, e.g. `entry.cgi`.
    pub relative_path: String,
    pub min_version: u32,
    pub max_version: u32,
}

impl EndpointDescriptor {
    /// Pick the version to send.
    ///
    /// Defaults to `max_version`. A pin outside `[min_version, max_version]`
    /// is rejected here and never reaches the server.
    pub fn resolve_version(&self, pin: Option<u32>) -> Result<u32> {
        let Some(version) = pin else {
            return Ok(self.max_version);
        };
        self.check_version(version)?;
        Ok(version)
    }

    pub fn supports(&self, version: u32) -> bool {
        (self.min_version..=self.max_version).contains(&version)
    }

    pub(crate) fn check_version(&self, version: u32) -> Result<()> {
        if self.supports(version) {
            return Ok(());
        }
        Err(SynoError::request(
            RequestErrorKind::VersionOutOfRange,
            None,
            format!(
                "{} supports versions {}..={}, got {version}",
                self.api_name, self.min_version, self.max_version
            ),
        ))
    }
}

#[derive(Deserialize)]
struct RawEntry {
    path: String,
    #[serde(rename = "minVersion")]
    min_version: u32,
    #[serde(rename = "maxVersion")]
    max_version: u32,
}

/// Immutable name → descriptor mapping for one [`Scope`].
#[derive(Debug, Clone)]
pub struct Catalog {
    scope: Scope,
    entries: BTreeMap<String, EndpointDescriptor>,
}

impl Catalog {
    /// Build the `scope` catalog from the `data` member of a discovery
    /// response.
    ///
    /// Any malformed entry fails the whole catalog; a partial catalog is
    /// never returned.
    pub fn from_discovery(scope: Scope, data: &Value) -> std::result::Result<Self, String> {
        let raw: HashMap<String, RawEntry> =
            serde_json::from_value(data.clone()).map_err(|e| format!("malformed discovery data: {e}"))?;

        let mut entries = BTreeMap::new();
        for (name, entry) in raw {
            if !scope.admits(&name) {
                continue;
            }
            if entry.path.is_empty() {
                return Err(format!("{name} has an empty path"));
            }
            if entry.min_version > entry.max_version {
                return Err(format!(
                    "{name} has minVersion {} above maxVersion {}",
                    entry.min_version, entry.max_version
                ));
            }
            let descriptor = EndpointDescriptor {
                api_name: name.clone(),
                relative_path: entry.path,
                min_version: entry.min_version,
                max_version: entry.max_version,
            };
            entries.insert(name, descriptor);
        }
        Ok(Self { scope, entries })
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn get(&self, api_name: &str) -> Option<&EndpointDescriptor> {
        self.entries.get(api_name)
    }

    /// Look up `api_name`, failing with `UnknownApiName` if absent.
    pub fn require(&self, api_name: &str) -> Result<&EndpointDescriptor> {
        self.get(api_name).ok_or_else(|| {
            SynoError::request(
                RequestErrorKind::UnknownApiName,
                None,
                format!("{api_name} is not in the {:?} catalog", self.scope),
            )
        })
    }

    /// All API names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// API names containing `fragment`, case-insensitively.
    pub fn search(&self, fragment: &str) -> Vec<&str> {
        let needle = fragment.to_ascii_lowercase();
        self.names()
            .filter(|name| name.to_ascii_lowercase().contains(&needle))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Data types for the endpoint helpers on [`SynoClient`](crate::SynoClient).
//!
//! Only the fields callers commonly need are typed; the full `data` payload
//! is always available through [`Session::call`](crate::Session::call).
//! Field names follow Rust conventions (`snake_case`) rather than the DSM
//! naming (camelCase).

use serde::{Deserialize, Serialize};

/// Parameters for `SYNO.Core.User` `create`.
///
/// Serialized field-for-field into the request, so the names here are the
/// wire names.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub password: String,
    pub email: String,
    pub description: String,
    pub cannot_chg_passwd: bool,
    /// Expiry date (`YYYY/MM/DD`) or `normal` for no expiry.
    pub expires: String,
    pub notify_by_email: bool,
    pub passwd_never_expires: bool,
    pub send_password: bool,
}

impl NewUser {
    /// A user with no expiry and no notifications.
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            email: String::new(),
            description: String::new(),
            cannot_chg_passwd: false,
            expires: "normal".into(),
            notify_by_email: false,
            passwd_never_expires: true,
            send_password: false,
        }
    }
}

/// Surveillance Station and host summary.
///
/// Returned by [`SynoClient::surveillance_info`](crate::SynoClient::surveillance_info).
///
/// API JSON fields: `DSModelName`, `hostname`, `cameraNumber`,
/// `maxCameraSupport`, `liscenseNumber` (sic), `timezone`, `version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveillanceInfo {
    #[serde(rename = "DSModelName", default)]
    pub model: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(rename = "cameraNumber", default)]
    pub camera_count: u32,
    #[serde(rename = "maxCameraSupport", default)]
    pub max_cameras: u32,
    #[serde(rename = "liscenseNumber", default)]
    pub license_count: u32,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub version: SurveillanceVersion,
}

/// Surveillance Station package version, reported as strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveillanceVersion {
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub minor: String,
    #[serde(default)]
    pub small: String,
    #[serde(default)]
    pub build: String,
}

impl SurveillanceVersion {
    /// `major.minor.small-build`, e.g. `9.2.2-11575`.
    pub fn display(&self) -> String {
        format!("{}.{}.{}-{}", self.major, self.minor, self.small, self.build)
    }
}

/// A camera as listed by `SYNO.SurveillanceStation.Camera` `List`.
///
/// API JSON fields: `id`, `newName`, `ip`, `port`, `vendor`, `model`,
/// `enabled`, `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub id: u64,
    #[serde(rename = "newName", default)]
    pub name: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub enabled: bool,
    /// Numeric camera status (1 = normal, 7 = disabled, ...).
    #[serde(default)]
    pub status: i64,
}

/// One page of cameras.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraList {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub cameras: Vec<Camera>,
}

/// Which stream profile a snapshot is taken from.
///
/// | Variant    | API value |
/// |------------|-----------|
/// | `High`     | 0         |
/// | `Balanced` | 1         |
/// | `Low`      | 2         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamProfile {
    High = 0,
    #[default]
    Balanced = 1,
    Low = 2,
}

//! Response envelope decoding.
//!
//! Every JSON response from the gateway shares this envelope:
//!
//! ```json
//! { "success": true,  "data": { ... } }
//! { "success": false, "error": { "code": 119, "errors": [ ... ] } }
//! ```
//!
//! Codes below 400 are global and mean the same thing for every API. Codes
//! from 400 upwards are defined per API family, so the API name is needed to
//! classify them.

use crate::error::{AuthErrorKind, RequestErrorKind, Result, SynoError};
use serde::Deserialize;
use serde_json::Value;

/// Inbound `{success, data|error}` wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

/// The `error` member of a failed envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: i64,
    /// Per-field detail some APIs attach (e.g. File Station path errors).
    #[serde(default)]
    pub errors: Option<Value>,
}

/// How a numeric code is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Auth(AuthErrorKind),
    Request(RequestErrorKind),
}

/// Parse `body` as an envelope and decode it.
pub fn decode_body(api_name: &str, body: &[u8]) -> Result<Value> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    decode(api_name, envelope)
}

/// Turn an envelope into its `data` or a typed error.
///
/// A successful envelope without `data` yields `Value::Null`. A failed
/// envelope always yields an error, even when the `error` member is
/// missing.
pub fn decode(api_name: &str, envelope: Envelope) -> Result<Value> {
    if envelope.success {
        return Ok(envelope.data.unwrap_or(Value::Null));
    }
    let Some(error) = envelope.error else {
        return Err(SynoError::request(
            RequestErrorKind::Unclassified,
            None,
            format!("{api_name} reported failure without an error code"),
        ));
    };
    Err(to_error(api_name, error.code))
}

/// Build the typed error for `code` as reported by `api_name`.
pub fn to_error(api_name: &str, code: i64) -> SynoError {
    match classify(api_name, code) {
        Classification::Auth(kind) => SynoError::Auth { kind, code },
        Classification::Request(kind) => {
            SynoError::request(kind, Some(code), describe(api_name, code))
        }
    }
}

pub fn classify(api_name: &str, code: i64) -> Classification {
    use Classification::{Auth, Request};
    use RequestErrorKind::{
        ParameterInvalid, PermissionDenied, QuotaExceeded, ResourceNotFound, Unclassified,
    };

    match code {
        101..=104 | 114 | 120..=149 => return Request(ParameterInvalid),
        105 => return Request(PermissionDenied),
        106 | 107 | 119 => return Auth(AuthErrorKind::SessionExpired),
        i64::MIN..=399 => return Request(Unclassified),
        _ => {}
    }

    match family(api_name) {
        Family::Auth => match code {
            400 => Auth(AuthErrorKind::InvalidCredentials),
            401 | 407 => Auth(AuthErrorKind::AccountLocked),
            402 => Request(PermissionDenied),
            403 | 406 => Auth(AuthErrorKind::OtpRequired),
            404 => Auth(AuthErrorKind::OtpInvalid),
            408..=410 => Auth(AuthErrorKind::PasswordExpired),
            _ => Request(Unclassified),
        },
        Family::FileStation => match code {
            400 => Request(ParameterInvalid),
            407 => Request(PermissionDenied),
            408 => Request(ResourceNotFound),
            415 | 416 => Request(QuotaExceeded),
            _ => Request(Unclassified),
        },
        Family::SurveillanceStation => match code {
            401 => Request(ParameterInvalid),
            414 | 418 => Request(ResourceNotFound),
            403 | 412 | 413 => Request(QuotaExceeded),
            _ => Request(Unclassified),
        },
        Family::Other => Request(Unclassified),
    }
}

/// Human-readable message for `code`.
pub fn describe(api_name: &str, code: i64) -> String {
    if let Some(message) = global_message(code) {
        return message.to_owned();
    }
    let message = match family(api_name) {
        Family::Auth => auth_message(code),
        Family::FileStation => file_station_message(code),
        Family::SurveillanceStation => surveillance_message(code),
        Family::Other => None,
    };
    match message {
        Some(message) => message.to_owned(),
        None => format!("undefined {api_name} error"),
    }
}

enum Family {
    Auth,
    FileStation,
    SurveillanceStation,
    Other,
}

fn family(api_name: &str) -> Family {
    if api_name == "SYNO.API.Auth" {
        Family::Auth
    } else if api_name.starts_with("SYNO.FileStation") {
        Family::FileStation
    } else if api_name.starts_with("SYNO.SurveillanceStation") {
        Family::SurveillanceStation
    } else {
        Family::Other
    }
}

fn global_message(code: i64) -> Option<&'static str> {
    Some(match code {
        100 => "Unknown error",
        101 => "No parameter of API, method or version",
        102 => "The requested API does not exist",
        103 => "The requested method does not exist",
        104 => "The requested version does not support the functionality",
        105 => "The logged in session does not have permission",
        106 => "Session timeout",
        107 => "Session interrupted by duplicated login",
        108 => "Failed to upload the file",
        109..=111 | 117 | 118 => "The network connection is unstable or the system is busy",
        114 => "Lost parameters for this API",
        115 => "Not allowed to upload a file",
        116 => "Not allowed to perform for a demo site",
        119 => "Invalid session",
        120..=149 => "Invalid parameter",
        150 => "Request source IP does not match the login IP",
        _ => return None,
    })
}

fn auth_message(code: i64) -> Option<&'static str> {
    Some(match code {
        400 => "No such account or incorrect password",
        401 => "Disabled account",
        402 => "Denied permission",
        403 => "2-factor authentication code required",
        404 => "Failed to authenticate 2-factor authentication code",
        406 => "Enforce to authenticate with 2-factor authentication code",
        407 => "Blocked IP source",
        408 => "Expired password cannot change",
        409 => "Expired password",
        410 => "Password must be changed",
        _ => return None,
    })
}

fn file_station_message(code: i64) -> Option<&'static str> {
    Some(match code {
        400 => "Invalid parameter of file operation",
        401 => "Unknown error of file operation",
        402 => "System is too busy",
        403 => "Invalid user does this file operation",
        404 => "Invalid group does this file operation",
        405 => "Invalid user and group does this file operation",
        406 => "Can't get user/group information from the account server",
        407 => "Operation not permitted",
        408 => "No such file or directory",
        409 => "Non-supported file system",
        410 => "Failed to connect internet-based file system",
        411 => "Read-only file system",
        412 => "Filename too long in the non-encrypted file system",
        413 => "Filename too long in the encrypted file system",
        414 => "File already exists",
        415 => "Disk quota exceeded",
        416 => "No space left on device",
        417 => "Input/output error",
        418 => "Illegal name or path",
        419 => "Illegal file name",
        420 => "Illegal file name on FAT file system",
        421 => "Device or resource busy",
        599 => "No such task of the file operation",
        _ => return None,
    })
}

fn surveillance_message(code: i64) -> Option<&'static str> {
    Some(match code {
        400 => "Execution failed",
        401 => "Invalid parameter",
        402 => "Camera disabled",
        403 => "Insufficient license",
        404 => "Codec activation failed",
        405 => "CMS server connection failed",
        407 => "CMS closed",
        412 => "Need to add license",
        413 => "Reach the maximum of platform",
        414 => "Some events not exist",
        415 => "Message connect failed",
        417 => "Test connection error",
        418 => "Object or VisualStation ID does not exist",
        419 => "VisualStation name repetition",
        439 => "Too many items selected",
        _ => return None,
    })
}

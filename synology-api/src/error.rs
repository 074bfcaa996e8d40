//! Error types for the Synology DSM Web API client.

use std::fmt;
use thiserror::Error;

/// Authentication failure subtypes.
///
/// Each maps to one or more numeric codes reported by `SYNO.API.Auth`, except
/// [`SessionExpired`](Self::SessionExpired) which comes from the global code
/// table (106, 107, 119) and may be returned by any endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    /// `400`: no such account or incorrect password.
    InvalidCredentials,
    /// `403` / `406`: a one-time password is required.
    OtpRequired,
    /// `404`: the one-time password was rejected.
    OtpInvalid,
    /// `401` / `407`: disabled account or blocked IP source.
    AccountLocked,
    /// `408` / `409` / `410`: the password expired or must be changed.
    PasswordExpired,
    /// The session identifier is no longer valid. Re-login and retry once.
    SessionExpired,
}

impl AuthErrorKind {
    /// Stable machine-readable name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid-credentials",
            Self::OtpRequired => "otp-required",
            Self::OtpInvalid => "otp-invalid",
            Self::AccountLocked => "account-locked",
            Self::PasswordExpired => "password-expired",
            Self::SessionExpired => "session-expired",
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request failure subtypes.
///
/// `UnknownApiName` and `VersionOutOfRange` are raised locally before any
/// network call; all other kinds are decoded from a server response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestErrorKind {
    UnknownApiName,
    VersionOutOfRange,
    ParameterInvalid,
    ResourceNotFound,
    PermissionDenied,
    QuotaExceeded,
    /// A vendor code this crate does not classify. The raw code is kept.
    Unclassified,
}

impl RequestErrorKind {
    /// Stable machine-readable name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownApiName => "unknown-api-name",
            Self::VersionOutOfRange => "version-out-of-range",
            Self::ParameterInvalid => "parameter-invalid",
            Self::ResourceNotFound => "resource-not-found",
            Self::PermissionDenied => "permission-denied",
            Self::QuotaExceeded => "quota-exceeded",
            Self::Unclassified => "unclassified-vendor-code",
        }
    }
}

impl fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when talking to a DSM Web API gateway.
#[derive(Debug, Error)]
pub enum SynoError {
    /// HTTP transport error (connection refused, timeout, TLS failure, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-2xx HTTP status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// API discovery failed or returned inconsistent data.
    #[error("API catalog unavailable for namespace {namespace}: {reason}")]
    CatalogUnavailable {
        /// Namespace whose catalog was being fetched.
        namespace: String,
        /// What went wrong.
        reason: String,
    },

    /// Login, OTP or session validity failure.
    #[error("authentication failed ({kind}, code {code})")]
    Auth {
        kind: AuthErrorKind,
        /// DSM error code from the response envelope.
        code: i64,
    },

    /// A request was rejected, locally or by the server.
    ///
    /// `code` is `None` for locally raised kinds.
    #[error("request failed ({kind}{}): {message}", code_suffix(*.code))]
    Request {
        kind: RequestErrorKind,
        code: Option<i64>,
        message: String,
    },

    /// The response body was not a valid envelope.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SynoError {
    pub(crate) fn request(kind: RequestErrorKind, code: Option<i64>, message: impl Into<String>) -> Self {
        Self::Request {
            kind,
            code,
            message: message.into(),
        }
    }

    /// Numeric DSM error code, if the failure was reported by the server.
    ///
    /// For [`SynoError::Status`] this is the HTTP status.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Auth { code, .. } => Some(*code),
            Self::Request { code, .. } => *code,
            Self::Status(status) => Some(i64::from(*status)),
            Self::Http(_) | Self::CatalogUnavailable { .. } | Self::Json(_) | Self::Config(_) => None,
        }
    }

    /// Stable dotted category, e.g. `auth.session-expired` or `transport`.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Http(_) | Self::Status(_) => "transport",
            Self::CatalogUnavailable { .. } => "catalog-unavailable",
            Self::Auth { kind, .. } => match kind {
                AuthErrorKind::InvalidCredentials => "auth.invalid-credentials",
                AuthErrorKind::OtpRequired => "auth.otp-required",
                AuthErrorKind::OtpInvalid => "auth.otp-invalid",
                AuthErrorKind::AccountLocked => "auth.account-locked",
                AuthErrorKind::PasswordExpired => "auth.password-expired",
                AuthErrorKind::SessionExpired => "auth.session-expired",
            },
            Self::Request { kind, .. } => match kind {
                RequestErrorKind::UnknownApiName => "request.unknown-api-name",
                RequestErrorKind::VersionOutOfRange => "request.version-out-of-range",
                RequestErrorKind::ParameterInvalid => "request.parameter-invalid",
                RequestErrorKind::ResourceNotFound => "request.resource-not-found",
                RequestErrorKind::PermissionDenied => "request.permission-denied",
                RequestErrorKind::QuotaExceeded => "request.quota-exceeded",
                RequestErrorKind::Unclassified => "request.unclassified-vendor-code",
            },
            Self::Json(_) => "decode",
            Self::Config(_) => "config",
        }
    }

    /// `true` when the caller may re-login and retry the failed call once.
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            Self::Auth {
                kind: AuthErrorKind::SessionExpired,
                ..
            }
        )
    }
}

fn code_suffix(code: Option<i64>) -> String {
    code.map(|c| format!(", code {c}")).unwrap_or_default()
}

/// Convenience alias for `Result<T, SynoError>`.
pub type Result<T> = std::result::Result<T, SynoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_stable() {
        let err = SynoError::Auth {
            kind: AuthErrorKind::SessionExpired,
            code: 119,
        };
        assert_eq!(err.category(), "auth.session-expired");
        assert_eq!(err.code(), Some(119));
        assert!(err.is_session_expired());

        let err = SynoError::request(RequestErrorKind::VersionOutOfRange, None, "v9");
        assert_eq!(err.category(), "request.version-out-of-range");
        assert_eq!(err.code(), None);
        assert!(!err.is_session_expired());
    }

    #[test]
    fn request_display_includes_code_when_present() {
        let err = SynoError::request(RequestErrorKind::ResourceNotFound, Some(408), "no such file");
        assert_eq!(
            err.to_string(),
            "request failed (resource-not-found, code 408): no such file"
        );
        let err = SynoError::request(RequestErrorKind::UnknownApiName, None, "SYNO.Nope");
        assert_eq!(err.to_string(), "request failed (unknown-api-name): SYNO.Nope");
    }
}

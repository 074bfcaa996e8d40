//! Request dispatch.
//!
//! Every call resolves to the same wire shape:
//!
//! ```text
//! GET /webapi/{path}?api={api}&method={method}&version={version}&_sid={sid}&{params...}
//! ```
//!
//! Parameter values are flattened to text: strings verbatim, numbers and
//! booleans via their JSON spelling, arrays and objects as compact JSON.
//! `null` values are left out.
//!
//! Responses come back either as a JSON envelope (decoded by
//! [`decoder`](crate::decoder)) or, for snapshots, recordings and exported
//! archives, as a raw body that is returned untouched.

use crate::catalog::{EndpointDescriptor, Namespace};
use crate::decoder::decode_body;
use crate::error::{RequestErrorKind, Result, SynoError};
use crate::session::Session;
use crate::transport::{HttpMethod, HttpRequest, HttpResponse};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

const RESERVED: [&str; 4] = ["api", "method", "version", "_sid"];

/// How the response body is interpreted. Chosen per call, never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Decode the `{success, data|error}` envelope and return `data`.
    Json,
    /// Return the body bytes verbatim.
    Raw,
}

/// Result of [`Session::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Json(Value),
    Raw(Vec<u8>),
}

impl Response {
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Raw(bytes) => Some(bytes),
            Self::Json(_) => None,
        }
    }
}

/// One API call: name, method, optional version pin and its parameters.
///
/// ```
/// use synology_api::ApiRequest;
///
/// let req = ApiRequest::new("SYNO.SurveillanceStation.Camera", "List")
///     .param("offset", 0)
///     .param("limit", 10)
///     .param_opt("idList", None::<&str>);
/// assert_eq!(req.api(), "SYNO.SurveillanceStation.Camera");
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    api: String,
    method: String,
    version: Option<u32>,
    params: BTreeMap<String, Value>,
    http_method: HttpMethod,
}

impl ApiRequest {
    pub fn new(api: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            method: method.into(),
            version: None,
            params: BTreeMap::new(),
            http_method: HttpMethod::Get,
        }
    }

    /// Pin the API version. Without a pin the highest advertised version
    /// is used.
    #[must_use]
    pub fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Add a parameter. `api`, `method`, `version` and `_sid` are set by the
    /// dispatcher and are ignored here.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a parameter only when `value` is `Some`.
    #[must_use]
    pub fn param_opt<V: Into<Value>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Add every top-level field of a serializable struct as a parameter.
    pub fn fields<T: Serialize>(mut self, fields: &T) -> Result<Self> {
        match serde_json::to_value(fields)? {
            Value::Object(map) => {
                self.params.extend(map);
                Ok(self)
            }
            other => Err(SynoError::request(
                RequestErrorKind::ParameterInvalid,
                None,
                format!("request fields must serialize to an object, got {other}"),
            )),
        }
    }

    /// Send the parameters as a POST form instead of a query string.
    #[must_use]
    pub fn post(mut self) -> Self {
        self.http_method = HttpMethod::Post;
        self
    }

    pub fn api(&self) -> &str {
        &self.api
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn pinned_version(&self) -> Option<u32> {
        self.version
    }

    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }
}

/// Render a parameter value for a flat key/value transport.
pub(crate) fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

pub(crate) fn base_params(api: &str, method: &str, version: u32) -> Vec<(String, String)> {
    vec![
        ("api".to_owned(), api.to_owned()),
        ("method".to_owned(), method.to_owned()),
        ("version".to_owned(), version.to_string()),
    ]
}

impl Session {
    /// Issue one request against `endpoint` and interpret the response
    /// according to `mode`.
    ///
    /// `endpoint` must describe `request.api`. The version (pinned or
    /// defaulted to `max_version`) is checked against it before anything is
    /// sent.
    ///
    /// The session identifier held for `namespace`, if any, is attached as
    /// `_sid`. A namespace that is not logged in is not rejected here: the
    /// bootstrap APIs take no sid, and any other API answers with a
    /// session-expired error from the server. [`SynoClient`](crate::SynoClient)
    /// logs in before dispatching.
    ///
    /// # Errors
    ///
    /// - [`SynoError::Request`] with `UnknownApiName`: `endpoint` belongs to
    ///   another API; no request sent
    /// - [`SynoError::Request`] with `VersionOutOfRange`: no request sent
    /// - [`SynoError::Http`] / [`SynoError::Status`]: transport failure, in
    ///   either mode
    /// - any decoded envelope failure, in [`ResponseMode::Json`]
    pub fn dispatch(
        &self,
        namespace: &Namespace,
        endpoint: &EndpointDescriptor,
        request: &ApiRequest,
        mode: ResponseMode,
    ) -> Result<Response> {
        if endpoint.api_name != request.api {
            return Err(SynoError::request(
                RequestErrorKind::UnknownApiName,
                None,
                format!("descriptor for {} used to call {}", endpoint.api_name, request.api),
            ));
        }
        let version = endpoint.resolve_version(request.version)?;

        let mut params = base_params(&request.api, &request.method, version);
        params.extend(
            request
                .params
                .iter()
                .filter(|(key, _)| !RESERVED.contains(&key.as_str()))
                .filter_map(|(key, value)| render(value).map(|v| (key.clone(), v))),
        );
        if let Some(sid) = self.current_session_id(namespace) {
            params.push(("_sid".to_owned(), sid.to_string()));
        }

        tracing::debug!(
            api = %request.api,
            method = %request.method,
            version,
            path = %endpoint.relative_path,
            namespace = %namespace,
            "dispatching"
        );
        let resp = self.execute(&endpoint.relative_path, request.http_method, params)?;

        match mode {
            ResponseMode::Raw => Ok(Response::Raw(resp.body)),
            ResponseMode::Json => decode_body(&request.api, &resp.body)
                .map(Response::Json)
                .inspect_err(|err| self.report(&request.api, &request.method, err)),
        }
    }

    /// Resolve `request.api` in the namespace's catalog and dispatch it,
    /// returning the envelope's `data`.
    pub fn call(&self, namespace: &Namespace, request: &ApiRequest) -> Result<Value> {
        let endpoint = self.endpoint(namespace, &request.api)?;
        let resp = self.dispatch(namespace, &endpoint, request, ResponseMode::Json)?;
        Ok(resp.into_json().unwrap_or(Value::Null))
    }

    /// Like [`call`](Self::call) but returns the raw body (images, video,
    /// archives).
    pub fn call_raw(&self, namespace: &Namespace, request: &ApiRequest) -> Result<Vec<u8>> {
        let endpoint = self.endpoint(namespace, &request.api)?;
        let resp = self.dispatch(namespace, &endpoint, request, ResponseMode::Raw)?;
        Ok(resp.into_bytes().unwrap_or_default())
    }

    /// Send already-rendered parameters to `{base_url}{path}`.
    ///
    /// Non-2xx statuses become [`SynoError::Status`].
    pub(crate) fn execute(
        &self,
        path: &str,
        http_method: HttpMethod,
        params: Vec<(String, String)>,
    ) -> Result<HttpResponse> {
        let request = HttpRequest {
            method: http_method,
            url: format!("{}{path}", self.base_url()),
            params,
        };
        let resp = self.transport().send(&request)?;
        if !resp.is_success() {
            return Err(SynoError::Status(resp.status));
        }
        Ok(resp)
    }

    fn report(&self, api: &str, method: &str, err: &SynoError) {
        if self.config().debug {
            tracing::warn!(api, method, code = ?err.code(), category = err.category(), "{err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::transport::mock::{MockTransport, api_info};
    use serde_json::json;
    use std::sync::Arc;

    fn session(mock: &Arc<MockTransport>) -> Session {
        let cfg = ClientConfig::new("nas", 5000, "admin", "pw");
        let transport: Arc<MockTransport> = Arc::clone(mock);
        Session::with_transport(cfg, transport).unwrap()
    }

    fn camera() -> EndpointDescriptor {
        EndpointDescriptor {
            api_name: "SYNO.SurveillanceStation.Camera".into(),
            relative_path: "entry.cgi".into(),
            min_version: 1,
            max_version: 9,
        }
    }

    fn ss() -> Namespace {
        Namespace::new("SurveillanceStation")
    }

    #[test]
    fn in_range_versions_are_sent_exactly() {
        let mock = Arc::new(MockTransport::with_responder(|_| {
            crate::transport::mock::json(&json!({ "success": true, "data": {} }))
        }));
        let session = session(&mock);
        for version in 1..=9 {
            let req = ApiRequest::new("SYNO.SurveillanceStation.Camera", "List").version(version);
            session.dispatch(&ss(), &camera(), &req, ResponseMode::Json).unwrap();
        }
        let sent: Vec<String> = mock
            .requests()
            .iter()
            .map(|r| r.param("version").unwrap().to_owned())
            .collect();
        assert_eq!(sent, (1..=9).map(|v| v.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn out_of_range_version_makes_no_network_call() {
        let mock = Arc::new(MockTransport::new());
        let session = session(&mock);
        for version in [0, 10] {
            let req = ApiRequest::new("SYNO.SurveillanceStation.Camera", "List").version(version);
            let err = session
                .dispatch(&ss(), &camera(), &req, ResponseMode::Json)
                .unwrap_err();
            assert_eq!(err.category(), "request.version-out-of-range");
        }
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn descriptor_of_another_api_is_rejected_locally() {
        let mock = Arc::new(MockTransport::new());
        let session = session(&mock);
        // Camera advertises 1..=9, Info only 1..=8
        let req = ApiRequest::new("SYNO.SurveillanceStation.Info", "GetInfo").version(9);
        let err = session
            .dispatch(&ss(), &camera(), &req, ResponseMode::Json)
            .unwrap_err();
        assert_eq!(err.category(), "request.unknown-api-name");
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn params_are_flattened_to_text() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(&json!({ "success": true, "data": null }));
        let session = session(&mock);
        let req = ApiRequest::new("SYNO.SurveillanceStation.Camera", "Save")
            .param("name", "front door")
            .param("port", 554)
            .param("enableLowProfile", true)
            .param("recordSchedule", json!([1, 2, 3]))
            .param("extra", json!({ "k": "v" }))
            .param("skipped", Value::Null)
            .param("api", "SYNO.Evil");
        session.dispatch(&ss(), &camera(), &req, ResponseMode::Json).unwrap();

        let sent = &mock.requests()[0];
        assert_eq!(sent.url, "http://nas:5000/webapi/entry.cgi");
        assert_eq!(sent.param("api"), Some("SYNO.SurveillanceStation.Camera"));
        assert_eq!(sent.param("method"), Some("Save"));
        assert_eq!(sent.param("version"), Some("9"));
        assert_eq!(sent.param("name"), Some("front door"));
        assert_eq!(sent.param("port"), Some("554"));
        assert_eq!(sent.param("enableLowProfile"), Some("true"));
        assert_eq!(sent.param("recordSchedule"), Some("[1,2,3]"));
        assert_eq!(sent.param("extra"), Some(r#"{"k":"v"}"#));
        assert_eq!(sent.param("skipped"), None);
        assert_eq!(sent.params.iter().filter(|(k, _)| k == "api").count(), 1);
        // not logged in, so no sid is attached
        assert_eq!(sent.param("_sid"), None);
    }

    #[test]
    fn session_expired_envelope_is_raised() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(&json!({ "success": false, "error": { "code": 119 } }));
        let session = session(&mock);
        let req = ApiRequest::new("SYNO.SurveillanceStation.Camera", "List");
        let err = session
            .dispatch(&ss(), &camera(), &req, ResponseMode::Json)
            .unwrap_err();
        assert!(err.is_session_expired());
    }

    #[test]
    fn success_envelope_returns_data_exactly() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(&json!({ "success": true, "data": { "x": 1 } }));
        let session = session(&mock);
        let req = ApiRequest::new("SYNO.SurveillanceStation.Camera", "List");
        let resp = session
            .dispatch(&ss(), &camera(), &req, ResponseMode::Json)
            .unwrap();
        assert_eq!(resp, Response::Json(json!({ "x": 1 })));
    }

    #[test]
    fn raw_mode_returns_body_verbatim() {
        let body = vec![0xFF, 0xD8, 0xFF, 0xE0, b'{', 0x00, 0x10];
        let mock = Arc::new(MockTransport::new());
        mock.push(200, body.clone());
        let session = session(&mock);
        let req = ApiRequest::new("SYNO.SurveillanceStation.Camera", "GetSnapshot");
        let resp = session
            .dispatch(&ss(), &camera(), &req, ResponseMode::Raw)
            .unwrap();
        assert_eq!(resp.into_bytes(), Some(body));
    }

    #[test]
    fn raw_mode_does_not_decode_failure_envelopes() {
        let body = json!({ "success": false, "error": { "code": 119 } }).to_string().into_bytes();
        let mock = Arc::new(MockTransport::new());
        mock.push(200, body.clone());
        let session = session(&mock);
        let req = ApiRequest::new("SYNO.SurveillanceStation.Camera", "GetSnapshot");
        let resp = session
            .dispatch(&ss(), &camera(), &req, ResponseMode::Raw)
            .unwrap();
        assert_eq!(resp, Response::Raw(body));
    }

    #[test]
    fn non_2xx_is_transport_error_in_both_modes() {
        let mock = Arc::new(MockTransport::new());
        mock.push(502, b"bad gateway".to_vec());
        mock.push(404, Vec::new());
        let session = session(&mock);
        let req = ApiRequest::new("SYNO.SurveillanceStation.Camera", "List");
        let err = session
            .dispatch(&ss(), &camera(), &req, ResponseMode::Json)
            .unwrap_err();
        assert!(matches!(err, SynoError::Status(502)));
        let err = session
            .dispatch(&ss(), &camera(), &req, ResponseMode::Raw)
            .unwrap_err();
        assert!(matches!(err, SynoError::Status(404)));
        assert_eq!(err.category(), "transport");
    }

    #[test]
    fn call_rejects_unknown_api_before_sending() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(&api_info());
        let session = session(&mock);
        let err = session
            .call(&ss(), &ApiRequest::new("SYNO.SurveillanceStation.Nope", "List"))
            .unwrap_err();
        assert_eq!(err.category(), "request.unknown-api-name");
        // only the discovery call went out
        assert_eq!(mock.requests().len(), 1);
        assert_eq!(mock.count_api("SYNO.API.Info"), 1);
    }

    #[test]
    fn post_requests_use_form_method() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(&json!({ "success": true }));
        let session = session(&mock);
        let req = ApiRequest::new("SYNO.SurveillanceStation.Camera", "Save").post();
        session.dispatch(&ss(), &camera(), &req, ResponseMode::Json).unwrap();
        assert_eq!(mock.requests()[0].method, HttpMethod::Post);
    }

    #[test]
    fn fields_merge_struct_members() {
        #[derive(Serialize)]
        struct Fields {
            name: &'static str,
            expires: Option<String>,
        }
        let req = ApiRequest::new("SYNO.Core.User", "create")
            .fields(&Fields { name: "alice", expires: None })
            .unwrap();
        assert_eq!(req.params().get("name"), Some(&json!("alice")));
        assert_eq!(req.params().get("expires"), Some(&Value::Null));
        assert!(ApiRequest::new("SYNO.Core.User", "create").fields(&42).is_err());
    }
}

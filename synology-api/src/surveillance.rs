//! Surveillance Station APIs.
//!
//! # Endpoints
//!
//! ## `surveillance_info`: `SYNO.SurveillanceStation.Info` `GetInfo`
//!
//! Response:
//! ```json
//! {
//!   "success": true,
//!   "data": {
//!     "DSModelName": "DS723+", "hostname": "nas", "cameraNumber": 1,
//!     "maxCameraSupport": 40, "liscenseNumber": 2, "timezone": "Amsterdam",
//!     "version": { "major": "9", "minor": "2", "small": "2", "build": "11575" }
//!   }
//! }
//! ```
//!
//! ## `camera_list`: `SYNO.SurveillanceStation.Camera` `List`
//!
//! Request: `{ "offset": 0, "limit": 0, "basic": true, "privCamType": 3, ... }`
//! (`limit: 0` means all cameras).
//!
//! ## `enable_cameras` / `disable_cameras`: `Enable` / `Disable`
//!
//! Request: `{ "idList": "1,2,3" }`
//!
//! ## `snapshot`: `GetSnapshot`
//!
//! Request: `{ "id": 1, "profileType": 1 }`. The response is a JPEG body,
//! not an envelope.

use crate::catalog::Namespace;
use crate::client::SynoClient;
use crate::dispatch::ApiRequest;
use crate::error::Result;
use crate::types::{CameraList, StreamProfile, SurveillanceInfo};
use serde_json::Value;

const INFO_API: &str = "SYNO.SurveillanceStation.Info";
const CAMERA_API: &str = "SYNO.SurveillanceStation.Camera";

fn namespace() -> Namespace {
    Namespace::new("SurveillanceStation")
}

fn id_list(ids: &[u64]) -> String {
    ids.iter().map(u64::to_string).collect::<Vec<_>>().join(",")
}

impl SynoClient {
    /// Surveillance Station version and host summary.
    pub fn surveillance_info(&self) -> Result<SurveillanceInfo> {
        let data = self.request(&namespace(), &ApiRequest::new(INFO_API, "GetInfo"))?;
        Ok(serde_json::from_value(data)?)
    }

    /// List cameras, `limit == 0` meaning all of them.
    pub fn camera_list(&self, offset: u64, limit: u64) -> Result<CameraList> {
        let req = ApiRequest::new(CAMERA_API, "List")
            .param("offset", offset)
            .param("limit", limit)
            .param("basic", true)
            .param("streamInfo", true)
            .param("blIncludeDeletedCam", false)
            .param("privCamType", 3)
            .param("camStm", 2);
        let data = self.request(&namespace(), &req)?;
        Ok(serde_json::from_value(data)?)
    }

    pub fn enable_cameras(&self, ids: &[u64]) -> Result<Value> {
        let req = ApiRequest::new(CAMERA_API, "Enable").param("idList", id_list(ids));
        self.request(&namespace(), &req)
    }

    pub fn disable_cameras(&self, ids: &[u64]) -> Result<Value> {
        let req = ApiRequest::new(CAMERA_API, "Disable").param("idList", id_list(ids));
        self.request(&namespace(), &req)
    }

    /// Current frame from a camera as JPEG bytes.
    pub fn snapshot(&self, camera_id: u64, profile: StreamProfile) -> Result<Vec<u8>> {
        let req = ApiRequest::new(CAMERA_API, "GetSnapshot")
            .param("id", camera_id)
            .param("profileType", profile as u8);
        self.request_raw(&namespace(), &req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::Session;
    use crate::transport::mock::{MockTransport, api_info, json};
    use crate::transport::{HttpRequest, HttpResponse};
    use serde_json::json;
    use std::sync::Arc;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xDB, 0x00, 0x43, 0xFF, 0xD9];

    fn client() -> (Arc<MockTransport>, SynoClient) {
        let mock = Arc::new(MockTransport::with_responder(|req: &HttpRequest| {
            match (req.param("api"), req.param("method")) {
                (Some("SYNO.API.Info"), _) => json(&api_info()),
                (Some("SYNO.API.Auth"), _) => {
                    json(&json!({ "success": true, "data": { "sid": req.param("session") } }))
                }
                (Some(INFO_API), _) => json(&json!({
                    "success": true,
                    "data": {
                        "DSModelName": "DS723+",
                        "hostname": "nas",
                        "cameraNumber": 1,
                        "maxCameraSupport": 40,
                        "liscenseNumber": 2,
                        "timezone": "Amsterdam",
                        "version": { "major": "9", "minor": "2", "small": "2", "build": "11575" }
                    }
                })),
                (Some(CAMERA_API), Some("List")) => json(&json!({
                    "success": true,
                    "data": {
                        "total": 1,
                        "cameras": [{
                            "id": 1, "newName": "Front", "ip": "10.0.0.9", "port": 554,
                            "vendor": "Axis", "model": "M3045", "enabled": true, "status": 1
                        }]
                    }
                })),
                (Some(CAMERA_API), Some("GetSnapshot")) => HttpResponse {
                    status: 200,
                    body: JPEG.to_vec(),
                },
                (Some(CAMERA_API), Some("Enable")) => {
                    json(&json!({ "success": false, "error": { "code": 418 } }))
                }
                _ => json(&json!({ "success": true })),
            }
        }));
        let transport: Arc<MockTransport> = Arc::clone(&mock);
        let session =
            Session::with_transport(ClientConfig::new("nas", 5000, "admin", "pw"), transport)
                .unwrap();
        (mock, SynoClient::with_session(session).unwrap())
    }

    #[test]
    fn info_is_typed() {
        let (_, client) = client();
        let info = client.surveillance_info().unwrap();
        assert_eq!(info.model, "DS723+");
        assert_eq!(info.max_cameras, 40);
        assert_eq!(info.version.display(), "9.2.2-11575");
    }

    #[test]
    fn calls_use_the_surveillance_session() {
        let (mock, client) = client();
        client.surveillance_info().unwrap();
        let sent = mock
            .requests()
            .into_iter()
            .find(|r| r.param("api") == Some(INFO_API))
            .unwrap();
        assert_eq!(sent.param("_sid"), Some("SurveillanceStation"));
        assert_eq!(sent.param("version"), Some("8"));
    }

    #[test]
    fn camera_list_is_typed() {
        let (_, client) = client();
        let list = client.camera_list(0, 0).unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.cameras[0].name, "Front");
        assert!(list.cameras[0].enabled);
    }

    #[test]
    fn snapshot_returns_raw_bytes() {
        let (mock, client) = client();
        let bytes = client.snapshot(1, StreamProfile::Balanced).unwrap();
        assert_eq!(bytes, JPEG);
        let sent = mock
            .requests()
            .into_iter()
            .find(|r| r.param("method") == Some("GetSnapshot"))
            .unwrap();
        assert_eq!(sent.param("profileType"), Some("1"));
    }

    #[test]
    fn server_errors_surface_from_helpers() {
        let (mock, client) = client();
        let err = client.enable_cameras(&[1, 7]).unwrap_err();
        assert_eq!(err.category(), "request.resource-not-found");
        assert_eq!(err.code(), Some(418));
        let sent = mock
            .requests()
            .into_iter()
            .find(|r| r.param("method") == Some("Enable"))
            .unwrap();
        assert_eq!(sent.param("idList"), Some("1,7"));
    }
}

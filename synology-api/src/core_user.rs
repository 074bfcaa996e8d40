//! User administration API.
//!
//! Endpoint: `SYNO.Core.User` `create` (administrative catalog, `Core`
//! session).
//!
//! Request: the fields of [`NewUser`] verbatim, e.g.
//! `{ "name": "alice", "password": "...", "expires": "normal", ... }`.

use crate::catalog::Namespace;
use crate::client::SynoClient;
use crate::dispatch::ApiRequest;
use crate::error::Result;
use crate::types::NewUser;
use serde_json::Value;

impl SynoClient {
    /// Create a local DSM user. Requires an administrator account.
    pub fn create_user(&self, user: &NewUser) -> Result<Value> {
        let req = ApiRequest::new("SYNO.Core.User", "create").fields(user)?.post();
        self.request(&Namespace::core(), &req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::Session;
    use crate::transport::HttpMethod;
    use crate::transport::mock::{MockTransport, api_info};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn create_user_posts_struct_fields() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(&api_info())
            .push_json(&json!({ "success": true, "data": { "sid": "s" } }))
            .push_json(&api_info())
            .push_json(&json!({ "success": true, "data": { "name": "alice", "uid": 1030 } }));
        let transport: Arc<MockTransport> = Arc::clone(&mock);
        let session =
            Session::with_transport(ClientConfig::new("nas", 5000, "admin", "pw"), transport)
                .unwrap();
        let client = SynoClient::with_session(session).unwrap();

        let data = client.create_user(&NewUser::new("alice", "s3cret")).unwrap();
        assert_eq!(data["uid"], 1030);

        let sent = mock.requests().pop().unwrap();
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.param("api"), Some("SYNO.Core.User"));
        assert_eq!(sent.param("method"), Some("create"));
        assert_eq!(sent.param("name"), Some("alice"));
        assert_eq!(sent.param("passwd_never_expires"), Some("true"));
        assert_eq!(sent.param("expires"), Some("normal"));
        assert_eq!(sent.param("_sid"), Some("s"));
    }

    #[test]
    fn permission_denied_is_reported() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(&api_info())
            .push_json(&json!({ "success": true, "data": { "sid": "s" } }))
            .push_json(&api_info())
            .push_json(&json!({ "success": false, "error": { "code": 105 } }));
        let transport: Arc<MockTransport> = Arc::clone(&mock);
        let session =
            Session::with_transport(ClientConfig::new("nas", 5000, "admin", "pw"), transport)
                .unwrap();
        let client = SynoClient::with_session(session).unwrap();
        let err = client.create_user(&NewUser::new("bob", "pw")).unwrap_err();
        assert_eq!(err.category(), "request.permission-denied");
    }
}

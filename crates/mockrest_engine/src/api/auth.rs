/* 📖 # Why is the login token not signed?

The login endpoint exists so client code that stores and forwards a bearer token can be
exercised without an identity provider. The token has the familiar three-segment shape, but
the outer segments are fixed placeholders and the middle one is plain base64 JSON, so tests
can inspect it. Nothing here authenticates anyone.
*/

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose};
use base64::{Engine as _, alphabet};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use mockrest_base::{
    ErrorKind, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpStatusCode, MockApiError,
    MockApiResult,
};

use super::endpoint::EndpointHandler;
use crate::request::RequestInfo;
use crate::response::data_response;

const LOGIN: &str = "login";
const TOKEN_LIFETIME: Duration = Duration::from_secs(30 * 60);

// Tokens minted elsewhere often drop the `=` padding
const TOKEN_PAYLOAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The current session set by the last login.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct Session {
    id: Value,
    name: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Credentials {
    uid: Value,
    uname: Value,
}

/// Simulated login at `<base>/login`.
///
/// `POST` with `{uid, uname}` starts a session and answers `{token, uid, uname}`; `GET`
/// answers `{data: <session or null>}`. One session per backend; a new login replaces it.
#[derive(Debug, Default)]
pub struct LoginEndpoint {
    session: Mutex<Option<Session>>,
}

impl LoginEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_session(&self) -> HttpResponse {
        let session = self.session.lock().clone();
        data_response(HttpStatusCode::OK, json!(session))
    }

    fn login(&self, request: &HttpRequest) -> MockApiResult<HttpResponse> {
        let body = request
            .body()
            .as_json()
            .map_err(|e| malformed(e.to_string()))?
            .unwrap_or_else(|| json!({}));
        let credentials: Credentials =
            serde_json::from_value(body).map_err(|e| malformed(e.to_string()))?;

        let session = Session {
            id: credentials.uid,
            name: credentials.uname,
        };
        let token = issue_token(&session);
        info!(uid = %session.id, "login session started");
        let response = HttpResponse::json(json!({
            "token": token,
            "uid": session.id,
            "uname": session.name,
        }));
        *self.session.lock() = Some(session);
        Ok(response)
    }
}

impl EndpointHandler for LoginEndpoint {
    fn name(&self) -> &str {
        LOGIN
    }

    fn handle(
        &self,
        request: &HttpRequest,
        _info: &RequestInfo,
    ) -> MockApiResult<Option<HttpResponse>> {
        match request.method() {
            HttpMethod::Get => Ok(Some(self.current_session())),
            HttpMethod::Post => self.login(request).map(Some),
            _ => Ok(None),
        }
    }

    fn reset(&self) {
        *self.session.lock() = None;
    }
}

fn issue_token(session: &Session) -> String {
    let expires = unix_seconds() + TOKEN_LIFETIME.as_secs();
    let placeholder = encode_segment(&json!({"test": "test"}));
    let payload = encode_segment(&json!({
        "uid": session.id,
        "uname": session.name,
        "exp": expires,
    }));
    format!("{placeholder}.{payload}.{placeholder}")
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn encode_segment(value: &Value) -> String {
    general_purpose::STANDARD.encode(value.to_string())
}

/// The user id carried by a `Bearer` token in the `Authorization` header.
///
/// Anything unexpected (no header, wrong shape, bad base64, bad JSON, no numeric uid) yields
/// `None`.
pub(crate) fn uid_from_authorization(headers: &HttpHeaders) -> Option<i64> {
    let authorization = headers.get("Authorization")?;
    let token = authorization
        .find("Bearer ")
        .map(|ix| &authorization[ix + "Bearer ".len()..])?;
    let payload = token.split('.').nth(1)?;
    let decoded = match TOKEN_PAYLOAD.decode(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "ignoring bearer token with invalid payload encoding");
            return None;
        }
    };
    let claims: Value = match serde_json::from_slice(&decoded) {
        Ok(claims) => claims,
        Err(e) => {
            warn!(error = %e, "ignoring bearer token with invalid payload");
            return None;
        }
    };
    match claims.get("uid")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn malformed(message: String) -> Box<MockApiError> {
    Box::new(MockApiError::new(ErrorKind::MalformedBody { message }))
}

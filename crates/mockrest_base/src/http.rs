/* 📖 # Why a dedicated HTTP module in the base crate?

The engine never touches a socket. A host interception layer hands it a request descriptor
and expects a response descriptor back, possibly later. These types are that contract, and
`HttpBackend` is the seam shared by the in-memory engine and any pass-through transport.
*/

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use serde_json::Value;

/// HTTP methods supported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// Parse an HTTP method from a string.
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    /// Convert the method to its string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP headers collection.
///
/// Header names are matched case-insensitively; the spelling used on first insert is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    inner: BTreeMap<String, String>,
}

impl HttpHeaders {
    /// Create empty headers.
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    fn find_key(&self, key: &str) -> Option<&String> {
        self.inner.keys().find(|k| k.eq_ignore_ascii_case(key))
    }

    /// Insert a header, replacing any value stored under the same name.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let existing = self.find_key(&key).cloned();
        self.inner.insert(existing.unwrap_or(key), value.into());
    }

    /// Get a header value.
    pub fn get(&self, key: &str) -> Option<&String> {
        self.find_key(key).and_then(|k| self.inner.get(k))
    }

    /// Check if a header exists.
    pub fn contains(&self, key: &str) -> bool {
        self.find_key(key).is_some()
    }

    /// Remove a header.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let existing = self.find_key(key).cloned()?;
        self.inner.remove(&existing)
    }

    /// Iterate over all headers in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.inner.iter()
    }

    /// Returns true if no header is set.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<BTreeMap<String, String>> for HttpHeaders {
    fn from(map: BTreeMap<String, String>) -> Self {
        let mut headers = Self::new();
        for (key, value) in map {
            headers.insert(key, value);
        }
        headers
    }
}

/* 📖 # Why does HttpBody have a Json variant?
Every body the engine produces is JSON (`{data: ...}`, `{error: ...}` or a login token).
Keeping it as a `serde_json::Value` until the host asks for bytes means hosts and tests can
inspect it without a parse step. Request bodies arrive as raw text from the host.
*/

/// Request or response body content.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum HttpBody {
    /// No body
    #[default]
    Empty,
    /// Raw body content
    Bytes(Vec<u8>),
    /// Structured JSON content
    Json(Value),
}

impl HttpBody {
    /// Create an empty body.
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }

    /// Create from string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Bytes(s.into().into_bytes())
    }

    /// Get content as a string if valid UTF-8.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Self::Empty => Some(String::new()),
            Self::Bytes(bytes) => String::from_utf8(bytes.clone()).ok(),
            Self::Json(value) => Some(value.to_string()),
        }
    }

    /// Get content as JSON.
    ///
    /// Raw content is parsed on demand; an empty body is `Ok(None)`.
    pub fn as_json(&self) -> Result<Option<Value>, serde_json::Error> {
        match self {
            Self::Empty => Ok(None),
            Self::Bytes(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(None),
            Self::Bytes(bytes) => serde_json::from_slice(bytes).map(Some),
            Self::Json(value) => Ok(Some(value.clone())),
        }
    }

    /// Check if body is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Bytes(bytes) => bytes.is_empty(),
            Self::Json(_) => false,
        }
    }

    /// Serialize the content to bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Empty => vec![],
            Self::Bytes(bytes) => bytes,
            Self::Json(value) => value.to_string().into_bytes(),
        }
    }
}

impl From<Vec<u8>> for HttpBody {
    fn from(v: Vec<u8>) -> Self {
        Self::from_bytes(v)
    }
}

impl From<String> for HttpBody {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl From<&str> for HttpBody {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl From<Value> for HttpBody {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// HTTP request descriptor handed over by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    method: HttpMethod,
    url: String,
    headers: HttpHeaders,
    body: HttpBody,
}

impl HttpRequest {
    /// Create a new HTTP request.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HttpHeaders::new(),
            body: HttpBody::empty(),
        }
    }

    /// Get the HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Get the request URL as given by the host (absolute or relative).
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the request headers.
    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Get the request body.
    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<HttpBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }
}

/// HTTP status code.
///
/// Any `u16` can be carried (a pass-through transport may answer with anything); the named
/// constants cover what the engine itself produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HttpStatusCode(u16);

impl HttpStatusCode {
    pub const OK: Self = Self(200);
    pub const CREATED: Self = Self(201);
    pub const NO_CONTENT: Self = Self(204);
    pub const NOT_FOUND: Self = Self(404);
    pub const METHOD_NOT_ALLOWED: Self = Self(405);
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);

    /// Get the numeric status code.
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// True for 2xx codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Get the standard reason phrase, if the code is a registered one.
    pub fn reason_phrase(&self) -> Option<&'static str> {
        let text = match self.0 {
            100 => "Continue",
            101 => "Switching Protocols",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            203 => "Non-Authoritative Information",
            204 => "No Content",
            205 => "Reset Content",
            206 => "Partial Content",
            300 => "Multiple Choices",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            305 => "Use Proxy",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            402 => "Payment Required",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            406 => "Not Acceptable",
            407 => "Proxy Authentication Required",
            408 => "Request Timeout",
            409 => "Conflict",
            410 => "Gone",
            411 => "Length Required",
            412 => "Precondition Failed",
            413 => "Payload Too Large",
            414 => "URI Too Long",
            415 => "Unsupported Media Type",
            416 => "Range Not Satisfiable",
            417 => "Expectation Failed",
            418 => "I'm a teapot",
            422 => "Unprocessable Entity",
            426 => "Upgrade Required",
            428 => "Precondition Required",
            429 => "Too Many Requests",
            431 => "Request Header Fields Too Large",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            505 => "HTTP Version Not Supported",
            511 => "Network Authentication Required",
            _ => return None,
        };
        Some(text)
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl std::fmt::Display for HttpStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP response descriptor delivered back to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    status: HttpStatusCode,
    status_text: String,
    headers: HttpHeaders,
    body: HttpBody,
}

impl HttpResponse {
    /// Create a new response with the given status.
    pub fn new(status: HttpStatusCode) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: HttpHeaders::new(),
            body: HttpBody::empty(),
        }
    }

    /// Create a 200 OK response.
    pub fn ok() -> Self {
        Self::new(HttpStatusCode::OK)
    }

    /// Create a 204 No Content response.
    pub fn no_content() -> Self {
        Self::new(HttpStatusCode::NO_CONTENT)
    }

    /// Create a 500 Internal Server Error response.
    pub fn internal_error() -> Self {
        Self::new(HttpStatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the status code.
    pub fn status(&self) -> HttpStatusCode {
        self.status
    }

    /// Get the human-readable status text (empty until a response builder sets it).
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// True when the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the headers.
    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Get mutable access to headers.
    pub fn headers_mut(&mut self) -> &mut HttpHeaders {
        &mut self.headers
    }

    /// Get the body.
    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    /// Take ownership of the body.
    pub fn into_body(self) -> HttpBody {
        self.body
    }

    /// Set the response body.
    pub fn with_body(mut self, body: impl Into<HttpBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set the Content-Type header.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// Set the status code.
    pub fn with_status(mut self, status: HttpStatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set the status text.
    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    /// Create a 200 JSON response.
    pub fn json(body: Value) -> Self {
        Self::ok()
            .with_content_type("application/json")
            .with_body(body)
    }
}

/* 📖 # Why a single HttpBackend trait?

Both the in-memory engine and a real pass-through transport take a request and produce a
response some time later. Sharing one trait lets a host swap one for the other, and lets the
engine hold its pass-through transport as just another backend.
*/

/// Trait for anything that can answer an HTTP request asynchronously.
pub trait HttpBackend: std::fmt::Debug + Send + Sync + 'static {
    /// Handle an HTTP request and return a future resolving to the response.
    fn handle_request(&self, request: HttpRequest) -> BoxFuture<'static, HttpResponse>;
}

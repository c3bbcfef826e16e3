/* 📖 # Why have mockrest_base as a core library?
mockrest_base provides the error type and the HTTP descriptor types shared by the engine,
the CLI and any pass-through transport. Keeping them here means a transport crate can depend
on the request/response shapes without pulling in the engine.
*/

pub mod error;
pub mod http;
pub mod tracing;

// Re-export commonly used types for convenience
pub use error::{ErrorKind, MockApiError, MockApiResult, ResultExt};
pub use http::{
    HttpBackend, HttpBody, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpStatusCode,
};

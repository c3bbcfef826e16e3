use mockrest_base::{HttpRequest, HttpResponse, MockApiResult};

use crate::request::RequestInfo;

/// A custom endpoint answered before generic collection CRUD.
///
/// The dispatcher offers a request to every endpoint whose `name` equals the request's
/// collection name, in registration order. Returning `Ok(None)` lets the request fall through.
pub trait EndpointHandler: std::fmt::Debug + Send + Sync + 'static {
    /// Collection name this endpoint answers for.
    fn name(&self) -> &str;

    /// Handle a request addressed to this endpoint.
    fn handle(&self, request: &HttpRequest, info: &RequestInfo)
    -> MockApiResult<Option<HttpResponse>>;

    /// Discard any session state held by the endpoint.
    fn reset(&self) {}
}

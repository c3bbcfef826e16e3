use serde_json::json;

use mockrest_base::{
    ErrorKind, HttpMethod, HttpRequest, HttpResponse, MockApiError, MockApiResult, err,
};

use super::service::InMemoryBackend;
use crate::request::RequestInfo;

/// Base segment that addresses administrative commands instead of a collection.
pub(crate) const COMMANDS_BASE: &str = "commands";

/// Run the command named by the request's collection segment.
///
/// Command responses carry no `{data}` wrapper and no headers of their own.
pub(crate) fn handle_command(
    backend: &InMemoryBackend,
    request: &HttpRequest,
    info: &RequestInfo,
) -> MockApiResult<HttpResponse> {
    let command = info.collection_name.to_lowercase();
    match command.as_str() {
        "resetdb" => {
            backend.reset_db()?;
            Ok(HttpResponse::ok())
        }
        "config" if request.method() == HttpMethod::Get => {
            Ok(HttpResponse::ok().with_body(backend.config().to_json()))
        }
        "config" => {
            let partial = request
                .body()
                .as_json()
                .map_err(|e| {
                    Box::new(MockApiError::new(ErrorKind::MalformedBody {
                        message: e.to_string(),
                    }))
                })?
                .unwrap_or_else(|| json!({}));
            backend.update_config(partial)?;
            Ok(HttpResponse::no_content())
        }
        _ => Err(err!("Unknown command \"{}\"", command)),
    }
}

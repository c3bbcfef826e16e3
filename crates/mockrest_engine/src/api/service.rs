/* 📖 # Why compute the response before the delay starts?

The simulated latency models the network, not the server. Every store mutation happens
synchronously inside `handle`, so a later request sees it immediately even when the earlier
response is still "in flight". The returned future only waits and hands over a finished
response; dropping it cancels delivery and nothing else.
*/

/* 📖 # Why does every error become a 500 here?

Handlers propagate failures with `?` and never build error responses for unexpected
conditions themselves. `handle` is the single place that turns an `Err` into
`{"error": "<message>"}`, so malformed bodies, bad filters, unknown commands and URL parse
failures all reach the client the same way.
*/

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use mockrest_base::{HttpBackend, HttpRequest, HttpResponse, HttpStatusCode, MockApiResult};

use super::auth::{LoginEndpoint, uid_from_authorization};
use super::collection::{CollectionHandler, collection_not_found};
use super::commands::{COMMANDS_BASE, handle_command};
use super::endpoint::EndpointHandler;
use crate::config::BackendConfig;
use crate::request::parse_url;
use crate::response::{deliver, error_response, finalize};
use crate::store::{SeedProvider, StoreHandle};

enum Dispatch {
    Respond(HttpResponse),
    PassThru(Arc<dyn HttpBackend>),
}

/// A REST backend simulated in memory.
///
/// Each instance owns its collection store, configuration and endpoint state; instances never
/// share anything.
pub struct InMemoryBackend {
    seed: Box<dyn SeedProvider>,
    store: StoreHandle,
    config: RwLock<BackendConfig>,
    endpoints: Vec<Box<dyn EndpointHandler>>,
    pass_thru: Option<Arc<dyn HttpBackend>>,
}

impl InMemoryBackend {
    /// Create a backend seeded from `seed`, with the `login` endpoint registered.
    pub fn new(seed: impl SeedProvider, config: BackendConfig) -> MockApiResult<Self> {
        let db = seed.create_db()?;
        debug!(collections = ?db.names().collect::<Vec<_>>(), "seeded collection store");
        Ok(Self {
            seed: Box::new(seed),
            store: StoreHandle::new(db),
            config: RwLock::new(config),
            endpoints: vec![Box::new(LoginEndpoint::new())],
            pass_thru: None,
        })
    }

    /// Register a custom endpoint. Endpoints are tried in registration order.
    pub fn with_endpoint(mut self, endpoint: impl EndpointHandler) -> Self {
        self.endpoints.push(Box::new(endpoint));
        self
    }

    /// Set the backend that answers unknown collections when `passThruUnknownUrl` is on.
    pub fn with_pass_thru(mut self, backend: impl HttpBackend) -> Self {
        self.pass_thru = Some(Arc::new(backend));
        self
    }

    /// A copy of the live configuration.
    pub fn config(&self) -> BackendConfig {
        self.config.read().clone()
    }

    /// Merge a partial configuration object into the live configuration.
    pub fn update_config(&self, partial: Value) -> MockApiResult<()> {
        self.config.write().merge_json(partial)?;
        info!("configuration updated");
        Ok(())
    }

    /// The collection store.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Replace the collection store with a fresh one from the seed provider.
    pub fn reset_db(&self) -> MockApiResult<()> {
        let db = self.seed.create_db()?;
        self.store.replace(db);
        info!("collection store reset");
        Ok(())
    }

    /// Discard the state of every endpoint, such as the login session.
    pub fn reset_sessions(&self) {
        for endpoint in &self.endpoints {
            endpoint.reset();
        }
    }

    /// Handle a request.
    ///
    /// The response is computed before this returns; the future delivers it after the
    /// configured delay. Pass-through requests return the transport's future as is.
    pub fn handle(&self, request: HttpRequest) -> BoxFuture<'static, HttpResponse> {
        let response = match self.dispatch_request(&request) {
            Ok(Dispatch::Respond(response)) => response,
            Ok(Dispatch::PassThru(backend)) => {
                debug!(url = request.url(), "passing request through");
                return backend.handle_request(request);
            }
            Err(e) => {
                warn!(url = request.url(), error = %e, "request failed");
                error_response(HttpStatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        let config = self.config.read();
        deliver(finalize(response, &config), config.delay)
    }

    #[instrument(skip_all, fields(method = %request.method(), url = request.url()))]
    fn dispatch_request(&self, request: &HttpRequest) -> MockApiResult<Dispatch> {
        let config = self.config();
        let mut info = parse_url(request.url(), &config)?;
        if config.use_jwt {
            info.uid = uid_from_authorization(request.headers());
        }

        if info.base.eq_ignore_ascii_case(COMMANDS_BASE) {
            debug!(command = %info.collection_name, "dispatching command");
            return handle_command(self, request, &info).map(Dispatch::Respond);
        }

        for endpoint in self
            .endpoints
            .iter()
            .filter(|endpoint| endpoint.name() == info.collection_name)
        {
            if let Some(response) = endpoint.handle(request, &info)? {
                debug!(endpoint = endpoint.name(), "handled by custom endpoint");
                return Ok(Dispatch::Respond(response));
            }
        }

        if self.store.contains_collection(&info.collection_name) {
            return CollectionHandler::new(&self.store, &config, &info)
                .handle(request)
                .map(Dispatch::Respond);
        }

        if config.pass_thru_unknown_url {
            match &self.pass_thru {
                Some(backend) => return Ok(Dispatch::PassThru(backend.clone())),
                None => warn!(
                    collection = %info.collection_name,
                    "pass-through enabled but no pass-through backend configured"
                ),
            }
        }
        Ok(Dispatch::Respond(collection_not_found(&info.collection_name)))
    }
}

impl fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("store", &self.store)
            .field("config", &*self.config.read())
            .field("endpoints", &self.endpoints)
            .field("pass_thru", &self.pass_thru.is_some())
            .finish()
    }
}

impl HttpBackend for InMemoryBackend {
    fn handle_request(&self, request: HttpRequest) -> BoxFuture<'static, HttpResponse> {
        self.handle(request)
    }
}

pub mod api;
pub mod config;
pub mod params;
pub mod query;
pub mod record;
pub mod request;
pub mod response;
pub mod store;


pub use api::{EndpointHandler, InMemoryBackend, LoginEndpoint};
pub use config::{BackendConfig, DefaultResponseOptions, load_config};
pub use params::{UrlParameters, UrlParametersParser};
pub use record::{Record, RecordId};
pub use request::{QueryParams, RequestInfo, parse_url};
pub use store::{Collection, Database, JsonSeed, SeedProvider, StoreHandle};

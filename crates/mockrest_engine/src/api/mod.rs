/* 📖 # Why an API module in mockrest_engine?

The api module turns request descriptors into response descriptors. `InMemoryBackend` is the
single entry point; it routes each request to one of three handler families:

- commands: administrative operations under the reserved `commands` base
- endpoints: custom handlers keyed by collection name, such as `login`
- collections: generic CRUD against the collection store

Everything a handler returns, including errors, passes through the response builder before
delivery.
*/

mod auth;
mod collection;
mod commands;
mod endpoint;
mod service;

pub use auth::LoginEndpoint;
pub use endpoint::EndpointHandler;
pub use service::InMemoryBackend;

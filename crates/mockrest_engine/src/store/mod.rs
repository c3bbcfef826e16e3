pub mod memory;
pub mod traits;

pub use memory::{Collection, Database, Upsert};
pub use traits::{JsonSeed, SeedProvider, StoreHandle};

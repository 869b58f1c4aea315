// Adapters layer: concrete sources and sinks for collections.

pub mod local;
pub mod memory;

pub use local::LocalStorage;
pub use memory::InMemoryStore;

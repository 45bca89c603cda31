//! SurrealDB repository implementations.

mod flag_store;

pub use flag_store::SurrealFlagStore;

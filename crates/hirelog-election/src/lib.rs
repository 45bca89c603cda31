//! hirelog election: keeps "at most one flagged resource per owner"
//! true for every resource family, across create, update and delete.
//!
//! Request handlers never assign the flag themselves. After a storage
//! mutation they call the matching [`LifecycleHooks`] method, which
//! routes through the [`ElectionManager`].

pub mod config;
pub mod hooks;
mod lock;
pub mod manager;

pub use config::ElectionConfig;
pub use hooks::{FamilyHooks, LifecycleHooks};
pub use manager::ElectionManager;

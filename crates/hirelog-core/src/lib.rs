//! hirelog core: domain models, error taxonomy and the storage
//! trait shared by every other crate in the workspace.

pub mod error;
pub mod models;
pub mod repository;

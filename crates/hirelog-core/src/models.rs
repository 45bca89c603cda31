//! Domain models for hirelog.

pub mod caller;
pub mod permission;
pub mod resource;

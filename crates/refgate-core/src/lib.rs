//! # refgate-core
//!
//! Core types shared across all refgate crates.
//!
//! - `Domain`: the enumerated set of independently deployed databases
//! - `Reference`: a typed pointer from one domain into another
//! - Entity structs for migration status and reference audit rows
//! - Admin response types (`RunReport`, `MigrationDetail`)
//! - Cross-cutting error types

pub mod domain;
pub mod entities;
pub mod errors;
pub mod reference;
pub mod responses;

pub use domain::{Domain, MasterSource};
pub use reference::Reference;

//! Cross-domain reference resolution, validation, and audited writes.

pub mod cache;
pub mod validator;
pub mod writer;

pub use cache::ReferenceCache;
pub use validator::ReferenceValidator;
pub use writer::{InsertedEntity, NewEntity, ReferenceUpdate, ReferenceWriter};

//! Typed cross-domain reference.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::Domain;

/// An identifier stored in one domain that designates a master record owned
/// by another.
///
/// The storage engine never enforces these; every write that carries one
/// must pass it through the reference validator first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Reference {
    pub domain: Domain,
    pub id: i64,
}

impl Reference {
    #[must_use]
    pub const fn new(domain: Domain, id: i64) -> Self {
        Self { domain, id }
    }

    #[must_use]
    pub const fn units(id: i64) -> Self {
        Self::new(Domain::Units, id)
    }

    #[must_use]
    pub const fn materials(id: i64) -> Self {
        Self::new(Domain::Materials, id)
    }

    #[must_use]
    pub const fn users(id: i64) -> Self {
        Self::new(Domain::Users, id)
    }

    #[must_use]
    pub const fn sizecolor(id: i64) -> Self {
        Self::new(Domain::Sizecolor, id)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.domain, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_domain_hash_id() {
        assert_eq!(Reference::units(42).to_string(), "units#42");
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_value(Reference::materials(7)).unwrap();
        assert_eq!(json, serde_json::json!({"domain": "materials", "id": 7}));
    }
}

//! Logical database domains.
//!
//! Every domain is an independently deployed database with its own schema.
//! Nothing may join across two domains; relationships between them are
//! carried as [`Reference`](crate::Reference) values and checked at write
//! time.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

/// One independently deployed logical database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Users,
    Settings,
    Merchandiser,
    Samples,
    Sizecolor,
    Units,
    Materials,
}

/// Table and id column holding the master records of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterSource {
    pub table: &'static str,
    pub id_column: &'static str,
}

impl Domain {
    /// All domains in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Users,
        Self::Settings,
        Self::Merchandiser,
        Self::Samples,
        Self::Sizecolor,
        Self::Units,
        Self::Materials,
    ];

    /// Return the string representation used in SQL storage and file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Settings => "settings",
            Self::Merchandiser => "merchandiser",
            Self::Samples => "samples",
            Self::Sizecolor => "sizecolor",
            Self::Units => "units",
            Self::Materials => "materials",
        }
    }

    /// Where other domains resolve references into this one.
    ///
    /// Uses an exhaustive match so a new domain cannot be added without
    /// declaring its master table.
    #[must_use]
    pub const fn master_source(self) -> MasterSource {
        let table = match self {
            Self::Users => "users",
            Self::Settings => "settings",
            Self::Merchandiser => "merchandisers",
            Self::Samples => "samples",
            Self::Sizecolor => "size_colors",
            Self::Units => "units",
            Self::Materials => "materials",
        };
        MasterSource {
            table,
            id_column: "id",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == needle)
            .ok_or_else(|| CoreError::Validation(format!("unknown domain '{s}'")))
    }
}

//! Capabilities granted to accounts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TypeError;

/// A capability an account may hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// May administer the registry and grant or revoke capabilities.
    Admin,
    /// May create distributions.
    Distributor,
}

impl Capability {
    /// Stable role name, used in authorization errors and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Admin => "DEFAULT_ADMIN_ROLE",
            Capability::Distributor => "DISTRIBUTOR_ROLE",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEFAULT_ADMIN_ROLE" | "admin" => Ok(Capability::Admin),
            "DISTRIBUTOR_ROLE" | "distributor" => Ok(Capability::Distributor),
            other => Err(TypeError::UnknownCapability(other.to_string())),
        }
    }
}

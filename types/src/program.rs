//! Identifiers for the two watched ledger programs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which on-ledger program a state diff originated from.
///
/// The mirror watches two program addresses: the main rewards program and
/// the governance program. Each has its own state map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Program {
    /// The main social-rewards program.
    Main,
    /// The governance program.
    Governance,
}

impl Program {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Governance => "governance",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

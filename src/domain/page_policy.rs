//! What pagination does after a page fails to load.

use serde::{Deserialize, Serialize};

/// Behaviour of the next scroll trigger after a page fetch failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PageErrorPolicy {
    /// Fetch the failed page again instead of moving on.
    Retry,
    /// Move on to the next page, leaving the failed one behind.
    #[default]
    Skip,
    /// Stop paginating for the rest of the session.
    Halt,
}

impl std::fmt::Display for PageErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retry => write!(f, "retry"),
            Self::Skip => write!(f, "skip"),
            Self::Halt => write!(f, "halt"),
        }
    }
}

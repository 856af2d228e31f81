// Configuration for an STV count

use serde::{Deserialize, Serialize};

/// Tabulation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabulationOptions {
    /// No Confidence may be eliminated for having the fewest votes.
    pub can_eliminate_no_confidence: bool,
    /// Ties that survive every other rule are settled by the permutation.
    /// When false the count halts instead.
    pub can_random_tiebreak: bool,
    /// Fixed permutation for the final tie-break. A fresh one is generated
    /// per count when absent.
    pub tiebreak_permutation: Option<String>,
}

impl Default for TabulationOptions {
    fn default() -> Self {
        Self {
            can_eliminate_no_confidence: true,
            can_random_tiebreak: true,
            tiebreak_permutation: None,
        }
    }
}

impl TabulationOptions {
    pub fn with_tiebreak_permutation(mut self, permutation: impl Into<String>) -> Self {
        self.tiebreak_permutation = Some(permutation.into());
        self
    }
}

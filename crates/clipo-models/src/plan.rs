//! Plan tiers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Plan tier enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Starter,
    Pro,
    Agency,
}

impl PlanTier {
    /// Parse from string (case-insensitive). Unknown plans map to free.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "starter" => PlanTier::Starter,
            "pro" => PlanTier::Pro,
            "agency" => PlanTier::Agency,
            _ => PlanTier::Free,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Starter => "starter",
            PlanTier::Pro => "pro",
            PlanTier::Agency => "agency",
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, PlanTier::Free)
    }

    /// Free renders carry a watermark.
    pub fn requires_watermark(&self) -> bool {
        matches!(self, PlanTier::Free)
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a single call site against the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Valid,
    UnknownSymbol,
    SignatureMismatch,
    Unverifiable,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Valid => "VALID",
            Verdict::UnknownSymbol => "UNKNOWN_SYMBOL",
            Verdict::SignatureMismatch => "SIGNATURE_MISMATCH",
            Verdict::Unverifiable => "UNVERIFIABLE",
        };
        write!(f, "{}", s)
    }
}

/// One validated call site in the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub line: u32,
    pub callee_text: String,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub suggestions: Vec<String>,
}

/// Aggregated validation result for one script against one repository.
/// Deterministic for identical input: no timestamps, no randomness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallucinationReport {
    pub repository: String,
    pub total_calls: usize,
    pub valid: usize,
    pub unknown_symbol: usize,
    pub signature_mismatch: usize,
    pub unverifiable: usize,
    /// `(2 * unknown_symbol + signature_mismatch) / resolved call count`,
    /// 0.0 when nothing resolved.
    pub severity_score: f64,
    /// Ordered by source line number.
    pub findings: Vec<Finding>,
}

impl HallucinationReport {
    /// True when the script referenced symbols that do not exist or used
    /// them with an incompatible shape.
    pub fn has_hallucinations(&self) -> bool {
        self.unknown_symbol > 0 || self.signature_mismatch > 0
    }
}

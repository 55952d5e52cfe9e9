//! Script analysis and knowledge-graph validation: walk a Python script,
//! resolve every call through its imports and tracked instances, classify
//! each against an indexed repository, and report the hallucinations.

pub mod analyzer;
pub mod detector;
pub mod reporter;
pub mod suggest;
pub mod validator;

pub use analyzer::{ScriptAnalysis, ScriptAnalyzer, SCRIPT_MODULE};
pub use detector::HallucinationDetector;
pub use reporter::build_report;
pub use suggest::{closest_matches, levenshtein};
pub use validator::{check_shape, KnowledgeGraphValidator, ValidatorSettings};

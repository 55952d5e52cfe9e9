use graphcheck_core::{CallSite, Finding, HallucinationReport, Verdict};

/// Fold per-call findings into the final report. Severity weighs a
/// nonexistent symbol twice as heavily as a wrong shape and is normalized
/// by the number of calls whose target resolved at all, so unverifiable
/// noise neither inflates nor masks the score.
pub fn build_report(
    repository: impl Into<String>,
    calls: &[CallSite],
    findings: Vec<Finding>,
) -> HallucinationReport {
    let mut valid = 0;
    let mut unknown_symbol = 0;
    let mut signature_mismatch = 0;
    let mut unverifiable = 0;
    for finding in &findings {
        match finding.verdict {
            Verdict::Valid => valid += 1,
            Verdict::UnknownSymbol => unknown_symbol += 1,
            Verdict::SignatureMismatch => signature_mismatch += 1,
            Verdict::Unverifiable => unverifiable += 1,
        }
    }

    let resolved = calls.iter().filter(|c| c.resolved.is_some()).count();
    let severity_score = if resolved == 0 {
        0.0
    } else {
        (2 * unknown_symbol + signature_mismatch) as f64 / resolved as f64
    };

    HallucinationReport {
        repository: repository.into(),
        total_calls: calls.len(),
        valid,
        unknown_symbol,
        signature_mismatch,
        unverifiable,
        severity_score,
        findings,
    }
}

use crate::core::registry::Registry;
use crate::domain::model::{CorrectionResult, Hub, PostalCode};
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use serde::{Deserialize, Serialize};

/// 修正建議的門檻設定
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionPolicy {
    /// Inputs shorter than this are too unreliable to correct.
    pub min_length: usize,
    /// Lowest positional similarity accepted as a suggestion.
    pub threshold: f64,
}

impl Default for CorrectionPolicy {
    fn default() -> Self {
        Self {
            min_length: 4,
            threshold: 0.5,
        }
    }
}

impl Validate for CorrectionPolicy {
    fn validate(&self) -> Result<()> {
        validate_positive_number("correction.min_length", self.min_length, 1)?;
        validate_range("correction.threshold", self.threshold, 0.0, 1.0)
    }
}

/// Fraction of positions at which `a` and `b` hold the same character,
/// normalised by the longer of the two.
pub fn positional_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    let matches = a.chars().zip(b.chars()).filter(|(x, y)| x == y).count();
    matches as f64 / longest as f64
}

/// Checks pincodes against a registry snapshot and proposes corrections.
pub struct PincodeValidator<'r> {
    registry: &'r Registry,
    policy: CorrectionPolicy,
}

impl<'r> PincodeValidator<'r> {
    pub fn new(registry: &'r Registry, policy: CorrectionPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn verify(&self, code: &str) -> (bool, Option<&'r Hub>) {
        if !PostalCode::is_well_formed(code) {
            return (false, None);
        }
        match self.registry.owner(code) {
            Some(hub) => (true, Some(hub)),
            None => (false, None),
        }
    }

    pub fn suggest(&self, code: &str) -> CorrectionResult {
        if code.is_empty() || code.chars().count() < self.policy.min_length {
            tracing::debug!("pincode '{}' too short to correct", code);
            return CorrectionResult::none();
        }

        let mut best: Option<&PostalCode> = None;
        let mut highest = 0.0_f64;

        // 依宣告順序掃描，只在分數嚴格較高時更新，相同分數保留先出現者
        for candidate in self.registry.codes() {
            let score = positional_similarity(code, candidate.as_str());
            if score > highest {
                highest = score;
                best = Some(candidate);
            }
        }

        match best {
            Some(candidate) if highest >= self.policy.threshold => {
                tracing::debug!(
                    "suggesting {} for '{}' (confidence {:.3})",
                    candidate,
                    code,
                    highest
                );
                CorrectionResult {
                    suggested_code: Some(candidate.clone()),
                    confidence: highest,
                }
            }
            _ => CorrectionResult::none(),
        }
    }
}

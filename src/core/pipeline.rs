use crate::core::registry::{Registry, SharedRegistry};
use crate::core::resolver::{HubLookup, HubResolver};
use crate::core::segmenter::AddressSegmenter;
use crate::core::validator::{CorrectionPolicy, PincodeValidator};
use crate::domain::model::{
    CorrectionAudit, GeocodeHint, PincodeCheck, PipelineOutcome, PostalCode, Resolution,
};
use crate::utils::error::{Result, RouterError};
use std::fmt;

/// 管線階段，依序執行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Segment,
    Validate,
    Correct,
    Resolve,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Segment => "segment",
            Stage::Validate => "validate",
            Stage::Correct => "correct",
            Stage::Resolve => "resolve",
        };
        f.write_str(name)
    }
}

/// Segment → Validate → Correct (optional) → Resolve.
///
/// Every stage is pure over its input and the registry snapshot taken at the
/// start of the call, so invocations can run concurrently without locking.
/// Corrections are returned as [`CorrectionAudit`] values for the caller to
/// persist; this type performs no I/O.
#[derive(Debug, Clone)]
pub struct AddressPipeline {
    registry: SharedRegistry,
    segmenter: AddressSegmenter,
    policy: CorrectionPolicy,
}

impl AddressPipeline {
    pub fn new(registry: SharedRegistry, segmenter: AddressSegmenter, policy: CorrectionPolicy) -> Self {
        Self {
            registry,
            segmenter,
            policy,
        }
    }

    pub fn with_defaults(registry: SharedRegistry) -> Result<Self> {
        Ok(Self::new(
            registry,
            AddressSegmenter::new()?,
            CorrectionPolicy::default(),
        ))
    }

    /// 處理一筆原始地址文字
    ///
    /// The segmented pincode is used when present; otherwise the geocoding
    /// hint's pincode, if any. Other hint fields are carried for display only.
    pub fn process(&self, raw_text: &str, hint: Option<GeocodeHint>) -> Result<PipelineOutcome> {
        let registry = self.registry.snapshot()?;

        tracing::debug!(stage = %Stage::Segment, "running stage");
        let parsed = self.segmenter.segment(raw_text)?;

        let candidate = parsed
            .pincode
            .as_ref()
            .map(|code| code.as_str().to_string())
            .or_else(|| {
                hint.as_ref()
                    .and_then(|h| h.pincode.as_deref())
                    .map(str::trim)
                    .filter(|code| !code.is_empty())
                    .map(str::to_string)
            });

        let (resolution, audit) = match candidate {
            Some(code) => self.reconcile(&registry, &code, raw_text),
            None => {
                tracing::debug!("no pincode in address, skipping validation");
                (Resolution::UnresolvedNoPincode, None)
            }
        };

        Ok(PipelineOutcome {
            parsed,
            geocoded: hint,
            resolution,
            audit,
        })
    }

    /// Pincode-check flow: validate, otherwise suggest a correction.
    pub fn check_pincode(
        &self,
        pincode: &str,
        address_text: Option<&str>,
    ) -> Result<(PincodeCheck, Option<CorrectionAudit>)> {
        if pincode.is_empty() {
            return Err(RouterError::invalid_input("No pincode provided"));
        }
        let registry = self.registry.snapshot()?;
        let validator = PincodeValidator::new(&registry, self.policy);

        if let (true, Some(hub)) = validator.verify(pincode) {
            return Ok((
                PincodeCheck {
                    is_valid: true,
                    pincode: Some(pincode.to_string()),
                    suggestion: None,
                    confidence: None,
                    hub: Some(hub.name.clone()),
                    message: format!("Valid pincode for {}", hub.name),
                },
                None,
            ));
        }

        let correction = validator.suggest(pincode);
        let suggested = correction
            .suggested_code
            .map(|code| (HubResolver::new(&registry).resolve(code.as_str()).label(), code));

        match suggested {
            Some((hub, suggestion)) => {
                let audit = CorrectionAudit {
                    original: pincode.to_string(),
                    corrected: suggestion.clone(),
                    source_text: address_text.unwrap_or_default().to_string(),
                    confidence: correction.confidence,
                };
                Ok((
                    PincodeCheck {
                        is_valid: false,
                        pincode: None,
                        message: format!(
                            "Invalid pincode. Did you mean {} for {}?",
                            suggestion, hub
                        ),
                        suggestion: Some(suggestion),
                        confidence: Some(correction.confidence),
                        hub: Some(hub.to_string()),
                    },
                    Some(audit),
                ))
            }
            None => Ok((
                PincodeCheck {
                    is_valid: false,
                    pincode: None,
                    suggestion: None,
                    confidence: None,
                    hub: None,
                    message: "Invalid pincode. No suggestion available.".to_string(),
                },
                None,
            )),
        }
    }

    fn reconcile(
        &self,
        registry: &Registry,
        code: &str,
        source_text: &str,
    ) -> (Resolution, Option<CorrectionAudit>) {
        let validator = PincodeValidator::new(registry, self.policy);
        let resolver = HubResolver::new(registry);

        if PostalCode::is_well_formed(code) {
            tracing::debug!(stage = %Stage::Validate, pincode = code, "running stage");
            if let (true, Some(_)) = validator.verify(code) {
                tracing::debug!(stage = %Stage::Resolve, pincode = code, "running stage");
                if let HubLookup::Found(hub) = resolver.resolve(code) {
                    return (
                        Resolution::Resolved {
                            hub: hub.name.clone(),
                        },
                        None,
                    );
                }
            }
        }

        tracing::debug!(stage = %Stage::Correct, pincode = code, "running stage");
        let correction = validator.suggest(code);
        let Some(suggestion) = correction.suggested_code else {
            tracing::info!("❓ No registry match for pincode '{}'", code);
            return (
                Resolution::UnresolvedNoMatch {
                    original: code.to_string(),
                },
                None,
            );
        };

        tracing::debug!(stage = %Stage::Resolve, pincode = %suggestion, "running stage");
        match resolver.resolve(suggestion.as_str()) {
            HubLookup::Found(hub) => {
                tracing::info!(
                    "🔧 Corrected pincode {} → {} ({:.2}) for {}",
                    code,
                    suggestion,
                    correction.confidence,
                    hub.name
                );
                let audit = CorrectionAudit {
                    original: code.to_string(),
                    corrected: suggestion.clone(),
                    source_text: source_text.to_string(),
                    confidence: correction.confidence,
                };
                (
                    Resolution::ResolvedViaSuggestion {
                        hub: hub.name.clone(),
                        original: code.to_string(),
                        suggestion,
                        confidence: correction.confidence,
                    },
                    Some(audit),
                )
            }
            HubLookup::NotFound => (
                Resolution::UnresolvedNoMatch {
                    original: code.to_string(),
                },
                None,
            ),
        }
    }
}

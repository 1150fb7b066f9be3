//! Label Decider: metrics -> primary label, with an optional learned-model
//! override when the rules resolve to `NEUTRAL`.

use sonify_spec::{Label, Metrics, RuleSet};

/// An opaque learned predictor. Never trusted to invent labels outside the
/// four defined values — [`Label::from_model_output`] degrades anything
/// else to `NEUTRAL`. The fixed feature-vector schema is
/// `[ctr, impressions, position, clicks, volatility_index]`
/// ([`Metrics::feature_vector`]).
pub trait LabelModel {
    fn predict(&self, features: &[f64; 5]) -> Result<String, ModelError>;
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("label model error: {0}")]
pub struct ModelError(pub String);

pub struct LabelDecision {
    pub label: Label,
    /// Set when the learned model was consulted but failed; the decision
    /// still falls back to the rules result rather than failing the job.
    pub model_warning: Option<String>,
}

/// Decides the primary label for a job.
///
/// Rules are evaluated first (first match wins, guaranteed to match by the
/// trailing default). If the rules result is `NEUTRAL` and
/// `allow_ml_override` is set, the optional model is consulted; a model
/// error is logged/returned as a warning and the rules result is kept.
pub fn decide_label(
    rules: &RuleSet,
    metrics: &Metrics,
    model: Option<&dyn LabelModel>,
    allow_ml_override: bool,
) -> LabelDecision {
    let rules_label = rules.decide(metrics);

    if rules_label != Label::Neutral || !allow_ml_override {
        return LabelDecision {
            label: rules_label,
            model_warning: None,
        };
    }

    match model {
        Some(model) => match model.predict(&metrics.feature_vector()) {
            Ok(raw) => LabelDecision {
                label: Label::from_model_output(&raw),
                model_warning: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "label model error, falling back to rules result");
                LabelDecision {
                    label: rules_label,
                    model_warning: Some(e.to_string()),
                }
            }
        },
        None => LabelDecision {
            label: rules_label,
            model_warning: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonify_spec::{Predicate, Rule};
    use std::collections::HashMap;

    fn metrics(ctr: f64) -> Metrics {
        Metrics {
            ctr: Some(ctr),
            impressions: None,
            position: None,
            clicks: None,
            volatility_index: None,
        }
    }

    fn default_rules() -> RuleSet {
        RuleSet {
            rules: vec![
                Rule {
                    when: HashMap::from([("ctr".to_string(), Predicate::Ge { value: 0.7 })]),
                    choose_label: Label::MomentumPos,
                },
                Rule {
                    when: HashMap::new(),
                    choose_label: Label::Neutral,
                },
            ],
        }
    }

    struct AlwaysFails;
    impl LabelModel for AlwaysFails {
        fn predict(&self, _features: &[f64; 5]) -> Result<String, ModelError> {
            Err(ModelError("boom".to_string()))
        }
    }

    struct FixedOutput(&'static str);
    impl LabelModel for FixedOutput {
        fn predict(&self, _features: &[f64; 5]) -> Result<String, ModelError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn model_not_consulted_when_rules_are_not_neutral() {
        let rules = default_rules();
        let decision = decide_label(&rules, &metrics(0.9), Some(&AlwaysFails), true);
        assert_eq!(decision.label, Label::MomentumPos);
        assert!(decision.model_warning.is_none());
    }

    #[test]
    fn model_error_downgrades_to_rules_result() {
        let rules = default_rules();
        let decision = decide_label(&rules, &metrics(0.1), Some(&AlwaysFails), true);
        assert_eq!(decision.label, Label::Neutral);
        assert!(decision.model_warning.is_some());
    }

    #[test]
    fn model_bogus_output_degrades_to_neutral() {
        let rules = default_rules();
        let decision = decide_label(&rules, &metrics(0.1), Some(&FixedOutput("NONSENSE")), true);
        assert_eq!(decision.label, Label::Neutral);
    }

    #[test]
    fn model_not_consulted_when_disallowed() {
        let rules = default_rules();
        let decision = decide_label(&rules, &metrics(0.1), Some(&FixedOutput("MOMENTUM_NEG")), false);
        assert_eq!(decision.label, Label::Neutral);
    }
}

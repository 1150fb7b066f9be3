//! Declarative label rules, parsed from YAML.

use crate::error::{SonifyError, SonifyResult};
use crate::label::Label;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    Ge { value: f64 },
    Gt { value: f64 },
    Le { value: f64 },
    Lt { value: f64 },
    Between { low: f64, high: f64 },
}

impl Predicate {
    pub fn matches(&self, x: f64) -> bool {
        match *self {
            Predicate::Ge { value } => x >= value,
            Predicate::Gt { value } => x > value,
            Predicate::Le { value } => x <= value,
            Predicate::Lt { value } => x < value,
            Predicate::Between { low, high } => x >= low && x <= high,
        }
    }
}

/// One rule: a set of metric predicates (all must match) and the label to
/// choose if they do. An empty `when` map always matches — used for the
/// trailing default rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub when: HashMap<String, Predicate>,
    pub choose_label: Label,
}

impl Rule {
    pub fn matches(&self, metrics: &crate::series::Metrics) -> bool {
        self.when.iter().all(|(metric, predicate)| {
            let value = match metric.as_str() {
                "ctr" => metrics.ctr(),
                "impressions" => metrics.impressions(),
                "position" => metrics.position(),
                "clicks" => metrics.clicks(),
                "volatility_index" => metrics.volatility_index(),
                _ => return false,
            };
            predicate.matches(value)
        })
    }
}

/// An ordered rule list. Must end with an empty-`when` default rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Parses and validates a rule set from YAML text.
    pub fn from_yaml(text: &str) -> SonifyResult<Self> {
        let rules: Vec<Rule> = serde_yaml::from_str(text)
            .map_err(|e| SonifyError::Internal(format!("invalid rules YAML: {e}")))?;
        let set = RuleSet { rules };
        set.validate("<inline>")?;
        Ok(set)
    }

    pub fn validate(&self, path: &str) -> SonifyResult<()> {
        match self.rules.last() {
            Some(last) if last.when.is_empty() => Ok(()),
            _ => Err(SonifyError::MissingRules {
                path: path.to_string(),
            }),
        }
    }

    /// Evaluates rules in order; first match wins. Callers must have
    /// already validated the set (a trailing default guarantees a match).
    pub fn decide(&self, metrics: &crate::series::Metrics) -> Label {
        for rule in &self.rules {
            if rule.matches(metrics) {
                return rule.choose_label;
            }
        }
        Label::Neutral
    }
}

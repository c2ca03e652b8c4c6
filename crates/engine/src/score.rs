use ledgersort_core::{CategoryRule, PatternLogic, Transaction};
use serde::Serialize;

use crate::config::ScoringConfig;
use crate::matcher::CompiledPattern;

/// Per-pattern view of how a rule scored a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub pattern_hits: Vec<bool>,
    pub weight_sum: f64,
    pub multiplier: f64,
    pub score: f64,
}

/// A rule paired with its precompiled patterns.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: CategoryRule,
    patterns: Vec<CompiledPattern>,
}

impl CompiledRule {
    pub fn new(rule: CategoryRule) -> Self {
        let patterns = rule.patterns.iter().map(CompiledPattern::new).collect();
        CompiledRule { rule, patterns }
    }

    pub fn explain(&self, tx: &Transaction, config: &ScoringConfig) -> ScoreBreakdown {
        let pattern_hits: Vec<bool> = self.patterns.iter().map(|p| p.matches(tx)).collect();

        let weight_sum: f64 = match self.rule.pattern_logic {
            PatternLogic::Or => self
                .patterns
                .iter()
                .zip(&pattern_hits)
                .filter(|(_, hit)| **hit)
                .map(|(p, _)| usable_weight(p))
                .sum(),
            // An empty AND rule scores nothing rather than matching vacuously.
            PatternLogic::And => {
                if !pattern_hits.is_empty() && pattern_hits.iter().all(|hit| *hit) {
                    self.patterns.iter().map(usable_weight).sum()
                } else {
                    0.0
                }
            }
        };

        let multiplier = config.priority_multiplier(self.rule.priority);
        ScoreBreakdown {
            pattern_hits,
            weight_sum,
            multiplier,
            score: (weight_sum * multiplier).max(0.0),
        }
    }

    pub fn score(&self, tx: &Transaction, config: &ScoringConfig) -> f64 {
        self.explain(tx, config).score
    }
}

/// Negative or NaN weights contribute nothing.
fn usable_weight(pattern: &CompiledPattern) -> f64 {
    pattern.weight.max(0.0)
}

pub fn explain(tx: &Transaction, rule: &CategoryRule) -> ScoreBreakdown {
    CompiledRule::new(rule.clone()).explain(tx, &ScoringConfig::default())
}

/// Priority-weighted score of `rule` for `tx`; 0 when the rule does not apply.
pub fn score(tx: &Transaction, rule: &CategoryRule) -> f64 {
    explain(tx, rule).score
}

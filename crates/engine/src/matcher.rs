use ledgersort_core::{
    build_regex, AmountCondition, Pattern, PatternMatch, Transaction, TransactionField,
};
use regex::Regex;

use crate::normalize::normalize_text;

/// Outcome of compiling a regex pattern once, ahead of matching.
#[derive(Debug, Clone)]
pub enum RegexSlot {
    /// Empty source: places no constraint on the field.
    Unconstrained,
    Compiled(Regex),
    /// Failed to compile: never matches.
    Invalid,
}

impl RegexSlot {
    pub fn compile(source: &str, flags: &str) -> Self {
        if source.is_empty() {
            return RegexSlot::Unconstrained;
        }
        match build_regex(source, flags) {
            Ok(re) => RegexSlot::Compiled(re),
            Err(e) => {
                tracing::warn!("Pattern regex '{source}' with flags '{flags}' is unusable: {e}");
                RegexSlot::Invalid
            }
        }
    }

    fn is_match(&self, value: &str) -> bool {
        match self {
            RegexSlot::Unconstrained => true,
            RegexSlot::Compiled(re) => re.is_match(value),
            RegexSlot::Invalid => false,
        }
    }
}

#[derive(Debug, Clone)]
enum FieldPredicate {
    Wordlist {
        positive: Vec<String>,
        negated: Vec<String>,
    },
    Regex(RegexSlot),
}

/// A pattern prepared for repeated evaluation: word texts are normalised and
/// regexes compiled up front.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    fields: Vec<TransactionField>,
    predicate: FieldPredicate,
    case_sensitive: bool,
    amount_condition: Option<AmountCondition>,
    pub weight: f64,
}

impl CompiledPattern {
    pub fn new(pattern: &Pattern) -> Self {
        let predicate = match &pattern.matcher {
            PatternMatch::Wordlist { words } => {
                let (negated, positive): (Vec<_>, Vec<_>) =
                    words.iter().partition(|w| w.negated);
                let normalize = |w: &ledgersort_core::PatternWord| {
                    normalize_text(&w.text, pattern.case_sensitive)
                };
                FieldPredicate::Wordlist {
                    positive: positive.into_iter().map(normalize).collect(),
                    negated: negated.into_iter().map(normalize).collect(),
                }
            }
            PatternMatch::Regex { regex, flags } => {
                FieldPredicate::Regex(RegexSlot::compile(regex, flags))
            }
        };
        CompiledPattern {
            fields: pattern.fields.clone(),
            predicate,
            case_sensitive: pattern.case_sensitive,
            amount_condition: pattern.amount_condition,
            weight: pattern.weight,
        }
    }

    /// True when any resolved field satisfies the predicate and the amount
    /// condition (if any) holds.
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(condition) = &self.amount_condition {
            if !condition.is_satisfied_by(tx.amount) {
                return false;
            }
        }
        if self.fields.is_empty() {
            // Nothing positive to find and no field to veto on.
            return matches!(
                &self.predicate,
                FieldPredicate::Wordlist { positive, .. } if positive.is_empty()
            );
        }
        self.fields
            .iter()
            .any(|field| self.field_matches(&tx.field_text(field)))
    }

    fn field_matches(&self, value: &str) -> bool {
        match &self.predicate {
            FieldPredicate::Wordlist { positive, negated } => {
                let value = normalize_text(value, self.case_sensitive);
                let positive_ok =
                    positive.is_empty() || positive.iter().any(|w| value.contains(w.as_str()));
                let negated_ok = !negated.iter().any(|w| value.contains(w.as_str()));
                positive_ok && negated_ok
            }
            FieldPredicate::Regex(slot) => slot.is_match(value),
        }
    }
}

/// One-shot check of a single pattern against a transaction.
pub fn matches(tx: &Transaction, pattern: &Pattern) -> bool {
    CompiledPattern::new(pattern).matches(tx)
}

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

use super::money::Money;
use super::rule::RuleError;
use super::transaction::TransactionField;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternWord {
    pub text: String,
    #[serde(default)]
    pub negated: bool,
}

impl PatternWord {
    pub fn new(text: &str) -> Self {
        PatternWord {
            text: text.to_string(),
            negated: false,
        }
    }

    pub fn negated(text: &str) -> Self {
        PatternWord {
            text: text.to_string(),
            negated: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountOperator {
    Lt,
    Lte,
    Eq,
    Gte,
    Gt,
}

impl AmountOperator {
    pub fn holds(self, lhs: Money, rhs: Money) -> bool {
        match self {
            AmountOperator::Lt => lhs < rhs,
            AmountOperator::Lte => lhs <= rhs,
            AmountOperator::Eq => lhs == rhs,
            AmountOperator::Gte => lhs >= rhs,
            AmountOperator::Gt => lhs > rhs,
        }
    }
}

/// Constraint on the transaction amount, compared against its absolute
/// magnitude so that "more than 50" reads the same for debits and credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountCondition {
    pub operator: AmountOperator,
    pub value: Money,
}

impl AmountCondition {
    pub fn new(operator: AmountOperator, value: Money) -> Self {
        AmountCondition { operator, value }
    }

    pub fn is_satisfied_by(&self, amount: Money) -> bool {
        self.operator.holds(amount.magnitude(), self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    #[default]
    Wordlist,
    Regex,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternMatch {
    Wordlist { words: Vec<PatternWord> },
    Regex { regex: String, flags: String },
}

impl PatternMatch {
    pub fn match_type(&self) -> MatchType {
        match self {
            PatternMatch::Wordlist { .. } => MatchType::Wordlist,
            PatternMatch::Regex { .. } => MatchType::Regex,
        }
    }
}

/// A single matching unit, always held in canonical form: the legacy
/// single-field shape is folded into `fields` when the pattern is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPattern", into = "RawPattern")]
pub struct Pattern {
    pub fields: Vec<TransactionField>,
    pub matcher: PatternMatch,
    pub case_sensitive: bool,
    pub weight: f64,
    pub amount_condition: Option<AmountCondition>,
}

impl Pattern {
    pub fn wordlist(fields: &[TransactionField], words: Vec<PatternWord>, weight: f64) -> Self {
        Pattern {
            fields: fields.to_vec(),
            matcher: PatternMatch::Wordlist { words },
            case_sensitive: false,
            weight,
            amount_condition: None,
        }
    }

    pub fn regex(fields: &[TransactionField], regex: &str, flags: &str, weight: f64) -> Self {
        Pattern {
            fields: fields.to_vec(),
            matcher: PatternMatch::Regex {
                regex: regex.to_string(),
                flags: flags.to_string(),
            },
            case_sensitive: false,
            weight,
            amount_condition: None,
        }
    }

    pub fn with_amount_condition(mut self, condition: AmountCondition) -> Self {
        self.amount_condition = Some(condition);
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn match_type(&self) -> MatchType {
        self.matcher.match_type()
    }

    /// Resolved fields as an order-independent set.
    pub fn field_set(&self) -> BTreeSet<&TransactionField> {
        self.fields.iter().collect()
    }

    pub fn words(&self) -> &[PatternWord] {
        match &self.matcher {
            PatternMatch::Wordlist { words } => words,
            PatternMatch::Regex { .. } => &[],
        }
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(RuleError::InvalidWeight(self.weight));
        }
        match &self.matcher {
            PatternMatch::Wordlist { words } => {
                if words.is_empty() {
                    return Err(RuleError::EmptyWordlist);
                }
                if words.iter().any(|w| is_blank_word(&w.text)) {
                    return Err(RuleError::BlankWord);
                }
            }
            PatternMatch::Regex { regex, flags } => {
                if regex.is_empty() {
                    return Err(RuleError::EmptyRegex);
                }
                build_regex(regex, flags)?;
            }
        }
        if let Some(condition) = &self.amount_condition {
            if condition.value.is_negative() {
                return Err(RuleError::NegativeAmount(condition.value));
            }
        }
        Ok(())
    }
}

/// Words made only of whitespace and punctuation normalise to nothing, and
/// would then match (or veto) every field.
fn is_blank_word(text: &str) -> bool {
    static BLANK: OnceLock<Regex> = OnceLock::new();
    BLANK
        .get_or_init(|| Regex::new(r"^[\s\p{P}]*$").expect("invalid regex"))
        .is_match(text)
}

/// Compiles `source` with JavaScript-style flag letters. `g`, `u` and `y`
/// have no meaning for a single test and are accepted as no-ops.
pub fn build_regex(source: &str, flags: &str) -> Result<Regex, RuleError> {
    let mut builder = RegexBuilder::new(source);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            'g' | 'u' | 'y' => {}
            other => return Err(RuleError::UnknownRegexFlag(other)),
        }
    }
    builder.build().map_err(|e| RuleError::InvalidRegex {
        pattern: source.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPattern {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<TransactionField>>,
    #[serde(default, skip_serializing)]
    field: Option<TransactionField>,
    #[serde(default)]
    match_type: MatchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    words: Option<Vec<PatternWord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    regex_flags: Option<String>,
    #[serde(default)]
    case_sensitive: bool,
    weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    amount_condition: Option<AmountCondition>,
}

impl From<RawPattern> for Pattern {
    fn from(raw: RawPattern) -> Self {
        let fields = match (raw.fields, raw.field) {
            (Some(fields), _) => fields,
            (None, Some(field)) => vec![field],
            (None, None) => vec![TransactionField::Payee],
        };
        let matcher = match raw.match_type {
            MatchType::Wordlist => PatternMatch::Wordlist {
                words: raw.words.unwrap_or_default(),
            },
            MatchType::Regex => PatternMatch::Regex {
                regex: raw.regex.unwrap_or_default(),
                flags: raw.regex_flags.unwrap_or_default(),
            },
        };
        Pattern {
            fields,
            matcher,
            case_sensitive: raw.case_sensitive,
            weight: raw.weight,
            amount_condition: raw.amount_condition,
        }
    }
}

impl From<Pattern> for RawPattern {
    fn from(pattern: Pattern) -> Self {
        let match_type = pattern.match_type();
        let (words, regex, regex_flags) = match pattern.matcher {
            PatternMatch::Wordlist { words } => (Some(words), None, None),
            PatternMatch::Regex { regex, flags } => (None, Some(regex), Some(flags)),
        };
        RawPattern {
            fields: Some(pattern.fields),
            field: None,
            match_type,
            words,
            regex,
            regex_flags,
            case_sensitive: pattern.case_sensitive,
            weight: pattern.weight,
            amount_condition: pattern.amount_condition,
        }
    }
}

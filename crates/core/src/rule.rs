use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::money::Money;
use super::pattern::Pattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub i64);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PatternLogic {
    #[default]
    Or,
    And,
}

impl PatternLogic {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternLogic::Or => "OR",
            PatternLogic::And => "AND",
        }
    }
}

impl std::str::FromStr for PatternLogic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OR" => Ok(PatternLogic::Or),
            "AND" => Ok(PatternLogic::And),
            other => Err(format!("Unknown pattern logic: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Income,
    Expense,
}

impl RuleType {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleType::Income => "income",
            RuleType::Expense => "expense",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(RuleType::Income),
            "expense" => Ok(RuleType::Expense),
            other => Err(format!("Unknown rule type: '{other}'")),
        }
    }
}

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;

/// A named category and the patterns that assign transactions to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRule {
    pub id: RuleId,
    pub name: String,
    pub patterns: Vec<Pattern>,
    #[serde(default)]
    pub pattern_logic: PatternLogic,
    pub priority: u8,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_variant: Option<String>,
}

impl CategoryRule {
    pub fn new(id: i64, name: &str, rule_type: RuleType, priority: u8, patterns: Vec<Pattern>) -> Self {
        CategoryRule {
            id: RuleId(id),
            name: name.to_string(),
            patterns,
            pattern_logic: PatternLogic::Or,
            priority,
            rule_type,
            group_id: None,
            color_variant: None,
        }
    }

    pub fn with_logic(mut self, logic: PatternLogic) -> Self {
        self.pattern_logic = logic;
        self
    }

    /// Structural check run before a rule is persisted.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.name.trim().is_empty() {
            return Err(RuleError::BlankName);
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.priority) {
            return Err(RuleError::PriorityOutOfRange(self.priority));
        }
        if self.patterns.is_empty() {
            return Err(RuleError::NoPatterns(self.name.clone()));
        }
        for (index, pattern) in self.patterns.iter().enumerate() {
            pattern.validate().map_err(|cause| RuleError::Pattern {
                index,
                cause: Box::new(cause),
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("Rule name must not be blank")]
    BlankName,
    #[error("Priority {0} is outside 1..=10")]
    PriorityOutOfRange(u8),
    #[error("Rule '{0}' has no patterns")]
    NoPatterns(String),
    #[error("Pattern {index}: {cause}")]
    Pattern {
        index: usize,
        #[source]
        cause: Box<RuleError>,
    },
    #[error("Weight must be greater than zero, got {0}")]
    InvalidWeight(f64),
    #[error("Word list is empty")]
    EmptyWordlist,
    #[error("Word list contains a blank word")]
    BlankWord,
    #[error("Regex is empty")]
    EmptyRegex,
    #[error("Invalid regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },
    #[error("Unknown regex flag: '{0}'")]
    UnknownRegexFlag(char),
    #[error("Amount condition value must not be negative, got {0}")]
    NegativeAmount(Money),
}

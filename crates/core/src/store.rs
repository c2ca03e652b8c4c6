use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::pattern::Pattern;
use super::rule::{CategoryRule, PatternLogic, RuleId};
use super::transaction::{Transaction, TransactionId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Partial update for one transaction. `None` leaves the column untouched;
/// `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    pub category: Option<Option<String>>,
    pub category_confidence: Option<Option<u8>>,
    pub manually_edited: Option<bool>,
}

impl TransactionPatch {
    pub fn categorization(category: Option<String>, confidence: Option<u8>) -> Self {
        TransactionPatch {
            category: Some(category),
            category_confidence: Some(confidence),
            manually_edited: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.category_confidence.is_none() && self.manually_edited.is_none()
    }

    pub fn apply(&self, tx: &mut Transaction) {
        if let Some(category) = &self.category {
            tx.category = category.clone();
        }
        if let Some(confidence) = self.category_confidence {
            tx.category_confidence = confidence;
        }
        if let Some(manual) = self.manually_edited {
            tx.manually_edited = manual;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulePatch {
    pub name: Option<String>,
    pub patterns: Option<Vec<Pattern>>,
    pub pattern_logic: Option<PatternLogic>,
    pub priority: Option<u8>,
}

impl RulePatch {
    pub fn patterns(patterns: Vec<Pattern>) -> Self {
        RulePatch {
            patterns: Some(patterns),
            ..RulePatch::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.patterns.is_none()
            && self.pattern_logic.is_none()
            && self.priority.is_none()
    }

    pub fn apply(&self, rule: &mut CategoryRule) {
        if let Some(name) = &self.name {
            rule.name = name.clone();
        }
        if let Some(patterns) = &self.patterns {
            rule.patterns = patterns.clone();
        }
        if let Some(logic) = self.pattern_logic {
            rule.pattern_logic = logic;
        }
        if let Some(priority) = self.priority {
            rule.priority = priority;
        }
    }
}

/// Persistent home of rules and transactions. Writes are keyed by id and
/// independent of each other; no multi-record atomicity is expected.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list_rules(&self) -> StoreResult<Vec<CategoryRule>>;
    async fn list_transactions(&self) -> StoreResult<Vec<Transaction>>;
    async fn update_transaction(&self, id: TransactionId, patch: &TransactionPatch) -> StoreResult<()>;
    async fn update_rule(&self, id: RuleId, patch: &RulePatch) -> StoreResult<()>;
}

pub mod money;
pub mod pattern;
pub mod rule;
pub mod store;
pub mod transaction;

pub use money::Money;
pub use pattern::{
    build_regex, AmountCondition, AmountOperator, MatchType, Pattern, PatternMatch, PatternWord,
};
pub use rule::{CategoryRule, PatternLogic, RuleError, RuleId, RuleType, MAX_PRIORITY, MIN_PRIORITY};
pub use store::{CategoryStore, RulePatch, StoreError, StoreResult, TransactionPatch};
pub use transaction::{EntryType, Transaction, TransactionField, TransactionId};

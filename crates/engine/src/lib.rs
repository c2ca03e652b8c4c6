pub mod config;
pub mod conflict;
pub mod error;
pub mod matcher;
pub mod merge;
pub mod normalize;
pub mod resolver;
pub mod ruleset;
pub mod score;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ScoringConfig;
pub use conflict::{find_conflicts, find_conflicts_in_store};
pub use error::EngineError;
pub use matcher::{matches, CompiledPattern, RegexSlot};
pub use merge::{learn_patterns, merge_patterns};
pub use normalize::normalize_text;
pub use resolver::{
    categorize_batch, categorize_one, preview_rule, recategorize_all, recategorize_all_with_config,
    BatchSummary, CategoryMatch, PreviewHit, RuleResolver, SweepFailure, SweepReport,
};
pub use ruleset::{RuleProblem, RuleSet};
pub use score::{explain, score, CompiledRule, ScoreBreakdown};

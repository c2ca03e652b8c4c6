use std::collections::HashSet;

use ledgersort_core::{
    CategoryStore, MatchType, Pattern, PatternMatch, PatternWord, RuleId, RulePatch, StoreError,
};

/// Folds `incoming` patterns into `existing`, returning a new list.
///
/// Each incoming word-list pattern joins the first accumulated word-list
/// slot with the same field set; otherwise it is appended as is. Regex
/// patterns are never merged. Neither input is modified.
pub fn merge_patterns(existing: &[Pattern], incoming: &[Pattern]) -> Vec<Pattern> {
    let mut merged = existing.to_vec();

    for pattern in incoming {
        match merged.iter().position(|slot| can_merge(slot, pattern)) {
            Some(index) => merged[index] = merge_pair(&merged[index], pattern),
            None => merged.push(pattern.clone()),
        }
    }

    merged
}

fn can_merge(slot: &Pattern, incoming: &Pattern) -> bool {
    slot.match_type() == MatchType::Wordlist
        && incoming.match_type() == MatchType::Wordlist
        && slot.field_set() == incoming.field_set()
}

fn merge_pair(slot: &Pattern, incoming: &Pattern) -> Pattern {
    let mut seen = HashSet::new();
    let words: Vec<PatternWord> = slot
        .words()
        .iter()
        .chain(incoming.words())
        .filter(|w| seen.insert(w.text.to_lowercase()))
        .cloned()
        .collect();

    Pattern {
        matcher: PatternMatch::Wordlist { words },
        weight: slot.weight.max(incoming.weight),
        ..slot.clone()
    }
}

/// Merges newly captured patterns into a stored rule and persists the result.
pub async fn learn_patterns<S>(
    store: &S,
    rule_id: RuleId,
    incoming: &[Pattern],
) -> Result<Vec<Pattern>, StoreError>
where
    S: CategoryStore + ?Sized,
{
    let rules = store.list_rules().await?;
    let rule = rules
        .iter()
        .find(|r| r.id == rule_id)
        .ok_or_else(|| StoreError::NotFound(format!("rule {rule_id}")))?;

    let merged = merge_patterns(&rule.patterns, incoming);
    store
        .update_rule(rule_id, &RulePatch::patterns(merged.clone()))
        .await?;
    tracing::info!(
        "Learned {} pattern(s) into rule '{}': {} -> {} slots",
        incoming.len(),
        rule.name,
        rule.patterns.len(),
        merged.len()
    );
    Ok(merged)
}

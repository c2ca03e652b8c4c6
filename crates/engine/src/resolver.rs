use ledgersort_core::{
    CategoryRule, CategoryStore, RuleId, StoreError, Transaction, TransactionId, TransactionPatch,
};
use serde::Serialize;

use crate::config::ScoringConfig;
use crate::score::CompiledRule;

/// The winning rule for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMatch {
    pub rule_id: RuleId,
    pub category: String,
    pub score: f64,
    pub confidence: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub categorized: usize,
    pub uncategorized: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    pub transaction_id: Option<TransactionId>,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Non-manual transactions that were recomputed.
    pub examined: usize,
    pub skipped_manual: usize,
    pub unchanged: usize,
    pub updated: usize,
    pub failures: Vec<SweepFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewHit {
    pub index: usize,
    pub transaction_id: Option<TransactionId>,
    pub score: f64,
}

/// Picks the best-scoring rule per transaction.
///
/// Rules are held in ascending id order and a later rule must score strictly
/// higher to win, so ties always go to the lowest rule id.
pub struct RuleResolver {
    rules: Vec<CompiledRule>,
    config: ScoringConfig,
}

impl RuleResolver {
    pub fn new(rules: &[CategoryRule]) -> Self {
        Self::with_config(rules, ScoringConfig::default())
    }

    pub fn with_config(rules: &[CategoryRule], config: ScoringConfig) -> Self {
        let mut compiled: Vec<CompiledRule> = rules.iter().cloned().map(CompiledRule::new).collect();
        compiled.sort_by_key(|cr| cr.rule.id);
        Self { rules: compiled, config }
    }

    pub fn categorize_one(&self, tx: &Transaction) -> Option<CategoryMatch> {
        let mut best: Option<(&CompiledRule, f64)> = None;
        for cr in &self.rules {
            let score = cr.score(tx, &self.config);
            let best_score = best.map_or(0.0, |(_, s)| s);
            if score > best_score {
                best = Some((cr, score));
            }
        }

        best.map(|(cr, score)| CategoryMatch {
            rule_id: cr.rule.id,
            category: cr.rule.name.clone(),
            score,
            confidence: self.config.confidence(score),
        })
    }

    /// Authoritative categorization of fresh or explicitly re-requested
    /// records: every record gets its category recomputed and loses its
    /// manual-edit flag.
    pub fn categorize_batch(&self, transactions: &mut [Transaction]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for tx in transactions.iter_mut() {
            match self.categorize_one(tx) {
                Some(m) => {
                    tx.category = Some(m.category);
                    tx.category_confidence = Some(m.confidence);
                    summary.categorized += 1;
                }
                None => {
                    tx.category = None;
                    tx.category_confidence = None;
                    summary.uncategorized += 1;
                }
            }
            tx.manually_edited = false;
        }
        summary
    }

    /// Transactions the given rule would match on its own, with their scores.
    pub fn preview(rule: &CategoryRule, transactions: &[Transaction], config: &ScoringConfig) -> Vec<PreviewHit> {
        let compiled = CompiledRule::new(rule.clone());
        transactions
            .iter()
            .enumerate()
            .filter_map(|(index, tx)| {
                let score = compiled.score(tx, config);
                (score > 0.0).then_some(PreviewHit {
                    index,
                    transaction_id: tx.id,
                    score,
                })
            })
            .collect()
    }

    /// Recomputes every non-manual transaction in `store` and writes back the
    /// ones whose category or confidence changed. Manually edited records are
    /// never touched. A failed write is recorded and the sweep carries on.
    pub async fn recategorize_store<S>(&self, store: &S) -> Result<SweepReport, StoreError>
    where
        S: CategoryStore + ?Sized,
    {
        let transactions = store.list_transactions().await?;
        let mut report = SweepReport::default();

        for tx in &transactions {
            if tx.manually_edited {
                report.skipped_manual += 1;
                continue;
            }
            report.examined += 1;

            let (category, confidence) = match self.categorize_one(tx) {
                Some(m) => (Some(m.category), Some(m.confidence)),
                None => (None, None),
            };
            if category == tx.category && confidence == tx.category_confidence {
                report.unchanged += 1;
                continue;
            }

            let Some(id) = tx.id else {
                tracing::warn!("Skipping transaction without id during sweep: {}", tx.payee);
                report.failures.push(SweepFailure {
                    transaction_id: None,
                    error: "transaction has no id".to_string(),
                });
                continue;
            };

            tracing::debug!(
                "Transaction {id}: {:?} ({:?}) -> {:?} ({:?})",
                tx.category,
                tx.category_confidence,
                category,
                confidence
            );
            let patch = TransactionPatch::categorization(category, confidence);
            match store.update_transaction(id, &patch).await {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    tracing::warn!("Failed to update transaction {id}: {e}");
                    report.failures.push(SweepFailure {
                        transaction_id: Some(id),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Recategorization sweep: {} examined, {} updated, {} unchanged, {} manual skipped, {} failed",
            report.examined,
            report.updated,
            report.unchanged,
            report.skipped_manual,
            report.failures.len()
        );
        Ok(report)
    }
}

pub fn categorize_one(tx: &Transaction, rules: &[CategoryRule]) -> Option<CategoryMatch> {
    RuleResolver::new(rules).categorize_one(tx)
}

pub fn categorize_batch(transactions: &mut [Transaction], rules: &[CategoryRule]) -> BatchSummary {
    RuleResolver::new(rules).categorize_batch(transactions)
}

pub fn preview_rule(rule: &CategoryRule, transactions: &[Transaction]) -> Vec<PreviewHit> {
    RuleResolver::preview(rule, transactions, &ScoringConfig::default())
}

/// Reads the current rule snapshot from `store` and sweeps all non-manual
/// transactions against it.
pub async fn recategorize_all<S>(store: &S) -> Result<SweepReport, StoreError>
where
    S: CategoryStore + ?Sized,
{
    recategorize_all_with_config(store, ScoringConfig::default()).await
}

pub async fn recategorize_all_with_config<S>(
    store: &S,
    config: ScoringConfig,
) -> Result<SweepReport, StoreError>
where
    S: CategoryStore + ?Sized,
{
    let rules = store.list_rules().await?;
    RuleResolver::with_config(&rules, config)
        .recategorize_store(store)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use ledgersort_core::{Money, Pattern, PatternLogic, PatternWord, RuleType, TransactionField};

    fn rule(id: i64, name: &str, priority: u8, words: &[&str], weight: f64) -> CategoryRule {
        let pattern = Pattern::wordlist(
            &[TransactionField::Payee],
            words.iter().map(|w| PatternWord::new(w)).collect(),
            weight,
        );
        CategoryRule::new(id, name, RuleType::Expense, priority, vec![pattern])
    }

    fn tx(id: i64, payee: &str) -> Transaction {
        let mut tx = Transaction::new(payee, "", Money::from_cents(-1000));
        tx.id = Some(TransactionId(id));
        tx
    }

    #[test]
    fn picks_highest_score() {
        let rules = vec![
            rule(1, "Groceries", 1, &["albert"], 10.0),
            rule(2, "Household", 1, &["albert"], 20.0),
        ];
        let m = categorize_one(&tx(1, "Albert Heijn"), &rules).unwrap();
        assert_eq!(m.category, "Household");
        assert_eq!(m.rule_id, RuleId(2));
        assert_eq!(m.confidence, 22);
    }

    #[test]
    fn no_match_is_none() {
        let rules = vec![rule(1, "Groceries", 5, &["albert"], 10.0)];
        assert_eq!(categorize_one(&tx(1, "Shell"), &rules), None);
        assert_eq!(categorize_one(&tx(1, "Shell"), &[]), None);
    }

    #[test]
    fn fast_food_scenario_confidence() {
        let rules = vec![rule(7, "Fast food", 5, &["McDonald"], 10.0)];
        let m = categorize_one(&tx(1, "McDonald's"), &rules).unwrap();
        assert!((m.score - 15.0).abs() < 1e-9);
        assert_eq!(m.confidence, 15);
    }

    #[test]
    fn confidence_caps_at_hundred() {
        let rules = vec![rule(1, "Big", 10, &["x"], 150.0)];
        let m = categorize_one(&tx(1, "x"), &rules).unwrap();
        assert_eq!(m.confidence, 100);
    }

    #[test]
    fn ties_go_to_lowest_rule_id_regardless_of_order() {
        let rules = vec![
            rule(9, "Later", 3, &["spar"], 10.0),
            rule(4, "Earlier", 3, &["spar"], 10.0),
        ];
        let m = categorize_one(&tx(1, "Spar"), &rules).unwrap();
        assert_eq!(m.category, "Earlier");

        let reversed: Vec<_> = rules.into_iter().rev().collect();
        assert_eq!(categorize_one(&tx(1, "Spar"), &reversed).unwrap().category, "Earlier");
    }

    #[test]
    fn batch_sets_clears_and_resets_manual_flag() {
        let rules = vec![rule(1, "Groceries", 5, &["spar"], 10.0)];
        let mut matched = tx(1, "Spar");
        matched.manually_edited = true;
        let mut unmatched = tx(2, "Shell");
        unmatched.category = Some("Fuel".to_string());
        unmatched.category_confidence = Some(80);
        unmatched.manually_edited = true;

        let mut batch = vec![matched, unmatched];
        let summary = categorize_batch(&mut batch, &rules);

        assert_eq!(summary, BatchSummary { categorized: 1, uncategorized: 1 });
        assert_eq!(batch[0].category.as_deref(), Some("Groceries"));
        assert_eq!(batch[0].category_confidence, Some(15));
        assert!(!batch[0].manually_edited);
        assert_eq!(batch[1].category, None);
        assert_eq!(batch[1].category_confidence, None);
        assert!(!batch[1].manually_edited);
    }

    #[test]
    fn preview_lists_matching_transactions() {
        let r = rule(1, "Groceries", 1, &["spar"], 10.0);
        let txs = vec![tx(1, "Spar"), tx(2, "Shell"), tx(3, "Spar City")];
        let hits = preview_rule(&r, &txs);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].transaction_id, Some(TransactionId(1)));
        assert_eq!(hits[1].index, 2);
    }

    #[test]
    fn and_rule_in_resolver() {
        let r = CategoryRule::new(
            1,
            "Fuel",
            RuleType::Expense,
            1,
            vec![
                Pattern::wordlist(&[TransactionField::Payee], vec![PatternWord::new("shell")], 5.0),
                Pattern::wordlist(&[TransactionField::Payee], vec![PatternWord::new("station")], 3.0),
            ],
        )
        .with_logic(PatternLogic::And);
        let m = categorize_one(&tx(1, "Shell Station"), &[r]).unwrap();
        assert!((m.score - 8.8).abs() < 1e-9);
        assert_eq!(m.confidence, 9);
    }

    #[tokio::test]
    async fn sweep_never_touches_manual_records() {
        let mut manual = tx(1, "McDonald's");
        manual.category = Some("Manual".to_string());
        manual.category_confidence = Some(100);
        manual.manually_edited = true;

        let store = MemoryStore::new(vec![rule(1, "Fast food", 10, &["McDonald"], 90.0)], vec![manual]);
        let report = recategorize_all(&store).await.unwrap();

        assert_eq!(report.skipped_manual, 1);
        assert_eq!(report.examined, 0);
        assert_eq!(report.updated, 0);
        let stored = store.transaction(1);
        assert_eq!(stored.category.as_deref(), Some("Manual"));
        assert!(stored.manually_edited);
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sweep_writes_only_changed_records() {
        let mut current = tx(1, "Spar");
        current.category = Some("Groceries".to_string());
        current.category_confidence = Some(15);
        let mut stale = tx(2, "Shell");
        stale.category = Some("Groceries".to_string());
        stale.category_confidence = Some(15);
        let fresh = tx(3, "Spar Express");

        let store = MemoryStore::new(
            vec![rule(1, "Groceries", 5, &["spar"], 10.0)],
            vec![current, stale, fresh],
        );
        let report = recategorize_all(&store).await.unwrap();

        assert_eq!(report.examined, 3);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.updated, 2);
        assert!(report.failures.is_empty());
        assert_eq!(*store.writes.lock().unwrap(), vec![TransactionId(2), TransactionId(3)]);

        assert_eq!(store.transaction(2).category, None);
        assert_eq!(store.transaction(2).category_confidence, None);
        assert_eq!(store.transaction(3).category.as_deref(), Some("Groceries"));
        assert_eq!(store.transaction(3).category_confidence, Some(15));
    }

    #[tokio::test]
    async fn sweep_updates_confidence_only_change() {
        let mut t = tx(1, "Spar");
        t.category = Some("Groceries".to_string());
        t.category_confidence = Some(50);
        let store = MemoryStore::new(vec![rule(1, "Groceries", 5, &["spar"], 10.0)], vec![t]);

        let report = recategorize_all(&store).await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(store.transaction(1).category_confidence, Some(15));
    }

    #[tokio::test]
    async fn failed_write_does_not_abort_sweep() {
        let mut store = MemoryStore::new(
            vec![rule(1, "Groceries", 5, &["spar"], 10.0)],
            vec![tx(1, "Spar"), tx(2, "Spar"), tx(3, "Spar")],
        );
        store.failing_writes.insert(TransactionId(2));

        let report = recategorize_all(&store).await.unwrap();
        assert_eq!(report.updated, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].transaction_id, Some(TransactionId(2)));
        assert_eq!(store.transaction(3).category.as_deref(), Some("Groceries"));
        assert_eq!(store.transaction(2).category, None);
    }

    #[tokio::test]
    async fn sweep_uses_custom_config() {
        let store = MemoryStore::new(vec![rule(1, "Groceries", 5, &["spar"], 10.0)], vec![tx(1, "Spar")]);
        let config = ScoringConfig {
            reference_max_score: 30.0,
            ..ScoringConfig::default()
        };
        recategorize_all_with_config(&store, config).await.unwrap();
        assert_eq!(store.transaction(1).category_confidence, Some(50));
    }
}

use async_trait::async_trait;
use ledgersort_core::{
    CategoryRule, CategoryStore, RuleId, RulePatch, StoreError, StoreResult, Transaction,
    TransactionId, TransactionPatch,
};
use std::collections::HashSet;
use std::sync::Mutex;

/// In-memory store for exercising store-driven operations.
#[derive(Default)]
pub struct MemoryStore {
    pub rules: Mutex<Vec<CategoryRule>>,
    pub transactions: Mutex<Vec<Transaction>>,
    pub failing_writes: HashSet<TransactionId>,
    pub writes: Mutex<Vec<TransactionId>>,
}

impl MemoryStore {
    pub fn new(rules: Vec<CategoryRule>, transactions: Vec<Transaction>) -> Self {
        MemoryStore {
            rules: Mutex::new(rules),
            transactions: Mutex::new(transactions),
            ..MemoryStore::default()
        }
    }

    pub fn transaction(&self, id: i64) -> Transaction {
        self.transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == Some(TransactionId(id)))
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list_rules(&self) -> StoreResult<Vec<CategoryRule>> {
        Ok(self.rules.lock().unwrap().clone())
    }

    async fn list_transactions(&self) -> StoreResult<Vec<Transaction>> {
        Ok(self.transactions.lock().unwrap().clone())
    }

    async fn update_transaction(&self, id: TransactionId, patch: &TransactionPatch) -> StoreResult<()> {
        if self.failing_writes.contains(&id) {
            return Err(StoreError::Database(format!("disk full while writing {id}")));
        }
        let mut transactions = self.transactions.lock().unwrap();
        let tx = transactions
            .iter_mut()
            .find(|t| t.id == Some(id))
            .ok_or_else(|| StoreError::NotFound(format!("transaction {id}")))?;
        patch.apply(tx);
        self.writes.lock().unwrap().push(id);
        Ok(())
    }

    async fn update_rule(&self, id: RuleId, patch: &RulePatch) -> StoreResult<()> {
        let mut rules = self.rules.lock().unwrap();
        let rule = rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("rule {id}")))?;
        patch.apply(rule);
        Ok(())
    }
}

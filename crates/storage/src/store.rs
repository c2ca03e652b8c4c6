use async_trait::async_trait;
use ledgersort_core::{
    CategoryRule, CategoryStore, RuleId, RulePatch, StoreResult, Transaction, TransactionId,
    TransactionPatch,
};
use std::path::Path;

use crate::db::{self, DbPool};

/// SQLite-backed rule and transaction store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn open(path: &Path) -> Result<Self, sqlx::Error> {
        let pool = db::create_db(path).await?;
        tracing::debug!("Opened category store at {}", path.display());
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn save_rule(&self, rule: &CategoryRule) -> StoreResult<RuleId> {
        db::save_rule(&self.pool, rule).await
    }

    pub async fn insert_transaction(&self, tx: &Transaction) -> StoreResult<TransactionId> {
        db::insert_transaction(&self.pool, tx).await
    }
}

#[async_trait]
impl CategoryStore for SqliteStore {
    async fn list_rules(&self) -> StoreResult<Vec<CategoryRule>> {
        db::get_all_rules(&self.pool).await
    }

    async fn list_transactions(&self) -> StoreResult<Vec<Transaction>> {
        db::get_all_transactions(&self.pool).await
    }

    async fn update_transaction(&self, id: TransactionId, patch: &TransactionPatch) -> StoreResult<()> {
        db::update_transaction(&self.pool, id, patch).await
    }

    async fn update_rule(&self, id: RuleId, patch: &RulePatch) -> StoreResult<()> {
        db::update_rule(&self.pool, id, patch).await
    }
}

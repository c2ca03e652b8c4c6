use ledgersort_core::{
    CategoryRule, EntryType, Money, Pattern, PatternLogic, RuleId, RulePatch, RuleType, StoreError,
    StoreResult, Transaction, TransactionId, TransactionPatch,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS category_rules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            patterns TEXT NOT NULL,
            pattern_logic TEXT NOT NULL DEFAULT 'OR',
            priority INTEGER NOT NULL,
            rule_type TEXT NOT NULL,
            group_id TEXT,
            color_variant TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT,
            payee TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            amount TEXT NOT NULL DEFAULT '0',
            currency TEXT NOT NULL DEFAULT '',
            entry_type TEXT,
            account_number TEXT NOT NULL DEFAULT '',
            transaction_type TEXT NOT NULL DEFAULT '',
            archive_id TEXT NOT NULL DEFAULT '',
            category TEXT,
            category_confidence INTEGER,
            manually_edited INTEGER NOT NULL DEFAULT 0,
            ignored INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_archive_id ON transactions(archive_id)")
        .execute(pool)
        .await?;

    Ok(())
}

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn patterns_to_json(patterns: &[Pattern]) -> StoreResult<String> {
    serde_json::to_string(patterns).map_err(|e| StoreError::Corrupt(format!("patterns: {e}")))
}

/// Inserts `rule` under its own id, replacing any rule already stored there.
pub async fn save_rule(pool: &DbPool, rule: &CategoryRule) -> StoreResult<RuleId> {
    let patterns = patterns_to_json(&rule.patterns)?;
    sqlx::query(
        r#"
        INSERT INTO category_rules (id, name, patterns, pattern_logic, priority, rule_type, group_id, color_variant)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            patterns = excluded.patterns,
            pattern_logic = excluded.pattern_logic,
            priority = excluded.priority,
            rule_type = excluded.rule_type,
            group_id = excluded.group_id,
            color_variant = excluded.color_variant
        "#,
    )
    .bind(rule.id.0)
    .bind(&rule.name)
    .bind(patterns)
    .bind(rule.pattern_logic.as_str())
    .bind(i64::from(rule.priority))
    .bind(rule.rule_type.as_str())
    .bind(&rule.group_id)
    .bind(&rule.color_variant)
    .execute(pool)
    .await
    .map_err(db_error)?;

    Ok(rule.id)
}

pub async fn get_all_rules(pool: &DbPool) -> StoreResult<Vec<CategoryRule>> {
    let rows = sqlx::query_as::<_, (i64, String, String, String, i64, String, Option<String>, Option<String>)>(
        "SELECT id, name, patterns, pattern_logic, priority, rule_type, group_id, color_variant FROM category_rules ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .map_err(db_error)?;

    rows.into_iter()
        .map(|r| {
            let patterns: Vec<Pattern> = serde_json::from_str(&r.2)
                .map_err(|e| StoreError::Corrupt(format!("rule {}: patterns: {e}", r.0)))?;
            let pattern_logic: PatternLogic = r.3.parse().map_err(StoreError::Corrupt)?;
            let rule_type: RuleType = r.5.parse().map_err(StoreError::Corrupt)?;
            let priority = u8::try_from(r.4)
                .map_err(|_| StoreError::Corrupt(format!("rule {}: priority {}", r.0, r.4)))?;
            Ok(CategoryRule {
                id: RuleId(r.0),
                name: r.1,
                patterns,
                pattern_logic,
                priority,
                rule_type,
                group_id: r.6,
                color_variant: r.7,
            })
        })
        .collect()
}

pub async fn update_rule(pool: &DbPool, id: RuleId, patch: &RulePatch) -> StoreResult<()> {
    if patch.is_empty() {
        return Ok(());
    }

    let mut query = QueryBuilder::<Sqlite>::new("UPDATE category_rules SET ");
    {
        let mut set = query.separated(", ");
        if let Some(name) = &patch.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(patterns) = &patch.patterns {
            set.push("patterns = ")
                .push_bind_unseparated(patterns_to_json(patterns)?);
        }
        if let Some(logic) = patch.pattern_logic {
            set.push("pattern_logic = ")
                .push_bind_unseparated(logic.as_str());
        }
        if let Some(priority) = patch.priority {
            set.push("priority = ")
                .push_bind_unseparated(i64::from(priority));
        }
    }
    query.push(" WHERE id = ").push_bind(id.0);

    let result = query.build().execute(pool).await.map_err(db_error)?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("rule {id}")));
    }
    Ok(())
}

pub async fn insert_transaction(pool: &DbPool, tx: &Transaction) -> StoreResult<TransactionId> {
    let row = sqlx::query(
        r#"
        INSERT INTO transactions (
            date, payee, description, amount, currency, entry_type, account_number,
            transaction_type, archive_id, category, category_confidence, manually_edited, ignored
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(tx.date)
    .bind(&tx.payee)
    .bind(&tx.description)
    .bind(tx.amount.to_string())
    .bind(&tx.currency)
    .bind(tx.entry_type.map(EntryType::as_str))
    .bind(&tx.account_number)
    .bind(&tx.transaction_type)
    .bind(&tx.archive_id)
    .bind(&tx.category)
    .bind(tx.category_confidence.map(i64::from))
    .bind(tx.manually_edited)
    .bind(tx.ignored)
    .fetch_one(pool)
    .await
    .map_err(db_error)?;

    Ok(TransactionId(row.try_get("id").map_err(db_error)?))
}

pub async fn get_all_transactions(pool: &DbPool) -> StoreResult<Vec<Transaction>> {
    let rows = sqlx::query(
        r#"
        SELECT id, date, payee, description, amount, currency, entry_type, account_number,
               transaction_type, archive_id, category, category_confidence, manually_edited, ignored
        FROM transactions ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(db_error)?;

    rows.iter().map(transaction_from_row).collect()
}

fn transaction_from_row(row: &sqlx::sqlite::SqliteRow) -> StoreResult<Transaction> {
    let id: i64 = row.try_get("id").map_err(db_error)?;
    let amount: String = row.try_get("amount").map_err(db_error)?;
    let amount: Money = amount
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("transaction {id}: amount '{amount}': {e}")))?;
    let entry_type = row
        .try_get::<Option<String>, _>("entry_type")
        .map_err(db_error)?
        .map(|t| t.parse::<EntryType>())
        .transpose()
        .map_err(|e| StoreError::Corrupt(format!("transaction {id}: {e}")))?;
    let category_confidence = row
        .try_get::<Option<i64>, _>("category_confidence")
        .map_err(db_error)?
        .map(|c| {
            u8::try_from(c)
                .ok()
                .filter(|c| *c <= 100)
                .ok_or_else(|| StoreError::Corrupt(format!("transaction {id}: confidence {c}")))
        })
        .transpose()?;

    Ok(Transaction {
        id: Some(TransactionId(id)),
        date: row.try_get("date").map_err(db_error)?,
        payee: row.try_get("payee").map_err(db_error)?,
        description: row.try_get("description").map_err(db_error)?,
        amount,
        currency: row.try_get("currency").map_err(db_error)?,
        entry_type,
        account_number: row.try_get("account_number").map_err(db_error)?,
        transaction_type: row.try_get("transaction_type").map_err(db_error)?,
        archive_id: row.try_get("archive_id").map_err(db_error)?,
        category: row.try_get("category").map_err(db_error)?,
        category_confidence,
        manually_edited: row.try_get("manually_edited").map_err(db_error)?,
        ignored: row.try_get("ignored").map_err(db_error)?,
    })
}

pub async fn update_transaction(
    pool: &DbPool,
    id: TransactionId,
    patch: &TransactionPatch,
) -> StoreResult<()> {
    if patch.is_empty() {
        return Ok(());
    }

    let mut query = QueryBuilder::<Sqlite>::new("UPDATE transactions SET ");
    {
        let mut set = query.separated(", ");
        if let Some(category) = &patch.category {
            set.push("category = ").push_bind_unseparated(category.clone());
        }
        if let Some(confidence) = patch.category_confidence {
            set.push("category_confidence = ")
                .push_bind_unseparated(confidence.map(i64::from));
        }
        if let Some(manual) = patch.manually_edited {
            set.push("manually_edited = ").push_bind_unseparated(manual);
        }
    }
    query.push(" WHERE id = ").push_bind(id.0);

    let result = query.build().execute(pool).await.map_err(db_error)?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("transaction {id}")));
    }
    Ok(())
}

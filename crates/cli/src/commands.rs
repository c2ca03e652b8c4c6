use anyhow::{bail, Context};
use ledgersort_core::{CategoryStore, Transaction};
use ledgersort_engine::{recategorize_all_with_config, RuleResolver, RuleSet};
use ledgersort_storage::SqliteStore;
use std::path::Path;

use crate::config::AppConfig;

async fn open_store(config: &AppConfig) -> anyhow::Result<SqliteStore> {
    SqliteStore::open(&config.database_path)
        .await
        .with_context(|| format!("Failed to open {}", config.database_path.display()))
}

fn read_rule_set(file: &Path) -> anyhow::Result<RuleSet> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    RuleSet::from_toml(&content).with_context(|| format!("Failed to parse {}", file.display()))
}

pub async fn sweep(config: &AppConfig) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let report = recategorize_all_with_config(&store, config.scoring()?).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.failures.is_empty() {
        bail!("{} transaction(s) could not be updated", report.failures.len());
    }
    Ok(())
}

pub async fn categorize(config: &AppConfig, file: &Path, save: bool) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut transactions: Vec<Transaction> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    let store = open_store(config).await?;
    let rules = store.list_rules().await?;
    let resolver = RuleResolver::with_config(&rules, config.scoring()?);
    let summary = resolver.categorize_batch(&mut transactions);
    tracing::info!(
        "Categorized {} of {} transaction(s)",
        summary.categorized,
        summary.categorized + summary.uncategorized
    );

    if save {
        for tx in &mut transactions {
            tx.id = Some(store.insert_transaction(tx).await?);
        }
    }
    println!("{}", serde_json::to_string_pretty(&transactions)?);
    Ok(())
}

pub async fn import_rules(config: &AppConfig, file: &Path) -> anyhow::Result<()> {
    let rule_set = read_rule_set(file)?;
    let problems = rule_set.problems();
    if !problems.is_empty() {
        for p in &problems {
            eprintln!("rule {} ({}): {}", p.rule_id, p.rule_name, p.error);
        }
        bail!("{} invalid rule(s) in {}; nothing imported", problems.len(), file.display());
    }

    let store = open_store(config).await?;
    for rule in &rule_set.rules {
        store.save_rule(rule).await?;
    }
    tracing::info!("Imported {} rule(s) from {}", rule_set.rules.len(), file.display());
    Ok(())
}

pub fn validate(file: &Path) -> anyhow::Result<()> {
    let rule_set = read_rule_set(file)?;
    let problems = rule_set.problems();
    for p in &problems {
        println!("rule {} ({}): {}", p.rule_id, p.rule_name, p.error);
    }
    if !problems.is_empty() {
        bail!("{} of {} rule(s) invalid", problems.len(), rule_set.rules.len());
    }
    println!("{} rule(s) OK", rule_set.rules.len());
    Ok(())
}

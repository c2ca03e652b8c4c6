use ledgersort_core::{CategoryRule, CategoryStore, Pattern, StoreError, Transaction};

use crate::matcher::matches;

/// Names of other rules that would also fire on `tx` through a pattern
/// inspecting at least one of the fields `new_pattern` inspects.
///
/// Advisory only: the result is shown as a warning before a new pattern is
/// saved and never blocks anything. Each rule is reported at most once, in
/// the order the rules were given.
pub fn find_conflicts(
    new_pattern: &Pattern,
    target_rule_name: &str,
    tx: &Transaction,
    other_rules: &[CategoryRule],
) -> Vec<String> {
    let new_fields = new_pattern.field_set();
    let mut conflicts: Vec<String> = Vec::new();

    for rule in other_rules {
        if rule.name == target_rule_name || conflicts.contains(&rule.name) {
            continue;
        }
        let fires = rule
            .patterns
            .iter()
            .filter(|p| !p.field_set().is_disjoint(&new_fields))
            .any(|p| matches(tx, p));
        if fires {
            conflicts.push(rule.name.clone());
        }
    }

    conflicts
}

pub async fn find_conflicts_in_store<S>(
    store: &S,
    new_pattern: &Pattern,
    target_rule_name: &str,
    tx: &Transaction,
) -> Result<Vec<String>, StoreError>
where
    S: CategoryStore + ?Sized,
{
    let rules = store.list_rules().await?;
    Ok(find_conflicts(new_pattern, target_rule_name, tx, &rules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use ledgersort_core::{Money, PatternWord, RuleType, TransactionField};

    const PAYEE: TransactionField = TransactionField::Payee;
    const DESCRIPTION: TransactionField = TransactionField::Description;

    fn pattern(fields: &[TransactionField], word: &str) -> Pattern {
        Pattern::wordlist(fields, vec![PatternWord::new(word)], 1.0)
    }

    fn rule(id: i64, name: &str, patterns: Vec<Pattern>) -> CategoryRule {
        CategoryRule::new(id, name, RuleType::Expense, 5, patterns)
    }

    fn tx() -> Transaction {
        Transaction::new("Albert Heijn 1402", "Pinbetaling boodschappen", Money::from_cents(-2345))
    }

    #[test]
    fn reports_rules_firing_on_shared_fields() {
        let rules = vec![
            rule(1, "Groceries", vec![pattern(&[PAYEE], "albert")]),
            rule(2, "Household", vec![pattern(&[PAYEE], "heijn")]),
            rule(3, "Fuel", vec![pattern(&[PAYEE], "shell")]),
        ];
        let new = pattern(&[PAYEE], "albert heijn");
        assert_eq!(
            find_conflicts(&new, "Groceries", &tx(), &rules),
            vec!["Household".to_string()]
        );
    }

    #[test]
    fn ignores_patterns_on_disjoint_fields() {
        let rules = vec![rule(2, "Household", vec![pattern(&[DESCRIPTION], "boodschappen")])];
        let new = pattern(&[PAYEE], "albert");
        assert!(find_conflicts(&new, "Groceries", &tx(), &rules).is_empty());

        let overlapping = pattern(&[PAYEE, DESCRIPTION], "albert");
        assert_eq!(
            find_conflicts(&overlapping, "Groceries", &tx(), &rules),
            vec!["Household".to_string()]
        );
    }

    #[test]
    fn rule_reported_once_even_with_several_hits() {
        let rules = vec![rule(
            2,
            "Household",
            vec![pattern(&[PAYEE], "albert"), pattern(&[PAYEE], "heijn")],
        )];
        let new = pattern(&[PAYEE], "albert");
        assert_eq!(find_conflicts(&new, "Groceries", &tx(), &rules).len(), 1);
    }

    #[test]
    fn regex_patterns_participate() {
        let mut regex_rule = rule(2, "Supermarkets", vec![]);
        regex_rule.patterns = vec![Pattern::regex(&[PAYEE], r"(?i)^albert\s+heijn", "", 1.0)];
        let new = pattern(&[PAYEE], "albert");
        assert_eq!(
            find_conflicts(&new, "Groceries", &tx(), &[regex_rule]),
            vec!["Supermarkets".to_string()]
        );
    }

    #[test]
    fn target_rule_is_excluded() {
        let rules = vec![rule(1, "Groceries", vec![pattern(&[PAYEE], "albert")])];
        let new = pattern(&[PAYEE], "albert");
        assert!(find_conflicts(&new, "Groceries", &tx(), &rules).is_empty());
    }

    #[test]
    fn empty_new_field_set_conflicts_with_nothing() {
        let rules = vec![rule(2, "Household", vec![pattern(&[PAYEE], "albert")])];
        let new = pattern(&[], "albert");
        assert!(find_conflicts(&new, "Groceries", &tx(), &rules).is_empty());
    }

    #[tokio::test]
    async fn reads_rules_from_store() {
        let store = MemoryStore::new(
            vec![
                rule(1, "Groceries", vec![pattern(&[PAYEE], "albert")]),
                rule(2, "Household", vec![pattern(&[PAYEE], "albert")]),
            ],
            vec![],
        );
        let new = pattern(&[PAYEE], "heijn");
        let conflicts = find_conflicts_in_store(&store, &new, "Groceries", &tx()).await.unwrap();
        assert_eq!(conflicts, vec!["Household".to_string()]);
    }
}

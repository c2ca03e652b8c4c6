use ledgersort_core::{CategoryRule, RuleError, RuleId};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A set of rules as authored in a TOML file:
///
/// ```toml
/// [[rules]]
/// id = 1
/// name = "Groceries"
/// type = "expense"
/// priority = 5
///
/// [[rules.patterns]]
/// fields = ["payee"]
/// words = [{ text = "albert heijn" }]
/// weight = 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<CategoryRule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleProblem {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub error: RuleError,
}

impl RuleSet {
    pub fn from_toml(toml_content: &str) -> Result<Self, EngineError> {
        Ok(toml::from_str(toml_content)?)
    }

    /// Every rule that fails structural validation, with its first problem.
    pub fn problems(&self) -> Vec<RuleProblem> {
        self.rules
            .iter()
            .filter_map(|rule| {
                rule.validate().err().map(|error| RuleProblem {
                    rule_id: rule.id,
                    rule_name: rule.name.clone(),
                    error,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgersort_core::{PatternLogic, TransactionField};

    const RULES: &str = r#"
        [[rules]]
        id = 1
        name = "Groceries"
        type = "expense"
        priority = 5

        [[rules.patterns]]
        fields = ["payee"]
        words = [{ text = "albert heijn" }, { text = "jumbo" }]
        weight = 10

        [[rules]]
        id = 2
        name = "Salary"
        type = "income"
        priority = 8
        patternLogic = "AND"

        [[rules.patterns]]
        field = "description"
        matchType = "regex"
        regex = "^SALARIS"
        regexFlags = "i"
        weight = 20

        [[rules.patterns]]
        field = "type"
        words = [{ text = "credit" }]
        weight = 5
        amountCondition = { operator = "gte", value = 1000 }
    "#;

    #[test]
    fn parses_rule_file() {
        let set = RuleSet::from_toml(RULES).unwrap();
        assert_eq!(set.rules.len(), 2);
        assert_eq!(set.rules[1].pattern_logic, PatternLogic::And);
        assert_eq!(set.rules[1].patterns[0].fields, vec![TransactionField::Description]);
        assert!(set.rules[1].patterns[1].amount_condition.is_some());
        assert!(set.problems().is_empty());
    }

    #[test]
    fn reports_invalid_rules() {
        let set = RuleSet::from_toml(
            r#"
            [[rules]]
            id = 9
            name = "Broken"
            type = "expense"
            priority = 12
            patterns = []
            "#,
        )
        .unwrap();
        let problems = set.problems();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].rule_id, RuleId(9));
        assert_eq!(problems[0].error, RuleError::PriorityOutOfRange(12));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(RuleSet::from_toml("[[rules]]\nid = \"x\""), Err(EngineError::Toml(_))));
    }
}

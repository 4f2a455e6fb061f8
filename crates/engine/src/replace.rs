use serde::{Deserialize, Serialize};

/// Literal find/replace pair. Not a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceRule {
    pub find: String,
    #[serde(default)]
    pub replace: String,
}

impl ReplaceRule {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self { find: find.into(), replace: replace.into() }
    }
}

/// Ordered replace rules. Each rule sees the output of the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceRules(Vec<ReplaceRule>);

impl ReplaceRules {
    pub fn new(rules: Vec<ReplaceRule>) -> Self {
        Self(rules)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn apply(&self, input: &str) -> String {
        self.0.iter().fold(input.to_string(), |acc, rule| {
            if rule.find.is_empty() {
                acc
            } else {
                acc.replace(&rule.find, &rule.replace)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn applies_in_sequence() {
        let rules = ReplaceRules::new(vec![ReplaceRule::new(" ", ""), ReplaceRule::new("_", "-")]);
        assert_eq!(rules.apply("VQ_ Sales "), "VQ-Sales");
    }

    #[test]
    fn order_changes_result() {
        let forward = ReplaceRules::new(vec![ReplaceRule::new("a", "b"), ReplaceRule::new("b", "c")]);
        let reverse = ReplaceRules::new(vec![ReplaceRule::new("b", "c"), ReplaceRule::new("a", "b")]);
        assert_eq!(forward.apply("ab"), "cc");
        assert_eq!(reverse.apply("ab"), "bc");
    }

    #[test]
    fn find_is_literal_not_regex() {
        let rules = ReplaceRules::new(vec![ReplaceRule::new(".*", "X")]);
        assert_eq!(rules.apply("a.*b"), "aXb");
        assert_eq!(rules.apply("ab"), "ab");
    }

    proptest! {
        #[test]
        fn apply_is_deterministic(
            input in "[a-c _]{0,12}",
            pairs in proptest::collection::vec(("[a-c _]{1,2}", "[a-c_]{0,2}"), 0..4),
        ) {
            let rules = ReplaceRules::new(
                pairs.into_iter().map(|(f, r)| ReplaceRule::new(f, r)).collect(),
            );
            prop_assert_eq!(rules.apply(&input), rules.apply(&input));
        }

        #[test]
        fn no_rules_is_identity(input in ".{0,20}") {
            prop_assert_eq!(ReplaceRules::default().apply(&input), input);
        }
    }
}

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::error::{require, Reason, Result, ValidationError};
use crate::model::enums::ScriptKind;
use crate::model::filter_action::FilterAction;
use crate::model::filter_test::FilterTests;

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One `if` of a rule tree.
///
/// When `tests` match, `actions` run in index order and then `child` is
/// evaluated as a nested `if`. Otherwise the `else_rules` are tried in order
/// and the first whose tests match is taken. `child` is an owned box, so the
/// chain it forms can never loop back on itself.
///
/// `else_rules` keeps "no else clause" (`None`) apart from an else clause with
/// no alternatives (`Some(vec![])`). `actions` makes no such distinction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRuleNode {
    #[serde(default)]
    tests: FilterTests,
    #[serde(default, deserialize_with = "null_as_empty")]
    actions: Vec<FilterAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    child: Option<Box<FilterRuleNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    else_rules: Option<Vec<FilterRuleNode>>,
}

impl FilterRuleNode {
    pub fn new(tests: FilterTests) -> Self {
        Self {
            tests,
            ..Default::default()
        }
    }

    pub fn tests(&self) -> &FilterTests {
        &self.tests
    }

    pub fn tests_mut(&mut self) -> &mut FilterTests {
        &mut self.tests
    }

    pub fn set_tests(&mut self, tests: FilterTests) {
        self.tests = tests;
    }

    pub fn push_action(&mut self, action: FilterAction) {
        self.actions.push(action);
    }

    pub fn with_action(mut self, action: FilterAction) -> Self {
        self.push_action(action);
        self
    }

    pub fn actions(&self) -> &[FilterAction] {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut [FilterAction] {
        &mut self.actions
    }

    /// Actions sorted by `index`; equal indices keep insertion order.
    pub fn ordered_actions(&self) -> Vec<&FilterAction> {
        let mut ordered: Vec<&FilterAction> = self.actions.iter().collect();
        ordered.sort_by_key(|a| a.index);
        ordered
    }

    /// Installs the nested `if`, returning the one it replaces.
    pub fn set_child(&mut self, child: FilterRuleNode) -> Option<FilterRuleNode> {
        self.child.replace(Box::new(child)).map(|old| *old)
    }

    pub fn with_child(mut self, child: FilterRuleNode) -> Self {
        self.set_child(child);
        self
    }

    pub fn child(&self) -> Option<&FilterRuleNode> {
        self.child.as_deref()
    }

    pub fn child_mut(&mut self) -> Option<&mut FilterRuleNode> {
        self.child.as_deref_mut()
    }

    pub fn take_child(&mut self) -> Option<FilterRuleNode> {
        self.child.take().map(|c| *c)
    }

    pub fn set_else_rules(&mut self, rules: Vec<FilterRuleNode>) {
        self.else_rules = Some(rules);
    }

    /// Appends an alternative, creating the else clause if there was none.
    pub fn push_else_rule(&mut self, rule: FilterRuleNode) {
        self.else_rules.get_or_insert_with(Vec::new).push(rule);
    }

    pub fn with_else_rule(mut self, rule: FilterRuleNode) -> Self {
        self.push_else_rule(rule);
        self
    }

    pub fn clear_else_rules(&mut self) -> Option<Vec<FilterRuleNode>> {
        self.else_rules.take()
    }

    pub fn else_rules(&self) -> Option<&[FilterRuleNode]> {
        self.else_rules.as_deref()
    }

    pub fn else_rules_mut(&mut self) -> Option<&mut Vec<FilterRuleNode>> {
        self.else_rules.as_mut()
    }

    /// This node followed by its nested `if` chain.
    pub fn chain(&self) -> impl Iterator<Item = &FilterRuleNode> {
        std::iter::successors(Some(self), |node| node.child())
    }

    pub fn depth(&self) -> usize {
        self.chain().count()
    }

    /// Validates every test and action in the tree, normalizing header edit
    /// actions. On error the tree is left unchanged.
    pub fn validate(&mut self, script: ScriptKind) -> Result<()> {
        let mut tree = self.clone();
        tree.validate_in_place(script)?;
        *self = tree;
        Ok(())
    }

    fn validate_in_place(&mut self, script: ScriptKind) -> Result<()> {
        let mut pending: Vec<&mut FilterRuleNode> = vec![self];
        while let Some(node) = pending.pop() {
            let FilterRuleNode {
                tests,
                actions,
                child,
                else_rules,
            } = node;

            tests.validate()?;
            if actions.is_empty() && child.is_none() {
                return Err(ValidationError::new(
                    Reason::MissingAction,
                    "missing action: a rule without a nested rule needs at least one action",
                ));
            }
            for action in actions.iter_mut() {
                action.validate(script)?;
            }

            if let Some(rules) = else_rules {
                pending.extend(rules.iter_mut().rev());
            }
            if let Some(child) = child {
                pending.push(child);
            }
        }
        Ok(())
    }
}

/// A named top-level rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    pub name: String,
    #[serde(default = "enabled")]
    pub active: bool,
    #[serde(flatten)]
    pub node: FilterRuleNode,
}

fn enabled() -> bool {
    true
}

impl FilterRule {
    pub fn new(name: impl Into<String>, node: FilterRuleNode) -> Self {
        Self {
            name: name.into(),
            active: true,
            node,
        }
    }

    pub fn validate(&mut self, script: ScriptKind) -> Result<()> {
        require("name", &self.name)?;
        debug!(rule = %self.name, depth = self.node.depth(), "validating rule");
        self.node.validate(script).map_err(|e| {
            warn!(rule = %self.name, reason = %e.reason(), "rule rejected: {e}");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::editheader::{DeleteheaderAction, HeaderMatchSpec};
    use crate::model::enums::{EditheaderMatchType, StringComparison};
    use crate::model::filter_action::{ActionKind, FileIntoAction, LogAction};
    use crate::model::filter_test::{FilterTest, HeaderTest, TestKind};

    fn subject_is(value: &str) -> FilterTests {
        FilterTests::any_of([FilterTest::new(
            HeaderTest::new("Subject", StringComparison::Is, value).unwrap(),
        )])
    }

    fn log(content: &str) -> FilterAction {
        FilterAction::new(LogAction {
            content: content.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_actions_never_nil() {
        let node = FilterRuleNode::new(subject_is("hi"));
        assert!(node.actions().is_empty());

        let parsed: FilterRuleNode = serde_json::from_str(r#"{"actions":null}"#).unwrap();
        assert!(parsed.actions().is_empty());
        let missing: FilterRuleNode = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, missing);
    }

    #[test]
    fn test_else_rules_nil_and_empty_are_distinct() {
        let unset = FilterRuleNode::new(subject_is("a")).with_action(FilterAction::new(ActionKind::Keep));
        let mut empty = unset.clone();
        empty.set_else_rules(Vec::new());

        assert_eq!(unset.else_rules(), None);
        assert_eq!(empty.else_rules(), Some(&[][..]));
        assert_ne!(unset, empty);

        let unset_json = serde_json::to_string(&unset).unwrap();
        let empty_json = serde_json::to_string(&empty).unwrap();
        assert!(!unset_json.contains("elseRules"));
        assert!(empty_json.contains("\"elseRules\":[]"));

        let unset_back: FilterRuleNode = serde_json::from_str(&unset_json).unwrap();
        let empty_back: FilterRuleNode = serde_json::from_str(&empty_json).unwrap();
        assert_eq!(unset_back.else_rules(), None);
        assert_eq!(empty_back.else_rules().map(<[_]>::len), Some(0));
    }

    #[test]
    fn test_push_else_rule_creates_clause() {
        let mut node = FilterRuleNode::new(subject_is("a"));
        node.push_else_rule(FilterRuleNode::default().with_action(log("else")));
        node.push_else_rule(FilterRuleNode::default().with_action(log("else 2")));
        assert_eq!(node.else_rules().unwrap().len(), 2);
        assert_eq!(node.clear_else_rules().map(|r| r.len()), Some(2));
        assert_eq!(node.else_rules(), None);
    }

    #[test]
    fn test_set_child_replaces() {
        let mut node = FilterRuleNode::new(subject_is("a"));
        assert!(node.set_child(FilterRuleNode::new(subject_is("b"))).is_none());
        let old = node.set_child(FilterRuleNode::new(subject_is("c"))).unwrap();
        assert_eq!(old.tests(), &subject_is("b"));
        assert_eq!(node.child().unwrap().tests(), &subject_is("c"));
        assert!(node.take_child().is_some());
        assert!(node.child().is_none());
    }

    #[test]
    fn test_child_chain_cannot_cycle() {
        // Linking a node under itself moves a copy in; the chain stays finite
        // and the copy is independent of the original.
        let mut root = FilterRuleNode::new(subject_is("a")).with_child(FilterRuleNode::new(subject_is("b")));
        let snapshot = root.clone();
        root.child_mut().unwrap().set_child(snapshot);

        assert_eq!(root.depth(), 4);
        let seen: Vec<_> = root.chain().map(|n| n as *const FilterRuleNode).collect();
        for (i, a) in seen.iter().enumerate() {
            assert!(seen[i + 1..].iter().all(|b| b != a), "node reachable from itself");
        }

        root.set_tests(subject_is("changed"));
        let copy = root.chain().nth(2).unwrap();
        assert_eq!(copy.tests(), &subject_is("a"));
    }

    #[test]
    fn test_validate_normalizes_nested_actions() {
        let spec = HeaderMatchSpec::new("X-Foo").with_values(["bar"]);
        let child = FilterRuleNode::new(subject_is("b"))
            .with_action(FilterAction::new(DeleteheaderAction::new(spec)));
        let mut root = FilterRuleNode::new(subject_is("a")).with_child(child);

        root.validate(ScriptKind::Admin).unwrap();
        let delete = root.child().unwrap().actions()[0]
            .get::<DeleteheaderAction>()
            .unwrap();
        assert_eq!(delete.test.match_type, Some(EditheaderMatchType::Is));
    }

    #[test]
    fn test_validate_is_all_or_nothing() {
        let spec = HeaderMatchSpec::new("X-Foo").with_values(["bar"]);
        let mut root = FilterRuleNode::new(subject_is("a"))
            .with_action(FilterAction::new(DeleteheaderAction::new(spec)))
            .with_else_rule(FilterRuleNode::default().with_action(FilterAction::reject("")));
        let before = root.clone();

        let err = root.validate(ScriptKind::Admin).unwrap_err();
        assert_eq!(err.reason(), Reason::MissingField);
        assert_eq!(root, before);
    }

    #[test]
    fn test_validate_missing_action() {
        let mut leaf = FilterRuleNode::new(subject_is("a"));
        assert_eq!(leaf.validate(ScriptKind::User).unwrap_err().reason(), Reason::MissingAction);

        // a node may carry no actions when it continues into a nested rule
        let mut parent = FilterRuleNode::new(subject_is("a"))
            .with_child(FilterRuleNode::new(subject_is("b")).with_action(log("nested")));
        assert!(parent.validate(ScriptKind::User).is_ok());
    }

    #[test]
    fn test_validate_checks_tests() {
        let mut tests = subject_is("a");
        tests.tests_mut()[0].get_mut::<HeaderTest>().unwrap().value.clear();
        let mut node = FilterRuleNode::new(tests).with_action(FilterAction::new(ActionKind::Keep));
        assert_eq!(node.validate(ScriptKind::User).unwrap_err().reason(), Reason::MissingField);
    }

    #[test]
    fn test_rule_requires_name() {
        let node = FilterRuleNode::new(FilterTests::all_of([FilterTest::new(TestKind::True)]))
            .with_action(FilterAction::new(FileIntoAction::new("Junk").unwrap()));
        let mut rule = FilterRule::new("", node);
        assert_eq!(rule.validate(ScriptKind::User).unwrap_err().reason(), Reason::MissingField);
        rule.name = "Junk".to_string();
        assert!(rule.validate(ScriptKind::User).is_ok());
    }

    #[test]
    fn test_rule_serde_defaults_active() {
        let rule: FilterRule = serde_json::from_str(
            r#"{"name":"r","tests":{"condition":"anyof","tests":[{"type":"true"}]},"actions":[{"type":"keep"}]}"#,
        )
        .unwrap();
        assert!(rule.active);
        assert_eq!(rule.node.actions().len(), 1);
        assert_eq!(rule.node.tests().tests().len(), 1);
    }
}

//! Branch selection over a rule tree.
//!
//! Matching a test against a message is the executor's business; it answers
//! through [`TestOracle`]. What stays here is the if/elsif/else walk that
//! decides which actions run and in what order.
use crate::model::enums::Condition;
use crate::model::filter_action::FilterAction;
use crate::model::filter_test::{FilterTest, FilterTests};
use crate::model::rule::FilterRuleNode;

/// Answers a single leaf test, before `negate` is applied.
pub trait TestOracle {
    fn matches(&mut self, test: &FilterTest) -> bool;
}

impl<F> TestOracle for F
where
    F: FnMut(&FilterTest) -> bool,
{
    fn matches(&mut self, test: &FilterTest) -> bool {
        self(test)
    }
}

impl FilterTests {
    /// Combines the tests in index order, stopping as soon as the result is
    /// known. An empty list matches.
    pub fn evaluate<O: TestOracle + ?Sized>(&self, oracle: &mut O) -> bool {
        if self.is_empty() {
            return true;
        }
        let mut results = self
            .ordered()
            .into_iter()
            .map(|test| oracle.matches(test) != test.negate);
        match self.condition {
            Condition::AllOf => results.all(|r| r),
            Condition::AnyOf => results.any(|r| r),
        }
    }
}

impl FilterRuleNode {
    /// The actions that would run, in run order.
    pub fn select_actions<O: TestOracle + ?Sized>(&self, oracle: &mut O) -> Vec<&FilterAction> {
        let mut selected = Vec::new();
        let mut branch = self.take_branch(oracle);
        while let Some(node) = branch {
            selected.extend(node.ordered_actions());
            branch = node.child().and_then(|child| child.take_branch(&mut *oracle));
        }
        selected
    }

    /// The node whose actions run when control reaches `self`: `self` if its
    /// tests match, else the first matching else rule.
    fn take_branch<O: TestOracle + ?Sized>(&self, oracle: &mut O) -> Option<&FilterRuleNode> {
        if self.tests().evaluate(oracle) {
            return Some(self);
        }
        self.else_rules()?
            .iter()
            .find(|rule| rule.tests().evaluate(&mut *oracle))
    }
}

//! `RuleContext` (spec §4.F): threads fail-fast state and the violation
//! list through a traversal, and implements the "patch after the fact"
//! path-accumulation trick (spec §9) so a node doesn't pay for path
//! construction until it actually produces a violation.

use crate::path::FieldPathElement;
use crate::violation::Violation;

/// Per-evaluation state shared across the whole compiled-tree walk.
pub struct RuleContext {
    fail_fast: bool,
    violations: Vec<Violation>,
}

impl RuleContext {
    pub fn new(fail_fast: bool) -> Self {
        RuleContext {
            fail_fast,
            violations: Vec::new(),
        }
    }

    /// Whether the caller asked to stop at the first violation and one
    /// has already been recorded.
    pub fn should_return(&self) -> bool {
        self.fail_fast && !self.violations.is_empty()
    }

    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// Records a violation with no path set yet; callers fill in
    /// `field_path`/`rule_path` via [`Self::append_field_path_element`]
    /// once the enclosing node finishes, walking back up the stack.
    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Returns the index of the first violation recorded since `mark`,
    /// i.e. the index to start patching paths from once the current
    /// node's sub-evaluation returns. Call [`Self::mark`] before
    /// descending into a child node.
    pub fn mark(&self) -> usize {
        self.violations.len()
    }

    /// Prepends `element` to the field path of every violation recorded
    /// since `mark`, implementing the "patch after the fact" path
    /// construction described in spec §9: the hot path (no violations)
    /// never touches path storage at all.
    pub fn append_field_path_element(&mut self, mark: usize, element: FieldPathElement) {
        for violation in &mut self.violations[mark..] {
            violation.field_path.prepend(element.clone());
        }
    }

    /// Same as [`Self::append_field_path_element`] but for the rule path
    /// (which points into the rule annotation tree, not the message).
    pub fn append_rule_path_elements(&mut self, mark: usize, elements: &[FieldPathElement]) {
        for violation in &mut self.violations[mark..] {
            violation.rule_path.prepend_many(elements);
        }
    }

    /// Flags every violation recorded since `mark` as concerning a map
    /// key rather than its value (`Violation::for_key`).
    pub fn mark_for_key(&mut self, mark: usize) {
        for violation in &mut self.violations[mark..] {
            violation.for_key = true;
        }
    }

    /// Consumes the context, returning the accumulated violations in
    /// traversal order. `finalize` is the named extension point spec §4.F
    /// reserves for resolving any still-lazy value captures; this
    /// implementation has none left to resolve (see [`crate::violation`]).
    pub fn finalize(self) -> Vec<Violation> {
        self.violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_fast_stops_after_first_violation() {
        let mut ctx = RuleContext::new(true);
        assert!(!ctx.should_return());
        ctx.add_violation(Violation::new("r1", "m1"));
        assert!(ctx.should_return());
    }

    #[test]
    fn path_patch_only_touches_violations_since_mark() {
        let mut ctx = RuleContext::new(false);
        ctx.add_violation(Violation::new("r1", "m1"));
        let mark = ctx.mark();
        ctx.add_violation(Violation::new("r2", "m2"));
        ctx.append_field_path_element(mark, FieldPathElement::new(2, "child", "string"));
        let violations = ctx.finalize();
        assert!(violations[0].field_path.is_empty());
        assert_eq!(violations[1].field_path.elements.len(), 1);
    }
}

//! Three-valued plausibility result algebra.

use std::fmt;

/// Outcome of a plausibility test.
///
/// Variants are ordered by severity, so [`PlausibilityResult::and`] is the
/// maximum and [`PlausibilityResult::or`] the minimum of two results.
///
/// # Examples
///
/// ```
/// use rupforge_core::PlausibilityResult::*;
///
/// assert_eq!(Pass.and(FailFuturePossible), FailFuturePossible);
/// assert_eq!(Pass.or(FailHardStop), Pass);
/// assert!(FailFuturePossible.can_continue());
/// assert!(!FailHardStop.can_continue());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlausibilityResult {
    /// The rupture or jump satisfies the criterion.
    #[default]
    Pass,
    /// Currently failing, but another continuation or growth order may pass.
    FailFuturePossible,
    /// No extension of this path can pass; abandon the branch.
    FailHardStop,
}

impl PlausibilityResult {
    /// The more severe of the two results.
    #[inline]
    pub fn and(self, other: Self) -> Self {
        self.max(other)
    }

    /// The less severe of the two results.
    #[inline]
    pub fn or(self, other: Self) -> Self {
        self.min(other)
    }

    #[inline]
    pub fn is_pass(self) -> bool {
        self == PlausibilityResult::Pass
    }

    /// True unless the search must abandon this branch.
    #[inline]
    pub fn can_continue(self) -> bool {
        self != PlausibilityResult::FailHardStop
    }

    /// Maps a boolean pass to this result or the given failure.
    #[inline]
    pub fn pass_or(passes: bool, failure: Self) -> Self {
        if passes {
            PlausibilityResult::Pass
        } else {
            failure
        }
    }
}

impl fmt::Display for PlausibilityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlausibilityResult::Pass => "PASS",
            PlausibilityResult::FailFuturePossible => "FAIL_FUTURE_POSSIBLE",
            PlausibilityResult::FailHardStop => "FAIL_HARD_STOP",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::PlausibilityResult::{self, *};
    use proptest::prelude::*;

    fn any_result() -> impl Strategy<Value = PlausibilityResult> {
        prop_oneof![Just(Pass), Just(FailFuturePossible), Just(FailHardStop)]
    }

    #[test]
    fn test_and_ordering() {
        assert_eq!(Pass.and(Pass), Pass);
        assert_eq!(Pass.and(FailFuturePossible), FailFuturePossible);
        assert_eq!(FailFuturePossible.and(FailHardStop), FailHardStop);
        assert_eq!(Pass.and(FailHardStop), FailHardStop);
    }

    #[test]
    fn test_or_ordering() {
        assert_eq!(FailHardStop.or(FailFuturePossible), FailFuturePossible);
        assert_eq!(FailFuturePossible.or(Pass), Pass);
        assert_eq!(FailHardStop.or(FailHardStop), FailHardStop);
    }

    #[test]
    fn test_display() {
        assert_eq!(FailFuturePossible.to_string(), "FAIL_FUTURE_POSSIBLE");
    }

    proptest! {
        #[test]
        fn prop_and_commutative(a in any_result(), b in any_result()) {
            prop_assert_eq!(a.and(b), b.and(a));
        }

        #[test]
        fn prop_or_commutative(a in any_result(), b in any_result()) {
            prop_assert_eq!(a.or(b), b.or(a));
        }

        #[test]
        fn prop_associative(a in any_result(), b in any_result(), c in any_result()) {
            prop_assert_eq!(a.and(b).and(c), a.and(b.and(c)));
            prop_assert_eq!(a.or(b).or(c), a.or(b.or(c)));
        }

        #[test]
        fn prop_and_never_better(a in any_result(), b in any_result()) {
            prop_assert!(a.and(b) >= a && a.and(b) >= b);
            prop_assert!(a.or(b) <= a && a.or(b) <= b);
        }

        #[test]
        fn prop_can_continue(a in any_result()) {
            prop_assert_eq!(a.can_continue(), a != FailHardStop);
            prop_assert_eq!(a.is_pass(), a == Pass);
        }
    }
}

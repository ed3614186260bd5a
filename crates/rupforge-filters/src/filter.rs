//! Filter contract: whole-rupture, incremental and scalar evaluation.

use std::fmt::{self, Debug};

use rupforge_config::FilterConfig;
use rupforge_core::{ClusterRupture, Jump, PlausibilityResult, Result};

/// Controls the trade-off between speed and diagnostics.
///
/// `ShortCircuit` lets filters stop as soon as the verdict is known.
/// `Exhaustive` computes every intermediate value and emits it as tracing
/// events. Both modes must return the same verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalMode {
    #[default]
    ShortCircuit,
    Exhaustive,
}

impl EvalMode {
    #[inline]
    pub fn short_circuits(self) -> bool {
        self == EvalMode::ShortCircuit
    }

    #[inline]
    pub fn is_exhaustive(self) -> bool {
        self == EvalMode::Exhaustive
    }
}

/// Trait for deciding whether a rupture is plausible.
///
/// Filters hold configuration and shared collaborators only; every method
/// takes `&self` so one instance can serve many search threads.
pub trait PlausibilityFilter: Send + Sync + Debug {
    /// Compact name used in tables and logs.
    fn short_name(&self) -> String;

    /// Descriptive name.
    fn name(&self) -> String;

    /// Evaluates the whole rupture, including every splay.
    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult>;

    /// Evaluates `rupture` extended by `jump`.
    ///
    /// Overrides may assume `rupture` itself already passed [`Self::apply`]
    /// and look only at what the jump adds. The result must never be more
    /// permissive than `apply` on the extended rupture.
    fn test_jump(
        &self,
        rupture: &ClusterRupture,
        jump: &Jump,
        mode: EvalMode,
    ) -> Result<PlausibilityResult> {
        self.apply(&rupture.take(jump)?, mode)
    }

    /// Returns true if the verdict may depend on the order in which the
    /// sections were visited.
    fn is_directional(&self, splayed: bool) -> bool;

    /// Persisted form of this filter.
    fn to_config(&self) -> FilterConfig;

    /// Scalar facet, for filters that expose a value.
    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        None
    }
}

/// Filters that reduce a rupture to a number compared against a range.
pub trait ScalarValueFilter: PlausibilityFilter {
    /// The value for this rupture, `None` when it is not defined (for
    /// example a jump-based value on a single-cluster rupture).
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>>;

    fn acceptable_range(&self) -> ScalarRange;

    fn scalar_name(&self) -> String;

    fn scalar_units(&self) -> Option<String>;
}

/// Closed interval with optional bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScalarRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ScalarRange {
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn closed(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    /// Returns true if `a` is better than `b`: larger when the range has a
    /// lower bound, smaller otherwise.
    pub fn is_value_better(&self, a: f64, b: f64) -> bool {
        if self.min.is_some() {
            a > b
        } else {
            a < b
        }
    }

    pub fn best_value(&self, values: impl IntoIterator<Item = f64>) -> Option<f64> {
        values
            .into_iter()
            .reduce(|best, v| if self.is_value_better(v, best) { v } else { best })
    }

    pub fn worst_value(&self, values: impl IntoIterator<Item = f64>) -> Option<f64> {
        values
            .into_iter()
            .reduce(|worst, v| if self.is_value_better(worst, v) { v } else { worst })
    }
}

impl fmt::Display for ScalarRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "∈[{}, {}]", format_num(min), format_num(max)),
            (Some(min), None) => write!(f, "≥{}", format_num(min)),
            (None, Some(max)) => write!(f, "≤{}", format_num(max)),
            (None, None) => f.write_str("∈ℝ"),
        }
    }
}

/// Formats a number with at most two decimals and no trailing zeros.
pub(crate) fn format_num(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

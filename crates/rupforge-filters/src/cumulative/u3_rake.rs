//! Cumulative rake change reproducing legacy UCERF3 results.

use rupforge_config::{ConfigError, CumulativeRakeChangeConfig, FilterConfig};
use rupforge_core::{ClusterRupture, PlausibilityResult, Result};
use tracing::debug;

use crate::azimuth::rake_difference;
use crate::filter::{format_num, EvalMode, PlausibilityFilter, ScalarRange, ScalarValueFilter};

/// Compatibility mode of [`super::CumulativeRakeChangeFilter`].
///
/// Sums rake changes between consecutive entries of the ordered section list
/// (splay sections inlined after their branch section) in list order, and
/// never counts the change into the final section. Both quirks are kept so
/// legacy rupture sets reproduce exactly.
#[derive(Debug, Clone)]
pub struct U3CompatibleCumulativeRakeChangeFilter {
    threshold: f64,
}

impl U3CompatibleCumulativeRakeChangeFilter {
    pub fn new(threshold: f64) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::non_negative("threshold", threshold)?;
        Ok(Self { threshold })
    }

    fn total(&self, rupture: &ClusterRupture, limit: Option<f64>) -> f64 {
        let sects = rupture.build_ordered_section_list();
        let mut total = 0.0;
        for i in 1..sects.len().saturating_sub(1) {
            total += rake_difference(sects[i - 1].rake, sects[i].rake);
            if limit.is_some_and(|limit| total > limit) {
                break;
            }
        }
        total
    }
}

impl PlausibilityFilter for U3CompatibleCumulativeRakeChangeFilter {
    fn short_name(&self) -> String {
        format!("U3CumRake≤{}", format_num(self.threshold))
    }

    fn name(&self) -> String {
        format!("U3 Cumulative Rake Change ≤{}", format_num(self.threshold))
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        let total = self.total(rupture, mode.short_circuits().then_some(self.threshold));
        let result =
            PlausibilityResult::pass_or(total <= self.threshold, PlausibilityResult::FailHardStop);
        if mode.is_exhaustive() {
            debug!(event = "u3_cum_rake", total, threshold = self.threshold, result = %result);
        }
        Ok(result)
    }

    fn is_directional(&self, _splayed: bool) -> bool {
        true
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::U3CompatibleCumulativeRakeChangeFilter(CumulativeRakeChangeConfig {
            threshold: self.threshold,
        })
    }

    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        Some(self)
    }
}

impl ScalarValueFilter for U3CompatibleCumulativeRakeChangeFilter {
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>> {
        Ok(Some(self.total(rupture, None)))
    }

    fn acceptable_range(&self) -> ScalarRange {
        ScalarRange::at_most(self.threshold)
    }

    fn scalar_name(&self) -> String {
        "Cumulative Rake Change".to_string()
    }

    fn scalar_units(&self) -> Option<String> {
        Some("Degrees".to_string())
    }
}

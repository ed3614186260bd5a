//! Filters that sum a quantity along every path through the rupture tree.
//!
//! Paths start at the rupture's start section and follow the navigator's
//! descendant relation to every leaf; at a splay the running total is
//! carried down each branch. A rupture passes when the largest path total is
//! at most the threshold.

mod penalty;
mod u3_rake;


use rupforge_config::{
    ConfigError, CumulativeAzimuthChangeConfig, CumulativeRakeChangeConfig, FilterConfig,
};
use rupforge_core::{ClusterRupture, PlausibilityResult, Result, RuptureTreeNavigator, SectionRef};
use tracing::trace;

use crate::azimuth::{azimuth_difference, rake_difference, AzimuthCalc};
use crate::filter::{format_num, EvalMode, PlausibilityFilter, ScalarRange, ScalarValueFilter};

pub use penalty::{CumulativePenaltyFilter, Penalty};
pub use u3_rake::U3CompatibleCumulativeRakeChangeFilter;

/// Quantity added for one section-to-section step.
pub(crate) trait PathQuantity {
    /// `prev` is the section before `cur` on the path, `None` at the start.
    fn step(
        &self,
        nav: &RuptureTreeNavigator,
        prev: Option<&SectionRef>,
        cur: &SectionRef,
        next: &SectionRef,
    ) -> Result<f64>;
}

struct PathWalk<'a, Q: ?Sized> {
    quantity: &'a Q,
    nav: &'a RuptureTreeNavigator,
    limit: Option<f64>,
    filter: &'a str,
    trace: bool,
}

impl<Q: PathQuantity + ?Sized> PathWalk<'_, Q> {
    fn walk(&self, prev: Option<&SectionRef>, cur: &SectionRef, total: f64) -> Result<f64> {
        if self.limit.is_some_and(|limit| total > limit) {
            return Ok(total);
        }
        let mut best = total;
        for next in self.nav.descendants(cur) {
            let value = self.quantity.step(self.nav, prev, cur, next)?;
            let sum = total + value;
            if self.trace {
                trace!(
                    event = "path_step",
                    filter = self.filter,
                    from = cur.id,
                    to = next.id,
                    value,
                    total = sum,
                );
            }
            best = best.max(self.walk(Some(cur), next, sum)?);
            if self.limit.is_some_and(|limit| best > limit) {
                break;
            }
        }
        Ok(best)
    }
}

/// Largest path total over the rupture.
///
/// With a `limit`, the walk returns as soon as any total exceeds it, so the
/// result is only exact when it is at most the limit.
pub(crate) fn max_path_total<Q: PathQuantity + ?Sized>(
    quantity: &Q,
    rupture: &ClusterRupture,
    limit: Option<f64>,
    filter: &str,
    mode: EvalMode,
) -> Result<f64> {
    let walk = PathWalk {
        quantity,
        nav: rupture.navigator(),
        limit,
        filter,
        trace: mode.is_exhaustive(),
    };
    walk.walk(None, rupture.first_cluster().start_sect(), 0.0)
}

/// Shared `apply` for the path-sum filters: `<=` threshold passes.
pub(crate) fn apply_path_threshold<Q: PathQuantity + ?Sized>(
    quantity: &Q,
    threshold: f64,
    rupture: &ClusterRupture,
    filter: &str,
    mode: EvalMode,
) -> Result<PlausibilityResult> {
    let limit = mode.short_circuits().then_some(threshold);
    let total = max_path_total(quantity, rupture, limit, filter, mode)?;
    let result = PlausibilityResult::pass_or(total <= threshold, PlausibilityResult::FailHardStop);
    if mode.is_exhaustive() {
        tracing::debug!(event = "path_total", filter, total, threshold, result = %result);
    }
    Ok(result)
}

/// Limits the summed absolute azimuth change along any path.
#[derive(Debug, Clone)]
pub struct CumulativeAzimuthChangeFilter {
    az_calc: AzimuthCalc,
    threshold: f64,
}

impl CumulativeAzimuthChangeFilter {
    pub fn new(az_calc: AzimuthCalc, threshold: f64) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::non_negative("threshold", threshold)?;
        Ok(Self { az_calc, threshold })
    }
}

impl PathQuantity for CumulativeAzimuthChangeFilter {
    fn step(
        &self,
        _nav: &RuptureTreeNavigator,
        prev: Option<&SectionRef>,
        cur: &SectionRef,
        next: &SectionRef,
    ) -> Result<f64> {
        let Some(prev) = prev else {
            return Ok(0.0);
        };
        let before = self.az_calc.azimuth(prev, cur);
        let after = self.az_calc.azimuth(cur, next);
        Ok(azimuth_difference(before, after).abs())
    }
}

impl PlausibilityFilter for CumulativeAzimuthChangeFilter {
    fn short_name(&self) -> String {
        format!("CumulativeAz≤{}", format_num(self.threshold))
    }

    fn name(&self) -> String {
        format!("Cumulative Azimuth Change ≤{}", format_num(self.threshold))
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        apply_path_threshold(self, self.threshold, rupture, "CumulativeAz", mode)
    }

    fn is_directional(&self, splayed: bool) -> bool {
        splayed
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::CumulativeAzimuthChangeFilter(CumulativeAzimuthChangeConfig {
            az_calc: self.az_calc.config().clone(),
            threshold: self.threshold,
        })
    }

    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        Some(self)
    }
}

impl ScalarValueFilter for CumulativeAzimuthChangeFilter {
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>> {
        max_path_total(self, rupture, None, "CumulativeAz", EvalMode::ShortCircuit).map(Some)
    }

    fn acceptable_range(&self) -> ScalarRange {
        ScalarRange::at_most(self.threshold)
    }

    fn scalar_name(&self) -> String {
        "Cumulative Azimuth Change".to_string()
    }

    fn scalar_units(&self) -> Option<String> {
        Some("Degrees".to_string())
    }
}

/// Limits the summed rake change along any path.
#[derive(Debug, Clone)]
pub struct CumulativeRakeChangeFilter {
    threshold: f64,
}

impl CumulativeRakeChangeFilter {
    pub fn new(threshold: f64) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::non_negative("threshold", threshold)?;
        Ok(Self { threshold })
    }
}

impl PathQuantity for CumulativeRakeChangeFilter {
    fn step(
        &self,
        _nav: &RuptureTreeNavigator,
        _prev: Option<&SectionRef>,
        cur: &SectionRef,
        next: &SectionRef,
    ) -> Result<f64> {
        Ok(rake_difference(cur.rake, next.rake))
    }
}

impl PlausibilityFilter for CumulativeRakeChangeFilter {
    fn short_name(&self) -> String {
        format!("CumRake≤{}", format_num(self.threshold))
    }

    fn name(&self) -> String {
        format!("Cumulative Rake Change ≤{}", format_num(self.threshold))
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        apply_path_threshold(self, self.threshold, rupture, "CumRake", mode)
    }

    fn is_directional(&self, splayed: bool) -> bool {
        splayed
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::CumulativeRakeChangeFilter(CumulativeRakeChangeConfig {
            threshold: self.threshold,
        })
    }

    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        Some(self)
    }
}

impl ScalarValueFilter for CumulativeRakeChangeFilter {
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>> {
        max_path_total(self, rupture, None, "CumRake", EvalMode::ShortCircuit).map(Some)
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

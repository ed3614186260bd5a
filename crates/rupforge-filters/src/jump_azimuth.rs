//! Azimuth change across each jump.

use rupforge_config::{ConfigError, FilterConfig, JumpAzimuthChangeConfig};
use rupforge_core::{
    ClusterRupture, FaultSubsectionCluster, Jump, PlausibilityError, PlausibilityResult, Result,
    RuptureTreeNavigator, SectionRef,
};
use tracing::debug;

use crate::azimuth::{azimuth_difference, AzimuthCalc};
use crate::filter::{format_num, EvalMode, PlausibilityFilter, ScalarRange, ScalarValueFilter};

/// Compares the strike direction arriving at a jump with the direction
/// leaving it.
///
/// The arriving azimuth runs from the from-section's predecessor to the
/// from-section; the leaving azimuth from the to-section to the next section
/// of the to-cluster. A change larger than the threshold is a hard stop.
#[derive(Debug, Clone)]
pub struct JumpAzimuthChangeFilter {
    az_calc: AzimuthCalc,
    threshold: f64,
    err_on_cant_evaluate: bool,
}

impl JumpAzimuthChangeFilter {
    pub fn new(
        az_calc: AzimuthCalc,
        threshold: f64,
        err_on_cant_evaluate: bool,
    ) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::non_negative("threshold", threshold)?;
        Ok(Self {
            az_calc,
            threshold,
            err_on_cant_evaluate,
        })
    }

    /// Signed azimuth change at `jump`, `None` when either side has only one
    /// section to work with.
    pub fn azimuth_change(&self, nav: &RuptureTreeNavigator, jump: &Jump) -> Option<f64> {
        let before = nav.predecessor(&jump.from_section)?;
        let after = section_after_entry(&jump.to_cluster)?;
        let before_az = self.az_calc.azimuth(before, &jump.from_section);
        let after_az = self.az_calc.azimuth(&jump.to_section, after);
        Some(azimuth_difference(before_az, after_az))
    }

    fn test(
        &self,
        nav: &RuptureTreeNavigator,
        jump: &Jump,
        mode: EvalMode,
    ) -> Result<PlausibilityResult> {
        let Some(diff) = self.azimuth_change(nav, jump) else {
            if self.err_on_cant_evaluate {
                return Err(PlausibilityError::CannotEvaluate {
                    filter: self.short_name(),
                    reason: format!("jump {} lacks a section on one side", jump),
                });
            }
            if mode.is_exhaustive() {
                debug!(event = "jump_az_undetermined", jump = %jump);
            }
            return Ok(PlausibilityResult::FailFuturePossible);
        };
        let result =
            PlausibilityResult::pass_or(diff.abs() <= self.threshold, PlausibilityResult::FailHardStop);
        if mode.is_exhaustive() {
            debug!(event = "jump_az", jump = %jump, diff, result = %result);
        }
        Ok(result)
    }
}

/// The to-cluster's section next to its start, on either side.
pub(crate) fn section_after_entry(cluster: &FaultSubsectionCluster) -> Option<&SectionRef> {
    let start = cluster.start_index();
    cluster
        .sects()
        .get(start + 1)
        .or_else(|| start.checked_sub(1).and_then(|i| cluster.sects().get(i)))
}

impl PlausibilityFilter for JumpAzimuthChangeFilter {
    fn short_name(&self) -> String {
        format!("JumpAz≤{}", format_num(self.threshold))
    }

    fn name(&self) -> String {
        format!("Jump Azimuth Change ≤{}", format_num(self.threshold))
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        let nav = rupture.navigator();
        let mut result = PlausibilityResult::Pass;
        for jump in rupture.all_jumps() {
            result = result.and(self.test(nav, jump, mode)?);
            if mode.short_circuits() && !result.can_continue() {
                break;
            }
        }
        Ok(result)
    }

    fn test_jump(
        &self,
        rupture: &ClusterRupture,
        jump: &Jump,
        mode: EvalMode,
    ) -> Result<PlausibilityResult> {
        // the from-section is already in the rupture, so its predecessor is known
        self.test(rupture.navigator(), jump, mode)
    }

    fn is_directional(&self, splayed: bool) -> bool {
        splayed
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::JumpAzimuthChangeFilter(JumpAzimuthChangeConfig {
            az_calc: self.az_calc.config().clone(),
            threshold: self.threshold,
            err_on_cant_evaluate: self.err_on_cant_evaluate,
        })
    }

    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        Some(self)
    }
}

impl ScalarValueFilter for JumpAzimuthChangeFilter {
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>> {
        let nav = rupture.navigator();
        Ok(rupture
            .all_jumps()
            .into_iter()
            .filter_map(|jump| self.azimuth_change(nav, jump))
            .map(f64::abs)
            .reduce(f64::max))
    }

    fn acceptable_range(&self) -> ScalarRange {
        ScalarRange::at_most(self.threshold)
    }

    fn scalar_name(&self) -> String {
        "Maximum Jump Azimuth Change".to_string()
    }

    fn scalar_units(&self) -> Option<String> {
        Some("Degrees".to_string())
    }
}

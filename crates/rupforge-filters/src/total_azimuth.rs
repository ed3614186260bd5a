//! Azimuth change from the start of a rupture to the end of each strand.

use rupforge_config::{ConfigError, FilterConfig, TotalAzimuthChangeConfig};
use rupforge_core::{ClusterRupture, PlausibilityResult, Result};
use tracing::debug;

use crate::azimuth::{azimuth_difference, AzimuthCalc};
use crate::filter::{format_num, EvalMode, PlausibilityFilter, ScalarRange, ScalarValueFilter};

#[derive(Debug, Clone)]
pub struct TotalAzimuthChangeFilter {
    az_calc: AzimuthCalc,
    threshold: f64,
    multi_fault_only: bool,
    test_full_end: bool,
}

impl TotalAzimuthChangeFilter {
    pub fn new(
        az_calc: AzimuthCalc,
        threshold: f64,
        multi_fault_only: bool,
        test_full_end: bool,
    ) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::non_negative("threshold", threshold)?;
        Ok(Self {
            az_calc,
            threshold,
            multi_fault_only,
            test_full_end,
        })
    }

    /// Absolute change for every strand end, `None` entries where an end
    /// cluster has a single section. `None` overall when the start azimuth
    /// is undetermined.
    fn end_changes(&self, rupture: &ClusterRupture) -> Option<Vec<Option<f64>>> {
        let first = rupture.first_cluster();
        if first.len() < 2 {
            return None;
        }
        let start_az = self.az_calc.azimuth(&first.sects()[0], &first.sects()[1]);
        let changes = rupture
            .strands()
            .into_iter()
            .map(|strand| {
                let end = strand.last_cluster();
                let n = end.len();
                if n < 2 {
                    return None;
                }
                let (a, b) = if self.test_full_end {
                    (end.first(), end.last())
                } else {
                    (&end.sects()[n - 2], &end.sects()[n - 1])
                };
                let end_az = self.az_calc.azimuth(a, b);
                Some(azimuth_difference(start_az, end_az).abs())
            })
            .collect();
        Some(changes)
    }

    fn is_exempt(&self, rupture: &ClusterRupture) -> bool {
        self.multi_fault_only && rupture.total_num_clusters() == 1
    }
}

impl PlausibilityFilter for TotalAzimuthChangeFilter {
    fn short_name(&self) -> String {
        format!("TotAz≤{}", format_num(self.threshold))
    }

    fn name(&self) -> String {
        format!("Total Azimuth Change ≤{}", format_num(self.threshold))
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        if self.is_exempt(rupture) {
            return Ok(PlausibilityResult::Pass);
        }
        let Some(changes) = self.end_changes(rupture) else {
            return Ok(PlausibilityResult::FailFuturePossible);
        };
        let mut result = PlausibilityResult::Pass;
        for change in changes {
            // an end cluster becomes interior once the strand grows, so
            // failures here are never final
            let end_result = match change {
                Some(diff) => PlausibilityResult::pass_or(
                    diff <= self.threshold,
                    PlausibilityResult::FailFuturePossible,
                ),
                None => PlausibilityResult::FailFuturePossible,
            };
            if mode.is_exhaustive() {
                debug!(event = "total_az", change = ?change, result = %end_result);
            }
            result = result.and(end_result);
        }
        Ok(result)
    }

    fn is_directional(&self, splayed: bool) -> bool {
        splayed
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::TotalAzimuthChangeFilter(TotalAzimuthChangeConfig {
            az_calc: self.az_calc.config().clone(),
            threshold: self.threshold,
            multi_fault_only: self.multi_fault_only,
            test_full_end: self.test_full_end,
        })
    }

    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        Some(self)
    }
}

impl ScalarValueFilter for TotalAzimuthChangeFilter {
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>> {
        if self.is_exempt(rupture) {
            return Ok(None);
        }
        Ok(self
            .end_changes(rupture)
            .and_then(|changes| changes.into_iter().flatten().reduce(f64::max)))
    }

    fn acceptable_range(&self) -> ScalarRange {
        ScalarRange::at_most(self.threshold)
    }

    fn scalar_name(&self) -> String {
        "Total Azimuth Change".to_string()
    }

    fn scalar_units(&self) -> Option<String> {
        Some("Degrees".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rupforge_config::AzimuthCalcConfig;
    use rupforge_core::PlausibilityResult::*;
    use rupforge_test::FaultNetwork;

    fn filter(net: &FaultNetwork, threshold: f64, multi_fault_only: bool, test_full_end: bool) -> TotalAzimuthChangeFilter {
        let az = AzimuthCalc::new(&AzimuthCalcConfig::SimpleAzimuthCalc, Arc::new(net.calc())).unwrap();
        TotalAzimuthChangeFilter::new(az, threshold, multi_fault_only, test_full_end).unwrap()
    }

    #[test]
    fn test_end_direction() {
        let mut net = FaultNetwork::new();
        net.add_fault(1, 3, (0.0, 0.0), 0.0);
        net.add_fault(2, 3, (1.0, 16.0), 45.0);
        let rupture = net.strand(&[(1, 0..3), (2, 0..3)]);

        assert_eq!(filter(&net, 60.0, true, false).apply(&rupture, EvalMode::ShortCircuit).unwrap(), Pass);
        assert_eq!(
            filter(&net, 30.0, true, false).apply(&rupture, EvalMode::ShortCircuit).unwrap(),
            FailFuturePossible
        );
        let value = filter(&net, 30.0, true, true).value(&rupture).unwrap().unwrap();
        assert!((value - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_cluster() {
        let mut net = FaultNetwork::new();
        net.add_fault(1, 3, (0.0, 0.0), 0.0);
        let rupture = ClusterRupture::new(net.cluster(1, 0..3));
        assert_eq!(filter(&net, 0.0, true, false).apply(&rupture, EvalMode::ShortCircuit).unwrap(), Pass);
        assert_eq!(filter(&net, 0.0, false, false).apply(&rupture, EvalMode::ShortCircuit).unwrap(), Pass);

        let short = ClusterRupture::new(net.cluster(1, 0..1));
        assert_eq!(
            filter(&net, 0.0, false, false).apply(&short, EvalMode::ShortCircuit).unwrap(),
            FailFuturePossible
        );
    }
}

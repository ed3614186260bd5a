use std::borrow::Cow;
use std::sync::Arc;

use rupforge_config::{ConfigError, NucleationEvaluatorConfig};
use rupforge_core::{ClusterRef, ClusterRupture, PlausibilityResult, Result};
use tracing::debug;

use super::NucleationEvaluator;
use crate::filter::{format_num, EvalMode, ScalarRange};
use crate::probability::{check_probability, ProbabilityCalc};

/// Product of the rupture probabilities of the rupture regrown from the
/// nucleation cluster outward.
#[derive(Debug, Clone)]
pub struct CumulativeJumpProbPathEvaluator {
    min_probability: f64,
    fail_future_possible: bool,
    calcs: Vec<Arc<ProbabilityCalc>>,
}

impl CumulativeJumpProbPathEvaluator {
    pub fn new(
        min_probability: f64,
        fail_future_possible: bool,
        calcs: Vec<Arc<ProbabilityCalc>>,
    ) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::fraction("min_probability", min_probability)?;
        rupforge_config::validate::non_empty("calcs", &calcs)?;
        Ok(Self {
            min_probability,
            fail_future_possible,
            calcs,
        })
    }

    /// `rupture` as if it had started at `nucleation`.
    fn nucleation_rupture<'a>(
        rupture: &'a ClusterRupture,
        nucleation: &ClusterRef,
    ) -> Result<Cow<'a, ClusterRupture>> {
        if rupture.first_cluster().key() == nucleation.key() {
            return Ok(Cow::Borrowed(rupture));
        }
        if rupture.is_single_strand() && rupture.last_cluster().key() == nucleation.key() {
            return Ok(Cow::Owned(rupture.reversed()?));
        }
        // an end cluster is flipped so growth runs away from its tip
        let at_end = rupture.navigator().descendant_clusters(nucleation).is_empty();
        Ok(Cow::Owned(rupture.rerooted(nucleation, at_end)?))
    }

    fn probability(
        &self,
        rupture: &ClusterRupture,
        nucleation: &ClusterRef,
        mode: EvalMode,
    ) -> Result<f64> {
        let nucleation_rupture = Self::nucleation_rupture(rupture, nucleation)?;
        let mut prob = 1.0;
        for calc in &self.calcs {
            let calc_prob = check_probability(
                &calc.name(),
                calc.rupture_probability(&nucleation_rupture, mode)?,
            )?;
            prob *= calc_prob;
            if mode.is_exhaustive() {
                debug!(
                    event = "nucleation_prob",
                    calc = %calc.name(),
                    nucleation = %nucleation,
                    prob = calc_prob,
                );
            } else if (prob as f32) < self.min_probability as f32 {
                break;
            }
        }
        Ok(prob)
    }

    fn names(&self, strip_spaces: bool) -> String {
        let names: Vec<String> = self
            .calcs
            .iter()
            .map(|calc| {
                let name = calc.name();
                if strip_spaces {
                    name.replace(' ', "")
                } else {
                    name
                }
            })
            .collect();
        names.join(", ")
    }
}

impl NucleationEvaluator for CumulativeJumpProbPathEvaluator {
    fn test_nucleation_cluster(
        &self,
        rupture: &ClusterRupture,
        nucleation: &ClusterRef,
        mode: EvalMode,
    ) -> Result<PlausibilityResult> {
        let prob = self.probability(rupture, nucleation, mode)?;
        Ok(PlausibilityResult::pass_or(
            prob as f32 >= self.min_probability as f32,
            self.failure_type(),
        ))
    }

    fn nucleation_value(
        &self,
        rupture: &ClusterRupture,
        nucleation: &ClusterRef,
        mode: EvalMode,
    ) -> Result<Option<f64>> {
        self.probability(rupture, nucleation, mode).map(Some)
    }

    fn failure_type(&self) -> PlausibilityResult {
        if self.fail_future_possible {
            PlausibilityResult::FailFuturePossible
        } else {
            PlausibilityResult::FailHardStop
        }
    }

    fn acceptable_range(&self) -> ScalarRange {
        ScalarRange::at_least(self.min_probability)
    }

    fn scalar_name(&self) -> String {
        "Conditional Probability".to_string()
    }

    fn scalar_units(&self) -> Option<String> {
        None
    }

    fn short_name(&self) -> String {
        format!("P({})≥{}", self.names(true), format_num(self.min_probability))
    }

    fn name(&self) -> String {
        format!("P({}) ≥{}", self.names(false), format_num(self.min_probability))
    }

    fn to_config(&self) -> NucleationEvaluatorConfig {
        NucleationEvaluatorConfig::CumulativeJumpProbPathEvaluator {
            min_probability: self.min_probability,
            fail_future_possible: self.fail_future_possible,
            calcs: self.calcs.iter().map(|calc| calc.to_config()).collect(),
        }
    }
}

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use rupforge_config::{ConfigError, NucleationEvaluatorConfig};
use rupforge_core::{
    AggregatedStiffnessCalculator, ClusterRef, ClusterRupture, PlausibilityError,
    PlausibilityResult, Result,
    RuptureTreeNavigator, SectionRef,
};
use tracing::trace;

use super::{next_clusters, oriented_jump, sects_between, NucleationEvaluator};
use crate::filter::{format_num, EvalMode, ScalarRange};

/// Grows paths one cluster at a time and requires the stress from the
/// sections already on the path onto each added cluster to reach the
/// threshold.
///
/// Only the sections a path actually traverses act as sources: the part of
/// each cluster between where the path entered and where it jumps on. The
/// nucleation cluster contributes its longer side up to the jump.
#[derive(Clone)]
pub struct ClusterCoulombPathEvaluator {
    stiffness: Arc<dyn AggregatedStiffnessCalculator>,
    threshold: f64,
    fail_future_possible: bool,
}

impl ClusterCoulombPathEvaluator {
    pub fn new(
        stiffness: Arc<dyn AggregatedStiffnessCalculator>,
        threshold: f64,
        fail_future_possible: bool,
    ) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::finite("threshold", threshold)?;
        Ok(Self {
            stiffness,
            threshold,
            fail_future_possible,
        })
    }

    fn range(&self) -> ScalarRange {
        ScalarRange::at_least(self.threshold)
    }

    fn test_strand(
        &self,
        nav: &RuptureTreeNavigator,
        on_strand: &HashSet<usize>,
        strand_sects: &[SectionRef],
        addition: &ClusterRef,
        entry: usize,
        mode: EvalMode,
    ) -> Result<Option<f64>> {
        let range = self.range();
        let mut worst = None;
        if !strand_sects.is_empty() {
            let val = self.stiffness.calc(strand_sects, addition.sects());
            if mode.is_exhaustive() {
                trace!(
                    event = "cluster_path_step",
                    sources = strand_sects.len(),
                    to = %addition,
                    val,
                );
            }
            worst = Some(val);
            if mode.short_circuits() && !range.contains(val) {
                return Ok(worst);
            }
        }

        let mut next_on_strand = on_strand.clone();
        next_on_strand.insert(addition.key());
        for dest in next_clusters(nav, addition, on_strand) {
            let jump = oriented_jump(nav, addition, dest)?;
            let mut sects = strand_sects.to_vec();
            sects.extend(sects_between(addition, entry, jump.from_section.id)?);
            let val = self.test_strand(nav, &next_on_strand, &sects, dest, jump.to_section.id, mode)?;
            worst = range.worst_value(worst.into_iter().chain(val));
            if mode.short_circuits() && worst.is_some_and(|w| !range.contains(w)) {
                return Ok(worst);
            }
        }
        Ok(worst)
    }
}

impl NucleationEvaluator for ClusterCoulombPathEvaluator {
    fn nucleation_value(
        &self,
        rupture: &ClusterRupture,
        nucleation: &ClusterRef,
        mode: EvalMode,
    ) -> Result<Option<f64>> {
        let nav = rupture.navigator();
        let range = self.range();
        let on_strand = HashSet::from([nucleation.key()]);
        let sects = nucleation.sects();
        let mut worst = None;
        for dest in next_clusters(nav, nucleation, &on_strand) {
            let jump = oriented_jump(nav, nucleation, dest)?;
            let exit = nucleation.index_of(jump.from_section.id).ok_or_else(|| {
                PlausibilityError::Inconsistent(format!(
                    "jump {} does not leave {}",
                    jump, nucleation
                ))
            })?;
            // start from the far end of the nucleation cluster
            let far = if sects.len() - exit > exit + 1 {
                sects[sects.len() - 1].id
            } else {
                sects[0].id
            };
            let strand_sects = sects_between(nucleation, far, jump.from_section.id)?;
            let val = self.test_strand(nav, &on_strand, &strand_sects, dest, jump.to_section.id, mode)?;
            worst = range.worst_value(worst.into_iter().chain(val));
            if mode.short_circuits() && worst.is_some_and(|w| !range.contains(w)) {
                break;
            }
        }
        Ok(worst)
    }

    fn failure_type(&self) -> PlausibilityResult {
        if self.fail_future_possible {
            PlausibilityResult::FailFuturePossible
        } else {
            PlausibilityResult::FailHardStop
        }
    }

    fn acceptable_range(&self) -> ScalarRange {
        self.range()
    }

    fn scalar_name(&self) -> String {
        self.stiffness.scalar_name()
    }

    fn scalar_units(&self) -> Option<String> {
        Some(self.stiffness.units())
    }

    fn short_name(&self) -> String {
        format!("[{}]≥{}", self.stiffness.scalar_name(), format_num(self.threshold))
    }

    fn name(&self) -> String {
        format!(
            "Cluster [{}] ≥{}",
            self.stiffness.scalar_name(),
            format_num(self.threshold)
        )
    }

    fn to_config(&self) -> NucleationEvaluatorConfig {
        NucleationEvaluatorConfig::ClusterCoulombPathEvaluator {
            threshold: self.threshold,
            fail_future_possible: self.fail_future_possible,
        }
    }
}

impl fmt::Debug for ClusterCoulombPathEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterCoulombPathEvaluator")
            .field("aggregation", &self.stiffness.aggregation_name())
            .field("threshold", &self.threshold)
            .field("fail_future_possible", &self.fail_future_possible)
            .finish()
    }
}

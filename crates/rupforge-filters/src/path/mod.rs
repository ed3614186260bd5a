//! Nucleation-point path filters.
//!
//! Every cluster of a rupture is tried as the point where growth started.
//! From there the rupture spreads toward the cluster's tree predecessor and
//! all of its descendants, and each [`NucleationEvaluator`] judges whether
//! that growth is plausible. The rupture passes when enough nucleation
//! clusters pass.

mod cluster_coulomb;
mod jump_prob;
mod sect_coulomb;

#[cfg(test)]
mod tests;

use std::fmt::Debug;
use std::sync::Arc;

use rupforge_config::{
    ClusterPathCoulombConfig, ConfigError, FilterConfig, NucleationEvaluatorConfig,
    PathPlausibilityConfig, SectPathCoulombConfig,
};
use rupforge_core::{
    ClusterRef, ClusterRupture, FaultSubsectionCluster, FilterDataKey, Jump, PlausibilityError,
    PlausibilityResult, Result, RuptureTreeNavigator, SectionRef,
};
use smallvec::SmallVec;
use tracing::debug;

use crate::filter::{EvalMode, PlausibilityFilter, ScalarRange, ScalarValueFilter};

pub use cluster_coulomb::ClusterCoulombPathEvaluator;
pub use jump_prob::CumulativeJumpProbPathEvaluator;
pub use sect_coulomb::SectCoulombPathEvaluator;

/// Judges growth nucleating at one cluster.
pub trait NucleationEvaluator: Send + Sync + Debug {
    /// Verdict for growth starting at `nucleation`.
    fn test_nucleation_cluster(
        &self,
        rupture: &ClusterRupture,
        nucleation: &ClusterRef,
        mode: EvalMode,
    ) -> Result<PlausibilityResult> {
        let value = self.nucleation_value(rupture, nucleation, mode)?;
        Ok(match value {
            Some(value) if !self.acceptable_range().contains(value) => self.failure_type(),
            _ => PlausibilityResult::Pass,
        })
    }

    /// Value for growth starting at `nucleation`.
    ///
    /// In short-circuit mode evaluation may stop once the value has left the
    /// acceptable range, so only its side of the range is exact.
    fn nucleation_value(
        &self,
        rupture: &ClusterRupture,
        nucleation: &ClusterRef,
        mode: EvalMode,
    ) -> Result<Option<f64>>;

    /// Result returned when a nucleation cluster fails.
    fn failure_type(&self) -> PlausibilityResult;

    fn acceptable_range(&self) -> ScalarRange;

    fn scalar_name(&self) -> String;

    fn scalar_units(&self) -> Option<String>;

    fn short_name(&self) -> String;

    fn name(&self) -> String;

    fn to_config(&self) -> NucleationEvaluatorConfig;
}

/// Persisted form a path filter was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathFilterKind {
    General,
    ClusterCoulomb,
    SectCoulomb,
}

/// Passes when enough clusters pass as nucleation points.
#[derive(Debug, Clone)]
pub struct PathPlausibilityFilter {
    fract_pass_threshold: f64,
    logical_or: bool,
    evaluators: Vec<Arc<dyn NucleationEvaluator>>,
    failure_type: PlausibilityResult,
    kind: PathFilterKind,
    data_key: FilterDataKey,
}

impl PathPlausibilityFilter {
    pub fn new(
        fract_pass_threshold: f64,
        logical_or: bool,
        evaluators: Vec<Arc<dyn NucleationEvaluator>>,
    ) -> std::result::Result<Self, ConfigError> {
        Self::with_kind(
            fract_pass_threshold,
            logical_or,
            evaluators,
            PathFilterKind::General,
        )
    }

    /// Cluster-level Coulomb paths; failures are future-possible.
    pub fn cluster_coulomb(
        evaluator: ClusterCoulombPathEvaluator,
        fract_pass_threshold: f64,
    ) -> std::result::Result<Self, ConfigError> {
        Self::with_kind(
            fract_pass_threshold,
            false,
            vec![Arc::new(evaluator)],
            PathFilterKind::ClusterCoulomb,
        )
    }

    /// Section-level Coulomb paths.
    pub fn sect_coulomb(
        evaluator: SectCoulombPathEvaluator,
    ) -> std::result::Result<Self, ConfigError> {
        Self::with_kind(
            0.0,
            false,
            vec![Arc::new(evaluator)],
            PathFilterKind::SectCoulomb,
        )
    }

    fn with_kind(
        fract_pass_threshold: f64,
        logical_or: bool,
        evaluators: Vec<Arc<dyn NucleationEvaluator>>,
        kind: PathFilterKind,
    ) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::fraction("fract_pass_threshold", fract_pass_threshold)?;
        rupforge_config::validate::non_empty("evaluators", &evaluators)?;
        let failure_type = evaluators
            .iter()
            .map(|e| e.failure_type())
            .reduce(PlausibilityResult::and)
            .unwrap_or(PlausibilityResult::FailHardStop);
        if failure_type.is_pass() {
            return Err(ConfigError::Invalid(
                "nucleation evaluators must fail with a failure result".to_string(),
            ));
        }
        let mut filter = Self {
            fract_pass_threshold,
            logical_or,
            evaluators,
            failure_type,
            kind,
            data_key: FilterDataKey::new(String::new()),
        };
        filter.data_key = FilterDataKey::new(filter.short_name());
        Ok(filter)
    }

    pub fn evaluators(&self) -> &[Arc<dyn NucleationEvaluator>] {
        &self.evaluators
    }

    fn num_needed(&self, num_clusters: usize) -> usize {
        if self.fract_pass_threshold > 0.0 {
            ((self.fract_pass_threshold * num_clusters as f64).ceil() as usize).max(1)
        } else {
            1
        }
    }

    fn path_string(&self) -> String {
        let fract = self.fract_pass_threshold as f32;
        if fract <= 0.0 {
            return "Path".to_string();
        }
        if fract == 0.5 {
            "Half Paths".to_string()
        } else if fract == 1.0 / 3.0 {
            "1/3 Paths".to_string()
        } else if fract == 2.0 / 3.0 {
            "2/3 Paths".to_string()
        } else if fract == 0.25 {
            "1/4 Paths".to_string()
        } else if fract == 0.75 {
            "3/4 Paths".to_string()
        } else {
            format!("{}x Paths", fract)
        }
    }

    fn test_nucleation(
        &self,
        rupture: &ClusterRupture,
        nucleation: &ClusterRef,
        mode: EvalMode,
    ) -> Result<PlausibilityResult> {
        let mut result: Option<PlausibilityResult> = None;
        for evaluator in &self.evaluators {
            let sub = evaluator.test_nucleation_cluster(rupture, nucleation, mode)?;
            if mode.is_exhaustive() {
                debug!(
                    event = "nucleation_eval",
                    evaluator = %evaluator.short_name(),
                    nucleation = %nucleation,
                    result = %sub,
                );
            }
            let combined = match result {
                None => sub,
                Some(prev) if self.logical_or => prev.or(sub),
                Some(prev) => prev.and(sub),
            };
            result = Some(combined);
            if mode.short_circuits() && (self.logical_or == combined.is_pass()) {
                break;
            }
        }
        Ok(result.unwrap_or(PlausibilityResult::Pass))
    }
}

impl PlausibilityFilter for PathPlausibilityFilter {
    fn short_name(&self) -> String {
        let paths = self.path_string().replace(' ', "");
        match self.evaluators.as_slice() {
            [evaluator] => format!("{}{}", paths, evaluator.short_name()),
            evaluators => format!("{}[{} criteria]", paths, evaluators.len()),
        }
    }

    fn name(&self) -> String {
        match self.evaluators.as_slice() {
            [evaluator] => format!("{} {}", self.path_string(), evaluator.name()),
            evaluators => {
                let names: Vec<String> = evaluators.iter().map(|e| e.name()).collect();
                format!("{} [{}]", self.path_string(), names.join(", "))
            }
        }
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        if rupture.total_num_jumps() == 0 {
            return Ok(PlausibilityResult::Pass);
        }
        let clusters = rupture.all_clusters();
        let num_needed = self.num_needed(clusters.len());
        let skip = rupture.filter_data(&self.data_key).unwrap_or_default();
        let mut failed = Vec::new();
        let mut num_passes = 0;
        for nucleation in &clusters {
            if skip.contains(&nucleation.key()) {
                if mode.is_exhaustive() {
                    debug!(event = "nucleation_skip", nucleation = %nucleation);
                }
                continue;
            }
            if self.test_nucleation(rupture, nucleation, mode)?.is_pass() {
                num_passes += 1;
            } else {
                failed.push(nucleation.key());
            }
            if mode.short_circuits() && num_passes >= num_needed {
                break;
            }
        }
        rupture.add_filter_data(&self.data_key, failed);
        if mode.is_exhaustive() {
            debug!(
                event = "path_summary",
                filter = %self.short_name(),
                num_passes,
                num_paths = clusters.len(),
                num_needed,
            );
        }
        Ok(PlausibilityResult::pass_or(num_passes >= num_needed, self.failure_type))
    }

    fn is_directional(&self, splayed: bool) -> bool {
        splayed
    }

    fn to_config(&self) -> FilterConfig {
        let evaluators: Vec<NucleationEvaluatorConfig> =
            self.evaluators.iter().map(|e| e.to_config()).collect();
        match (self.kind, evaluators.as_slice()) {
            (
                PathFilterKind::ClusterCoulomb,
                [NucleationEvaluatorConfig::ClusterCoulombPathEvaluator { threshold, .. }],
            ) => FilterConfig::ClusterPathCoulombCompatibilityFilter(ClusterPathCoulombConfig {
                threshold: *threshold,
                fract_pass_threshold: self.fract_pass_threshold,
            }),
            (
                PathFilterKind::SectCoulomb,
                [NucleationEvaluatorConfig::SectCoulombPathEvaluator {
                    threshold,
                    fail_future_possible,
                    jump_to_most_favorable,
                    max_jump_dist,
                }],
            ) => FilterConfig::SectPathCoulombCompatibilityFilter(SectPathCoulombConfig {
                threshold: *threshold,
                jump_to_most_favorable: *jump_to_most_favorable,
                max_jump_dist: *max_jump_dist,
                fail_future_possible: *fail_future_possible,
            }),
            _ => FilterConfig::PathPlausibilityFilter(PathPlausibilityConfig {
                fract_pass_threshold: self.fract_pass_threshold,
                logical_or: self.logical_or,
                evaluators,
            }),
        }
    }

    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        if self.evaluators.len() == 1 {
            Some(self)
        } else {
            None
        }
    }
}

impl ScalarValueFilter for PathPlausibilityFilter {
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>> {
        let [evaluator] = self.evaluators.as_slice() else {
            return Err(PlausibilityError::Unsupported(format!(
                "{} combines several evaluators",
                self.short_name()
            )));
        };
        if rupture.total_num_jumps() == 0 {
            return Ok(None);
        }
        let range = evaluator.acceptable_range();
        let mut values = Vec::new();
        for nucleation in rupture.all_clusters() {
            if let Some(value) = evaluator.nucleation_value(rupture, nucleation, EvalMode::Exhaustive)? {
                values.push(value);
            }
        }
        if values.is_empty() {
            return Ok(None);
        }
        if self.fract_pass_threshold > 0.0 {
            let num_needed = self.num_needed(values.len());
            // worst first
            values.sort_by(|a, b| {
                if range.is_value_better(*a, *b) {
                    std::cmp::Ordering::Greater
                } else if range.is_value_better(*b, *a) {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            });
            return Ok(Some(values[values.len() - num_needed]));
        }
        Ok(range.best_value(values))
    }

    fn acceptable_range(&self) -> ScalarRange {
        self.evaluators
            .first()
            .map(|e| e.acceptable_range())
            .unwrap_or_default()
    }

    fn scalar_name(&self) -> String {
        self.evaluators
            .first()
            .map(|e| e.scalar_name())
            .unwrap_or_default()
    }

    fn scalar_units(&self) -> Option<String> {
        self.evaluators.first().and_then(|e| e.scalar_units())
    }
}

/// The jump between two adjacent clusters, oriented from `from` to `to`.
pub(crate) fn oriented_jump(
    nav: &RuptureTreeNavigator,
    from: &FaultSubsectionCluster,
    to: &FaultSubsectionCluster,
) -> Result<Jump> {
    if let Some(jump) = nav.jump(from, to) {
        return Ok(jump.clone());
    }
    nav.jump(to, from).map(Jump::reverse).ok_or_else(|| {
        PlausibilityError::Inconsistent(format!("clusters {} and {} are not adjacent", from, to))
    })
}

/// Tree neighbors of `cluster` not yet on the strand.
pub(crate) fn next_clusters<'a>(
    nav: &'a RuptureTreeNavigator,
    cluster: &FaultSubsectionCluster,
    on_strand: &std::collections::HashSet<usize>,
) -> SmallVec<[&'a ClusterRef; 4]> {
    let mut next: SmallVec<[&'a ClusterRef; 4]> = SmallVec::new();
    if let Some(pred) = nav.predecessor_cluster(cluster) {
        if !on_strand.contains(&pred.key()) {
            next.push(pred);
        }
    }
    for desc in nav.descendant_clusters(cluster) {
        if !on_strand.contains(&desc.key()) {
            next.push(desc);
        }
    }
    next
}

/// Sections of `cluster` between two of its sections, inclusive.
pub(crate) fn sects_between(
    cluster: &FaultSubsectionCluster,
    a: usize,
    b: usize,
) -> Result<Vec<SectionRef>> {
    let missing = |id| PlausibilityError::Inconsistent(format!("section {} not in {}", id, cluster));
    let ia = cluster.index_of(a).ok_or_else(|| missing(a))?;
    let ib = cluster.index_of(b).ok_or_else(|| missing(b))?;
    Ok(cluster.sects()[ia.min(ib)..=ia.max(ib)].to_vec())
}

//! Wiring between persisted filter configuration and runtime filters.

use std::sync::Arc;

use rupforge_config::{ConfigError, FilterConfig, NucleationEvaluatorConfig};
use rupforge_core::{
    AggregatedStiffnessCalculator, Collaborators, ConnectionStrategy,
    SectionDistanceAzimuthCalculator,
};
use tracing::debug;

use crate::azimuth::AzimuthCalc;
use crate::coulomb::{
    ClusterCoulombCompatibilityFilter, NetClusterCoulombFilter, NetRuptureCoulombFilter,
};
use crate::cumulative::{
    CumulativeAzimuthChangeFilter, CumulativePenaltyFilter, CumulativeRakeChangeFilter, Penalty,
    U3CompatibleCumulativeRakeChangeFilter,
};
use crate::filter::PlausibilityFilter;
use crate::jump_azimuth::JumpAzimuthChangeFilter;
use crate::multi_directional::MultiDirectionalPlausibilityFilter;
use crate::parent_coulomb::ParentCoulombCompatibilityFilter;
use crate::path::{
    ClusterCoulombPathEvaluator, CumulativeJumpProbPathEvaluator, NucleationEvaluator,
    PathPlausibilityFilter, SectCoulombPathEvaluator,
};
use crate::probability::{build_calcs, CumulativeProbabilityFilter};
use crate::size::{ClusterAspectRatioFilter, MinSectsPerParentFilter};
use crate::structural::{
    GapWithinSectFilter, JumpDistFilter, NumClustersFilter, SplayCountFilter, SplayLengthFilter,
};
use crate::total_azimuth::TotalAzimuthChangeFilter;

/// Builds runtime filters from their persisted form.
pub struct FilterBuilder;

impl FilterBuilder {
    /// Builds the filter described by `config`, attaching the collaborators
    /// it needs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for invalid parameters or when a
    /// required collaborator is absent.
    pub fn init(
        config: &FilterConfig,
        collaborators: &Collaborators,
    ) -> Result<Arc<dyn PlausibilityFilter>, ConfigError> {
        config.validate()?;
        let filter: Arc<dyn PlausibilityFilter> = match config {
            FilterConfig::MinSectsPerParentFilter(c) => Arc::new(MinSectsPerParentFilter::new(
                c.min_per_parent,
                c.allow_if_no_direct,
                c.allow_chained,
                collaborators.connection_strategy.clone(),
            )?),
            FilterConfig::ClusterAspectRatioFilter(c) => Arc::new(ClusterAspectRatioFilter::new(
                c.min_aspect_ratio,
                c.allow_if_no_direct,
                c.allow_chained,
                collaborators.connection_strategy.clone(),
            )?),
            FilterConfig::GapWithinSectFilter => Arc::new(GapWithinSectFilter::new()),
            FilterConfig::JumpDistFilter(c) => Arc::new(JumpDistFilter::new(c.max_dist)?),
            FilterConfig::NumClustersFilter(c) => {
                Arc::new(NumClustersFilter::new(c.max_num_clusters)?)
            }
            FilterConfig::SplayCountFilter(c) => Arc::new(SplayCountFilter::new(c.max_splays)),
            FilterConfig::SplayLengthFilter(c) => Arc::new(SplayLengthFilter::new(
                c.max_len,
                c.is_fract_of_main,
                c.total_across_splays,
            )?),
            FilterConfig::JumpAzimuthChangeFilter(c) => Arc::new(JumpAzimuthChangeFilter::new(
                AzimuthCalc::new(&c.az_calc, dist_az(collaborators)?)?,
                c.threshold,
                c.err_on_cant_evaluate,
            )?),
            FilterConfig::TotalAzimuthChangeFilter(c) => Arc::new(TotalAzimuthChangeFilter::new(
                AzimuthCalc::new(&c.az_calc, dist_az(collaborators)?)?,
                c.threshold,
                c.multi_fault_only,
                c.test_full_end,
            )?),
            FilterConfig::CumulativeAzimuthChangeFilter(c) => {
                Arc::new(CumulativeAzimuthChangeFilter::new(
                    AzimuthCalc::new(&c.az_calc, dist_az(collaborators)?)?,
                    c.threshold,
                )?)
            }
            FilterConfig::CumulativeRakeChangeFilter(c) => {
                Arc::new(CumulativeRakeChangeFilter::new(c.threshold)?)
            }
            FilterConfig::U3CompatibleCumulativeRakeChangeFilter(c) => {
                Arc::new(U3CompatibleCumulativeRakeChangeFilter::new(c.threshold)?)
            }
            FilterConfig::CumulativePenaltyFilter(c) => {
                let penalties = c
                    .penalties
                    .iter()
                    .map(|p| Penalty::new(p, collaborators.dist_az_calc.as_ref()))
                    .collect::<Result<Vec<_>, _>>()?;
                Arc::new(CumulativePenaltyFilter::new(c.threshold, penalties)?)
            }
            FilterConfig::CumulativeProbabilityFilter(c) => {
                Arc::new(CumulativeProbabilityFilter::new(
                    c.min_probability,
                    build_calcs(&c.calcs, collaborators)?,
                )?)
            }
            FilterConfig::PathPlausibilityFilter(c) => {
                let evaluators = c
                    .evaluators
                    .iter()
                    .map(|e| Self::init_evaluator(e, collaborators))
                    .collect::<Result<Vec<_>, _>>()?;
                Arc::new(PathPlausibilityFilter::new(
                    c.fract_pass_threshold,
                    c.logical_or,
                    evaluators,
                )?)
            }
            FilterConfig::ClusterPathCoulombCompatibilityFilter(c) => {
                let evaluator =
                    ClusterCoulombPathEvaluator::new(stiffness(collaborators)?, c.threshold, true)?;
                Arc::new(PathPlausibilityFilter::cluster_coulomb(
                    evaluator,
                    c.fract_pass_threshold,
                )?)
            }
            FilterConfig::SectPathCoulombCompatibilityFilter(c) => {
                let evaluator = SectCoulombPathEvaluator::new(
                    stiffness(collaborators)?,
                    collaborators.dist_az_calc.clone(),
                    c.threshold,
                    c.fail_future_possible,
                    c.jump_to_most_favorable,
                    c.max_jump_dist,
                )?;
                Arc::new(PathPlausibilityFilter::sect_coulomb(evaluator)?)
            }
            FilterConfig::ClusterCoulombCompatibilityFilter(c) => Arc::new(
                ClusterCoulombCompatibilityFilter::new(stiffness(collaborators)?, c.threshold)?,
            ),
            FilterConfig::NetClusterCoulombFilter(c) => Arc::new(NetClusterCoulombFilter::new(
                stiffness(collaborators)?,
                c.threshold,
            )?),
            FilterConfig::NetRuptureCoulombFilter(c) => Arc::new(NetRuptureCoulombFilter::new(
                stiffness(collaborators)?,
                c.quantity,
                c.threshold,
            )?),
            FilterConfig::ParentCoulombCompatibilityFilter(c) => {
                Arc::new(ParentCoulombCompatibilityFilter::new(
                    stiffness(collaborators)?,
                    connection_strategy(collaborators)?,
                    c.threshold,
                    c.directionality,
                )?)
            }
            FilterConfig::MultiDirectionalPlausibilityFilter(c) => {
                let inner = Self::init(&c.filter, collaborators)?;
                Arc::new(MultiDirectionalPlausibilityFilter::new(
                    inner,
                    c.max_num_splays,
                ))
            }
        };
        debug!(
            event = "filter_init",
            class = config.class_name(),
            filter = %filter.short_name(),
        );
        Ok(filter)
    }

    /// Builds a nucleation evaluator for a path filter.
    pub fn init_evaluator(
        config: &NucleationEvaluatorConfig,
        collaborators: &Collaborators,
    ) -> Result<Arc<dyn NucleationEvaluator>, ConfigError> {
        config.validate()?;
        let evaluator: Arc<dyn NucleationEvaluator> = match config {
            NucleationEvaluatorConfig::ClusterCoulombPathEvaluator {
                threshold,
                fail_future_possible,
            } => Arc::new(ClusterCoulombPathEvaluator::new(
                stiffness(collaborators)?,
                *threshold,
                *fail_future_possible,
            )?),
            NucleationEvaluatorConfig::SectCoulombPathEvaluator {
                threshold,
                fail_future_possible,
                jump_to_most_favorable,
                max_jump_dist,
            } => Arc::new(SectCoulombPathEvaluator::new(
                stiffness(collaborators)?,
                collaborators.dist_az_calc.clone(),
                *threshold,
                *fail_future_possible,
                *jump_to_most_favorable,
                *max_jump_dist,
            )?),
            NucleationEvaluatorConfig::CumulativeJumpProbPathEvaluator {
                min_probability,
                fail_future_possible,
                calcs,
            } => Arc::new(CumulativeJumpProbPathEvaluator::new(
                *min_probability,
                *fail_future_possible,
                build_calcs(calcs, collaborators)?,
            )?),
        };
        Ok(evaluator)
    }
}

fn dist_az(
    collaborators: &Collaborators,
) -> Result<Arc<dyn SectionDistanceAzimuthCalculator>, ConfigError> {
    collaborators.dist_az_calc.clone().ok_or_else(|| {
        ConfigError::Invalid("filter requires a section distance/azimuth calculator".to_string())
    })
}

fn stiffness(
    collaborators: &Collaborators,
) -> Result<Arc<dyn AggregatedStiffnessCalculator>, ConfigError> {
    collaborators
        .stiffness
        .clone()
        .ok_or_else(|| ConfigError::Invalid("filter requires a stiffness calculator".to_string()))
}

fn connection_strategy(
    collaborators: &Collaborators,
) -> Result<Arc<dyn ConnectionStrategy>, ConfigError> {
    collaborators.connection_strategy.clone().ok_or_else(|| {
        ConfigError::Invalid("filter requires a connection strategy".to_string())
    })
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;

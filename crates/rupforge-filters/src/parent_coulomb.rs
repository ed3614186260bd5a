//! Parent-pair Coulomb compatibility with a shared verdict cache.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use rupforge_config::{ConfigError, Directionality, FilterConfig, ParentCoulombConfig};
use rupforge_core::{
    AggregatedStiffnessCalculator, ClusterRupture, ConnectionStrategy, Jump, PlausibilityError,
    PlausibilityResult, Result,
};
use tracing::debug;

use crate::filter::{format_num, EvalMode, PlausibilityFilter};

/// Requires every pair of parents joined by a jump to be stress compatible,
/// comparing the full parent faults in both directions.
///
/// Verdicts are cached per unordered parent pair and shared by every clone
/// and every thread using the filter. Two threads may compute the same
/// entry at once; both compute the same verdict and the later insert wins.
#[derive(Clone)]
pub struct ParentCoulombCompatibilityFilter {
    stiffness: Arc<dyn AggregatedStiffnessCalculator>,
    connection_strategy: Arc<dyn ConnectionStrategy>,
    threshold: f64,
    directionality: Directionality,
    cache: Arc<DashMap<(u32, u32), bool>>,
}

impl ParentCoulombCompatibilityFilter {
    pub fn new(
        stiffness: Arc<dyn AggregatedStiffnessCalculator>,
        connection_strategy: Arc<dyn ConnectionStrategy>,
        threshold: f64,
        directionality: Directionality,
    ) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::finite("threshold", threshold)?;
        Ok(Self {
            stiffness,
            connection_strategy,
            threshold,
            directionality,
            cache: Arc::new(DashMap::new()),
        })
    }

    /// Number of parent pairs with a cached verdict.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Verdict for the unordered pair of parents.
    pub fn parents_compatible(&self, parent1: u32, parent2: u32) -> Result<bool> {
        let key = (parent1.min(parent2), parent1.max(parent2));
        if let Some(verdict) = self.cache.get(&key) {
            return Ok(*verdict);
        }
        let full = |parent: u32| {
            self.connection_strategy.full_cluster(parent).ok_or_else(|| {
                PlausibilityError::Inconsistent(format!("no full cluster for parent {}", parent))
            })
        };
        let a = full(key.0)?;
        let b = full(key.1)?;
        let forward = self.stiffness.calc(a.sects(), b.sects());
        let backward = self.stiffness.calc(b.sects(), a.sects());
        let verdict = match self.directionality {
            Directionality::Either => forward >= self.threshold || backward >= self.threshold,
            Directionality::Both => forward >= self.threshold && backward >= self.threshold,
            Directionality::Sum => forward + backward >= self.threshold,
        };
        debug!(
            event = "parent_cache_fill",
            parent1 = key.0,
            parent2 = key.1,
            forward,
            backward,
            verdict,
        );
        self.cache.insert(key, verdict);
        Ok(verdict)
    }

    fn test_jump_parents(&self, jump: &Jump, mode: EvalMode) -> Result<PlausibilityResult> {
        let from = jump.from_cluster.parent_id();
        let to = jump.to_cluster.parent_id();
        if from == to {
            return Ok(PlausibilityResult::Pass);
        }
        let compatible = self.parents_compatible(from, to)?;
        if mode.is_exhaustive() {
            debug!(
                event = "jump_eval",
                filter = %self.short_name(),
                from = jump.from_section.id,
                to = jump.to_section.id,
                compatible,
            );
        }
        Ok(PlausibilityResult::pass_or(
            compatible,
            PlausibilityResult::FailHardStop,
        ))
    }

    fn directionality_str(&self) -> &'static str {
        match self.directionality {
            Directionality::Either => "Either",
            Directionality::Both => "Both",
            Directionality::Sum => "Sum",
        }
    }
}

impl PlausibilityFilter for ParentCoulombCompatibilityFilter {
    fn short_name(&self) -> String {
        format!(
            "Parent{}[{}]≥{}",
            self.directionality_str(),
            self.stiffness.scalar_name(),
            format_num(self.threshold)
        )
    }

    fn name(&self) -> String {
        format!(
            "Parent {} [{}] ≥{}",
            self.directionality_str(),
            self.stiffness.scalar_name(),
            format_num(self.threshold)
        )
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        let mut result = PlausibilityResult::Pass;
        for jump in rupture.all_jumps() {
            result = result.and(self.test_jump_parents(jump, mode)?);
            if mode.short_circuits() && !result.is_pass() {
                break;
            }
        }
        Ok(result)
    }

    fn test_jump(
        &self,
        _rupture: &ClusterRupture,
        jump: &Jump,
        mode: EvalMode,
    ) -> Result<PlausibilityResult> {
        self.test_jump_parents(jump, mode)
    }

    fn is_directional(&self, _splayed: bool) -> bool {
        false
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::ParentCoulombCompatibilityFilter(ParentCoulombConfig {
            threshold: self.threshold,
            directionality: self.directionality,
        })
    }
}

impl fmt::Debug for ParentCoulombCompatibilityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentCoulombCompatibilityFilter")
            .field("aggregation", &self.stiffness.aggregation_name())
            .field("threshold", &self.threshold)
            .field("directionality", &self.directionality)
            .field("cached_pairs", &self.cache.len())
            .finish()
    }
}

//! Coulomb compatibility filters on jumps, clusters and whole ruptures.
//!
//! Stress values come from an [`AggregatedStiffnessCalculator`]; every
//! filter here only decides which sections act as sources and receivers.

use std::fmt;
use std::sync::Arc;

use rupforge_config::{
    ConfigError, CoulombThresholdConfig, FilterConfig, NetRuptureCoulombConfig,
    RupCoulombQuantity,
};
use rupforge_core::{
    AggregatedStiffnessCalculator, ClusterRupture, Jump, PlausibilityResult, Result, SectionRef,
};
use tracing::debug;

use crate::filter::{format_num, EvalMode, PlausibilityFilter, ScalarRange, ScalarValueFilter};

/// Requires the stress from the from-cluster onto the to-cluster of every
/// jump to reach the threshold.
#[derive(Clone)]
pub struct ClusterCoulombCompatibilityFilter {
    stiffness: Arc<dyn AggregatedStiffnessCalculator>,
    threshold: f64,
}

impl ClusterCoulombCompatibilityFilter {
    pub fn new(
        stiffness: Arc<dyn AggregatedStiffnessCalculator>,
        threshold: f64,
    ) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::finite("threshold", threshold)?;
        Ok(Self {
            stiffness,
            threshold,
        })
    }

    fn jump_value(&self, jump: &Jump) -> f64 {
        self.stiffness
            .calc(jump.from_cluster.sects(), jump.to_cluster.sects())
    }

    fn test_value(&self, jump: &Jump, mode: EvalMode) -> PlausibilityResult {
        let val = self.jump_value(jump);
        let result = PlausibilityResult::pass_or(
            self.acceptable_range().contains(val),
            PlausibilityResult::FailHardStop,
        );
        if mode.is_exhaustive() {
            debug!(
                event = "jump_eval",
                filter = %self.short_name(),
                from = jump.from_section.id,
                to = jump.to_section.id,
                val,
                result = %result,
            );
        }
        result
    }
}

impl PlausibilityFilter for ClusterCoulombCompatibilityFilter {
    fn short_name(&self) -> String {
        format!(
            "JumpCluster[{}]≥{}",
            self.stiffness.scalar_name(),
            format_num(self.threshold)
        )
    }

    fn name(&self) -> String {
        format!(
            "Jump Cluster [{}] ≥{}",
            self.stiffness.scalar_name(),
            format_num(self.threshold)
        )
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        let mut result = PlausibilityResult::Pass;
        for jump in rupture.all_jumps() {
            result = result.and(self.test_value(jump, mode));
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
        Ok(self.test_value(jump, mode))
    }

    fn is_directional(&self, _splayed: bool) -> bool {
        true
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::ClusterCoulombCompatibilityFilter(CoulombThresholdConfig {
            threshold: self.threshold,
        })
    }

    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        Some(self)
    }
}

impl ScalarValueFilter for ClusterCoulombCompatibilityFilter {
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>> {
        let range = self.acceptable_range();
        Ok(range.worst_value(rupture.all_jumps().into_iter().map(|j| self.jump_value(j))))
    }

    fn acceptable_range(&self) -> ScalarRange {
        ScalarRange::at_least(self.threshold)
    }

    fn scalar_name(&self) -> String {
        self.stiffness.scalar_name()
    }

    fn scalar_units(&self) -> Option<String> {
        Some(self.stiffness.units())
    }
}

impl fmt::Debug for ClusterCoulombCompatibilityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterCoulombCompatibilityFilter")
            .field("aggregation", &self.stiffness.aggregation_name())
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Each cluster in turn receives stress from every other section of the
/// rupture; the least loaded cluster must reach the threshold.
#[derive(Clone)]
pub struct NetClusterCoulombFilter {
    stiffness: Arc<dyn AggregatedStiffnessCalculator>,
    threshold: f64,
}

impl NetClusterCoulombFilter {
    pub fn new(
        stiffness: Arc<dyn AggregatedStiffnessCalculator>,
        threshold: f64,
    ) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::finite("threshold", threshold)?;
        Ok(Self {
            stiffness,
            threshold,
        })
    }

    fn min_value(&self, rupture: &ClusterRupture, mode: EvalMode) -> Option<f64> {
        if rupture.total_num_jumps() == 0 {
            return None;
        }
        let range = self.acceptable_range();
        let sects: Vec<SectionRef> = rupture.all_sections().into_iter().cloned().collect();
        let mut worst = None;
        for cluster in rupture.all_clusters() {
            let sources: Vec<SectionRef> = sects
                .iter()
                .filter(|s| !cluster.contains(s.id))
                .cloned()
                .collect();
            let val = self.stiffness.calc(&sources, cluster.sects());
            if mode.is_exhaustive() {
                debug!(event = "net_cluster", receiver = %cluster, val);
            }
            worst = range.worst_value(worst.into_iter().chain(Some(val)));
            if mode.short_circuits() && !range.contains(val) {
                break;
            }
        }
        worst
    }
}

impl PlausibilityFilter for NetClusterCoulombFilter {
    fn short_name(&self) -> String {
        format!(
            "NetClust[{}]≥{}",
            self.stiffness.scalar_name(),
            format_num(self.threshold)
        )
    }

    fn name(&self) -> String {
        format!(
            "Net Cluster [{}] ≥{}",
            self.stiffness.scalar_name(),
            format_num(self.threshold)
        )
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        let passes = self
            .min_value(rupture, mode)
            .map_or(true, |val| self.acceptable_range().contains(val));
        Ok(PlausibilityResult::pass_or(
            passes,
            PlausibilityResult::FailFuturePossible,
        ))
    }

    fn is_directional(&self, _splayed: bool) -> bool {
        false
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::NetClusterCoulombFilter(CoulombThresholdConfig {
            threshold: self.threshold,
        })
    }

    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        Some(self)
    }
}

impl ScalarValueFilter for NetClusterCoulombFilter {
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>> {
        Ok(self.min_value(rupture, EvalMode::Exhaustive))
    }

    fn acceptable_range(&self) -> ScalarRange {
        ScalarRange::at_least(self.threshold)
    }

    fn scalar_name(&self) -> String {
        format!("Net Cluster {}", self.stiffness.scalar_name())
    }

    fn scalar_units(&self) -> Option<String> {
        Some(self.stiffness.units())
    }
}

impl fmt::Debug for NetClusterCoulombFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetClusterCoulombFilter")
            .field("aggregation", &self.stiffness.aggregation_name())
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Each section in turn receives stress from every other section of the
/// rupture; the per-section values are summed or reduced to their minimum.
#[derive(Clone)]
pub struct NetRuptureCoulombFilter {
    stiffness: Arc<dyn AggregatedStiffnessCalculator>,
    quantity: RupCoulombQuantity,
    threshold: f64,
}

impl NetRuptureCoulombFilter {
    pub fn new(
        stiffness: Arc<dyn AggregatedStiffnessCalculator>,
        quantity: RupCoulombQuantity,
        threshold: f64,
    ) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::finite("threshold", threshold)?;
        Ok(Self {
            stiffness,
            quantity,
            threshold,
        })
    }

    fn quantity_name(&self, compact: bool) -> String {
        let scalar = self.stiffness.scalar_name();
        match (self.quantity, compact) {
            (RupCoulombQuantity::SumSectCff, true) => format!("SumSect{}", scalar),
            (RupCoulombQuantity::SumSectCff, false) => format!("Sum Sect {}", scalar),
            (RupCoulombQuantity::MinSectCff, true) => format!("MinSect{}", scalar),
            (RupCoulombQuantity::MinSectCff, false) => format!("Min Sect {}", scalar),
        }
    }

    fn net_value(&self, rupture: &ClusterRupture, mode: EvalMode) -> Option<f64> {
        if rupture.total_num_jumps() == 0 {
            return None;
        }
        let sects: Vec<SectionRef> = rupture.all_sections().into_iter().cloned().collect();
        let mut vals = Vec::with_capacity(sects.len());
        for (i, receiver) in sects.iter().enumerate() {
            let sources: Vec<SectionRef> = sects
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, s)| s.clone())
                .collect();
            let val = self.stiffness.calc(&sources, std::slice::from_ref(receiver));
            if mode.is_exhaustive() {
                debug!(event = "net_rupture_sect", receiver = receiver.id, val);
            }
            vals.push(val);
        }
        match self.quantity {
            RupCoulombQuantity::SumSectCff => Some(vals.iter().sum()),
            RupCoulombQuantity::MinSectCff => vals.into_iter().reduce(f64::min),
        }
    }
}

impl PlausibilityFilter for NetRuptureCoulombFilter {
    fn short_name(&self) -> String {
        format!(
            "NetRup[{}]≥{}",
            self.quantity_name(true),
            format_num(self.threshold)
        )
    }

    fn name(&self) -> String {
        format!(
            "Net Rupture [{}] ≥{}",
            self.quantity_name(false),
            format_num(self.threshold)
        )
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        let passes = self
            .net_value(rupture, mode)
            .map_or(true, |val| self.acceptable_range().contains(val));
        Ok(PlausibilityResult::pass_or(
            passes,
            PlausibilityResult::FailFuturePossible,
        ))
    }

    fn is_directional(&self, _splayed: bool) -> bool {
        false
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::NetRuptureCoulombFilter(NetRuptureCoulombConfig {
            quantity: self.quantity,
            threshold: self.threshold,
        })
    }

    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        Some(self)
    }
}

impl ScalarValueFilter for NetRuptureCoulombFilter {
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>> {
        Ok(self.net_value(rupture, EvalMode::Exhaustive))
    }

    fn acceptable_range(&self) -> ScalarRange {
        ScalarRange::at_least(self.threshold)
    }

    fn scalar_name(&self) -> String {
        self.quantity_name(false)
    }

    fn scalar_units(&self) -> Option<String> {
        Some(self.stiffness.units())
    }
}

impl fmt::Debug for NetRuptureCoulombFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetRuptureCoulombFilter")
            .field("aggregation", &self.stiffness.aggregation_name())
            .field("quantity", &self.quantity)
            .field("threshold", &self.threshold)
            .finish()
    }
}

//! Structural filters on counts, distances and lengths.

use std::collections::HashSet;

use rupforge_config::{
    ConfigError, FilterConfig, JumpDistConfig, NumClustersConfig, SplayCountConfig,
    SplayLengthConfig,
};
use rupforge_core::{ClusterRupture, FaultSubsectionCluster, Jump, PlausibilityResult, Result};
use tracing::debug;

use crate::filter::{format_num, EvalMode, PlausibilityFilter, ScalarRange, ScalarValueFilter};

/// Rejects ruptures with non-contiguous clusters or a parent used twice.
#[derive(Debug, Clone, Default)]
pub struct GapWithinSectFilter;

impl GapWithinSectFilter {
    pub fn new() -> Self {
        Self
    }

    fn is_contiguous(cluster: &FaultSubsectionCluster) -> bool {
        cluster.sects().windows(2).all(|pair| {
            match (pair[0].index_along_parent, pair[1].index_along_parent) {
                (Some(a), Some(b)) => a.abs_diff(b) == 1,
                _ => true,
            }
        })
    }
}

impl PlausibilityFilter for GapWithinSectFilter {
    fn short_name(&self) -> String {
        "GapWithinSect".to_string()
    }

    fn name(&self) -> String {
        "Gap Within Parent Section".to_string()
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        let mut parents = HashSet::new();
        for cluster in rupture.all_clusters() {
            if !parents.insert(cluster.parent_id()) || !Self::is_contiguous(cluster) {
                if mode.is_exhaustive() {
                    debug!(event = "gap_within_sect", cluster = %cluster);
                }
                return Ok(PlausibilityResult::FailHardStop);
            }
        }
        Ok(PlausibilityResult::Pass)
    }

    fn test_jump(
        &self,
        rupture: &ClusterRupture,
        jump: &Jump,
        _mode: EvalMode,
    ) -> Result<PlausibilityResult> {
        let parent = jump.to_cluster.parent_id();
        let reused = rupture
            .all_clusters()
            .iter()
            .any(|c| c.parent_id() == parent);
        Ok(PlausibilityResult::pass_or(
            !reused && Self::is_contiguous(&jump.to_cluster),
            PlausibilityResult::FailHardStop,
        ))
    }

    fn is_directional(&self, _splayed: bool) -> bool {
        false
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::GapWithinSectFilter
    }
}

/// Limits the distance of every jump.
#[derive(Debug, Clone)]
pub struct JumpDistFilter {
    max_dist: f64,
}

impl JumpDistFilter {
    pub fn new(max_dist: f64) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::non_negative("max_dist", max_dist)?;
        Ok(Self { max_dist })
    }

    fn test(&self, jump: &Jump) -> PlausibilityResult {
        PlausibilityResult::pass_or(jump.distance <= self.max_dist, PlausibilityResult::FailHardStop)
    }
}

impl PlausibilityFilter for JumpDistFilter {
    fn short_name(&self) -> String {
        format!("JumpDist≤{}km", format_num(self.max_dist))
    }

    fn name(&self) -> String {
        format!("Maximum Jump Dist ≤{}km", format_num(self.max_dist))
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        let mut result = PlausibilityResult::Pass;
        for jump in rupture.all_jumps() {
            let jump_result = self.test(jump);
            if mode.is_exhaustive() {
                debug!(event = "jump_dist", jump = %jump, distance = jump.distance, result = %jump_result);
            }
            result = result.and(jump_result);
            if mode.short_circuits() && !result.can_continue() {
                break;
            }
        }
        Ok(result)
    }

    fn test_jump(
        &self,
        _rupture: &ClusterRupture,
        jump: &Jump,
        _mode: EvalMode,
    ) -> Result<PlausibilityResult> {
        Ok(self.test(jump))
    }

    fn is_directional(&self, _splayed: bool) -> bool {
        false
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::JumpDistFilter(JumpDistConfig {
            max_dist: self.max_dist,
        })
    }

    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        Some(self)
    }
}

impl ScalarValueFilter for JumpDistFilter {
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>> {
        Ok(rupture
            .all_jumps()
            .iter()
            .map(|j| j.distance)
            .reduce(f64::max))
    }

    fn acceptable_range(&self) -> ScalarRange {
        ScalarRange::at_most(self.max_dist)
    }

    fn scalar_name(&self) -> String {
        "Maximum Jump Distance".to_string()
    }

    fn scalar_units(&self) -> Option<String> {
        Some("km".to_string())
    }
}

/// Limits the number of clusters.
#[derive(Debug, Clone)]
pub struct NumClustersFilter {
    max_num_clusters: usize,
}

impl NumClustersFilter {
    pub fn new(max_num_clusters: usize) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::at_least_one("max_num_clusters", max_num_clusters)?;
        Ok(Self { max_num_clusters })
    }
}

impl PlausibilityFilter for NumClustersFilter {
    fn short_name(&self) -> String {
        format!("MaxClusters={}", self.max_num_clusters)
    }

    fn name(&self) -> String {
        format!("Max Num Clusters ≤{}", self.max_num_clusters)
    }

    fn apply(&self, rupture: &ClusterRupture, _mode: EvalMode) -> Result<PlausibilityResult> {
        Ok(PlausibilityResult::pass_or(
            rupture.total_num_clusters() <= self.max_num_clusters,
            PlausibilityResult::FailHardStop,
        ))
    }

    fn test_jump(
        &self,
        rupture: &ClusterRupture,
        _jump: &Jump,
        _mode: EvalMode,
    ) -> Result<PlausibilityResult> {
        Ok(PlausibilityResult::pass_or(
            rupture.total_num_clusters() < self.max_num_clusters,
            PlausibilityResult::FailHardStop,
        ))
    }

    fn is_directional(&self, _splayed: bool) -> bool {
        false
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::NumClustersFilter(NumClustersConfig {
            max_num_clusters: self.max_num_clusters,
        })
    }

    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        Some(self)
    }
}

impl ScalarValueFilter for NumClustersFilter {
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>> {
        Ok(Some(rupture.total_num_clusters() as f64))
    }

    fn acceptable_range(&self) -> ScalarRange {
        ScalarRange::at_most(self.max_num_clusters as f64)
    }

    fn scalar_name(&self) -> String {
        "Num Clusters".to_string()
    }

    fn scalar_units(&self) -> Option<String> {
        None
    }
}

/// Limits the number of splays.
#[derive(Debug, Clone)]
pub struct SplayCountFilter {
    max_splays: usize,
}

impl SplayCountFilter {
    pub fn new(max_splays: usize) -> Self {
        Self { max_splays }
    }
}

impl PlausibilityFilter for SplayCountFilter {
    fn short_name(&self) -> String {
        format!("MaxSplays={}", self.max_splays)
    }

    fn name(&self) -> String {
        format!("Max Num Splays ≤{}", self.max_splays)
    }

    fn apply(&self, rupture: &ClusterRupture, _mode: EvalMode) -> Result<PlausibilityResult> {
        Ok(PlausibilityResult::pass_or(
            rupture.total_num_splays() <= self.max_splays,
            PlausibilityResult::FailHardStop,
        ))
    }

    fn is_directional(&self, _splayed: bool) -> bool {
        false
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::SplayCountFilter(SplayCountConfig {
            max_splays: self.max_splays,
        })
    }
}

/// Limits splay length, absolutely or relative to the primary strand.
#[derive(Debug, Clone)]
pub struct SplayLengthFilter {
    max_len: f64,
    is_fract_of_main: bool,
    total_across_splays: bool,
}

impl SplayLengthFilter {
    pub fn new(
        max_len: f64,
        is_fract_of_main: bool,
        total_across_splays: bool,
    ) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::positive("max_len", max_len)?;
        Ok(Self {
            max_len,
            is_fract_of_main,
            total_across_splays,
        })
    }

    fn strand_length(strand: &ClusterRupture) -> f64 {
        strand.clusters().iter().map(|c| c.total_length_km()).sum()
    }
}

impl PlausibilityFilter for SplayLengthFilter {
    fn short_name(&self) -> String {
        let prefix = if self.total_across_splays {
            "TotSplayLen"
        } else {
            "SplayLen"
        };
        if self.is_fract_of_main {
            format!("{}≤{}xMain", prefix, format_num(self.max_len))
        } else {
            format!("{}≤{}km", prefix, format_num(self.max_len))
        }
    }

    fn name(&self) -> String {
        let prefix = if self.total_across_splays {
            "Total Splay Length"
        } else {
            "Splay Length"
        };
        if self.is_fract_of_main {
            format!("{} ≤{} x Primary Length", prefix, format_num(self.max_len))
        } else {
            format!("{} ≤{}km", prefix, format_num(self.max_len))
        }
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        let splays: Vec<f64> = rupture
            .strands()
            .into_iter()
            .skip(1)
            .map(Self::strand_length)
            .collect();
        if splays.is_empty() {
            return Ok(PlausibilityResult::Pass);
        }
        let (limit, failure) = if self.is_fract_of_main {
            // the primary strand may still grow
            (
                self.max_len * Self::strand_length(rupture),
                PlausibilityResult::FailFuturePossible,
            )
        } else {
            (self.max_len, PlausibilityResult::FailHardStop)
        };
        let longest = if self.total_across_splays {
            splays.iter().sum::<f64>()
        } else {
            splays.iter().copied().fold(0.0, f64::max)
        };
        if mode.is_exhaustive() {
            debug!(event = "splay_length", length = longest, limit);
        }
        Ok(PlausibilityResult::pass_or(longest <= limit, failure))
    }

    fn is_directional(&self, splayed: bool) -> bool {
        splayed
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::SplayLengthFilter(SplayLengthConfig {
            max_len: self.max_len,
            is_fract_of_main: self.is_fract_of_main,
            total_across_splays: self.total_across_splays,
        })
    }
}

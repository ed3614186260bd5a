//! Per-cluster size filters.
//!
//! Both filters share one algorithm and differ only in what makes a cluster
//! sufficient. Every strand is judged in context: a splay is prefixed with
//! the clusters leading from the rupture root to the point where it departs.

use std::fmt;
use std::sync::Arc;

use rupforge_config::{
    ClusterAspectRatioConfig, ConfigError, FilterConfig, MinSectsPerParentConfig,
};
use rupforge_core::{
    ClusterRef, ClusterRupture, ConnectionStrategy, FaultSubsectionCluster, PlausibilityError,
    PlausibilityResult, Result,
};
use tracing::trace;

use crate::filter::{format_num, EvalMode, PlausibilityFilter};

/// How deficient clusters that are not at the end of a strand are treated.
#[derive(Clone)]
struct DeficientClusterRule {
    allow_if_no_direct: bool,
    allow_chained: bool,
    connection_strategy: Option<Arc<dyn ConnectionStrategy>>,
}

impl DeficientClusterRule {
    fn new(
        allow_if_no_direct: bool,
        allow_chained: bool,
        connection_strategy: Option<Arc<dyn ConnectionStrategy>>,
    ) -> std::result::Result<Self, ConfigError> {
        if allow_if_no_direct && connection_strategy.is_none() {
            return Err(ConfigError::Invalid(
                "allow_if_no_direct requires a connection strategy".to_string(),
            ));
        }
        Ok(Self {
            allow_if_no_direct,
            allow_chained,
            connection_strategy,
        })
    }

    fn apply(
        &self,
        filter: &str,
        rupture: &ClusterRupture,
        mode: EvalMode,
        sufficient: impl Fn(&FaultSubsectionCluster) -> bool,
    ) -> Result<PlausibilityResult> {
        let mut result = PlausibilityResult::Pass;
        for strand in strands_in_context(rupture) {
            let strand_result = self.test_strand(filter, &strand, mode, &sufficient)?;
            result = result.and(strand_result);
            if mode.short_circuits() && !result.can_continue() {
                break;
            }
        }
        Ok(result)
    }

    fn test_strand(
        &self,
        filter: &str,
        strand: &[&ClusterRef],
        mode: EvalMode,
        sufficient: &impl Fn(&FaultSubsectionCluster) -> bool,
    ) -> Result<PlausibilityResult> {
        if !sufficient(strand[0]) {
            if mode.is_exhaustive() {
                trace!(event = "deficient_first_cluster", filter, cluster = %strand[0]);
            }
            return Ok(PlausibilityResult::FailHardStop);
        }
        let last = strand.len() - 1;
        let mut result = PlausibilityResult::Pass;
        for i in 1..strand.len() {
            if sufficient(strand[i]) {
                continue;
            }
            if mode.is_exhaustive() {
                trace!(event = "deficient_cluster", filter, cluster = %strand[i], index = i);
            }
            if i == last {
                result = result.and(PlausibilityResult::FailFuturePossible);
                continue;
            }
            if !self.allow_if_no_direct {
                return Ok(PlausibilityResult::FailHardStop);
            }
            let mut before = i - 1;
            while !sufficient(strand[before]) {
                if !self.allow_chained {
                    return Ok(PlausibilityResult::FailHardStop);
                }
                // the first cluster is sufficient, so this stops at zero
                before -= 1;
            }
            let strategy = self
                .connection_strategy
                .as_ref()
                .ok_or(PlausibilityError::MissingCollaborator("connection strategy"))?;
            let after = strand[i + 1];
            if strategy.are_parents_connected(strand[before].parent_id(), after.parent_id()) {
                return Ok(PlausibilityResult::FailHardStop);
            }
        }
        Ok(result)
    }
}

/// Every strand as a cluster path from the rupture root.
fn strands_in_context(rupture: &ClusterRupture) -> Vec<Vec<&ClusterRef>> {
    let nav = rupture.navigator();
    let mut out = Vec::new();
    for strand in rupture.strands() {
        let mut path: Vec<&ClusterRef> = Vec::new();
        let mut cursor = nav.predecessor_cluster(strand.first_cluster());
        while let Some(cluster) = cursor {
            path.push(cluster);
            cursor = nav.predecessor_cluster(cluster);
        }
        path.reverse();
        path.extend(strand.clusters().iter());
        out.push(path);
    }
    out
}

/// Requires at least `min_per_parent` sections in every cluster.
#[derive(Clone)]
pub struct MinSectsPerParentFilter {
    min_per_parent: usize,
    rule: DeficientClusterRule,
}

impl MinSectsPerParentFilter {
    pub fn new(
        min_per_parent: usize,
        allow_if_no_direct: bool,
        allow_chained: bool,
        connection_strategy: Option<Arc<dyn ConnectionStrategy>>,
    ) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::at_least_one("min_per_parent", min_per_parent)?;
        Ok(Self {
            min_per_parent,
            rule: DeficientClusterRule::new(allow_if_no_direct, allow_chained, connection_strategy)?,
        })
    }

    fn is_sufficient(&self, cluster: &FaultSubsectionCluster) -> bool {
        cluster.len() >= self.min_per_parent
    }
}

impl PlausibilityFilter for MinSectsPerParentFilter {
    fn short_name(&self) -> String {
        format!("SectsPerParent≥{}", self.min_per_parent)
    }

    fn name(&self) -> String {
        format!("Min Sections Per Parent ≥{}", self.min_per_parent)
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        self.rule
            .apply(&self.short_name(), rupture, mode, |c| self.is_sufficient(c))
    }

    fn is_directional(&self, splayed: bool) -> bool {
        splayed
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::MinSectsPerParentFilter(MinSectsPerParentConfig {
            min_per_parent: self.min_per_parent,
            allow_if_no_direct: self.rule.allow_if_no_direct,
            allow_chained: self.rule.allow_chained,
        })
    }
}

impl fmt::Debug for MinSectsPerParentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinSectsPerParentFilter")
            .field("min_per_parent", &self.min_per_parent)
            .field("allow_if_no_direct", &self.rule.allow_if_no_direct)
            .field("allow_chained", &self.rule.allow_chained)
            .finish()
    }
}

/// Requires each cluster's length over its mean down-dip width to reach a
/// minimum aspect ratio.
#[derive(Clone)]
pub struct ClusterAspectRatioFilter {
    min_aspect_ratio: f64,
    rule: DeficientClusterRule,
}

impl ClusterAspectRatioFilter {
    pub fn new(
        min_aspect_ratio: f64,
        allow_if_no_direct: bool,
        allow_chained: bool,
        connection_strategy: Option<Arc<dyn ConnectionStrategy>>,
    ) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::positive("min_aspect_ratio", min_aspect_ratio)?;
        Ok(Self {
            min_aspect_ratio,
            rule: DeficientClusterRule::new(allow_if_no_direct, allow_chained, connection_strategy)?,
        })
    }

    /// Total length divided by mean down-dip width.
    pub fn aspect_ratio(cluster: &FaultSubsectionCluster) -> f64 {
        let width: f64 = cluster
            .sects()
            .iter()
            .map(|s| s.down_dip_width_km)
            .sum::<f64>()
            / cluster.len() as f64;
        cluster.total_length_km() / width
    }

    fn is_sufficient(&self, cluster: &FaultSubsectionCluster) -> bool {
        Self::aspect_ratio(cluster) >= self.min_aspect_ratio
    }
}

impl PlausibilityFilter for ClusterAspectRatioFilter {
    fn short_name(&self) -> String {
        format!("AspectRatio≥{}", format_num(self.min_aspect_ratio))
    }

    fn name(&self) -> String {
        format!("Cluster Aspect Ratio ≥{}", format_num(self.min_aspect_ratio))
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        self.rule
            .apply(&self.short_name(), rupture, mode, |c| self.is_sufficient(c))
    }

    fn is_directional(&self, splayed: bool) -> bool {
        splayed
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::ClusterAspectRatioFilter(ClusterAspectRatioConfig {
            min_aspect_ratio: self.min_aspect_ratio,
            allow_if_no_direct: self.rule.allow_if_no_direct,
            allow_chained: self.rule.allow_chained,
        })
    }
}

impl fmt::Debug for ClusterAspectRatioFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterAspectRatioFilter")
            .field("min_aspect_ratio", &self.min_aspect_ratio)
            .field("allow_if_no_direct", &self.rule.allow_if_no_direct)
            .field("allow_chained", &self.rule.allow_chained)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rupforge_core::PlausibilityResult::*;
    use rupforge_test::FaultNetwork;

    // 1: four sections, 2 and 4: one section each, 3: four sections, all on a line
    fn network() -> FaultNetwork {
        let mut net = FaultNetwork::new();
        net.add_fault(1, 4, (0.0, 0.0), 0.0);
        net.add_fault(2, 1, (0.0, 21.0), 0.0);
        net.add_fault(4, 1, (0.0, 27.0), 0.0);
        net.add_fault(3, 4, (0.0, 33.0), 0.0);
        net.connect(1, 2);
        net.connect(2, 3);
        net.connect(2, 4);
        net.connect(4, 3);
        net
    }

    fn min_sects(net: &FaultNetwork, allow_if_no_direct: bool, allow_chained: bool) -> MinSectsPerParentFilter {
        MinSectsPerParentFilter::new(
            2,
            allow_if_no_direct,
            allow_chained,
            Some(Arc::new(net.connection_strategy())),
        )
        .unwrap()
    }

    #[test]
    fn test_deficient_middle_without_direct_connection_passes() {
        let net = network();
        let rupture = net.strand(&[(1, 0..4), (2, 0..1), (3, 0..4)]);
        let filter = min_sects(&net, true, false);
        assert_eq!(filter.apply(&rupture, EvalMode::ShortCircuit).unwrap(), Pass);
        assert_eq!(filter.apply(&rupture, EvalMode::Exhaustive).unwrap(), Pass);
    }

    #[test]
    fn test_deficient_middle_with_direct_connection_hard_stops() {
        let mut net = network();
        net.connect(1, 3);
        let rupture = net.strand(&[(1, 0..4), (2, 0..1), (3, 0..4)]);
        let filter = min_sects(&net, true, false);
        assert_eq!(filter.apply(&rupture, EvalMode::ShortCircuit).unwrap(), FailHardStop);
    }

    #[test]
    fn test_deficient_middle_without_exception_hard_stops() {
        let net = network();
        let rupture = net.strand(&[(1, 0..4), (2, 0..1), (3, 0..4)]);
        let filter = min_sects(&net, false, false);
        assert_eq!(filter.apply(&rupture, EvalMode::ShortCircuit).unwrap(), FailHardStop);
    }

    #[test]
    fn test_deficient_tail_is_future_possible() {
        let net = network();
        let rupture = net.strand(&[(1, 0..4), (2, 0..1)]);
        let filter = min_sects(&net, false, false);
        assert_eq!(filter.apply(&rupture, EvalMode::ShortCircuit).unwrap(), FailFuturePossible);
    }

    #[test]
    fn test_deficient_first_cluster_hard_stops() {
        let net = network();
        let rupture = net.strand(&[(2, 0..1), (3, 0..4)]);
        let filter = min_sects(&net, true, true);
        assert_eq!(filter.apply(&rupture, EvalMode::ShortCircuit).unwrap(), FailHardStop);
    }

    #[test]
    fn test_chained_deficient_clusters() {
        let net = network();
        let rupture = net.strand(&[(1, 0..4), (2, 0..1), (4, 0..1), (3, 0..4)]);
        assert_eq!(
            min_sects(&net, true, false).apply(&rupture, EvalMode::ShortCircuit).unwrap(),
            FailHardStop
        );
        assert_eq!(
            min_sects(&net, true, true).apply(&rupture, EvalMode::ShortCircuit).unwrap(),
            Pass
        );
    }

    #[test]
    fn test_splay_judged_in_context() {
        let net = network();
        let main = net.cluster(1, 0..4);
        let rupture = ClusterRupture::new(main.clone());
        let single = net.cluster(2, 0..1);
        let splayed = rupture.take(&net.jump_from(&main, 101, &single)).unwrap();
        assert_eq!(splayed.total_num_splays(), 1);
        let filter = min_sects(&net, false, false);
        // the splay's only cluster is its end, not a strand start
        assert_eq!(filter.apply(&splayed, EvalMode::ShortCircuit).unwrap(), FailFuturePossible);
        assert!(filter.is_directional(true));
        assert!(!filter.is_directional(false));
    }

    #[test]
    fn test_requires_connection_strategy() {
        assert!(MinSectsPerParentFilter::new(2, true, false, None).is_err());
        assert!(MinSectsPerParentFilter::new(0, false, false, None).is_err());
        assert!(MinSectsPerParentFilter::new(2, false, false, None).is_ok());
    }

    #[test]
    fn test_aspect_ratio() {
        let net = network();
        let cluster = net.cluster(1, 0..4);
        // 4 x 5 km long, 10 km wide
        assert!((ClusterAspectRatioFilter::aspect_ratio(&cluster) - 2.0).abs() < 1e-9);

        let filter = ClusterAspectRatioFilter::new(
            1.5,
            true,
            false,
            Some(Arc::new(net.connection_strategy())),
        )
        .unwrap();
        let rupture = net.strand(&[(1, 0..4), (3, 0..2)]);
        assert_eq!(filter.apply(&rupture, EvalMode::ShortCircuit).unwrap(), FailFuturePossible);
        let rupture = net.strand(&[(1, 0..4), (3, 0..4)]);
        assert_eq!(filter.apply(&rupture, EvalMode::ShortCircuit).unwrap(), Pass);
        assert_eq!(filter.short_name(), "AspectRatio≥1.5");
    }
}

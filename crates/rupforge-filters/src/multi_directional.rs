//! Retrying order-dependent filters over equivalent rupture orderings.

use std::sync::Arc;

use rupforge_config::{FilterConfig, MultiDirectionalConfig};
use rupforge_core::{ClusterRupture, Jump, PlausibilityResult, Result};
use tracing::debug;

use crate::filter::{EvalMode, PlausibilityFilter, ScalarRange, ScalarValueFilter};

/// Wraps a directional filter; a failing rupture passes if any other
/// ordering of the same sections and jumps passes.
///
/// When the inner filter does not depend on direction for unsplayed
/// ruptures, only orderings that keep their root cluster's orientation are
/// tried.
#[derive(Debug, Clone)]
pub struct MultiDirectionalPlausibilityFilter {
    filter: Arc<dyn PlausibilityFilter>,
    max_num_splays: usize,
}

impl MultiDirectionalPlausibilityFilter {
    pub fn new(filter: Arc<dyn PlausibilityFilter>, max_num_splays: usize) -> Self {
        Self {
            filter,
            max_num_splays,
        }
    }

    pub fn inner(&self) -> &Arc<dyn PlausibilityFilter> {
        &self.filter
    }

    /// Orderings to retry, excluding `rupture` itself.
    fn alternatives(&self, rupture: &ClusterRupture) -> Result<Vec<ClusterRupture>> {
        let mut alternatives = rupture.alternative_representations(self.max_num_splays)?;
        if !self.filter.is_directional(false) {
            let clusters = rupture.all_clusters();
            alternatives.retain(|alt| {
                let root = alt.first_cluster();
                clusters.iter().any(|c| ***c == **root)
            });
        }
        Ok(alternatives)
    }

    fn retry(
        &self,
        rupture: &ClusterRupture,
        first: PlausibilityResult,
        mode: EvalMode,
    ) -> Result<PlausibilityResult> {
        let mut result = first;
        for alternative in self.alternatives(rupture)? {
            let alt_result = self.filter.apply(&alternative, mode)?;
            if mode.is_exhaustive() {
                debug!(
                    event = "directional_retry",
                    filter = %self.filter.short_name(),
                    rupture = %alternative,
                    result = %alt_result,
                );
            }
            result = result.or(alt_result);
            if mode.short_circuits() && result.is_pass() {
                break;
            }
        }
        Ok(result)
    }
}

impl PlausibilityFilter for MultiDirectionalPlausibilityFilter {
    fn short_name(&self) -> String {
        format!("MultiDir[{}]", self.filter.short_name())
    }

    fn name(&self) -> String {
        format!("Multi-Directional {}", self.filter.name())
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        let result = self.filter.apply(rupture, mode)?;
        if result.is_pass() || rupture.total_num_jumps() == 0 {
            return Ok(result);
        }
        self.retry(rupture, result, mode)
    }

    fn test_jump(
        &self,
        rupture: &ClusterRupture,
        jump: &Jump,
        mode: EvalMode,
    ) -> Result<PlausibilityResult> {
        let result = self.filter.test_jump(rupture, jump, mode)?;
        if result.is_pass() {
            return Ok(result);
        }
        let grown = rupture.take(jump)?;
        self.retry(&grown, result, mode)
    }

    fn is_directional(&self, _splayed: bool) -> bool {
        false
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::MultiDirectionalPlausibilityFilter(MultiDirectionalConfig {
            filter: Box::new(self.filter.to_config()),
            max_num_splays: self.max_num_splays,
        })
    }

    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        self.filter.as_scalar().map(|_| self as &dyn ScalarValueFilter)
    }
}

impl ScalarValueFilter for MultiDirectionalPlausibilityFilter {
    /// Best value over every ordering.
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>> {
        let Some(scalar) = self.filter.as_scalar() else {
            return Ok(None);
        };
        let range = scalar.acceptable_range();
        let mut values: Vec<f64> = scalar.value(rupture)?.into_iter().collect();
        if rupture.total_num_jumps() > 0 {
            for alternative in self.alternatives(rupture)? {
                values.extend(scalar.value(&alternative)?);
            }
        }
        Ok(range.best_value(values))
    }

    fn acceptable_range(&self) -> ScalarRange {
        self.filter
            .as_scalar()
            .map(|s| s.acceptable_range())
            .unwrap_or_default()
    }

    fn scalar_name(&self) -> String {
        self.filter
            .as_scalar()
            .map(|s| s.scalar_name())
            .unwrap_or_default()
    }

    fn scalar_units(&self) -> Option<String> {
        self.filter.as_scalar().and_then(|s| s.scalar_units())
    }
}

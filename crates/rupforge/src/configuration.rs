//! Runtime filter lists.

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use rupforge_config::{ConfigError, PlausibilityConfig};
use rupforge_core::{ClusterRupture, Collaborators, Jump, PlausibilityResult, Result};
use rupforge_filters::{
    EvalMode, FilterBuilder, MultiDirectionalPlausibilityFilter, PlausibilityFilter,
};
use tracing::{debug, info};

/// An ordered list of initialized filters sharing one set of collaborators.
///
/// Filters hold configuration only, so one configuration can be shared by
/// every search thread.
#[derive(Debug, Clone)]
pub struct PlausibilityConfiguration {
    filters: Vec<Arc<dyn PlausibilityFilter>>,
    max_num_splays: usize,
    collaborators: Collaborators,
}

impl PlausibilityConfiguration {
    /// Uses `filters` as given; no directional wrapping is applied.
    pub fn new(
        filters: Vec<Arc<dyn PlausibilityFilter>>,
        max_num_splays: usize,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            filters,
            max_num_splays,
            collaborators,
        }
    }

    /// Initializes every filter of `config`, wrapping order-dependent ones
    /// in a directional retry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a filter has an invalid
    /// parameter or lacks a collaborator it needs.
    pub fn from_config(
        config: &PlausibilityConfig,
        collaborators: Collaborators,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let filters = config
            .filters
            .iter()
            .map(|filter_config| {
                let filter = FilterBuilder::init(filter_config, &collaborators)?;
                Ok(wrap_directional(filter, config.max_num_splays))
            })
            .collect::<std::result::Result<Vec<_>, ConfigError>>()?;
        info!(
            event = "configuration_init",
            filter_count = filters.len(),
            max_num_splays = config.max_num_splays,
        );
        Ok(Self::new(filters, config.max_num_splays, collaborators))
    }

    /// Loads a JSON, YAML or TOML file and initializes it.
    pub fn load(
        path: impl AsRef<Path>,
        collaborators: Collaborators,
    ) -> std::result::Result<Self, ConfigError> {
        let config = PlausibilityConfig::load(path)?;
        Self::from_config(&config, collaborators)
    }

    pub fn filters(&self) -> &[Arc<dyn PlausibilityFilter>] {
        &self.filters
    }

    pub fn max_num_splays(&self) -> usize {
        self.max_num_splays
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Combined verdict of every filter.
    ///
    /// In short-circuit mode evaluation stops at the first hard stop.
    pub fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        let mut result = PlausibilityResult::Pass;
        for filter in &self.filters {
            let filter_result = filter.apply(rupture, mode)?;
            if mode.is_exhaustive() {
                debug!(
                    event = "filter_eval",
                    filter = %filter.short_name(),
                    rupture = %rupture,
                    result = %filter_result,
                );
            }
            result = result.and(filter_result);
            if mode.short_circuits() && !result.can_continue() {
                break;
            }
        }
        Ok(result)
    }

    /// Verdict of each filter in order, never short-circuiting.
    pub fn apply_each(&self, rupture: &ClusterRupture) -> Result<Vec<PlausibilityResult>> {
        self.filters
            .iter()
            .map(|filter| filter.apply(rupture, EvalMode::Exhaustive))
            .collect()
    }

    /// Combined verdict for growing `rupture` by `jump`.
    pub fn test_jump(
        &self,
        rupture: &ClusterRupture,
        jump: &Jump,
        mode: EvalMode,
    ) -> Result<PlausibilityResult> {
        let mut result = PlausibilityResult::Pass;
        for filter in &self.filters {
            result = result.and(filter.test_jump(rupture, jump, mode)?);
            if mode.short_circuits() && !result.can_continue() {
                break;
            }
        }
        Ok(result)
    }

    /// Evaluates many ruptures on the rayon pool, preserving their order.
    pub fn par_apply(
        &self,
        ruptures: &[ClusterRupture],
        mode: EvalMode,
    ) -> Result<Vec<PlausibilityResult>> {
        ruptures
            .par_iter()
            .map(|rupture| self.apply(rupture, mode))
            .collect()
    }

    /// Persisted form; wrapped filters persist with their wrapper.
    pub fn to_config(&self) -> PlausibilityConfig {
        PlausibilityConfig {
            max_num_splays: self.max_num_splays,
            filters: self.filters.iter().map(|f| f.to_config()).collect(),
        }
    }
}

/// Wraps `filter` in a directional retry when its verdict can depend on the
/// order clusters were added.
pub fn wrap_directional(
    filter: Arc<dyn PlausibilityFilter>,
    max_num_splays: usize,
) -> Arc<dyn PlausibilityFilter> {
    let directional =
        filter.is_directional(false) || (max_num_splays > 0 && filter.is_directional(true));
    if directional {
        debug!(
            event = "directional_wrap",
            filter = %filter.short_name(),
            max_num_splays,
        );
        Arc::new(MultiDirectionalPlausibilityFilter::new(filter, max_num_splays))
    } else {
        filter
    }
}

#[cfg(test)]
#[path = "configuration_tests.rs"]
mod tests;

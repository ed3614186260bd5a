//! Preset builder for common filter lists.

use tracing::debug;

use crate::filter::*;
use crate::{ConfigError, PlausibilityConfig};

/// Accumulates filter configurations into a [`PlausibilityConfig`].
///
/// # Examples
///
/// ```
/// use rupforge_config::PlausibilityConfigBuilder;
///
/// let config = PlausibilityConfigBuilder::new()
///     .max_splays(0)
///     .u3_all()
///     .max_jump_dist(5.0)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.filters.len(), 6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PlausibilityConfigBuilder {
    max_splays: usize,
    filters: Vec<FilterConfig>,
}

impl PlausibilityConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_splays(mut self, max_splays: usize) -> Self {
        self.max_splays = max_splays;
        self
    }

    /// Adds a raw filter configuration.
    pub fn add(mut self, filter: FilterConfig) -> Self {
        self.filters.push(filter);
        self
    }

    /// Azimuth, cumulative and cluster-size filters of the UCERF3 rule set.
    pub fn u3_all(self) -> Self {
        self.u3_azimuth()
            .u3_cumulatives()
            .min_sects_per_parent(2, true, true)
    }

    /// UCERF3 jump and start-to-end azimuth change filters.
    pub fn u3_azimuth(self) -> Self {
        self.jump_az_change(AzimuthCalcConfig::UCERF3LeftLateralFlipAzimuthCalc, 60.0)
            .tot_az_change(
                AzimuthCalcConfig::UCERF3LeftLateralFlipAzimuthCalc,
                60.0,
                true,
                true,
            )
    }

    /// UCERF3 cumulative azimuth filter and the compatibility-mode rake filter.
    pub fn u3_cumulatives(self) -> Self {
        self.cumulative_az_change(AzimuthCalcConfig::SimpleAzimuthCalc, 560.0)
            .u3_cumulative_rake_change(180.0)
    }

    pub fn min_sects_per_parent(
        self,
        min_per_parent: usize,
        allow_if_no_direct: bool,
        allow_chained: bool,
    ) -> Self {
        self.add(FilterConfig::MinSectsPerParentFilter(
            MinSectsPerParentConfig {
                min_per_parent,
                allow_if_no_direct,
                allow_chained,
            },
        ))
    }

    pub fn jump_az_change(self, az_calc: AzimuthCalcConfig, threshold: f64) -> Self {
        self.add(FilterConfig::JumpAzimuthChangeFilter(
            JumpAzimuthChangeConfig {
                az_calc,
                threshold,
                err_on_cant_evaluate: false,
            },
        ))
    }

    pub fn tot_az_change(
        self,
        az_calc: AzimuthCalcConfig,
        threshold: f64,
        multi_fault_only: bool,
        test_full_end: bool,
    ) -> Self {
        self.add(FilterConfig::TotalAzimuthChangeFilter(
            TotalAzimuthChangeConfig {
                az_calc,
                threshold,
                multi_fault_only,
                test_full_end,
            },
        ))
    }

    pub fn cumulative_az_change(self, az_calc: AzimuthCalcConfig, threshold: f64) -> Self {
        self.add(FilterConfig::CumulativeAzimuthChangeFilter(
            CumulativeAzimuthChangeConfig { az_calc, threshold },
        ))
    }

    pub fn cumulative_rake_change(self, threshold: f64) -> Self {
        self.add(FilterConfig::CumulativeRakeChangeFilter(
            CumulativeRakeChangeConfig { threshold },
        ))
    }

    pub fn u3_cumulative_rake_change(self, threshold: f64) -> Self {
        self.add(FilterConfig::U3CompatibleCumulativeRakeChangeFilter(
            CumulativeRakeChangeConfig { threshold },
        ))
    }

    pub fn max_jump_dist(self, max_dist: f64) -> Self {
        self.add(FilterConfig::JumpDistFilter(JumpDistConfig { max_dist }))
    }

    pub fn max_num_clusters(self, max_num_clusters: usize) -> Self {
        self.add(FilterConfig::NumClustersFilter(NumClustersConfig {
            max_num_clusters,
        }))
    }

    /// Limits the splay count to the builder's `max_splays`.
    pub fn max_splays_filter(self) -> Self {
        let max_splays = self.max_splays;
        self.add(FilterConfig::SplayCountFilter(SplayCountConfig {
            max_splays,
        }))
    }

    /// `max_len` is in km, or a fraction of the primary strand when
    /// `is_fract_of_main`.
    pub fn splay_length(
        self,
        max_len: f64,
        is_fract_of_main: bool,
        total_across_splays: bool,
    ) -> Self {
        self.add(FilterConfig::SplayLengthFilter(SplayLengthConfig {
            max_len,
            is_fract_of_main,
            total_across_splays,
        }))
    }

    pub fn cluster_coulomb(self, threshold: f64) -> Self {
        self.add(FilterConfig::ClusterCoulombCompatibilityFilter(
            CoulombThresholdConfig { threshold },
        ))
    }

    pub fn cluster_path_coulomb(self, threshold: f64, fract_pass_threshold: f64) -> Self {
        self.add(FilterConfig::ClusterPathCoulombCompatibilityFilter(
            ClusterPathCoulombConfig {
                threshold,
                fract_pass_threshold,
            },
        ))
    }

    pub fn parent_coulomb(self, threshold: f64, directionality: Directionality) -> Self {
        self.add(FilterConfig::ParentCoulombCompatibilityFilter(
            ParentCoulombConfig {
                threshold,
                directionality,
            },
        ))
    }

    pub fn net_cluster_coulomb(self, threshold: f64) -> Self {
        self.add(FilterConfig::NetClusterCoulombFilter(CoulombThresholdConfig {
            threshold,
        }))
    }

    pub fn net_rup_coulomb(self, quantity: RupCoulombQuantity, threshold: f64) -> Self {
        self.add(FilterConfig::NetRuptureCoulombFilter(
            NetRuptureCoulombConfig {
                quantity,
                threshold,
            },
        ))
    }

    pub fn cumulative_probability(
        self,
        min_probability: f64,
        calcs: Vec<ProbabilityCalcConfig>,
    ) -> Self {
        self.add(FilterConfig::CumulativeProbabilityFilter(
            CumulativeProbabilityConfig {
                min_probability,
                calcs,
            },
        ))
    }

    /// Validates every filter and returns the configuration.
    pub fn build(self) -> Result<PlausibilityConfig, ConfigError> {
        let config = PlausibilityConfig {
            max_num_splays: self.max_splays,
            filters: self.filters,
        };
        config.validate()?;
        debug!(
            event = "config_built",
            filters = config.filters.len(),
            max_num_splays = config.max_num_splays,
        );
        Ok(config)
    }
}

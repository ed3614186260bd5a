//! Persisted form of every filter and filter sub-component.
//!
//! Each enum serializes as `{ "class": <tag>, "value": { ...fields } }`.

use serde::{Deserialize, Serialize};

use crate::validate;
use crate::ConfigError;

/// A persisted plausibility filter.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "class", content = "value")]
pub enum FilterConfig {
    MinSectsPerParentFilter(MinSectsPerParentConfig),
    ClusterAspectRatioFilter(ClusterAspectRatioConfig),
    GapWithinSectFilter,
    JumpDistFilter(JumpDistConfig),
    NumClustersFilter(NumClustersConfig),
    SplayCountFilter(SplayCountConfig),
    SplayLengthFilter(SplayLengthConfig),
    JumpAzimuthChangeFilter(JumpAzimuthChangeConfig),
    TotalAzimuthChangeFilter(TotalAzimuthChangeConfig),
    CumulativeAzimuthChangeFilter(CumulativeAzimuthChangeConfig),
    CumulativeRakeChangeFilter(CumulativeRakeChangeConfig),
    U3CompatibleCumulativeRakeChangeFilter(CumulativeRakeChangeConfig),
    CumulativePenaltyFilter(CumulativePenaltyConfig),
    CumulativeProbabilityFilter(CumulativeProbabilityConfig),
    PathPlausibilityFilter(PathPlausibilityConfig),
    ClusterPathCoulombCompatibilityFilter(ClusterPathCoulombConfig),
    SectPathCoulombCompatibilityFilter(SectPathCoulombConfig),
    ClusterCoulombCompatibilityFilter(CoulombThresholdConfig),
    NetClusterCoulombFilter(CoulombThresholdConfig),
    NetRuptureCoulombFilter(NetRuptureCoulombConfig),
    ParentCoulombCompatibilityFilter(ParentCoulombConfig),
    MultiDirectionalPlausibilityFilter(MultiDirectionalConfig),
}

impl FilterConfig {
    /// The persisted class tag of this filter.
    pub fn class_name(&self) -> &'static str {
        match self {
            FilterConfig::MinSectsPerParentFilter(_) => "MinSectsPerParentFilter",
            FilterConfig::ClusterAspectRatioFilter(_) => "ClusterAspectRatioFilter",
            FilterConfig::GapWithinSectFilter => "GapWithinSectFilter",
            FilterConfig::JumpDistFilter(_) => "JumpDistFilter",
            FilterConfig::NumClustersFilter(_) => "NumClustersFilter",
            FilterConfig::SplayCountFilter(_) => "SplayCountFilter",
            FilterConfig::SplayLengthFilter(_) => "SplayLengthFilter",
            FilterConfig::JumpAzimuthChangeFilter(_) => "JumpAzimuthChangeFilter",
            FilterConfig::TotalAzimuthChangeFilter(_) => "TotalAzimuthChangeFilter",
            FilterConfig::CumulativeAzimuthChangeFilter(_) => "CumulativeAzimuthChangeFilter",
            FilterConfig::CumulativeRakeChangeFilter(_) => "CumulativeRakeChangeFilter",
            FilterConfig::U3CompatibleCumulativeRakeChangeFilter(_) => {
                "U3CompatibleCumulativeRakeChangeFilter"
            }
            FilterConfig::CumulativePenaltyFilter(_) => "CumulativePenaltyFilter",
            FilterConfig::CumulativeProbabilityFilter(_) => "CumulativeProbabilityFilter",
            FilterConfig::PathPlausibilityFilter(_) => "PathPlausibilityFilter",
            FilterConfig::ClusterPathCoulombCompatibilityFilter(_) => {
                "ClusterPathCoulombCompatibilityFilter"
            }
            FilterConfig::SectPathCoulombCompatibilityFilter(_) => {
                "SectPathCoulombCompatibilityFilter"
            }
            FilterConfig::ClusterCoulombCompatibilityFilter(_) => {
                "ClusterCoulombCompatibilityFilter"
            }
            FilterConfig::NetClusterCoulombFilter(_) => "NetClusterCoulombFilter",
            FilterConfig::NetRuptureCoulombFilter(_) => "NetRuptureCoulombFilter",
            FilterConfig::ParentCoulombCompatibilityFilter(_) => {
                "ParentCoulombCompatibilityFilter"
            }
            FilterConfig::MultiDirectionalPlausibilityFilter(_) => {
                "MultiDirectionalPlausibilityFilter"
            }
        }
    }

    /// Checks every parameter, recursing into sub-components.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            FilterConfig::MinSectsPerParentFilter(c) => {
                validate::at_least_one("min_per_parent", c.min_per_parent)?;
            }
            FilterConfig::ClusterAspectRatioFilter(c) => {
                validate::positive("min_aspect_ratio", c.min_aspect_ratio)?;
            }
            FilterConfig::GapWithinSectFilter => {}
            FilterConfig::JumpDistFilter(c) => {
                validate::non_negative("max_dist", c.max_dist)?;
            }
            FilterConfig::NumClustersFilter(c) => {
                validate::at_least_one("max_num_clusters", c.max_num_clusters)?;
            }
            FilterConfig::SplayCountFilter(_) => {}
            FilterConfig::SplayLengthFilter(c) => {
                validate::positive("max_len", c.max_len)?;
            }
            FilterConfig::JumpAzimuthChangeFilter(c) => {
                c.az_calc.validate()?;
                validate::non_negative("threshold", c.threshold)?;
            }
            FilterConfig::TotalAzimuthChangeFilter(c) => {
                c.az_calc.validate()?;
                validate::non_negative("threshold", c.threshold)?;
            }
            FilterConfig::CumulativeAzimuthChangeFilter(c) => {
                c.az_calc.validate()?;
                validate::non_negative("threshold", c.threshold)?;
            }
            FilterConfig::CumulativeRakeChangeFilter(c)
            | FilterConfig::U3CompatibleCumulativeRakeChangeFilter(c) => {
                validate::non_negative("threshold", c.threshold)?;
            }
            FilterConfig::CumulativePenaltyFilter(c) => {
                validate::non_negative("threshold", c.threshold)?;
                validate::non_empty("penalties", &c.penalties)?;
                for penalty in &c.penalties {
                    penalty.validate()?;
                }
            }
            FilterConfig::CumulativeProbabilityFilter(c) => {
                validate::probability_threshold("min_probability", c.min_probability)?;
                validate::non_empty("calcs", &c.calcs)?;
                for calc in &c.calcs {
                    calc.validate()?;
                }
            }
            FilterConfig::PathPlausibilityFilter(c) => {
                validate::fraction("fract_pass_threshold", c.fract_pass_threshold)?;
                validate::non_empty("evaluators", &c.evaluators)?;
                for evaluator in &c.evaluators {
                    evaluator.validate()?;
                }
            }
            FilterConfig::ClusterPathCoulombCompatibilityFilter(c) => {
                validate::finite("threshold", c.threshold)?;
                validate::fraction("fract_pass_threshold", c.fract_pass_threshold)?;
            }
            FilterConfig::SectPathCoulombCompatibilityFilter(c) => {
                validate::finite("threshold", c.threshold)?;
                validate::positive("max_jump_dist", c.max_jump_dist)?;
            }
            FilterConfig::ClusterCoulombCompatibilityFilter(c)
            | FilterConfig::NetClusterCoulombFilter(c) => {
                validate::finite("threshold", c.threshold)?;
            }
            FilterConfig::NetRuptureCoulombFilter(c) => {
                validate::finite("threshold", c.threshold)?;
            }
            FilterConfig::ParentCoulombCompatibilityFilter(c) => {
                validate::finite("threshold", c.threshold)?;
            }
            FilterConfig::MultiDirectionalPlausibilityFilter(c) => {
                if matches!(*c.filter, FilterConfig::MultiDirectionalPlausibilityFilter(_)) {
                    return Err(ConfigError::Invalid(
                        "directional retry cannot wrap another directional retry".to_string(),
                    ));
                }
                c.filter.validate()?;
            }
        }
        Ok(())
    }
}

/// Shared parameters of the per-cluster sufficiency filters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MinSectsPerParentConfig {
    pub min_per_parent: usize,
    /// Tolerate a deficient interior cluster when its neighbors cannot
    /// connect directly.
    #[serde(default)]
    pub allow_if_no_direct: bool,
    /// Tolerate consecutive deficient clusters under the same condition.
    #[serde(default)]
    pub allow_chained: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ClusterAspectRatioConfig {
    pub min_aspect_ratio: f64,
    #[serde(default)]
    pub allow_if_no_direct: bool,
    #[serde(default)]
    pub allow_chained: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct JumpDistConfig {
    pub max_dist: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct NumClustersConfig {
    pub max_num_clusters: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SplayCountConfig {
    pub max_splays: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SplayLengthConfig {
    /// Maximum length in km, or a fraction of the primary strand length.
    pub max_len: f64,
    #[serde(default)]
    pub is_fract_of_main: bool,
    #[serde(default)]
    pub total_across_splays: bool,
}

/// Strategy for computing azimuths between sections.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(tag = "class", content = "value")]
pub enum AzimuthCalcConfig {
    #[default]
    SimpleAzimuthCalc,
    /// Flips sections whose rake lies in `[min_rake, max_rake]`.
    LeftLateralFlipAzimuthCalc { min_rake: f64, max_rake: f64 },
    /// Flips sections on the listed parents.
    HardCodedLeftLateralFlipAzimuthCalc { parent_ids: Vec<u32> },
    /// Flips the left-lateral parents of the UCERF3 fault model.
    UCERF3LeftLateralFlipAzimuthCalc,
}

impl AzimuthCalcConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let AzimuthCalcConfig::LeftLateralFlipAzimuthCalc { min_rake, max_rake } = self {
            validate::finite("min_rake", *min_rake)?;
            validate::finite("max_rake", *max_rake)?;
            if min_rake > max_rake {
                return Err(ConfigError::Invalid(format!(
                    "min_rake {} exceeds max_rake {}",
                    min_rake, max_rake
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct JumpAzimuthChangeConfig {
    #[serde(default)]
    pub az_calc: AzimuthCalcConfig,
    pub threshold: f64,
    /// Raise an error instead of deferring when a jump cannot be evaluated.
    #[serde(default)]
    pub err_on_cant_evaluate: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TotalAzimuthChangeConfig {
    #[serde(default)]
    pub az_calc: AzimuthCalcConfig,
    pub threshold: f64,
    #[serde(default)]
    pub multi_fault_only: bool,
    #[serde(default)]
    pub test_full_end: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CumulativeAzimuthChangeConfig {
    #[serde(default)]
    pub az_calc: AzimuthCalcConfig,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CumulativeRakeChangeConfig {
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CumulativePenaltyConfig {
    pub threshold: f64,
    pub penalties: Vec<PenaltyConfig>,
}

/// A penalty added at each section-to-section step of a rupture path.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "class", content = "value")]
pub enum PenaltyConfig {
    /// Charged at every jump at least `min_distance` long; multiplied by the
    /// distance when `distance_dependent`.
    JumpPenalty {
        #[serde(default)]
        min_distance: f64,
        value: f64,
        #[serde(default)]
        distance_dependent: bool,
    },
    /// Charged when the rake change of a step exceeds `threshold` degrees.
    RakeChangePenalty {
        threshold: f64,
        value: f64,
        #[serde(default)]
        jumps_only: bool,
    },
    /// Charged when the dip change of a step exceeds `threshold` degrees.
    DipChangePenalty {
        threshold: f64,
        value: f64,
        #[serde(default)]
        jumps_only: bool,
    },
    /// Charged when the azimuth change at a step exceeds `threshold` degrees.
    AzimuthChangePenalty {
        #[serde(default)]
        az_calc: AzimuthCalcConfig,
        threshold: f64,
        value: f64,
        #[serde(default)]
        jumps_only: bool,
    },
}

impl PenaltyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            PenaltyConfig::JumpPenalty {
                min_distance,
                value,
                ..
            } => {
                validate::non_negative("min_distance", *min_distance)?;
                validate::finite("value", *value)?;
            }
            PenaltyConfig::RakeChangePenalty {
                threshold, value, ..
            }
            | PenaltyConfig::DipChangePenalty {
                threshold, value, ..
            } => {
                validate::non_negative("threshold", *threshold)?;
                validate::finite("value", *value)?;
            }
            PenaltyConfig::AzimuthChangePenalty {
                az_calc,
                threshold,
                value,
                ..
            } => {
                az_calc.validate()?;
                validate::non_negative("threshold", *threshold)?;
                validate::finite("value", *value)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CumulativeProbabilityConfig {
    pub min_probability: f64,
    pub calcs: Vec<ProbabilityCalcConfig>,
}

/// A rupture probability model.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "class", content = "value")]
pub enum ProbabilityCalcConfig {
    /// `a * exp(-d / r0)` per jump.
    Shaw07JumpDistProb { a: f64, r0: f64 },
    BiasiWesnousky2016SSJumpProb {
        #[serde(default = "default_min_jump_dist")]
        min_jump_dist: f64,
    },
    BiasiWesnousky2016CombJumpDistProb {
        #[serde(default = "default_min_jump_dist")]
        min_jump_dist: f64,
    },
    BiasiWesnousky2017JumpAzChangeProb {
        #[serde(default)]
        az_calc: AzimuthCalcConfig,
    },
    BiasiWesnousky2017SSJumpAzChangeProb {
        #[serde(default)]
        az_calc: AzimuthCalcConfig,
    },
    BiasiWesnousky2017MechChangeProb,
    /// Mean slip rate of the target relative to the alternatives; with
    /// `only_at_increases` only jumps preceding a slip-rate increase count.
    RelativeSlipRateProb {
        #[serde(default)]
        only_at_increases: bool,
    },
    /// Stress onto the target relative to the alternatives.
    RelativeCoulombProb {
        /// Use every section reached before the jump as the source.
        #[serde(default)]
        full_rupture_source: bool,
        #[serde(default)]
        allow_negative: bool,
        #[serde(default)]
        relative_to_best: bool,
    },
}

fn default_min_jump_dist() -> f64 {
    1.0
}

impl ProbabilityCalcConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ProbabilityCalcConfig::Shaw07JumpDistProb { a, r0 } => {
                validate::positive("a", *a)?;
                validate::positive("r0", *r0)?;
            }
            ProbabilityCalcConfig::BiasiWesnousky2016SSJumpProb { min_jump_dist }
            | ProbabilityCalcConfig::BiasiWesnousky2016CombJumpDistProb { min_jump_dist } => {
                validate::non_negative("min_jump_dist", *min_jump_dist)?;
            }
            ProbabilityCalcConfig::BiasiWesnousky2017JumpAzChangeProb { az_calc }
            | ProbabilityCalcConfig::BiasiWesnousky2017SSJumpAzChangeProb { az_calc } => {
                az_calc.validate()?;
            }
            ProbabilityCalcConfig::BiasiWesnousky2017MechChangeProb
            | ProbabilityCalcConfig::RelativeSlipRateProb { .. }
            | ProbabilityCalcConfig::RelativeCoulombProb { .. } => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PathPlausibilityConfig {
    /// Fraction of clusters that must pass as nucleation points; zero means
    /// a single passing cluster suffices.
    #[serde(default)]
    pub fract_pass_threshold: f64,
    /// Combine evaluators with OR instead of AND.
    #[serde(default)]
    pub logical_or: bool,
    pub evaluators: Vec<NucleationEvaluatorConfig>,
}

/// Judges whether growth nucleating at one cluster is plausible.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "class", content = "value")]
pub enum NucleationEvaluatorConfig {
    ClusterCoulombPathEvaluator {
        threshold: f64,
        #[serde(default)]
        fail_future_possible: bool,
    },
    SectCoulombPathEvaluator {
        threshold: f64,
        #[serde(default)]
        fail_future_possible: bool,
        #[serde(default)]
        jump_to_most_favorable: bool,
        #[serde(default = "default_max_jump_dist")]
        max_jump_dist: f64,
    },
    CumulativeJumpProbPathEvaluator {
        min_probability: f64,
        #[serde(default)]
        fail_future_possible: bool,
        calcs: Vec<ProbabilityCalcConfig>,
    },
}

fn default_max_jump_dist() -> f64 {
    15.0
}

impl NucleationEvaluatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            NucleationEvaluatorConfig::ClusterCoulombPathEvaluator { threshold, .. } => {
                validate::finite("threshold", *threshold)?;
            }
            NucleationEvaluatorConfig::SectCoulombPathEvaluator {
                threshold,
                max_jump_dist,
                ..
            } => {
                validate::finite("threshold", *threshold)?;
                validate::positive("max_jump_dist", *max_jump_dist)?;
            }
            NucleationEvaluatorConfig::CumulativeJumpProbPathEvaluator {
                min_probability,
                calcs,
                ..
            } => {
                validate::fraction("min_probability", *min_probability)?;
                validate::non_empty("calcs", calcs)?;
                for calc in calcs {
                    calc.validate()?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ClusterPathCoulombConfig {
    pub threshold: f64,
    #[serde(default)]
    pub fract_pass_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SectPathCoulombConfig {
    pub threshold: f64,
    #[serde(default)]
    pub jump_to_most_favorable: bool,
    #[serde(default = "default_max_jump_dist")]
    pub max_jump_dist: f64,
    #[serde(default)]
    pub fail_future_possible: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CoulombThresholdConfig {
    pub threshold: f64,
}

/// Net rupture quantity compared against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RupCoulombQuantity {
    /// Sum over sections of the stress each receives from all others.
    #[default]
    SumSectCff,
    /// Minimum over sections of the stress each receives from all others.
    MinSectCff,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct NetRuptureCoulombConfig {
    #[serde(default)]
    pub quantity: RupCoulombQuantity,
    pub threshold: f64,
}

/// How forward and reverse parent-pair stresses combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Directionality {
    /// Either direction reaching the threshold suffices.
    #[default]
    Either,
    /// Both directions must reach the threshold.
    Both,
    /// The sum of both directions must reach the threshold.
    Sum,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ParentCoulombConfig {
    pub threshold: f64,
    #[serde(default)]
    pub directionality: Directionality,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MultiDirectionalConfig {
    pub filter: Box<FilterConfig>,
    #[serde(default)]
    pub max_num_splays: usize,
}

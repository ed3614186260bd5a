//! RupForge Filters
//!
//! This crate provides every plausibility filter and its supporting pieces:
//! - The [`PlausibilityFilter`] and [`ScalarValueFilter`] traits
//! - Structural and size filters (jump distance, cluster counts, splays, gaps)
//! - Azimuth and rake change filters, plus path-cumulative penalties
//! - Jump probability models and the cumulative probability filter
//! - Coulomb stress filters over clusters, parents and whole ruptures
//! - Nucleation-point path filters
//! - The multi-directional retry wrapper
//! - Configuration wiring ([`FilterBuilder`])

pub mod azimuth;
pub mod builder;
pub mod coulomb;
pub mod cumulative;
pub mod filter;
pub mod jump_azimuth;
pub mod multi_directional;
pub mod parent_coulomb;
pub mod path;
pub mod probability;
pub mod size;
pub mod structural;
pub mod total_azimuth;

pub use azimuth::{azimuth_difference, rake_difference, AzimuthCalc};
pub use builder::FilterBuilder;
pub use coulomb::{
    ClusterCoulombCompatibilityFilter, NetClusterCoulombFilter, NetRuptureCoulombFilter,
};
pub use cumulative::{
    CumulativeAzimuthChangeFilter, CumulativePenaltyFilter, CumulativeRakeChangeFilter, Penalty,
    U3CompatibleCumulativeRakeChangeFilter,
};
pub use filter::{EvalMode, PlausibilityFilter, ScalarRange, ScalarValueFilter};
pub use jump_azimuth::JumpAzimuthChangeFilter;
pub use multi_directional::MultiDirectionalPlausibilityFilter;
pub use parent_coulomb::ParentCoulombCompatibilityFilter;
pub use path::{
    ClusterCoulombPathEvaluator, CumulativeJumpProbPathEvaluator, NucleationEvaluator,
    PathPlausibilityFilter, SectCoulombPathEvaluator,
};
pub use probability::{
    build_calcs, passing_ratio_to_prob, prob_to_passing_ratio, CumulativeProbabilityFilter,
    ProbabilityCalc, RelativeProb, RelativeQuantity,
};
pub use size::{ClusterAspectRatioFilter, MinSectsPerParentFilter};
pub use structural::{
    GapWithinSectFilter, JumpDistFilter, NumClustersFilter, SplayCountFilter, SplayLengthFilter,
};
pub use total_azimuth::TotalAzimuthChangeFilter;

//! RupForge - earthquake rupture plausibility filtering
//!
//! Decides whether candidate multi-fault ruptures are physically plausible.
//! Ruptures grow one jump at a time; every filter answers with a
//! three-valued [`PlausibilityResult`] so a search can tell a dead branch
//! from one that may still pass once it grows.
//!
//! # Example
//!
//! ```rust
//! use rupforge::prelude::*;
//!
//! let config = PlausibilityConfig::from_json_str(r#"{
//!     "filters": [
//!         { "class": "JumpDistFilter", "value": { "max_dist": 5.0 } },
//!         { "class": "NumClustersFilter", "value": { "max_num_clusters": 3 } }
//!     ]
//! }"#).unwrap();
//!
//! let filters = PlausibilityConfiguration::from_config(&config, Collaborators::new()).unwrap();
//! assert_eq!(filters.filters().len(), 2);
//! assert_eq!(filters.filters()[0].short_name(), "JumpDist≤5km");
//! ```

pub mod console;
mod configuration;

pub use configuration::{wrap_directional, PlausibilityConfiguration};

// Rupture model
pub use rupforge_core::{
    ClusterRef, ClusterRupture, FaultSection, FaultSubsectionCluster, FilterDataKey, Jump,
    RakeType, RuptureTreeNavigator, SectionRef, Splay,
};

// Results and errors
pub use rupforge_core::{PlausibilityError, PlausibilityResult, Result, RuptureError};

// Collaborators
pub use rupforge_core::{
    AggregatedStiffnessCalculator, Collaborators, ConnectionStrategy,
    SectionDistanceAzimuthCalculator,
};

// Persisted configuration
pub use rupforge_config::{ConfigError, FilterConfig, PlausibilityConfig, PlausibilityConfigBuilder};

// Filters
pub use rupforge_filters as filters;
pub use rupforge_filters::{EvalMode, FilterBuilder, PlausibilityFilter, ScalarRange, ScalarValueFilter};

pub mod prelude {
    pub use super::{
        ClusterRupture, Collaborators, EvalMode, FilterConfig, Jump, PlausibilityConfig,
        PlausibilityConfigBuilder, PlausibilityConfiguration, PlausibilityFilter,
        PlausibilityResult, ScalarValueFilter,
    };
}

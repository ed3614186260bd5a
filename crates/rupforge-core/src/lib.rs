//! RupForge Core - rupture tree model and result algebra
//!
//! This crate provides the fundamental abstractions for rupture plausibility filtering:
//! - Fault sections and parent-fault clusters
//! - Jumps between clusters on different parent faults
//! - [`ClusterRupture`], an immutable tree of clusters grown one jump at a time
//! - [`RuptureTreeNavigator`] for predecessor/descendant queries over that tree
//! - [`PlausibilityResult`], the three-valued pass/fail algebra
//! - Collaborator traits for connectivity, geometry and stiffness oracles

pub mod cluster;
pub mod collaborator;
pub mod error;
pub mod jump;
pub mod navigator;
pub mod result;
pub mod rupture;
pub mod section;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use cluster::{ClusterRef, FaultSubsectionCluster};
pub use collaborator::{
    AggregatedStiffnessCalculator, Collaborators, ConnectionStrategy,
    SectionDistanceAzimuthCalculator,
};
pub use error::{PlausibilityError, Result, RuptureError};
pub use jump::Jump;
pub use navigator::RuptureTreeNavigator;
pub use result::PlausibilityResult;
pub use rupture::{ClusterRupture, FilterDataKey, Splay};
pub use section::{FaultSection, RakeType, SectionRef};

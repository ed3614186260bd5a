//! External oracles consumed by filters.
//!
//! Connectivity, geometry and stiffness are computed outside this workspace.
//! Implementations must be safe for concurrent read-only queries.

use std::fmt;
use std::sync::Arc;

use crate::cluster::ClusterRef;
use crate::jump::Jump;
use crate::section::{FaultSection, SectionRef};

/// Connectivity between parent faults.
pub trait ConnectionStrategy: Send + Sync {
    /// Returns true if a direct jump between the two parents is possible.
    fn are_parents_connected(&self, parent1: u32, parent2: u32) -> bool;

    /// Candidate jumps leaving the given parent, between full parent clusters.
    fn jumps_from_parent(&self, parent_id: u32) -> Vec<Jump>;

    /// The cluster of all sections on a parent fault.
    fn full_cluster(&self, parent_id: u32) -> Option<ClusterRef>;
}

/// Horizontal distance and azimuth between sections.
pub trait SectionDistanceAzimuthCalculator: Send + Sync {
    /// Distance in km.
    fn distance(&self, a: &FaultSection, b: &FaultSection) -> f64;

    /// Azimuth from `a` to `b` in degrees.
    fn azimuth(&self, a: &FaultSection, b: &FaultSection) -> f64;
}

/// Aggregated stiffness (Coulomb) oracle.
pub trait AggregatedStiffnessCalculator: Send + Sync {
    /// Stress imparted by `sources` onto `receivers`, collapsed to one value.
    fn calc(&self, sources: &[SectionRef], receivers: &[SectionRef]) -> f64;

    /// Name of the aggregation method, e.g. `"median-then-sum"`.
    fn aggregation_name(&self) -> String;

    fn scalar_name(&self) -> String {
        "CFF".to_string()
    }

    fn units(&self) -> String {
        "MPa".to_string()
    }
}

/// Collaborator handles attached to filters after construction or
/// deserialization.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub connection_strategy: Option<Arc<dyn ConnectionStrategy>>,
    pub dist_az_calc: Option<Arc<dyn SectionDistanceAzimuthCalculator>>,
    pub stiffness: Option<Arc<dyn AggregatedStiffnessCalculator>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connection_strategy(mut self, strategy: Arc<dyn ConnectionStrategy>) -> Self {
        self.connection_strategy = Some(strategy);
        self
    }

    pub fn with_dist_az_calc(mut self, calc: Arc<dyn SectionDistanceAzimuthCalculator>) -> Self {
        self.dist_az_calc = Some(calc);
        self
    }

    pub fn with_stiffness(mut self, calc: Arc<dyn AggregatedStiffnessCalculator>) -> Self {
        self.stiffness = Some(calc);
        self
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("connection_strategy", &self.connection_strategy.is_some())
            .field("dist_az_calc", &self.dist_az_calc.is_some())
            .field("stiffness", &self.stiffness.is_some())
            .finish()
    }
}

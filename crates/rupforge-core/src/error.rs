//! Error types for RupForge

use thiserror::Error;

/// Errors raised while building or transforming the rupture tree model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuptureError {
    /// A cluster was built from an empty section list
    #[error("Cluster must contain at least one section")]
    EmptyCluster,

    /// A cluster mixes sections from several parent faults
    #[error("Cluster sections must share parent {expected}, found section {section} on parent {found}")]
    MixedParents {
        expected: u32,
        found: u32,
        section: usize,
    },

    /// A section id appears twice where it must be unique
    #[error("Duplicate section {0}")]
    DuplicateSection(usize),

    /// A section was referenced that is not part of the cluster or rupture
    #[error("Section {0} is not contained in the cluster or rupture")]
    SectionNotContained(usize),

    /// A jump cannot be taken from the current rupture
    #[error("Invalid jump {from}->{to}: {reason}")]
    InvalidJump {
        from: usize,
        to: usize,
        reason: &'static str,
    },

    /// Operation only defined for single-strand ruptures
    #[error("Operation requires a single-strand rupture")]
    NotSingleStrand,

    /// A cluster was passed that does not belong to the rupture
    #[error("Cluster starting at section {0} is not part of the rupture")]
    UnknownCluster(usize),
}

/// Errors raised while evaluating plausibility filters.
///
/// These signal programming or model errors, never an implausible rupture:
/// an implausible rupture is reported through [`crate::PlausibilityResult`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlausibilityError {
    /// Error in the rupture model
    #[error("Rupture model error: {0}")]
    Rupture(#[from] RuptureError),

    /// A computed probability fell outside [0, 1]
    #[error("Probability out of range: {name} = {value}")]
    ProbabilityOutOfRange { name: String, value: f64 },

    /// A penalty was computed as negative
    #[error("Negative penalty: {name} = {value}")]
    NegativePenalty { name: String, value: f64 },

    /// Strict mode: a directional quantity could not be evaluated
    #[error("Cannot evaluate {filter}: {reason}")]
    CannotEvaluate { filter: String, reason: String },

    /// A filter was used before its collaborators were attached
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// A filter was asked to evaluate something it cannot
    #[error("Unsupported evaluation: {0}")]
    Unsupported(String),

    /// Inconsistent intermediate state (should not occur in normal operation)
    #[error("Inconsistent state: {0}")]
    Inconsistent(String),
}

/// Result type alias for filter evaluation
pub type Result<T> = std::result::Result<T, PlausibilityError>;

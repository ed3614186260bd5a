//! Directed connections between clusters on different parent faults.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::cluster::ClusterRef;
use crate::section::SectionRef;

/// A directed edge `(from_section, from_cluster) -> (to_section, to_cluster)`.
///
/// Jumps are cheap to clone: every field is a shared handle.
#[derive(Debug, Clone)]
pub struct Jump {
    pub from_section: SectionRef,
    pub from_cluster: ClusterRef,
    pub to_section: SectionRef,
    pub to_cluster: ClusterRef,
    /// Horizontal distance between the two sections, in km.
    pub distance: f64,
}

impl Jump {
    pub fn new(
        from_section: SectionRef,
        from_cluster: ClusterRef,
        to_section: SectionRef,
        to_cluster: ClusterRef,
        distance: f64,
    ) -> Self {
        Self {
            from_section,
            from_cluster,
            to_section,
            to_cluster,
            distance,
        }
    }

    /// The same connection traversed in the opposite direction.
    pub fn reverse(&self) -> Self {
        Self {
            from_section: self.to_section.clone(),
            from_cluster: self.to_cluster.clone(),
            to_section: self.from_section.clone(),
            to_cluster: self.from_cluster.clone(),
            distance: self.distance,
        }
    }

    /// Returns true if both endpoints lie on the same parent fault.
    pub fn is_within_parent(&self) -> bool {
        self.from_section.parent_id == self.to_section.parent_id
    }
}

impl PartialEq for Jump {
    fn eq(&self, other: &Self) -> bool {
        self.from_section.id == other.from_section.id
            && self.to_section.id == other.to_section.id
            && self.from_cluster == other.from_cluster
            && self.to_cluster == other.to_cluster
    }
}

impl Eq for Jump {}

impl Hash for Jump {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.from_section.id.hash(state);
        self.to_section.id.hash(state);
    }
}

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]=>{}[{}]",
            self.from_cluster.parent_id(),
            self.from_section.id,
            self.to_cluster.parent_id(),
            self.to_section.id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{cluster, jump};

    #[test]
    fn test_reverse() {
        let a = cluster(1, 0..3);
        let b = cluster(2, 10..12);
        let j = jump(&a, 2, &b, 10, 1.5);
        let r = j.reverse();
        assert_eq!(r.from_section.id, 10);
        assert_eq!(r.to_section.id, 2);
        assert_eq!(r.distance, 1.5);
        assert_eq!(r.reverse(), j);
        assert!(!j.is_within_parent());
    }

    #[test]
    fn test_display() {
        let a = cluster(1, 0..3);
        let b = cluster(2, 10..12);
        assert_eq!(jump(&a, 2, &b, 10, 1.0).to_string(), "1[2]=>2[10]");
    }
}

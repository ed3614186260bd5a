//! Contiguous runs of fault sections on a single parent fault.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::RuptureError;
use crate::section::SectionRef;

/// Shared, immutable handle to a cluster.
pub type ClusterRef = Arc<FaultSubsectionCluster>;

/// An ordered chain of sections that all belong to one parent fault.
///
/// The order is a proximity order along the fault. A cluster is usually
/// entered at its first section; clusters entered in the middle (produced
/// when a rupture is re-grown from another point) keep their section order
/// and record the interior start, in which case both ends are exit points.
///
/// # Examples
///
/// ```
/// use rupforge_core::{FaultSection, FaultSubsectionCluster};
///
/// let sects = (0..3).map(|id| FaultSection::new(id, 7).into_ref()).collect();
/// let cluster = FaultSubsectionCluster::new(sects).unwrap();
///
/// assert_eq!(cluster.parent_id(), 7);
/// assert_eq!(cluster.start_sect().id, 0);
/// assert_eq!(cluster.reversed().start_sect().id, 2);
/// ```
#[derive(Debug, Clone)]
pub struct FaultSubsectionCluster {
    parent_id: u32,
    parent_name: String,
    sects: Vec<SectionRef>,
    start: usize,
    unique: BTreeSet<usize>,
}

impl FaultSubsectionCluster {
    /// Creates a cluster entered at its first section.
    pub fn new(sects: Vec<SectionRef>) -> Result<Self, RuptureError> {
        Self::build(sects, 0)
    }

    /// Creates a cluster entered at the section with id `start_id`.
    pub fn with_start(sects: Vec<SectionRef>, start_id: usize) -> Result<Self, RuptureError> {
        let start = sects
            .iter()
            .position(|s| s.id == start_id)
            .ok_or(RuptureError::SectionNotContained(start_id))?;
        Self::build(sects, start)
    }

    fn build(sects: Vec<SectionRef>, start: usize) -> Result<Self, RuptureError> {
        let first = sects.first().ok_or(RuptureError::EmptyCluster)?;
        let parent_id = first.parent_id;
        let parent_name = first.parent_name.clone();
        let mut unique = BTreeSet::new();
        for sect in &sects {
            if sect.parent_id != parent_id {
                return Err(RuptureError::MixedParents {
                    expected: parent_id,
                    found: sect.parent_id,
                    section: sect.id,
                });
            }
            if !unique.insert(sect.id) {
                return Err(RuptureError::DuplicateSection(sect.id));
            }
        }
        Ok(Self {
            parent_id,
            parent_name,
            sects,
            start,
            unique,
        })
    }

    /// Wraps this cluster in a shared handle.
    pub fn into_ref(self) -> ClusterRef {
        Arc::new(self)
    }

    pub fn parent_id(&self) -> u32 {
        self.parent_id
    }

    pub fn parent_name(&self) -> &str {
        &self.parent_name
    }

    /// Sections in cluster order.
    pub fn sects(&self) -> &[SectionRef] {
        &self.sects
    }

    pub fn len(&self) -> usize {
        self.sects.len()
    }

    /// Always false; clusters are non-empty by construction.
    pub fn is_empty(&self) -> bool {
        self.sects.is_empty()
    }

    pub fn first(&self) -> &SectionRef {
        &self.sects[0]
    }

    pub fn last(&self) -> &SectionRef {
        &self.sects[self.sects.len() - 1]
    }

    /// Section at which the rupture enters this cluster.
    pub fn start_sect(&self) -> &SectionRef {
        &self.sects[self.start]
    }

    /// Index of the start section within [`Self::sects`].
    pub fn start_index(&self) -> usize {
        self.start
    }

    /// Sections from which the strand may continue to a new cluster.
    pub fn end_sects(&self) -> Vec<&SectionRef> {
        let last = self.sects.len() - 1;
        if last == 0 {
            vec![&self.sects[0]]
        } else if self.start == 0 {
            vec![&self.sects[last]]
        } else if self.start == last {
            vec![&self.sects[0]]
        } else {
            vec![&self.sects[0], &self.sects[last]]
        }
    }

    /// Returns true if `id` is an exit point of this cluster.
    pub fn is_end_sect(&self, id: usize) -> bool {
        self.end_sects().iter().any(|s| s.id == id)
    }

    pub fn contains(&self, id: usize) -> bool {
        self.unique.contains(&id)
    }

    pub fn index_of(&self, id: usize) -> Option<usize> {
        self.sects.iter().position(|s| s.id == id)
    }

    /// Section ids in this cluster.
    pub fn unique(&self) -> &BTreeSet<usize> {
        &self.unique
    }

    /// Identifier of this cluster within a rupture (its first section id).
    pub fn key(&self) -> usize {
        self.sects[0].id
    }

    pub fn total_length_km(&self) -> f64 {
        self.sects.iter().map(|s| s.length_km).sum()
    }

    /// Same sections in reverse order, entered at the new first section.
    pub fn reversed(&self) -> Self {
        let mut sects = self.sects.clone();
        sects.reverse();
        Self {
            parent_id: self.parent_id,
            parent_name: self.parent_name.clone(),
            sects,
            start: 0,
            unique: self.unique.clone(),
        }
    }

    /// Same sections in reverse order, entered at section `start_id`.
    pub fn reversed_from(&self, start_id: usize) -> Result<Self, RuptureError> {
        let mut reversed = self.reversed();
        reversed.start = reversed
            .index_of(start_id)
            .ok_or(RuptureError::SectionNotContained(start_id))?;
        Ok(reversed)
    }

    /// Cluster of the sections in `from..=to` (indices into [`Self::sects`]).
    pub fn sub_range(&self, from: usize, to: usize) -> Result<Self, RuptureError> {
        if from > to || to >= self.sects.len() {
            return Err(RuptureError::SectionNotContained(to));
        }
        Self::new(self.sects[from..=to].to_vec())
    }

    fn section_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.sects.iter().map(|s| s.id)
    }
}

impl PartialEq for FaultSubsectionCluster {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FaultSubsectionCluster {}

impl PartialOrd for FaultSubsectionCluster {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FaultSubsectionCluster {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parent_id
            .cmp(&other.parent_id)
            .then_with(|| self.sects.len().cmp(&other.sects.len()))
            .then_with(|| self.section_ids().cmp(other.section_ids()))
            .then_with(|| self.start.cmp(&other.start))
    }
}

impl fmt::Display for FaultSubsectionCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:", self.parent_id)?;
        for (i, sect) in self.sects.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", sect.id)?;
        }
        write!(f, "]")
    }
}

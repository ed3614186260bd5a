//! The rupture tree: a primary strand of clusters plus nested splays.

mod filter_data;
mod reroot;


use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::cluster::{ClusterRef, FaultSubsectionCluster};
use crate::collaborator::SectionDistanceAzimuthCalculator;
use crate::error::RuptureError;
use crate::jump::Jump;
use crate::navigator::RuptureTreeNavigator;
use crate::section::SectionRef;

pub use filter_data::FilterDataKey;
use filter_data::FilterData;

/// A branch leaving the rupture, with the jump that starts it.
#[derive(Debug, Clone, PartialEq)]
pub struct Splay {
    pub jump: Jump,
    pub rupture: ClusterRupture,
}

/// A candidate rupture.
///
/// Values are immutable: [`ClusterRupture::take`] returns a new rupture that
/// shares every unchanged cluster, jump and splay with its parent, so growth
/// never deep-copies and ruptures can be shared across threads freely.
///
/// # Examples
///
/// ```
/// use rupforge_core::{ClusterRupture, FaultSection, FaultSubsectionCluster, Jump};
///
/// let a = FaultSubsectionCluster::new(
///     (0..3).map(|id| FaultSection::new(id, 1).into_ref()).collect(),
/// ).unwrap().into_ref();
/// let b = FaultSubsectionCluster::new(
///     (10..12).map(|id| FaultSection::new(id, 2).into_ref()).collect(),
/// ).unwrap().into_ref();
///
/// let rupture = ClusterRupture::new(a.clone());
/// let jump = Jump::new(a.last().clone(), a.clone(), b.first().clone(), b.clone(), 2.0);
/// let grown = rupture.take(&jump).unwrap();
///
/// assert_eq!(rupture.total_num_clusters(), 1);
/// assert_eq!(grown.total_num_clusters(), 2);
/// assert!(grown.is_single_strand());
/// assert_eq!(grown.to_string(), "[1:0,1,2]->[2:10,11]");
/// ```
#[derive(Clone)]
pub struct ClusterRupture {
    clusters: Arc<Vec<ClusterRef>>,
    internal_jumps: Arc<Vec<Jump>>,
    splays: Arc<Vec<Splay>>,
    unique: Arc<BTreeSet<usize>>,
    internal_unique: Arc<BTreeSet<usize>>,
    single_strand: bool,
    navigator: Arc<OnceLock<RuptureTreeNavigator>>,
    filter_data: Option<Arc<FilterData>>,
}

impl ClusterRupture {
    /// A single-cluster rupture.
    pub fn new(cluster: ClusterRef) -> Self {
        let unique: BTreeSet<usize> = cluster.unique().clone();
        Self {
            clusters: Arc::new(vec![cluster]),
            internal_jumps: Arc::new(Vec::new()),
            splays: Arc::new(Vec::new()),
            internal_unique: Arc::new(unique.clone()),
            unique: Arc::new(unique),
            single_strand: true,
            navigator: Arc::new(OnceLock::new()),
            filter_data: None,
        }
    }

    /// Builds a single-strand rupture from an ordered section list.
    ///
    /// Consecutive sections on the same parent form one cluster; the jump
    /// distance between clusters is the minimum section-to-section distance.
    pub fn for_ordered_single_strand(
        sections: &[SectionRef],
        dist_calc: &dyn SectionDistanceAzimuthCalculator,
    ) -> Result<Self, RuptureError> {
        let mut groups: Vec<Vec<SectionRef>> = Vec::new();
        for sect in sections {
            match groups.last_mut() {
                Some(group) if group[0].parent_id == sect.parent_id => group.push(sect.clone()),
                _ => groups.push(vec![sect.clone()]),
            }
        }
        let mut clusters = Vec::with_capacity(groups.len());
        for group in groups {
            clusters.push(FaultSubsectionCluster::new(group)?.into_ref());
        }
        let mut iter = clusters.into_iter();
        let first = iter.next().ok_or(RuptureError::EmptyCluster)?;
        let mut rupture = Self::new(first.clone());
        let mut prev = first;
        for cluster in iter {
            let mut distance = f64::INFINITY;
            for a in prev.sects() {
                for b in cluster.sects() {
                    distance = distance.min(dist_calc.distance(a, b));
                }
            }
            let jump = Jump::new(
                prev.last().clone(),
                prev.clone(),
                cluster.first().clone(),
                cluster.clone(),
                distance,
            );
            rupture = rupture.take(&jump)?;
            prev = cluster;
        }
        Ok(rupture)
    }

    /// Returns a new rupture with `jump` appended.
    ///
    /// The jump extends the primary strand when it leaves an end section of
    /// the last primary cluster, starts a new splay when it leaves any other
    /// primary section, and is delegated to the owning splay otherwise.
    pub fn take(&self, jump: &Jump) -> Result<Self, RuptureError> {
        let from = jump.from_section.id;
        let to = jump.to_section.id;
        let invalid = |reason| RuptureError::InvalidJump { from, to, reason };
        if !self.unique.contains(&from) {
            return Err(invalid("from-section is not in the rupture"));
        }
        if self.unique.contains(&to) {
            return Err(invalid("to-section is already in the rupture"));
        }
        if jump.to_cluster.start_sect().id != to {
            return Err(invalid("to-section is not the start of the to-cluster"));
        }
        if let Some(dup) = jump
            .to_cluster
            .unique()
            .iter()
            .find(|id| self.unique.contains(id))
        {
            return Err(RuptureError::DuplicateSection(*dup));
        }

        let mut unique = (*self.unique).clone();
        unique.extend(jump.to_cluster.unique().iter().copied());

        let mut next = if self.internal_unique.contains(&from) {
            let last = &self.clusters[self.clusters.len() - 1];
            if last.contains(from) && last.is_end_sect(from) {
                let mut clusters = (*self.clusters).clone();
                clusters.push(jump.to_cluster.clone());
                let mut internal_jumps = (*self.internal_jumps).clone();
                internal_jumps.push(jump.clone());
                let mut internal_unique = (*self.internal_unique).clone();
                internal_unique.extend(jump.to_cluster.unique().iter().copied());
                let single_strand = self.single_strand
                    && last.start_index() == 0
                    && from == last.last().id
                    && jump.to_cluster.start_index() == 0;
                Self {
                    clusters: Arc::new(clusters),
                    internal_jumps: Arc::new(internal_jumps),
                    splays: self.splays.clone(),
                    unique: Arc::new(unique),
                    internal_unique: Arc::new(internal_unique),
                    single_strand,
                    navigator: Arc::new(OnceLock::new()),
                    filter_data: None,
                }
            } else {
                let mut splays = (*self.splays).clone();
                splays.push(Splay {
                    jump: jump.clone(),
                    rupture: Self::new(jump.to_cluster.clone()),
                });
                self.with_splays(splays, unique)
            }
        } else {
            let index = self
                .splays
                .iter()
                .position(|s| s.rupture.contains(from))
                .ok_or(RuptureError::SectionNotContained(from))?;
            let mut splays = (*self.splays).clone();
            let grown = splays[index].rupture.take(jump)?;
            splays[index].rupture = grown;
            self.with_splays(splays, unique)
        };
        next.filter_data = self.filter_data.as_ref().map(|d| Arc::new(d.snapshot()));
        Ok(next)
    }

    fn with_splays(&self, splays: Vec<Splay>, unique: BTreeSet<usize>) -> Self {
        Self {
            clusters: self.clusters.clone(),
            internal_jumps: self.internal_jumps.clone(),
            splays: Arc::new(splays),
            unique: Arc::new(unique),
            internal_unique: self.internal_unique.clone(),
            single_strand: false,
            navigator: Arc::new(OnceLock::new()),
            filter_data: None,
        }
    }

    /// Clusters of the primary strand.
    pub fn clusters(&self) -> &[ClusterRef] {
        &self.clusters
    }

    /// Jumps between consecutive primary clusters.
    pub fn internal_jumps(&self) -> &[Jump] {
        &self.internal_jumps
    }

    pub fn splays(&self) -> &[Splay] {
        &self.splays
    }

    pub fn is_single_strand(&self) -> bool {
        self.single_strand
    }

    /// Ids of every section in the rupture, splays included.
    pub fn unique(&self) -> &BTreeSet<usize> {
        &self.unique
    }

    pub fn contains(&self, section_id: usize) -> bool {
        self.unique.contains(&section_id)
    }

    /// Returns true if the section lies on the primary strand.
    pub fn contains_internal(&self, section_id: usize) -> bool {
        self.internal_unique.contains(&section_id)
    }

    pub fn first_cluster(&self) -> &ClusterRef {
        &self.clusters[0]
    }

    pub fn last_cluster(&self) -> &ClusterRef {
        &self.clusters[self.clusters.len() - 1]
    }

    pub fn total_num_sects(&self) -> usize {
        self.unique.len()
    }

    pub fn total_num_jumps(&self) -> usize {
        self.internal_jumps.len()
            + self
                .splays
                .iter()
                .map(|s| 1 + s.rupture.total_num_jumps())
                .sum::<usize>()
    }

    pub fn total_num_clusters(&self) -> usize {
        self.clusters.len()
            + self
                .splays
                .iter()
                .map(|s| s.rupture.total_num_clusters())
                .sum::<usize>()
    }

    pub fn total_num_splays(&self) -> usize {
        self.splays.len()
            + self
                .splays
                .iter()
                .map(|s| s.rupture.total_num_splays())
                .sum::<usize>()
    }

    /// Every cluster: the primary strand, then each splay recursively.
    pub fn all_clusters(&self) -> Vec<&ClusterRef> {
        let mut out = Vec::with_capacity(self.total_num_clusters());
        self.collect_clusters(&mut out);
        out
    }

    fn collect_clusters<'a>(&'a self, out: &mut Vec<&'a ClusterRef>) {
        out.extend(self.clusters.iter());
        for splay in self.splays.iter() {
            splay.rupture.collect_clusters(out);
        }
    }

    /// Every jump: internal jumps, then each splay jump followed by the
    /// jumps of that splay.
    pub fn all_jumps(&self) -> Vec<&Jump> {
        let mut out = Vec::with_capacity(self.total_num_jumps());
        self.collect_jumps(&mut out);
        out
    }

    fn collect_jumps<'a>(&'a self, out: &mut Vec<&'a Jump>) {
        out.extend(self.internal_jumps.iter());
        for splay in self.splays.iter() {
            out.push(&splay.jump);
            splay.rupture.collect_jumps(out);
        }
    }

    /// This rupture and every nested splay, each viewed as one strand.
    pub fn strands(&self) -> Vec<&ClusterRupture> {
        let mut out = vec![self];
        for splay in self.splays.iter() {
            out.extend(splay.rupture.strands());
        }
        out
    }

    /// Every section in cluster traversal order.
    pub fn all_sections(&self) -> Vec<&SectionRef> {
        self.all_clusters()
            .into_iter()
            .flat_map(|c| c.sects().iter())
            .collect()
    }

    /// Sections in primary strand order, with each splay's sections
    /// inserted directly after the section it branches from.
    pub fn build_ordered_section_list(&self) -> Vec<SectionRef> {
        let mut out = Vec::with_capacity(self.total_num_sects());
        for cluster in self.clusters.iter() {
            for sect in cluster.sects() {
                out.push(sect.clone());
                for splay in self.splays.iter() {
                    if splay.jump.from_section.id == sect.id {
                        out.extend(splay.rupture.build_ordered_section_list());
                    }
                }
            }
        }
        out
    }

    /// Single-strand rupture traversed from its last section back to its first.
    pub fn reversed(&self) -> Result<Self, RuptureError> {
        if !self.single_strand {
            return Err(RuptureError::NotSingleStrand);
        }
        let n = self.clusters.len();
        let mut current: ClusterRef = Arc::new(self.clusters[n - 1].reversed());
        let mut rupture = Self::new(current.clone());
        for i in (1..n).rev() {
            let original = &self.internal_jumps[i - 1];
            let to: ClusterRef =
                Arc::new(self.clusters[i - 1].reversed_from(original.from_section.id)?);
            let jump = Jump::new(
                original.to_section.clone(),
                current,
                original.from_section.clone(),
                to.clone(),
                original.distance,
            );
            rupture = rupture.take(&jump)?;
            current = to;
        }
        Ok(rupture)
    }

    /// The adjacency view of this rupture, built on first use.
    pub fn navigator(&self) -> &RuptureTreeNavigator {
        self.navigator
            .get_or_init(|| RuptureTreeNavigator::new(self))
    }
}

impl PartialEq for ClusterRupture {
    fn eq(&self, other: &Self) -> bool {
        self.clusters == other.clusters
            && self.internal_jumps == other.internal_jumps
            && self.splays == other.splays
    }
}

impl fmt::Debug for ClusterRupture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClusterRupture({})", self)
    }
}

impl fmt::Display for ClusterRupture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cluster) in self.clusters.iter().enumerate() {
            if i > 0 {
                write!(f, "->")?;
            }
            write!(f, "{}", cluster)?;
        }
        for splay in self.splays.iter() {
            let nested = splay.rupture.to_string().replace('\n', "\n\t");
            write!(
                f,
                "\n\t--splay from [{}:{}]: {}",
                splay.jump.from_section.parent_id,
                splay.jump.from_section.id,
                nested
            )?;
        }
        Ok(())
    }
}

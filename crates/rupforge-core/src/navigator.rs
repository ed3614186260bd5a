//! Predecessor/descendant adjacency over a rupture tree.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::cluster::{ClusterRef, FaultSubsectionCluster};
use crate::jump::Jump;
use crate::rupture::ClusterRupture;
use crate::section::{FaultSection, SectionRef};

/// Read-only adjacency view of a [`ClusterRupture`].
///
/// Sections are linked along each cluster away from the cluster's start
/// section, and across every jump. Clusters are indexed in the order of
/// [`ClusterRupture::all_clusters`]. Obtain one through
/// [`ClusterRupture::navigator`], which caches it.
#[derive(Debug, Default)]
pub struct RuptureTreeNavigator {
    clusters: Vec<ClusterRef>,
    cluster_index: HashMap<usize, usize>,
    section_cluster: HashMap<usize, usize>,
    cluster_predecessor: Vec<Option<usize>>,
    cluster_descendants: Vec<SmallVec<[usize; 2]>>,
    jump_into: Vec<Option<Jump>>,
    sect_predecessor: HashMap<usize, SectionRef>,
    sect_descendants: HashMap<usize, SmallVec<[SectionRef; 2]>>,
}

impl RuptureTreeNavigator {
    pub fn new(rupture: &ClusterRupture) -> Self {
        let mut nav = Self::default();
        nav.add_strand(rupture, None);
        nav
    }

    fn add_strand(&mut self, strand: &ClusterRupture, entry: Option<&Jump>) {
        for (i, cluster) in strand.clusters().iter().enumerate() {
            let index = self.clusters.len();
            self.clusters.push(cluster.clone());
            self.cluster_index.insert(cluster.key(), index);
            self.cluster_predecessor.push(None);
            self.cluster_descendants.push(SmallVec::new());
            self.jump_into.push(None);
            for sect in cluster.sects() {
                self.section_cluster.insert(sect.id, index);
            }

            let jump = if i == 0 {
                entry
            } else {
                strand.internal_jumps().get(i - 1)
            };
            if let Some(jump) = jump {
                if let Some(&from) = self.section_cluster.get(&jump.from_section.id) {
                    self.cluster_predecessor[index] = Some(from);
                    self.cluster_descendants[from].push(index);
                }
                self.jump_into[index] = Some(jump.clone());
                self.link(&jump.from_section, &jump.to_section);
            }

            let sects = cluster.sects();
            let start = cluster.start_index();
            for k in start + 1..sects.len() {
                self.link(&sects[k - 1], &sects[k]);
            }
            for k in (0..start).rev() {
                self.link(&sects[k + 1], &sects[k]);
            }
        }
        for splay in strand.splays() {
            self.add_strand(&splay.rupture, Some(&splay.jump));
        }
    }

    fn link(&mut self, from: &SectionRef, to: &SectionRef) {
        self.sect_predecessor.insert(to.id, from.clone());
        self.sect_descendants
            .entry(from.id)
            .or_default()
            .push(to.clone());
    }

    /// Tree parent of a section, `None` for the rupture's start section.
    pub fn predecessor(&self, sect: &FaultSection) -> Option<&SectionRef> {
        self.sect_predecessor.get(&sect.id)
    }

    /// Tree children of a section; more than one only at a splay branch.
    pub fn descendants(&self, sect: &FaultSection) -> &[SectionRef] {
        self.sect_descendants
            .get(&sect.id)
            .map(|d| d.as_slice())
            .unwrap_or(&[])
    }

    pub fn predecessor_cluster(&self, cluster: &FaultSubsectionCluster) -> Option<&ClusterRef> {
        self.index_of(cluster)
            .and_then(|i| self.cluster_predecessor[i])
            .map(|p| &self.clusters[p])
    }

    pub fn descendant_clusters(&self, cluster: &FaultSubsectionCluster) -> Vec<&ClusterRef> {
        self.index_of(cluster)
            .map(|i| {
                self.cluster_descendants[i]
                    .iter()
                    .map(|&d| &self.clusters[d])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The jump connecting two adjacent clusters, in that direction.
    pub fn jump(&self, from: &FaultSubsectionCluster, to: &FaultSubsectionCluster) -> Option<&Jump> {
        let from = self.index_of(from)?;
        let to = self.index_of(to)?;
        if self.cluster_predecessor[to] == Some(from) {
            self.jump_into[to].as_ref()
        } else {
            None
        }
    }

    /// The jump between two sections, in that direction.
    pub fn jump_between(&self, from_sect: usize, to_sect: usize) -> Option<&Jump> {
        let to = *self.section_cluster.get(&to_sect)?;
        self.jump_into[to]
            .as_ref()
            .filter(|j| j.from_section.id == from_sect && j.to_section.id == to_sect)
    }

    /// The jump entering a cluster, `None` for the root cluster.
    pub fn jump_into(&self, cluster: &FaultSubsectionCluster) -> Option<&Jump> {
        self.index_of(cluster)
            .and_then(|i| self.jump_into[i].as_ref())
    }

    /// The cluster that contains a section.
    pub fn cluster_of(&self, section_id: usize) -> Option<&ClusterRef> {
        self.section_cluster
            .get(&section_id)
            .map(|&i| &self.clusters[i])
    }

    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    pub fn clusters(&self) -> &[ClusterRef] {
        &self.clusters
    }

    pub fn index_of(&self, cluster: &FaultSubsectionCluster) -> Option<usize> {
        self.cluster_index.get(&cluster.key()).copied()
    }

    pub fn cluster_at(&self, index: usize) -> &ClusterRef {
        &self.clusters[index]
    }

    pub fn predecessor_index(&self, index: usize) -> Option<usize> {
        self.cluster_predecessor[index]
    }

    pub fn descendant_indices(&self, index: usize) -> &[usize] {
        &self.cluster_descendants[index]
    }

    pub fn jump_into_index(&self, index: usize) -> Option<&Jump> {
        self.jump_into[index].as_ref()
    }
}

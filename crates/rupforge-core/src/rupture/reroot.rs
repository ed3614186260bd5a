//! Re-growing a rupture from a different starting cluster.

use std::collections::VecDeque;
use std::sync::Arc;

use super::ClusterRupture;
use crate::cluster::{ClusterRef, FaultSubsectionCluster};
use crate::error::RuptureError;
use crate::jump::Jump;

impl ClusterRupture {
    /// The same sections and jumps grown outward from `root`.
    ///
    /// Descendant clusters keep their orientation. Each predecessor cluster is
    /// reversed and entered at the section its original jump left from, so the
    /// resulting tree covers exactly the same sections with the same jump
    /// distances. When `reverse_root` is set the root cluster is reversed too.
    pub fn rerooted(
        &self,
        root: &FaultSubsectionCluster,
        reverse_root: bool,
    ) -> Result<Self, RuptureError> {
        let nav = self.navigator();
        let root_index = nav
            .index_of(root)
            .ok_or(RuptureError::UnknownCluster(root.key()))?;
        let new_root: ClusterRef = if reverse_root {
            Arc::new(nav.cluster_at(root_index).reversed())
        } else {
            nav.cluster_at(root_index).clone()
        };

        let mut rupture = ClusterRupture::new(new_root.clone());
        let mut queue = VecDeque::from([(root_index, new_root, None::<usize>)]);
        while let Some((index, cluster, came_from)) = queue.pop_front() {
            for &child in nav.descendant_indices(index) {
                if Some(child) == came_from {
                    continue;
                }
                let original = nav
                    .jump_into_index(child)
                    .ok_or(RuptureError::UnknownCluster(nav.cluster_at(child).key()))?;
                let to = nav.cluster_at(child).clone();
                let jump = Jump::new(
                    original.from_section.clone(),
                    cluster.clone(),
                    original.to_section.clone(),
                    to.clone(),
                    original.distance,
                );
                rupture = rupture.take(&jump)?;
                queue.push_back((child, to, Some(index)));
            }
            if let Some(parent) = nav.predecessor_index(index) {
                if Some(parent) == came_from {
                    continue;
                }
                let original = nav
                    .jump_into_index(index)
                    .ok_or(RuptureError::UnknownCluster(cluster.key()))?;
                let to: ClusterRef = Arc::new(
                    nav.cluster_at(parent)
                        .reversed_from(original.from_section.id)?,
                );
                let jump = Jump::new(
                    original.to_section.clone(),
                    cluster.clone(),
                    original.from_section.clone(),
                    to.clone(),
                    original.distance,
                );
                rupture = rupture.take(&jump)?;
                queue.push_back((parent, to, Some(index)));
            }
        }
        Ok(rupture)
    }

    /// Every other tree shape covering the same sections and jumps.
    ///
    /// Each cluster is tried as the root, and clusters with more than one
    /// section are also tried reversed. Shapes needing more than
    /// `max_splays` splays are skipped.
    pub fn alternative_representations(&self, max_splays: usize) -> Result<Vec<Self>, RuptureError> {
        let mut alternatives = Vec::new();
        let first_key = self.first_cluster().key();
        for cluster in self.all_clusters() {
            for reverse in [false, true] {
                if reverse && cluster.len() < 2 {
                    continue;
                }
                if !reverse && cluster.key() == first_key {
                    continue;
                }
                let alternative = self.rerooted(cluster, reverse)?;
                if alternative.total_num_splays() <= max_splays {
                    alternatives.push(alternative);
                }
            }
        }
        Ok(alternatives)
    }
}

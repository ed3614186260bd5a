//! Connection strategy over an explicit jump list.

use std::collections::{BTreeMap, HashSet};

use rupforge_core::{ClusterRef, ConnectionStrategy, Jump};

#[derive(Debug, Clone, Default)]
pub struct FixedConnectionStrategy {
    clusters: BTreeMap<u32, ClusterRef>,
    jumps: BTreeMap<u32, Vec<Jump>>,
    connected: HashSet<(u32, u32)>,
}

impl FixedConnectionStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cluster(&mut self, cluster: ClusterRef) {
        self.clusters.insert(cluster.parent_id(), cluster);
    }

    pub fn add_jump(&mut self, jump: Jump) {
        let from = jump.from_section.parent_id;
        let to = jump.to_section.parent_id;
        self.connected.insert((from.min(to), from.max(to)));
        self.jumps.entry(from).or_default().push(jump);
    }
}

impl ConnectionStrategy for FixedConnectionStrategy {
    fn are_parents_connected(&self, parent1: u32, parent2: u32) -> bool {
        self.connected
            .contains(&(parent1.min(parent2), parent1.max(parent2)))
    }

    fn jumps_from_parent(&self, parent_id: u32) -> Vec<Jump> {
        self.jumps.get(&parent_id).cloned().unwrap_or_default()
    }

    fn full_cluster(&self, parent_id: u32) -> Option<ClusterRef> {
        self.clusters.get(&parent_id).cloned()
    }
}

//! Synthetic fault networks made of straight, evenly divided faults.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Range;
use std::sync::Arc;

use rupforge_core::{
    ClusterRef, ClusterRupture, FaultSection, FaultSubsectionCluster, Jump,
    SectionDistanceAzimuthCalculator, SectionRef,
};

use crate::connection::FixedConnectionStrategy;
use crate::geometry::PlanarDistAzCalc;

/// Section length used by [`FaultNetwork::add_fault`], in km.
pub const SECT_LEN_KM: f64 = 5.0;

/// Section down-dip width used by [`FaultNetwork::add_fault`], in km.
pub const SECT_WIDTH_KM: f64 = 10.0;

/// A set of straight parent faults laid out on a plane.
///
/// Section `i` of parent `p` has id `p * 100 + i` and sits at the midpoint
/// of its 5 km segment, so distances and azimuths are easy to reason about.
#[derive(Debug, Clone, Default)]
pub struct FaultNetwork {
    faults: BTreeMap<u32, Vec<SectionRef>>,
    positions: HashMap<usize, (f64, f64)>,
    connections: BTreeSet<(u32, u32)>,
}

impl FaultNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertical strike-slip fault starting at `origin` (km east, km
    /// north) and running along `azimuth` degrees.
    pub fn add_fault(
        &mut self,
        parent_id: u32,
        num_sects: usize,
        origin: (f64, f64),
        azimuth: f64,
    ) -> Vec<SectionRef> {
        self.add_fault_with(parent_id, num_sects, origin, azimuth, |s| s)
    }

    /// Like [`Self::add_fault`], letting `customize` adjust every section.
    pub fn add_fault_with(
        &mut self,
        parent_id: u32,
        num_sects: usize,
        origin: (f64, f64),
        azimuth: f64,
        customize: impl Fn(FaultSection) -> FaultSection,
    ) -> Vec<SectionRef> {
        let (sin, cos) = azimuth.to_radians().sin_cos();
        let sects: Vec<SectionRef> = (0..num_sects)
            .map(|i| {
                let id = parent_id as usize * 100 + i;
                let along = (i as f64 + 0.5) * SECT_LEN_KM;
                self.positions
                    .insert(id, (origin.0 + along * sin, origin.1 + along * cos));
                let base = FaultSection::new(id, parent_id)
                    .with_parent_name(format!("Fault {}", parent_id))
                    .with_rake(180.0)
                    .with_dimensions(SECT_LEN_KM, SECT_WIDTH_KM)
                    .with_slip_rate(1.0)
                    .with_index_along_parent(i as u32);
                Arc::new(customize(base))
            })
            .collect();
        self.faults.insert(parent_id, sects.clone());
        sects
    }

    /// Declares that a direct jump between two parents is possible.
    pub fn connect(&mut self, parent_a: u32, parent_b: u32) {
        self.connections.insert((parent_a.min(parent_b), parent_a.max(parent_b)));
    }

    pub fn sections(&self, parent_id: u32) -> &[SectionRef] {
        &self.faults[&parent_id]
    }

    pub fn section(&self, parent_id: u32, index: usize) -> SectionRef {
        self.faults[&parent_id][index].clone()
    }

    /// Cluster of every section on a parent.
    pub fn full_cluster(&self, parent_id: u32) -> ClusterRef {
        self.cluster(parent_id, 0..self.faults[&parent_id].len())
    }

    /// Cluster of the sections at `range` (indices along the parent).
    pub fn cluster(&self, parent_id: u32, range: Range<usize>) -> ClusterRef {
        let sects = self.faults[&parent_id][range].to_vec();
        Arc::new(FaultSubsectionCluster::new(sects).unwrap())
    }

    /// Cluster of the sections at `range`, traversed in reverse.
    pub fn reversed_cluster(&self, parent_id: u32, range: Range<usize>) -> ClusterRef {
        Arc::new(self.cluster(parent_id, range).reversed())
    }

    /// Jump from the last section of `from` to the start of `to`.
    pub fn jump(&self, from: &ClusterRef, to: &ClusterRef) -> Jump {
        self.jump_from(from, from.last().id, to)
    }

    /// Jump from section `from_sect` of `from` to the start of `to`.
    pub fn jump_from(&self, from: &ClusterRef, from_sect: usize, to: &ClusterRef) -> Jump {
        let index = from.index_of(from_sect).unwrap();
        let from_section = from.sects()[index].clone();
        let to_section = to.start_sect().clone();
        let distance = self.calc().distance(&from_section, &to_section);
        Jump::new(from_section, from.clone(), to_section, to.clone(), distance)
    }

    /// Single-strand rupture over `(parent, index range)` clusters, each
    /// jump leaving the last section of the previous cluster.
    pub fn strand(&self, clusters: &[(u32, Range<usize>)]) -> ClusterRupture {
        let clusters: Vec<ClusterRef> = clusters
            .iter()
            .map(|(parent, range)| self.cluster(*parent, range.clone()))
            .collect();
        self.strand_of(&clusters)
    }

    /// Single-strand rupture over already built clusters.
    pub fn strand_of(&self, clusters: &[ClusterRef]) -> ClusterRupture {
        let mut rupture = ClusterRupture::new(clusters[0].clone());
        for pair in clusters.windows(2) {
            rupture = rupture.take(&self.jump(&pair[0], &pair[1])).unwrap();
        }
        rupture
    }

    pub fn calc(&self) -> PlanarDistAzCalc {
        PlanarDistAzCalc::new(self.positions.clone())
    }

    /// Connection strategy over the declared connections, with one jump per
    /// direction between the closest pair of sections.
    pub fn connection_strategy(&self) -> FixedConnectionStrategy {
        let calc = self.calc();
        let mut strategy = FixedConnectionStrategy::new();
        for &parent in self.faults.keys() {
            strategy.add_cluster(self.full_cluster(parent));
        }
        for &(a, b) in &self.connections {
            let ca = self.full_cluster(a);
            let cb = self.full_cluster(b);
            let mut best: Option<(f64, SectionRef, SectionRef)> = None;
            for sa in ca.sects() {
                for sb in cb.sects() {
                    let d = calc.distance(sa, sb);
                    if best.as_ref().map_or(true, |(bd, _, _)| d < *bd) {
                        best = Some((d, sa.clone(), sb.clone()));
                    }
                }
            }
            let (distance, sa, sb) = best.unwrap();
            let forward = Jump::new(sa, ca, sb, cb, distance);
            strategy.add_jump(forward.reverse());
            strategy.add_jump(forward);
        }
        strategy
    }
}

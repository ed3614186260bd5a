//! Small builders shared by this crate's unit tests.

use std::ops::Range;
use std::sync::Arc;

use crate::{ClusterRef, FaultSection, FaultSubsectionCluster, Jump, SectionRef};

pub(crate) fn sects(parent: u32, ids: Range<usize>) -> Vec<SectionRef> {
    ids.map(|id| FaultSection::new(id, parent).into_ref())
        .collect()
}

pub(crate) fn cluster(parent: u32, ids: Range<usize>) -> ClusterRef {
    Arc::new(FaultSubsectionCluster::new(sects(parent, ids)).unwrap())
}

pub(crate) fn section(cluster: &ClusterRef, id: usize) -> SectionRef {
    let index = cluster.index_of(id).unwrap();
    cluster.sects()[index].clone()
}

pub(crate) fn jump(
    from: &ClusterRef,
    from_id: usize,
    to: &ClusterRef,
    to_id: usize,
    distance: f64,
) -> Jump {
    Jump::new(
        section(from, from_id),
        from.clone(),
        section(to, to_id),
        to.clone(),
        distance,
    )
}

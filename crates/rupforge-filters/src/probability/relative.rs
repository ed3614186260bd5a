//! Probabilities relative to the alternatives available at each jump.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use rupforge_config::{ConfigError, ProbabilityCalcConfig};
use rupforge_core::{
    AggregatedStiffnessCalculator, ClusterRupture, Collaborators, ConnectionStrategy, Jump,
    PlausibilityError, Result, SectionRef,
};

/// The quantity compared between the jump taken and its alternatives.
#[derive(Clone)]
pub enum RelativeQuantity {
    /// Mean slip rate of the target sections.
    SlipRate { only_at_increases: bool },
    /// Stress imparted onto the target sections.
    Coulomb {
        stiffness: Arc<dyn AggregatedStiffnessCalculator>,
        /// Use every section reached before the jump as the source instead
        /// of the from-cluster alone.
        full_rupture_source: bool,
    },
}

/// Probability of a jump as its value divided by the sum (or maximum) of
/// the values of every path the rupture could have taken at that section.
///
/// Alternatives are continuing along the from-parent in either direction
/// past the from-section, and every other candidate jump leaving the
/// from-section for a different parent. A jump whose own value is negative
/// has probability zero unless negative values are allowed.
#[derive(Clone)]
pub struct RelativeProb {
    quantity: RelativeQuantity,
    connection_strategy: Arc<dyn ConnectionStrategy>,
    allow_negative: bool,
    relative_to_best: bool,
}

impl RelativeProb {
    pub fn new(
        config: &ProbabilityCalcConfig,
        collaborators: &Collaborators,
    ) -> std::result::Result<Self, ConfigError> {
        let connection_strategy = collaborators.connection_strategy.clone().ok_or_else(|| {
            ConfigError::Invalid("relative probability requires a connection strategy".to_string())
        })?;
        match config {
            ProbabilityCalcConfig::RelativeSlipRateProb { only_at_increases } => Ok(Self {
                quantity: RelativeQuantity::SlipRate {
                    only_at_increases: *only_at_increases,
                },
                connection_strategy,
                allow_negative: false,
                relative_to_best: true,
            }),
            ProbabilityCalcConfig::RelativeCoulombProb {
                full_rupture_source,
                allow_negative,
                relative_to_best,
            } => {
                let stiffness = collaborators.stiffness.clone().ok_or_else(|| {
                    ConfigError::Invalid(
                        "relative Coulomb probability requires a stiffness calculator".to_string(),
                    )
                })?;
                Ok(Self {
                    quantity: RelativeQuantity::Coulomb {
                        stiffness,
                        full_rupture_source: *full_rupture_source,
                    },
                    connection_strategy,
                    allow_negative: *allow_negative,
                    relative_to_best: *relative_to_best,
                })
            }
            other => Err(ConfigError::Invalid(format!(
                "{:?} is not a relative probability model",
                other
            ))),
        }
    }

    pub fn name(&self) -> String {
        match &self.quantity {
            RelativeQuantity::SlipRate { only_at_increases } => {
                if *only_at_increases {
                    "Rel Slip Rate (increases)".to_string()
                } else {
                    "Rel Slip Rate".to_string()
                }
            }
            RelativeQuantity::Coulomb {
                full_rupture_source,
                ..
            } => {
                let mut name = "Rel CFF".to_string();
                if *full_rupture_source {
                    name.push_str(", Full Rup Src");
                }
                if self.allow_negative {
                    name.push_str(", Allow Neg");
                }
                if self.relative_to_best {
                    name.push_str(", Rel Best");
                }
                name
            }
        }
    }

    pub fn to_config(&self) -> ProbabilityCalcConfig {
        match &self.quantity {
            RelativeQuantity::SlipRate { only_at_increases } => {
                ProbabilityCalcConfig::RelativeSlipRateProb {
                    only_at_increases: *only_at_increases,
                }
            }
            RelativeQuantity::Coulomb {
                full_rupture_source,
                ..
            } => ProbabilityCalcConfig::RelativeCoulombProb {
                full_rupture_source: *full_rupture_source,
                allow_negative: self.allow_negative,
                relative_to_best: self.relative_to_best,
            },
        }
    }

    /// Jumps that contribute to the rupture probability, `None` when the
    /// rupture probability is 1 regardless of the jumps.
    pub(crate) fn jumps_to_score<'a>(&self, rupture: &'a ClusterRupture) -> Option<Vec<&'a Jump>> {
        let only_at_increases = matches!(
            self.quantity,
            RelativeQuantity::SlipRate {
                only_at_increases: true
            }
        );
        if !only_at_increases {
            return Some(rupture.all_jumps());
        }
        let total = rupture.total_num_clusters();
        if total == 1 {
            return None;
        }
        // clusters in a non-increasing run at the end of a strand are not
        // scored; the rupture could still grow into a higher rate fault
        let nav = rupture.navigator();
        let mut skip_to: HashSet<usize> = HashSet::new();
        for strand in rupture.strands() {
            let mut cluster = strand.last_cluster();
            while let Some(pred) = nav.predecessor_cluster(cluster) {
                if mean_slip_rate(pred.sects()) >= mean_slip_rate(cluster.sects()) {
                    skip_to.insert(cluster.key());
                    cluster = pred;
                } else {
                    break;
                }
            }
        }
        if skip_to.len() == total - 1 {
            return None;
        }
        Some(
            rupture
                .all_jumps()
                .into_iter()
                .filter(|jump| !skip_to.contains(&jump.to_cluster.key()))
                .collect(),
        )
    }

    /// Probability of `jump` relative to its alternatives.
    pub fn jump_probability(&self, rupture: &ClusterRupture, jump: &Jump) -> Result<f64> {
        let sources = self.sources(rupture, jump);
        let my_val = self.value(&sources, jump.to_cluster.sects());
        if !self.allow_negative && my_val < 0.0 {
            return Ok(0.0);
        }

        let mut norm = my_val.min(0.0);
        let mut others = Vec::new();
        for target in self.alternatives(jump)? {
            let val = self.value(&sources, &target);
            if val < 0.0 {
                if !(self.allow_negative && my_val < 0.0) {
                    continue;
                }
                norm = norm.min(val);
            }
            others.push(val);
        }
        if others.is_empty() {
            return Ok(1.0);
        }

        let my_val = my_val - norm;
        let divisor = if self.relative_to_best {
            others.iter().map(|v| v - norm).fold(my_val, f64::max)
        } else {
            others.iter().map(|v| v - norm).sum::<f64>() + my_val
        };
        if (divisor as f32) < 0.0 {
            return Err(PlausibilityError::Inconsistent(format!(
                "{}: negative divisor {} at jump {}",
                self.name(),
                divisor,
                jump
            )));
        }
        if divisor as f32 == 0.0 {
            return Ok(0.0);
        }
        let prob = my_val / divisor;
        super::check_probability(&self.name(), prob)
    }

    fn value(&self, sources: &[SectionRef], targets: &[SectionRef]) -> f64 {
        match &self.quantity {
            RelativeQuantity::SlipRate { .. } => mean_slip_rate(targets),
            RelativeQuantity::Coulomb { stiffness, .. } => stiffness.calc(sources, targets),
        }
    }

    fn sources(&self, rupture: &ClusterRupture, jump: &Jump) -> Vec<SectionRef> {
        match &self.quantity {
            RelativeQuantity::Coulomb {
                full_rupture_source: true,
                ..
            } => sections_before(rupture, jump),
            _ => jump.from_cluster.sects().to_vec(),
        }
    }

    /// Section lists of every target the rupture could have taken instead.
    ///
    /// Same-parent continuations stop only at sections of the from-cluster,
    /// and candidates into faults the rupture already visits still count.
    fn alternatives(&self, jump: &Jump) -> Result<Vec<Vec<SectionRef>>> {
        let from_parent = jump.from_cluster.parent_id();
        let full_from = self
            .connection_strategy
            .full_cluster(from_parent)
            .ok_or_else(|| {
                PlausibilityError::Inconsistent(format!("no full cluster for parent {}", from_parent))
            })?;

        let mut alternatives = Vec::new();
        let at_parent_end = full_from
            .end_sects()
            .iter()
            .any(|s| s.id == jump.from_section.id);
        if full_from.len() > jump.from_cluster.len() && !at_parent_end {
            let index = full_from.index_of(jump.from_section.id).ok_or_else(|| {
                PlausibilityError::Inconsistent(format!(
                    "section {} not in full cluster of parent {}",
                    jump.from_section.id, from_parent
                ))
            })?;
            let sects = full_from.sects();
            let outside_from = |s: &&SectionRef| !jump.from_cluster.contains(s.id);
            let forward: Vec<SectionRef> = sects[index + 1..]
                .iter()
                .take_while(outside_from)
                .cloned()
                .collect();
            let backward: Vec<SectionRef> = sects[..index]
                .iter()
                .rev()
                .take_while(outside_from)
                .cloned()
                .collect();
            alternatives.extend([forward, backward].into_iter().filter(|a| !a.is_empty()));
        }

        let to_parent = jump.to_cluster.parent_id();
        for candidate in self.connection_strategy.jumps_from_parent(from_parent) {
            if candidate.from_section.id != jump.from_section.id
                || candidate.to_cluster.parent_id() == to_parent
            {
                continue;
            }
            alternatives.push(candidate.to_cluster.sects().to_vec());
        }
        Ok(alternatives)
    }
}

impl fmt::Debug for RelativeProb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelativeProb")
            .field("name", &self.name())
            .finish()
    }
}

fn mean_slip_rate(sects: &[SectionRef]) -> f64 {
    if sects.is_empty() {
        return 0.0;
    }
    sects.iter().map(|s| s.slip_rate).sum::<f64>() / sects.len() as f64
}

/// Sections reached before `jump`: the strand up to the jump's to-cluster,
/// plus every splay other than the one the jump starts.
fn sections_before(rupture: &ClusterRupture, jump: &Jump) -> Vec<SectionRef> {
    let mut out = Vec::new();
    for cluster in rupture.clusters() {
        if cluster.as_ref() == jump.to_cluster.as_ref() {
            break;
        }
        out.extend(cluster.sects().iter().cloned());
    }
    for splay in rupture.splays() {
        if splay.jump != *jump {
            out.extend(sections_before(&splay.rupture, jump));
        }
    }
    out
}

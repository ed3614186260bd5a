use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use rupforge_config::{ConfigError, NucleationEvaluatorConfig};
use rupforge_core::{
    AggregatedStiffnessCalculator, ClusterRef, ClusterRupture, FaultSubsectionCluster,
    PlausibilityError, PlausibilityResult, Result, RuptureTreeNavigator,
    SectionDistanceAzimuthCalculator, SectionRef,
};
use tracing::trace;

use super::{next_clusters, oriented_jump, NucleationEvaluator};
use crate::filter::{format_num, EvalMode, ScalarRange};

/// Like [`super::ClusterCoulombPathEvaluator`], but each destination
/// cluster is added one section at a time, spreading both ways from the
/// section the path jumped to.
///
/// With `jump_to_most_favorable` the path may enter a destination cluster
/// at any section within `max_jump_dist` of the cluster it leaves (or the
/// actual jump distance, if larger), picking the one receiving the most
/// stress.
#[derive(Clone)]
pub struct SectCoulombPathEvaluator {
    stiffness: Arc<dyn AggregatedStiffnessCalculator>,
    dist_az_calc: Option<Arc<dyn SectionDistanceAzimuthCalculator>>,
    threshold: f64,
    fail_future_possible: bool,
    jump_to_most_favorable: bool,
    max_jump_dist: f64,
}

impl SectCoulombPathEvaluator {
    pub fn new(
        stiffness: Arc<dyn AggregatedStiffnessCalculator>,
        dist_az_calc: Option<Arc<dyn SectionDistanceAzimuthCalculator>>,
        threshold: f64,
        fail_future_possible: bool,
        jump_to_most_favorable: bool,
        max_jump_dist: f64,
    ) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::finite("threshold", threshold)?;
        rupforge_config::validate::positive("max_jump_dist", max_jump_dist)?;
        if jump_to_most_favorable && dist_az_calc.is_none() {
            return Err(ConfigError::Invalid(
                "jumping to the most favorable section requires a distance calculator".to_string(),
            ));
        }
        Ok(Self {
            stiffness,
            dist_az_calc,
            threshold,
            fail_future_possible,
            jump_to_most_favorable,
            max_jump_dist,
        })
    }

    fn range(&self) -> ScalarRange {
        ScalarRange::at_least(self.threshold)
    }

    fn jump_dist_str(&self) -> String {
        ((self.max_jump_dist * 10.0).round() / 10.0).to_string()
    }

    /// Section of `to` the path enters when leaving `from`.
    fn entry_section(
        &self,
        nav: &RuptureTreeNavigator,
        cur_sects: &[SectionRef],
        from: &FaultSubsectionCluster,
        to: &FaultSubsectionCluster,
    ) -> Result<SectionRef> {
        let jump = oriented_jump(nav, from, to)?;
        if !self.jump_to_most_favorable {
            return Ok(jump.to_section);
        }
        let Some(calc) = &self.dist_az_calc else {
            return Err(PlausibilityError::MissingCollaborator(
                "section distance calculator",
            ));
        };
        let max_dist = (self.max_jump_dist as f32).max(jump.distance as f32);
        let allowed: Vec<&SectionRef> = to
            .sects()
            .iter()
            .filter(|sect| {
                from.sects()
                    .iter()
                    .any(|source| calc.distance(sect, source) as f32 <= max_dist)
            })
            .collect();
        match allowed.as_slice() {
            [] => Err(PlausibilityError::Inconsistent(format!(
                "no jumps within {} km between {} and {}",
                max_dist, from, to
            ))),
            [only] => Ok(SectionRef::clone(only)),
            _ => {
                let range = self.range();
                let mut best: Option<(f64, &SectionRef)> = None;
                for sect in allowed {
                    let val = self.stiffness.calc(cur_sects, std::slice::from_ref(sect));
                    if best.map_or(true, |(best_val, _)| range.is_value_better(val, best_val)) {
                        best = Some((val, sect));
                    }
                }
                best.map(|(_, sect)| sect.clone()).ok_or_else(|| {
                    PlausibilityError::Inconsistent(format!("no favorable jump into {}", to))
                })
            }
        }
    }

    fn test_strand(
        &self,
        nav: &RuptureTreeNavigator,
        on_strand: &HashSet<usize>,
        mut strand_sects: Vec<SectionRef>,
        dest: &ClusterRef,
        dest_sect: &SectionRef,
        mode: EvalMode,
    ) -> Result<Option<f64>> {
        let range = self.range();
        let jump_index = dest.index_of(dest_sect.id).ok_or_else(|| {
            PlausibilityError::Inconsistent(format!("section {} not in {}", dest_sect.id, dest))
        })?;
        let sects = dest.sects();
        let mut worst: Option<f64> = None;

        // grow outward from the entry section, both sides at once
        for offset in 0.. {
            let added: Vec<&SectionRef> = if offset == 0 {
                vec![dest_sect]
            } else {
                [
                    sects.get(jump_index + offset),
                    jump_index.checked_sub(offset).and_then(|i| sects.get(i)),
                ]
                .into_iter()
                .flatten()
                .collect()
            };
            if added.is_empty() {
                break;
            }
            for sect in &added {
                let val = self.stiffness.calc(&strand_sects, std::slice::from_ref(*sect));
                worst = range.worst_value(worst.into_iter().chain(Some(val)));
                if mode.short_circuits() && !range.contains(val) {
                    return Ok(worst);
                }
            }
            strand_sects.extend(added.into_iter().cloned());
        }
        if mode.is_exhaustive() {
            trace!(event = "sect_path_cluster", to = %dest, worst);
        }

        let mut next_on_strand = on_strand.clone();
        next_on_strand.insert(dest.key());
        for next in next_clusters(nav, dest, on_strand) {
            let entry = self.entry_section(nav, &strand_sects, dest, next)?;
            let val = self.test_strand(
                nav,
                &next_on_strand,
                strand_sects.clone(),
                next,
                &entry,
                mode,
            )?;
            worst = range.worst_value(worst.into_iter().chain(val));
            if mode.short_circuits() && worst.is_some_and(|w| !range.contains(w)) {
                return Ok(worst);
            }
        }
        Ok(worst)
    }
}

impl NucleationEvaluator for SectCoulombPathEvaluator {
    fn nucleation_value(
        &self,
        rupture: &ClusterRupture,
        nucleation: &ClusterRef,
        mode: EvalMode,
    ) -> Result<Option<f64>> {
        let nav = rupture.navigator();
        let range = self.range();
        let on_strand = HashSet::from([nucleation.key()]);
        let mut worst = None;
        for dest in next_clusters(nav, nucleation, &on_strand) {
            let cur_sects = nucleation.sects().to_vec();
            let entry = self.entry_section(nav, &cur_sects, nucleation, dest)?;
            let val = self.test_strand(nav, &on_strand, cur_sects, dest, &entry, mode)?;
            worst = range.worst_value(worst.into_iter().chain(val));
            if mode.short_circuits() && worst.is_some_and(|w| !range.contains(w)) {
                break;
            }
        }
        Ok(worst)
    }

    fn failure_type(&self) -> PlausibilityResult {
        if self.fail_future_possible {
            PlausibilityResult::FailFuturePossible
        } else {
            PlausibilityResult::FailHardStop
        }
    }

    fn acceptable_range(&self) -> ScalarRange {
        self.range()
    }

    fn scalar_name(&self) -> String {
        self.stiffness.scalar_name()
    }

    fn scalar_units(&self) -> Option<String> {
        Some(self.stiffness.units())
    }

    fn short_name(&self) -> String {
        let prefix = if self.jump_to_most_favorable {
            format!("SectFav{}", self.jump_dist_str())
        } else {
            "Sect".to_string()
        };
        format!(
            "{}[{}]≥{}",
            prefix,
            self.stiffness.scalar_name(),
            format_num(self.threshold)
        )
    }

    fn name(&self) -> String {
        let prefix = if self.jump_to_most_favorable {
            format!("Sect Favorable ({}km)", self.jump_dist_str())
        } else {
            "Sect".to_string()
        };
        format!(
            "{} [{}] ≥{}",
            prefix,
            self.stiffness.scalar_name(),
            format_num(self.threshold)
        )
    }

    fn to_config(&self) -> NucleationEvaluatorConfig {
        NucleationEvaluatorConfig::SectCoulombPathEvaluator {
            threshold: self.threshold,
            fail_future_possible: self.fail_future_possible,
            jump_to_most_favorable: self.jump_to_most_favorable,
            max_jump_dist: self.max_jump_dist,
        }
    }
}

impl fmt::Debug for SectCoulombPathEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectCoulombPathEvaluator")
            .field("aggregation", &self.stiffness.aggregation_name())
            .field("threshold", &self.threshold)
            .field("jump_to_most_favorable", &self.jump_to_most_favorable)
            .field("max_jump_dist", &self.max_jump_dist)
            .finish()
    }
}

//! Jump probability models and the cumulative probability filter.
//!
//! Each model assigns a conditional probability to every jump; the
//! probability of a rupture is the product over its jumps. The Biasi and
//! Wesnousky models work with passing ratios (passed / stopped counts), so
//! conversions both ways live here too.

mod filter;
mod relative;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use rupforge_config::{ConfigError, ProbabilityCalcConfig};
use rupforge_core::{
    ClusterRupture, Collaborators, Jump, PlausibilityError, RakeType, Result, SectionRef,
};
use tracing::debug;

use crate::azimuth::{azimuth_difference, AzimuthCalc};
use crate::filter::{format_num, EvalMode};

pub use filter::CumulativeProbabilityFilter;
pub use relative::{RelativeProb, RelativeQuantity};

/// Passing ratio `r` expressed as the probability `r / (r + 1)`.
pub fn passing_ratio_to_prob(ratio: f64) -> f64 {
    ratio / (ratio + 1.0)
}

/// Probability `p` expressed as the passing ratio `p / (1 - p)`.
pub fn prob_to_passing_ratio(prob: f64) -> f64 {
    prob / (1.0 - prob)
}

// BW17 strike-slip passing ratios at azimuth changes of 5, 15, 25, 35 and 45 degrees
const BW17_SS_RATIOS: [f64; 5] = [2.7, 1.35, 1.3, 0.1, 0.08];

/// Model assigning a conditional probability to each jump.
#[derive(Debug, Clone)]
pub enum ProbabilityCalc {
    /// `a * exp(-d / r0)`, Shaw and Dieterich (2007).
    Shaw07JumpDist { a: f64, r0: f64 },
    /// Strike-slip jump distance model, Biasi and Wesnousky (2016).
    BW16SSJumpDist { min_jump_dist: f64 },
    /// Jump distance model using mechanism-specific rates for non strike-slip
    /// jumps, Biasi and Wesnousky (2016).
    BW16CombJumpDist { min_jump_dist: f64 },
    /// Azimuth change at a jump, Biasi and Wesnousky (2017).
    BW17JumpAzChange { az_calc: AzimuthCalc },
    /// [`ProbabilityCalc::BW17JumpAzChange`] applied to strike-slip jumps only.
    BW17SSJumpAzChange { az_calc: AzimuthCalc },
    /// Mechanism change at a jump, Biasi and Wesnousky (2017).
    BW17MechChange,
    /// Value of the jump taken relative to the alternatives.
    Relative(RelativeProb),
}

impl ProbabilityCalc {
    pub fn new(
        config: &ProbabilityCalcConfig,
        collaborators: &Collaborators,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let dist_az = || {
            collaborators.dist_az_calc.clone().ok_or_else(|| {
                ConfigError::Invalid(
                    "azimuth change probability requires a distance/azimuth calculator"
                        .to_string(),
                )
            })
        };
        Ok(match config {
            ProbabilityCalcConfig::Shaw07JumpDistProb { a, r0 } => {
                ProbabilityCalc::Shaw07JumpDist { a: *a, r0: *r0 }
            }
            ProbabilityCalcConfig::BiasiWesnousky2016SSJumpProb { min_jump_dist } => {
                ProbabilityCalc::BW16SSJumpDist {
                    min_jump_dist: *min_jump_dist,
                }
            }
            ProbabilityCalcConfig::BiasiWesnousky2016CombJumpDistProb { min_jump_dist } => {
                ProbabilityCalc::BW16CombJumpDist {
                    min_jump_dist: *min_jump_dist,
                }
            }
            ProbabilityCalcConfig::BiasiWesnousky2017JumpAzChangeProb { az_calc } => {
                ProbabilityCalc::BW17JumpAzChange {
                    az_calc: AzimuthCalc::new(az_calc, dist_az()?)?,
                }
            }
            ProbabilityCalcConfig::BiasiWesnousky2017SSJumpAzChangeProb { az_calc } => {
                ProbabilityCalc::BW17SSJumpAzChange {
                    az_calc: AzimuthCalc::new(az_calc, dist_az()?)?,
                }
            }
            ProbabilityCalcConfig::BiasiWesnousky2017MechChangeProb => {
                ProbabilityCalc::BW17MechChange
            }
            ProbabilityCalcConfig::RelativeSlipRateProb { .. }
            | ProbabilityCalcConfig::RelativeCoulombProb { .. } => {
                ProbabilityCalc::Relative(RelativeProb::new(config, collaborators)?)
            }
        })
    }

    pub fn name(&self) -> String {
        match self {
            ProbabilityCalc::Shaw07JumpDist { a, r0 } => {
                format!("Shaw07 [A={}, R0={}]", format_num(*a), format_num(*r0))
            }
            ProbabilityCalc::BW16SSJumpDist { .. } => "BW16 SS JumpDist".to_string(),
            ProbabilityCalc::BW16CombJumpDist { .. } => "BW16 JumpDist".to_string(),
            ProbabilityCalc::BW17JumpAzChange { .. } => "BW17 AzChange".to_string(),
            ProbabilityCalc::BW17SSJumpAzChange { .. } => "BW17 SS AzChange".to_string(),
            ProbabilityCalc::BW17MechChange => "BW17 MechChange".to_string(),
            ProbabilityCalc::Relative(relative) => relative.name(),
        }
    }

    /// Conditional probability of taking `jump`, which must belong to `rupture`.
    pub fn jump_probability(&self, rupture: &ClusterRupture, jump: &Jump) -> Result<f64> {
        let prob = match self {
            ProbabilityCalc::Shaw07JumpDist { a, r0 } => a * (-jump.distance / r0).exp(),
            ProbabilityCalc::BW16SSJumpDist { min_jump_dist } => {
                if jump.distance < *min_jump_dist {
                    1.0
                } else {
                    bw16_ss_prob(jump.distance)
                }
            }
            ProbabilityCalc::BW16CombJumpDist { min_jump_dist } => {
                if jump.distance < *min_jump_dist {
                    1.0
                } else {
                    let from = jump.from_section.rake_type();
                    let to = jump.to_section.rake_type();
                    if from == to && from.is_strike_slip() {
                        bw16_ss_prob(jump.distance)
                    } else {
                        0.5 * (bw16_dip_slip_prob(from) + bw16_dip_slip_prob(to))
                    }
                }
            }
            ProbabilityCalc::BW17JumpAzChange { az_calc } => {
                bw17_az_change_prob(az_calc, rupture, jump, false)
            }
            ProbabilityCalc::BW17SSJumpAzChange { az_calc } => {
                bw17_az_change_prob(az_calc, rupture, jump, true)
            }
            ProbabilityCalc::BW17MechChange => {
                let same_rake = jump.from_section.rake as f32 == jump.to_section.rake as f32;
                if same_rake || jump.from_section.rake_type() == jump.to_section.rake_type() {
                    1.0
                } else {
                    4.0 / 75.0
                }
            }
            ProbabilityCalc::Relative(relative) => relative.jump_probability(rupture, jump)?,
        };
        check_probability(&self.name(), prob)
    }

    /// Product of the jump probabilities, stopping at zero.
    pub fn rupture_probability(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<f64> {
        let jumps = match self {
            ProbabilityCalc::Relative(relative) => match relative.jumps_to_score(rupture) {
                Some(jumps) => jumps,
                None => return Ok(1.0),
            },
            _ => rupture.all_jumps(),
        };
        let mut prob = 1.0;
        for jump in jumps {
            let jump_prob = self.jump_probability(rupture, jump)?;
            prob *= jump_prob;
            if mode.is_exhaustive() {
                debug!(
                    event = "jump_prob",
                    calc = %self.name(),
                    jump = %jump,
                    jump_prob,
                    prob,
                );
            }
            if prob == 0.0 {
                break;
            }
        }
        Ok(prob)
    }

    /// Only the relative models depend on the order in which jumps were taken.
    pub fn is_directional(&self) -> bool {
        matches!(self, ProbabilityCalc::Relative(_))
    }

    pub fn to_config(&self) -> ProbabilityCalcConfig {
        match self {
            ProbabilityCalc::Shaw07JumpDist { a, r0 } => {
                ProbabilityCalcConfig::Shaw07JumpDistProb { a: *a, r0: *r0 }
            }
            ProbabilityCalc::BW16SSJumpDist { min_jump_dist } => {
                ProbabilityCalcConfig::BiasiWesnousky2016SSJumpProb {
                    min_jump_dist: *min_jump_dist,
                }
            }
            ProbabilityCalc::BW16CombJumpDist { min_jump_dist } => {
                ProbabilityCalcConfig::BiasiWesnousky2016CombJumpDistProb {
                    min_jump_dist: *min_jump_dist,
                }
            }
            ProbabilityCalc::BW17JumpAzChange { az_calc } => {
                ProbabilityCalcConfig::BiasiWesnousky2017JumpAzChangeProb {
                    az_calc: az_calc.config().clone(),
                }
            }
            ProbabilityCalc::BW17SSJumpAzChange { az_calc } => {
                ProbabilityCalcConfig::BiasiWesnousky2017SSJumpAzChangeProb {
                    az_calc: az_calc.config().clone(),
                }
            }
            ProbabilityCalc::BW17MechChange => ProbabilityCalcConfig::BiasiWesnousky2017MechChangeProb,
            ProbabilityCalc::Relative(relative) => relative.to_config(),
        }
    }
}

/// Builds every calculator in `configs`.
pub fn build_calcs(
    configs: &[ProbabilityCalcConfig],
    collaborators: &Collaborators,
) -> std::result::Result<Vec<Arc<ProbabilityCalc>>, ConfigError> {
    rupforge_config::validate::non_empty("calcs", configs)?;
    configs
        .iter()
        .map(|config| ProbabilityCalc::new(config, collaborators).map(Arc::new))
        .collect()
}

pub(crate) fn check_probability(name: &str, value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(PlausibilityError::ProbabilityOutOfRange {
            name: name.to_string(),
            value,
        })
    }
}

fn bw16_ss_prob(distance: f64) -> f64 {
    let ratio = (1.89 - 0.31 * distance).max(0.0);
    passing_ratio_to_prob(ratio)
}

fn bw16_dip_slip_prob(rake_type: RakeType) -> f64 {
    match rake_type {
        RakeType::Reverse => 0.62,
        RakeType::Normal => 0.37,
        _ => 0.46,
    }
}

fn bw17_az_change_prob(
    az_calc: &AzimuthCalc,
    rupture: &ClusterRupture,
    jump: &Jump,
    strike_slip_only: bool,
) -> f64 {
    let from_type = jump.from_section.rake_type();
    if from_type != jump.to_section.rake_type() {
        return 1.0;
    }
    if strike_slip_only && !from_type.is_strike_slip() {
        return 1.0;
    }
    let nav = rupture.navigator();
    let Some(before) = nav.predecessor(&jump.from_section) else {
        return 1.0;
    };
    let before_az = az_calc.azimuth(before, &jump.from_section);
    let after: &[SectionRef] = nav.descendants(&jump.to_section);
    let mut prob: f64 = 1.0;
    for next in after {
        let after_az = az_calc.azimuth(&jump.to_section, next);
        let diff = azimuth_difference(before_az, after_az).abs();
        let ratio = if from_type.is_strike_slip() {
            let index = ((diff - 5.0) / 10.0).round().clamp(0.0, 4.0) as usize;
            BW17_SS_RATIOS[index]
        } else if diff < 60.0 {
            2.0
        } else {
            0.5
        };
        prob = prob.min(passing_ratio_to_prob(ratio));
    }
    prob
}

//! Cumulative penalty filter and its penalty sub-models.

use std::sync::Arc;

use rupforge_config::{ConfigError, CumulativePenaltyConfig, FilterConfig, PenaltyConfig};
use rupforge_core::{
    ClusterRupture, PlausibilityError, PlausibilityResult, Result, RuptureTreeNavigator,
    SectionDistanceAzimuthCalculator, SectionRef,
};

use super::{apply_path_threshold, max_path_total, PathQuantity};
use crate::azimuth::{azimuth_difference, rake_difference, AzimuthCalc};
use crate::filter::{format_num, EvalMode, PlausibilityFilter, ScalarRange, ScalarValueFilter};

/// A penalty charged for one section-to-section step.
#[derive(Debug, Clone)]
pub enum Penalty {
    /// Charged for every jump at least `min_distance` long, multiplied by
    /// the distance when `distance_dependent`.
    Jump {
        min_distance: f64,
        value: f64,
        distance_dependent: bool,
    },
    /// Charged when the rake changes by more than `threshold`.
    RakeChange {
        threshold: f64,
        value: f64,
        jumps_only: bool,
    },
    /// Charged when the dip changes by more than `threshold`.
    DipChange {
        threshold: f64,
        value: f64,
        jumps_only: bool,
    },
    /// Charged when the azimuth changes by more than `threshold`.
    AzimuthChange {
        az_calc: AzimuthCalc,
        threshold: f64,
        value: f64,
        jumps_only: bool,
    },
}

impl Penalty {
    pub fn new(
        config: &PenaltyConfig,
        dist_az: Option<&Arc<dyn SectionDistanceAzimuthCalculator>>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(match config {
            PenaltyConfig::JumpPenalty {
                min_distance,
                value,
                distance_dependent,
            } => Penalty::Jump {
                min_distance: *min_distance,
                value: *value,
                distance_dependent: *distance_dependent,
            },
            PenaltyConfig::RakeChangePenalty {
                threshold,
                value,
                jumps_only,
            } => Penalty::RakeChange {
                threshold: *threshold,
                value: *value,
                jumps_only: *jumps_only,
            },
            PenaltyConfig::DipChangePenalty {
                threshold,
                value,
                jumps_only,
            } => Penalty::DipChange {
                threshold: *threshold,
                value: *value,
                jumps_only: *jumps_only,
            },
            PenaltyConfig::AzimuthChangePenalty {
                az_calc,
                threshold,
                value,
                jumps_only,
            } => {
                let dist_az = dist_az.ok_or_else(|| {
                    ConfigError::Invalid(
                        "AzimuthChangePenalty requires a distance/azimuth calculator".to_string(),
                    )
                })?;
                Penalty::AzimuthChange {
                    az_calc: AzimuthCalc::new(az_calc, dist_az.clone())?,
                    threshold: *threshold,
                    value: *value,
                    jumps_only: *jumps_only,
                }
            }
        })
    }

    pub fn name(&self) -> String {
        match self {
            Penalty::Jump { min_distance, .. } if *min_distance > 0.0 => {
                format!("Jump≥{}km", format_num(*min_distance))
            }
            Penalty::Jump { .. } => "Jump".to_string(),
            Penalty::RakeChange { threshold, .. } => format!("ΔRake>{}", format_num(*threshold)),
            Penalty::DipChange { threshold, .. } => format!("ΔDip>{}", format_num(*threshold)),
            Penalty::AzimuthChange { threshold, .. } => format!("ΔAz>{}", format_num(*threshold)),
        }
    }

    /// Penalty for stepping from `cur` to `next`.
    pub fn calc(
        &self,
        nav: &RuptureTreeNavigator,
        prev: Option<&SectionRef>,
        cur: &SectionRef,
        next: &SectionRef,
    ) -> Result<f64> {
        let jump = nav.jump_between(cur.id, next.id);
        let is_jump = jump.is_some();
        let value = match self {
            Penalty::Jump {
                min_distance,
                value,
                distance_dependent,
            } => {
                let Some(jump) = jump else {
                    return Ok(0.0);
                };
                if jump.distance < *min_distance {
                    0.0
                } else if *distance_dependent {
                    value * jump.distance
                } else {
                    *value
                }
            }
            Penalty::RakeChange {
                threshold,
                value,
                jumps_only,
            } => {
                if *jumps_only && !is_jump {
                    return Ok(0.0);
                }
                if rake_difference(cur.rake, next.rake) > *threshold {
                    *value
                } else {
                    0.0
                }
            }
            Penalty::DipChange {
                threshold,
                value,
                jumps_only,
            } => {
                if *jumps_only && !is_jump {
                    return Ok(0.0);
                }
                if (cur.dip - next.dip).abs() > *threshold {
                    *value
                } else {
                    0.0
                }
            }
            Penalty::AzimuthChange {
                az_calc,
                threshold,
                value,
                jumps_only,
            } => {
                if *jumps_only && !is_jump {
                    return Ok(0.0);
                }
                let Some(prev) = prev else {
                    return Ok(0.0);
                };
                let before = az_calc.azimuth(prev, cur);
                let after = az_calc.azimuth(cur, next);
                if azimuth_difference(before, after).abs() > *threshold {
                    *value
                } else {
                    0.0
                }
            }
        };
        if value < 0.0 {
            return Err(PlausibilityError::NegativePenalty {
                name: self.name(),
                value,
            });
        }
        Ok(value)
    }

    pub fn to_config(&self) -> PenaltyConfig {
        match self {
            Penalty::Jump {
                min_distance,
                value,
                distance_dependent,
            } => PenaltyConfig::JumpPenalty {
                min_distance: *min_distance,
                value: *value,
                distance_dependent: *distance_dependent,
            },
            Penalty::RakeChange {
                threshold,
                value,
                jumps_only,
            } => PenaltyConfig::RakeChangePenalty {
                threshold: *threshold,
                value: *value,
                jumps_only: *jumps_only,
            },
            Penalty::DipChange {
                threshold,
                value,
                jumps_only,
            } => PenaltyConfig::DipChangePenalty {
                threshold: *threshold,
                value: *value,
                jumps_only: *jumps_only,
            },
            Penalty::AzimuthChange {
                az_calc,
                threshold,
                value,
                jumps_only,
            } => PenaltyConfig::AzimuthChangePenalty {
                az_calc: az_calc.config().clone(),
                threshold: *threshold,
                value: *value,
                jumps_only: *jumps_only,
            },
        }
    }
}

/// Limits the summed penalties along any path.
#[derive(Debug, Clone)]
pub struct CumulativePenaltyFilter {
    threshold: f64,
    penalties: Vec<Penalty>,
}

impl CumulativePenaltyFilter {
    pub fn new(threshold: f64, penalties: Vec<Penalty>) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::non_negative("threshold", threshold)?;
        rupforge_config::validate::non_empty("penalties", &penalties)?;
        Ok(Self {
            threshold,
            penalties,
        })
    }
}

impl PathQuantity for CumulativePenaltyFilter {
    fn step(
        &self,
        nav: &RuptureTreeNavigator,
        prev: Option<&SectionRef>,
        cur: &SectionRef,
        next: &SectionRef,
    ) -> Result<f64> {
        let mut total = 0.0;
        for penalty in &self.penalties {
            total += penalty.calc(nav, prev, cur, next)?;
        }
        Ok(total)
    }
}

impl PlausibilityFilter for CumulativePenaltyFilter {
    fn short_name(&self) -> String {
        format!("CumPenalty≤{}", format_num(self.threshold))
    }

    fn name(&self) -> String {
        let names: Vec<String> = self.penalties.iter().map(Penalty::name).collect();
        format!(
            "Cumulative Penalty [{}] ≤{}",
            names.join(", "),
            format_num(self.threshold)
        )
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        apply_path_threshold(self, self.threshold, rupture, "CumPenalty", mode)
    }

    fn is_directional(&self, splayed: bool) -> bool {
        splayed
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::CumulativePenaltyFilter(CumulativePenaltyConfig {
            threshold: self.threshold,
            penalties: self.penalties.iter().map(Penalty::to_config).collect(),
        })
    }

    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        Some(self)
    }
}

impl ScalarValueFilter for CumulativePenaltyFilter {
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>> {
        max_path_total(self, rupture, None, "CumPenalty", EvalMode::ShortCircuit).map(Some)
    }

    fn acceptable_range(&self) -> ScalarRange {
        ScalarRange::at_most(self.threshold)
    }

    fn scalar_name(&self) -> String {
        "Cumulative Penalty".to_string()
    }

    fn scalar_units(&self) -> Option<String> {
        None
    }
}

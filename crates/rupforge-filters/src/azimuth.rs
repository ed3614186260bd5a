//! Azimuth between sections, with optional left-lateral direction flips.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use rupforge_config::{AzimuthCalcConfig, ConfigError};
use rupforge_core::{FaultSection, SectionDistanceAzimuthCalculator};

/// Left-lateral parents of the UCERF3 fault model whose strike direction is
/// reversed relative to the right-lateral convention.
pub const UCERF3_LEFT_LATERAL_PARENTS: [u32; 6] = [48, 49, 93, 341, 47, 169];

#[derive(Debug, Clone, PartialEq)]
enum FlipRule {
    Never,
    RakeRange { min_rake: f64, max_rake: f64 },
    Parents(BTreeSet<u32>),
}

/// Computes azimuths through the distance/azimuth collaborator, adding 180
/// degrees when the first section is flagged as left-lateral.
#[derive(Clone)]
pub struct AzimuthCalc {
    dist_az: Arc<dyn SectionDistanceAzimuthCalculator>,
    flip: FlipRule,
    config: AzimuthCalcConfig,
}

impl AzimuthCalc {
    pub fn new(
        config: &AzimuthCalcConfig,
        dist_az: Arc<dyn SectionDistanceAzimuthCalculator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let flip = match config {
            AzimuthCalcConfig::SimpleAzimuthCalc => FlipRule::Never,
            AzimuthCalcConfig::LeftLateralFlipAzimuthCalc { min_rake, max_rake } => {
                FlipRule::RakeRange {
                    min_rake: *min_rake,
                    max_rake: *max_rake,
                }
            }
            AzimuthCalcConfig::HardCodedLeftLateralFlipAzimuthCalc { parent_ids } => {
                FlipRule::Parents(parent_ids.iter().copied().collect())
            }
            AzimuthCalcConfig::UCERF3LeftLateralFlipAzimuthCalc => {
                FlipRule::Parents(UCERF3_LEFT_LATERAL_PARENTS.into_iter().collect())
            }
        };
        Ok(Self {
            dist_az,
            flip,
            config: config.clone(),
        })
    }

    /// Plain azimuths with no flips.
    pub fn simple(dist_az: Arc<dyn SectionDistanceAzimuthCalculator>) -> Self {
        Self {
            dist_az,
            flip: FlipRule::Never,
            config: AzimuthCalcConfig::SimpleAzimuthCalc,
        }
    }

    pub fn azimuth(&self, from: &FaultSection, to: &FaultSection) -> f64 {
        let azimuth = self.dist_az.azimuth(from, to);
        if self.flips(from) {
            azimuth + 180.0
        } else {
            azimuth
        }
    }

    pub fn distance(&self, a: &FaultSection, b: &FaultSection) -> f64 {
        self.dist_az.distance(a, b)
    }

    fn flips(&self, sect: &FaultSection) -> bool {
        match &self.flip {
            FlipRule::Never => false,
            FlipRule::RakeRange { min_rake, max_rake } => {
                sect.rake >= *min_rake && sect.rake <= *max_rake
            }
            FlipRule::Parents(parents) => parents.contains(&sect.parent_id),
        }
    }

    pub fn config(&self) -> &AzimuthCalcConfig {
        &self.config
    }
}

impl fmt::Debug for AzimuthCalc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzimuthCalc")
            .field("flip", &self.flip)
            .finish()
    }
}

/// Signed change from `before` to `after`, normalized to (-180, 180].
pub fn azimuth_difference(before: f64, after: f64) -> f64 {
    let diff = (after - before).rem_euclid(360.0);
    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}

/// Absolute rake change, in [0, 180].
pub fn rake_difference(rake1: f64, rake2: f64) -> f64 {
    let diff = (rake1 - rake2).abs();
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rupforge_test::FaultNetwork;

    #[test]
    fn test_azimuth_difference() {
        assert_eq!(azimuth_difference(10.0, 30.0), 20.0);
        assert_eq!(azimuth_difference(350.0, 10.0), 20.0);
        assert_eq!(azimuth_difference(10.0, 350.0), -20.0);
        assert_eq!(azimuth_difference(0.0, 180.0), 180.0);
        assert_eq!(azimuth_difference(90.0, 450.0), 0.0);
    }

    #[test]
    fn test_rake_difference() {
        assert_eq!(rake_difference(180.0, -180.0), 0.0);
        assert_eq!(rake_difference(170.0, -170.0), 20.0);
        assert_eq!(rake_difference(0.0, 90.0), 90.0);
    }

    #[test]
    fn test_flip_rules() {
        let mut net = FaultNetwork::new();
        let ll = net.add_fault_with(48, 2, (0.0, 0.0), 0.0, |s| s.with_rake(0.0));
        let rl = net.add_fault(2, 2, (10.0, 0.0), 0.0);
        let calc: Arc<dyn SectionDistanceAzimuthCalculator> = Arc::new(net.calc());

        let simple = AzimuthCalc::simple(calc.clone());
        assert!(simple.azimuth(&ll[0], &ll[1]).abs() < 1e-9);

        let u3 = AzimuthCalc::new(&AzimuthCalcConfig::UCERF3LeftLateralFlipAzimuthCalc, calc.clone())
            .unwrap();
        assert!((u3.azimuth(&ll[0], &ll[1]) - 180.0).abs() < 1e-9);
        assert!(u3.azimuth(&rl[0], &rl[1]).abs() < 1e-9);

        let by_rake = AzimuthCalc::new(
            &AzimuthCalcConfig::LeftLateralFlipAzimuthCalc {
                min_rake: -45.0,
                max_rake: 45.0,
            },
            calc,
        )
        .unwrap();
        assert!((by_rake.azimuth(&ll[0], &ll[1]) - 180.0).abs() < 1e-9);
        assert!(by_rake.azimuth(&rl[0], &rl[1]).abs() < 1e-9);
    }
}

//! Planar distance and azimuth between section midpoints.

use std::collections::HashMap;

use rupforge_core::{FaultSection, SectionDistanceAzimuthCalculator};

/// Distance/azimuth calculator over fixed section midpoints.
///
/// Coordinates are km east and km north; azimuths are compass degrees in
/// `[0, 360)`. Unknown sections sit at the origin.
#[derive(Debug, Clone, Default)]
pub struct PlanarDistAzCalc {
    positions: HashMap<usize, (f64, f64)>,
}

impl PlanarDistAzCalc {
    pub fn new(positions: HashMap<usize, (f64, f64)>) -> Self {
        Self { positions }
    }

    fn position(&self, sect: &FaultSection) -> (f64, f64) {
        self.positions.get(&sect.id).copied().unwrap_or_default()
    }
}

impl SectionDistanceAzimuthCalculator for PlanarDistAzCalc {
    fn distance(&self, a: &FaultSection, b: &FaultSection) -> f64 {
        let (ax, ay) = self.position(a);
        let (bx, by) = self.position(b);
        (bx - ax).hypot(by - ay)
    }

    fn azimuth(&self, a: &FaultSection, b: &FaultSection) -> f64 {
        let (ax, ay) = self.position(a);
        let (bx, by) = self.position(b);
        (bx - ax).atan2(by - ay).to_degrees().rem_euclid(360.0)
    }
}

//! Fault sections and mechanism classification.

use std::fmt;
use std::sync::Arc;

/// Shared, immutable handle to a fault section.
pub type SectionRef = Arc<FaultSection>;

/// A single fault subsection.
///
/// Sections are identified by `id`, which is unique across the whole fault
/// system. Geometry beyond the scalar attributes below lives in external
/// collaborators.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaultSection {
    pub id: usize,
    pub parent_id: u32,
    pub parent_name: String,
    pub name: String,
    /// Rake in degrees, [-180, 180].
    pub rake: f64,
    /// Dip in degrees.
    pub dip: f64,
    pub length_km: f64,
    pub down_dip_width_km: f64,
    /// Long-term slip rate in mm/yr.
    pub slip_rate: f64,
    /// Position of this section along its parent, when known.
    pub index_along_parent: Option<u32>,
}

impl FaultSection {
    /// Creates a section with neutral attributes.
    pub fn new(id: usize, parent_id: u32) -> Self {
        Self {
            id,
            parent_id,
            parent_name: format!("Parent {}", parent_id),
            name: format!("Section {}", id),
            rake: 0.0,
            dip: 90.0,
            length_km: 1.0,
            down_dip_width_km: 1.0,
            slip_rate: 0.0,
            index_along_parent: None,
        }
    }

    pub fn with_parent_name(mut self, name: impl Into<String>) -> Self {
        self.parent_name = name.into();
        self
    }

    pub fn with_rake(mut self, rake: f64) -> Self {
        self.rake = rake;
        self
    }

    pub fn with_dip(mut self, dip: f64) -> Self {
        self.dip = dip;
        self
    }

    pub fn with_dimensions(mut self, length_km: f64, down_dip_width_km: f64) -> Self {
        self.length_km = length_km;
        self.down_dip_width_km = down_dip_width_km;
        self
    }

    pub fn with_slip_rate(mut self, slip_rate: f64) -> Self {
        self.slip_rate = slip_rate;
        self
    }

    pub fn with_index_along_parent(mut self, index: u32) -> Self {
        self.index_along_parent = Some(index);
        self
    }

    /// Wraps this section in a shared handle.
    pub fn into_ref(self) -> SectionRef {
        Arc::new(self)
    }

    /// Mechanism classification of this section's rake.
    pub fn rake_type(&self) -> RakeType {
        RakeType::classify(self.rake)
    }
}

impl fmt::Display for FaultSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Faulting mechanism implied by a rake angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RakeType {
    RightLateral,
    LeftLateral,
    Reverse,
    Normal,
    Oblique,
}

impl RakeType {
    /// Classifies a rake angle. Bounds are inclusive and compared in single
    /// precision.
    pub fn classify(rake: f64) -> Self {
        let rake = rake as f32;
        if (-180.0..=-170.0).contains(&rake) || (170.0..=180.0).contains(&rake) {
            RakeType::RightLateral
        } else if (-10.0..=10.0).contains(&rake) {
            RakeType::LeftLateral
        } else if (80.0..=100.0).contains(&rake) {
            RakeType::Reverse
        } else if (-100.0..=-80.0).contains(&rake) {
            RakeType::Normal
        } else {
            RakeType::Oblique
        }
    }

    /// Returns true for right- and left-lateral mechanisms.
    pub fn is_strike_slip(self) -> bool {
        matches!(self, RakeType::RightLateral | RakeType::LeftLateral)
    }

    pub fn name(self) -> &'static str {
        match self {
            RakeType::RightLateral => "Right-Lateral SS",
            RakeType::LeftLateral => "Left-Lateral SS",
            RakeType::Reverse => "Reverse",
            RakeType::Normal => "Normal",
            RakeType::Oblique => "Oblique",
        }
    }
}

//! Table-driven stiffness calculator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use rupforge_core::{AggregatedStiffnessCalculator, SectionRef};

/// Stiffness oracle whose pairwise values come from lookup tables.
///
/// The value for a source/receiver pair is the section-pair entry if
/// present, else the parent-pair entry, else `default`. Aggregation takes
/// the median over sources for each receiver, then sums over receivers.
#[derive(Debug, Default)]
pub struct TableStiffnessCalc {
    default: f64,
    parent_pairs: HashMap<(u32, u32), f64>,
    section_pairs: HashMap<(usize, usize), f64>,
    calls: AtomicUsize,
}

impl TableStiffnessCalc {
    pub fn new(default: f64) -> Self {
        Self {
            default,
            ..Self::default()
        }
    }

    /// Sets the value imparted by sections of `source` onto sections of `receiver`.
    pub fn with_parent_pair(mut self, source: u32, receiver: u32, value: f64) -> Self {
        self.parent_pairs.insert((source, receiver), value);
        self
    }

    pub fn with_section_pair(mut self, source: usize, receiver: usize, value: f64) -> Self {
        self.section_pairs.insert((source, receiver), value);
        self
    }

    /// Number of `calc` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn pair_value(&self, source: &SectionRef, receiver: &SectionRef) -> f64 {
        if let Some(v) = self.section_pairs.get(&(source.id, receiver.id)) {
            return *v;
        }
        self.parent_pairs
            .get(&(source.parent_id, receiver.parent_id))
            .copied()
            .unwrap_or(self.default)
    }
}

impl AggregatedStiffnessCalculator for TableStiffnessCalc {
    fn calc(&self, sources: &[SectionRef], receivers: &[SectionRef]) -> f64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        receivers
            .iter()
            .map(|receiver| {
                let mut values: Vec<f64> = sources
                    .iter()
                    .filter(|s| s.id != receiver.id)
                    .map(|s| self.pair_value(s, receiver))
                    .collect();
                if values.is_empty() {
                    return 0.0;
                }
                values.sort_by(|a, b| a.total_cmp(b));
                let mid = values.len() / 2;
                if values.len() % 2 == 0 {
                    0.5 * (values[mid - 1] + values[mid])
                } else {
                    values[mid]
                }
            })
            .sum()
    }

    fn aggregation_name(&self) -> String {
        "median-then-sum".to_string()
    }
}

use std::sync::Arc;

use rupforge_config::{ConfigError, CumulativeProbabilityConfig, FilterConfig};
use rupforge_core::{ClusterRupture, PlausibilityResult, Result};
use tracing::debug;

use super::{check_probability, ProbabilityCalc};
use crate::filter::{format_num, EvalMode, PlausibilityFilter, ScalarRange, ScalarValueFilter};

/// Passes when the product of every model's rupture probability is at
/// least `min_probability`.
#[derive(Debug, Clone)]
pub struct CumulativeProbabilityFilter {
    min_probability: f64,
    calcs: Vec<Arc<ProbabilityCalc>>,
}

impl CumulativeProbabilityFilter {
    pub fn new(
        min_probability: f64,
        calcs: Vec<Arc<ProbabilityCalc>>,
    ) -> std::result::Result<Self, ConfigError> {
        rupforge_config::validate::probability_threshold("min_probability", min_probability)?;
        rupforge_config::validate::non_empty("calcs", &calcs)?;
        Ok(Self {
            min_probability,
            calcs,
        })
    }

    pub fn calcs(&self) -> &[Arc<ProbabilityCalc>] {
        &self.calcs
    }

    fn probability(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<f64> {
        let mut prob = 1.0;
        for calc in &self.calcs {
            let calc_prob = check_probability(&calc.name(), calc.rupture_probability(rupture, mode)?)?;
            prob *= calc_prob;
            if mode.short_circuits() && (prob as f32) < self.min_probability as f32 {
                break;
            }
        }
        Ok(prob)
    }
}

impl PlausibilityFilter for CumulativeProbabilityFilter {
    fn short_name(&self) -> String {
        match self.calcs.as_slice() {
            [calc] => format!(
                "P({})≥{}",
                calc.name().replace(' ', ""),
                format_num(self.min_probability)
            ),
            _ => format!("CumProb≥{}", format_num(self.min_probability)),
        }
    }

    fn name(&self) -> String {
        match self.calcs.as_slice() {
            [calc] => format!("{} ≥{}", calc.name(), format_num(self.min_probability)),
            _ => format!(
                "Cumulative Probability Filter ≥{}",
                format_num(self.min_probability)
            ),
        }
    }

    fn apply(&self, rupture: &ClusterRupture, mode: EvalMode) -> Result<PlausibilityResult> {
        let prob = self.probability(rupture, mode)?;
        let result = PlausibilityResult::pass_or(
            prob as f32 >= self.min_probability as f32,
            PlausibilityResult::FailHardStop,
        );
        if mode.is_exhaustive() {
            debug!(
                event = "cum_prob",
                filter = %self.short_name(),
                prob,
                min = self.min_probability,
                result = %result,
            );
        }
        Ok(result)
    }

    fn is_directional(&self, _splayed: bool) -> bool {
        self.calcs.iter().any(|calc| calc.is_directional())
    }

    fn to_config(&self) -> FilterConfig {
        FilterConfig::CumulativeProbabilityFilter(CumulativeProbabilityConfig {
            min_probability: self.min_probability,
            calcs: self.calcs.iter().map(|calc| calc.to_config()).collect(),
        })
    }

    fn as_scalar(&self) -> Option<&dyn ScalarValueFilter> {
        Some(self)
    }
}

impl ScalarValueFilter for CumulativeProbabilityFilter {
    fn value(&self, rupture: &ClusterRupture) -> Result<Option<f64>> {
        self.probability(rupture, EvalMode::Exhaustive).map(Some)
    }

    fn acceptable_range(&self) -> ScalarRange {
        ScalarRange::closed(self.min_probability, 1.0)
    }

    fn scalar_name(&self) -> String {
        "Conditional Probability".to_string()
    }

    fn scalar_units(&self) -> Option<String> {
        None
    }
}

/*! Tuning knobs of the analyses.

The plain entry points (e.g., [crate::edf::rta::exact_wcrt]) use
[AnalysisConfig::default]; the `_with` variants take an explicit
configuration. */

/// Parameters that bound or refine the work done by an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Maximum number of iterations of any single fixed-point search.
    /// Running out is reported as an inconclusive result, not as a
    /// negative one. `None` means unbounded.
    pub iteration_budget: Option<usize>,
    /// Number of steps into which the FF-DBF test divides the range of
    /// candidate processor speeds.
    pub speed_granularity: usize,
}

impl AnalysisConfig {
    pub fn with_iteration_budget(self, budget: usize) -> Self {
        AnalysisConfig {
            iteration_budget: Some(budget),
            ..self
        }
    }

    pub fn with_speed_granularity(self, steps: usize) -> Self {
        AnalysisConfig {
            speed_granularity: steps,
            ..self
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            iteration_budget: None,
            speed_granularity: 20,
        }
    }
}

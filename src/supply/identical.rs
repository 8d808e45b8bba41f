use super::SupplyBound;
use crate::time::{Duration, Service, Time};

/// `processors` identical unit-speed processors, viewed as one fluid
/// resource of speed `processors`.
///
/// This is the supply against which the demand-based feasibility
/// conditions for multiprocessors are stated; it ignores that a single
/// job cannot run on two processors at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identical {
    processors: u32,
}

impl Identical {
    /// Construct a platform of `processors` processors, where
    /// `processors > 0`.
    pub fn new(processors: u32) -> Self {
        assert!(processors > 0, "a platform needs at least one processor");
        Identical { processors }
    }

    pub fn processors(&self) -> u32 {
        self.processors
    }

    fn capacity(&self) -> Time {
        Time::from(self.processors)
    }
}

impl SupplyBound for Identical {
    fn provided_service(&self, delta: &Duration) -> Service {
        delta * &self.capacity()
    }

    fn service_time(&self, demand: &Service) -> Duration {
        demand / &self.capacity()
    }
}

use super::{merged_steps, DemandBound};
use crate::time::{Duration, Service};

/// A wrapper type for representing the total demand of a vector of
/// individual demand sources (e.g., all tasks of a task system).
#[derive(Clone, Debug)]
pub struct Aggregate<T> {
    individual: Vec<T>,
}

impl<T> Aggregate<T> {
    pub fn new(components: Vec<T>) -> Self {
        Aggregate {
            individual: components,
        }
    }

    pub fn components(&self) -> &[T] {
        &self.individual
    }
}

impl<T: DemandBound> FromIterator<T> for Aggregate<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Aggregate::new(iter.into_iter().collect())
    }
}

impl<T: DemandBound> DemandBound for Aggregate<T> {
    fn demand(&self, delta: &Duration) -> Service {
        self.individual.iter().map(|d| d.demand(delta)).sum()
    }

    fn steps_after<'a>(&'a self, after: &Duration) -> Box<dyn Iterator<Item = Duration> + 'a> {
        merged_steps(
            self.individual
                .iter()
                .map(|d| d.steps_after(after))
                .collect(),
        )
    }
}

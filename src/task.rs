/*! The sporadic task model.

A [SporadicTask] is an immutable description of a recurring unit of
work. A [TaskSystem] is an ordered collection of such tasks together
with one analysis-result slot per task, which the response-time
analyses in [crate::edf::rta] fill in. */

use std::ops::Index;

use thiserror::Error;

use crate::time::{Duration, Instant, Service, Time};

/// Error type returned when a task is constructed from parameters
/// that do not describe a well-defined sporadic task.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("task cost must be positive (got {0})")]
    NonPositiveCost(Time),
    #[error("task period must be positive (got {0})")]
    NonPositivePeriod(Time),
    #[error("task deadline must be positive (got {0})")]
    NonPositiveDeadline(Time),
    #[error("task offset must not be negative (got {0})")]
    NegativeOffset(Time),
    #[error("speedup factor must lie in (0, 1] (got {0})")]
    InvalidSpeedup(Time),
}

/// A sporadic task with worst-case execution cost `C`, minimum
/// inter-arrival time `T`, and relative deadline `D`.
///
/// `C ≤ D` is *not* required: infeasible tasks are legal inputs, and
/// the tests report them as unschedulable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SporadicTask {
    cost: Duration,
    period: Duration,
    deadline: Duration,
    offset: Instant,
}

impl SporadicTask {
    /// A task with an implicit deadline (`D = T`) and no offset.
    pub fn new(cost: impl Into<Time>, period: impl Into<Time>) -> Result<Self, ModelError> {
        let period = period.into();
        Self::new_with_deadline(cost, period.clone(), period)
    }

    /// A task with an arbitrary relative deadline and no offset.
    pub fn new_with_deadline(
        cost: impl Into<Time>,
        period: impl Into<Time>,
        deadline: impl Into<Time>,
    ) -> Result<Self, ModelError> {
        let (cost, period, deadline) = (cost.into(), period.into(), deadline.into());
        if !cost.is_positive() {
            return Err(ModelError::NonPositiveCost(cost));
        }
        if !period.is_positive() {
            return Err(ModelError::NonPositivePeriod(period));
        }
        if !deadline.is_positive() {
            return Err(ModelError::NonPositiveDeadline(deadline));
        }
        Ok(SporadicTask {
            cost,
            period,
            deadline,
            offset: Time::zero(),
        })
    }

    /// The same task, with its first job released at `offset`.
    pub fn with_offset(self, offset: impl Into<Time>) -> Result<Self, ModelError> {
        let offset = offset.into();
        if offset.is_negative() {
            return Err(ModelError::NegativeOffset(offset));
        }
        Ok(SporadicTask { offset, ..self })
    }

    pub fn cost(&self) -> &Duration {
        &self.cost
    }

    pub fn period(&self) -> &Duration {
        &self.period
    }

    pub fn deadline(&self) -> &Duration {
        &self.deadline
    }

    pub fn offset(&self) -> &Instant {
        &self.offset
    }

    /// `C / T`
    pub fn utilization(&self) -> Time {
        &self.cost / &self.period
    }

    /// `C / min(D, T)`
    pub fn density(&self) -> Time {
        &self.cost / std::cmp::min(&self.deadline, &self.period)
    }

    pub fn has_implicit_deadline(&self) -> bool {
        self.deadline == self.period
    }

    pub fn has_constrained_deadline(&self) -> bool {
        self.deadline <= self.period
    }
}

/// An ordered collection of sporadic tasks.
///
/// Every task has an associated response-time slot, which is empty
/// until one of the response-time analyses succeeds on the system.
/// Because each task's bound depends on the whole system, appending a
/// task clears all slots.
#[derive(Clone, Debug, Default)]
pub struct TaskSystem {
    tasks: Vec<SporadicTask>,
    response_times: Vec<Option<Duration>>,
}

impl TaskSystem {
    pub fn new() -> Self {
        TaskSystem::default()
    }

    /// Append a task. Previously computed response times are
    /// discarded.
    pub fn push(&mut self, task: SporadicTask) {
        self.tasks.push(task);
        self.response_times.clear();
        self.response_times.resize(self.tasks.len(), None);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SporadicTask> {
        self.tasks.iter()
    }

    pub fn tasks(&self) -> &[SporadicTask] {
        &self.tasks
    }

    pub fn get(&self, index: usize) -> Option<&SporadicTask> {
        self.tasks.get(index)
    }

    /// The response-time bound last computed for the `index`-th task.
    pub fn response_time(&self, index: usize) -> Option<&Duration> {
        self.response_times.get(index).and_then(Option::as_ref)
    }

    pub fn response_times(&self) -> &[Option<Duration>] {
        &self.response_times
    }

    pub(crate) fn store_response_times(&mut self, bounds: Vec<Duration>) {
        debug_assert_eq!(bounds.len(), self.tasks.len());
        self.response_times = bounds.into_iter().map(Some).collect();
    }

    /// Reorder the tasks by non-decreasing relative deadline (ties
    /// broken by period, then by original position). Result slots
    /// move with their tasks.
    pub fn sort_by_deadline(&mut self) {
        let mut entries: Vec<_> = self
            .tasks
            .drain(..)
            .zip(self.response_times.drain(..))
            .collect();
        entries.sort_by(|(a, _), (b, _)| {
            a.deadline
                .cmp(&b.deadline)
                .then_with(|| a.period.cmp(&b.period))
        });
        let (tasks, response_times) = entries.into_iter().unzip();
        self.tasks = tasks;
        self.response_times = response_times;
    }

    pub fn utilization(&self) -> Time {
        self.tasks.iter().map(SporadicTask::utilization).sum()
    }

    pub fn max_density(&self) -> Time {
        self.tasks
            .iter()
            .map(SporadicTask::density)
            .max()
            .unwrap_or_else(Time::zero)
    }

    pub fn total_cost(&self) -> Service {
        self.tasks.iter().map(SporadicTask::cost).sum()
    }

    pub fn min_deadline(&self) -> Option<&Duration> {
        self.tasks.iter().map(SporadicTask::deadline).min()
    }

    pub fn max_deadline(&self) -> Option<&Duration> {
        self.tasks.iter().map(SporadicTask::deadline).max()
    }

    pub fn has_constrained_deadlines(&self) -> bool {
        self.tasks.iter().all(SporadicTask::has_constrained_deadline)
    }

    /// The least common multiple of all periods (which may be
    /// fractional), or `None` for an empty system.
    pub fn hyperperiod(&self) -> Option<Duration> {
        self.tasks
            .iter()
            .map(|task| task.period.clone())
            .reduce(|acc, period| {
                let common = gcd(acc.clone(), period.clone());
                acc * period / common
            })
    }
}

// Euclid's algorithm, which also terminates on positive rationals.
fn gcd(mut a: Time, mut b: Time) -> Time {
    while !b.is_zero() {
        let rem = &a - &((&a / &b).floor() * &b);
        a = b;
        b = rem;
    }
    a
}

impl From<Vec<SporadicTask>> for TaskSystem {
    fn from(tasks: Vec<SporadicTask>) -> Self {
        let response_times = vec![None; tasks.len()];
        TaskSystem {
            tasks,
            response_times,
        }
    }
}

impl FromIterator<SporadicTask> for TaskSystem {
    fn from_iter<I: IntoIterator<Item = SporadicTask>>(iter: I) -> Self {
        TaskSystem::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl Index<usize> for TaskSystem {
    type Output = SporadicTask;

    fn index(&self, index: usize) -> &SporadicTask {
        &self.tasks[index]
    }
}

impl<'a> IntoIterator for &'a TaskSystem {
    type Item = &'a SporadicTask;
    type IntoIter = std::slice::Iter<'a, SporadicTask>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

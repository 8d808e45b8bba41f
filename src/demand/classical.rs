use super::{progression, DemandBound};
use crate::task::SporadicTask;
use crate::time::{Duration, Instant, Service, Time};

/// The classical demand-bound function (DBF) of a sporadic task.
///
/// In an interval of length `delta`, the task demands the cost of
/// every job that is released and due within the interval, which is
/// maximized by a synchronous periodic release sequence:
/// `(⌊(delta - D) / T⌋ + 1) · C` for `delta ≥ D`, and zero otherwise.
#[derive(Clone, Debug)]
pub struct Dbf<'a> {
    task: &'a SporadicTask,
}

impl<'a> Dbf<'a> {
    pub fn new(task: &'a SporadicTask) -> Self {
        Dbf { task }
    }

    /// The number of jobs with release and deadline inside an interval
    /// of length `delta`.
    pub fn number_of_due_jobs(&self, delta: &Duration) -> Time {
        let deadline = self.task.deadline();
        if delta >= deadline {
            ((delta - deadline) / self.task.period()).floor() + Time::one()
        } else {
            Time::zero()
        }
    }

    /// The largest absolute deadline strictly before `t` in a
    /// synchronous periodic release, if any.
    pub fn last_deadline_before(&self, t: &Instant) -> Option<Instant> {
        let (period, deadline) = (self.task.period(), self.task.deadline());
        if t > deadline {
            let k = ((t - deadline) / period).ceil() - Time::one();
            Some(k * period + deadline)
        } else {
            None
        }
    }
}

impl<'a> DemandBound for Dbf<'a> {
    fn demand(&self, delta: &Duration) -> Service {
        self.number_of_due_jobs(delta) * self.task.cost()
    }

    fn steps_after<'b>(&'b self, after: &Duration) -> Box<dyn Iterator<Item = Duration> + 'b> {
        Box::new(deadlines_after(self.task, after))
    }
}

/// The absolute deadlines `k·T + D` greater than `after`.
pub(super) fn deadlines_after(
    task: &SporadicTask,
    after: &Duration,
) -> impl Iterator<Item = Duration> {
    let period = task.period().clone();
    // skip the jobs whose deadlines are certainly not after `after`
    let first = after.saturating_sub(task.deadline()) / &period;
    let start = first.floor() * &period + task.deadline();
    let after = after.clone();
    progression(start, period).skip_while(move |d| *d <= after)
}

/// The request-bound function of a sporadic task: the cumulative cost
/// of all jobs that may be released in a half-open interval of
/// length `delta`, i.e., `⌈delta / T⌉ · C`.
pub fn rbf(task: &SporadicTask, delta: &Duration) -> Service {
    if delta.is_positive() {
        (delta / task.period()).ceil() * task.cost()
    } else {
        Time::zero()
    }
}

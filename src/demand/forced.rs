use super::{progression, DemandBound};
use crate::merge::merge;
use crate::task::{ModelError, SporadicTask};
use crate::time::{Duration, Service, Time};

/// The speed of the processor relative to unit speed, restricted to
/// `(0, 1]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Speedup(Time);

impl Speedup {
    pub fn new(factor: impl Into<Time>) -> Result<Self, ModelError> {
        let factor = factor.into();
        if factor.is_positive() && factor <= Time::one() {
            Ok(Speedup(factor))
        } else {
            Err(ModelError::InvalidSpeedup(factor))
        }
    }

    /// A unit-speed processor.
    pub fn unit() -> Self {
        Speedup(Time::one())
    }

    pub fn factor(&self) -> &Time {
        &self.0
    }
}

/// The forced-forward demand-bound function (FF-DBF) of a sporadic task
/// on a processor of speed `σ`.
///
/// For an interval of length `delta` ending at time `delta` of a
/// synchronous periodic release, job `i` (released at `i·T` with
/// `i·T ≤ delta`) must have executed at least
///
/// `max(0, C - σ · max(0, i·T + D - delta))`
///
/// units by the end of the interval, because the processor cannot
/// finish more than `σ` units per time unit before the job's deadline.
/// Jobs whose deadline has passed thus count in full, and the last job
/// contributes linearly from `D - C/σ` onwards. The sum is zero for
/// short intervals, non-decreasing, and never smaller than the
/// classical DBF.
#[derive(Clone, Debug)]
pub struct ForcedForward<'a> {
    task: &'a SporadicTask,
    speed: Speedup,
}

impl<'a> ForcedForward<'a> {
    pub fn new(task: &'a SporadicTask, speed: Speedup) -> Self {
        ForcedForward { task, speed }
    }
}

impl<'a> DemandBound for ForcedForward<'a> {
    fn demand(&self, delta: &Duration) -> Service {
        let (cost, period, deadline) = (self.task.cost(), self.task.period(), self.task.deadline());
        let sigma = self.speed.factor();
        if delta.is_negative() {
            return Time::zero();
        }
        // all jobs with deadlines inside the interval are forced in full
        let full_jobs = if delta >= deadline {
            ((delta - deadline) / period).floor() + Time::one()
        } else {
            Time::zero()
        };
        let mut total = &full_jobs * cost;
        // the remaining jobs released inside the interval are forced in part
        let mut release = full_jobs * period;
        while &release <= delta {
            let slack_time = (&release + deadline) - delta;
            let forced = cost - &(slack_time * sigma);
            if forced.is_positive() {
                total += forced;
            }
            release = release + period;
        }
        total
    }

    fn steps_after<'b>(&'b self, after: &Duration) -> Box<dyn Iterator<Item = Duration> + 'b> {
        Box::new(ramp_points(self.task, &self.speed, after))
    }
}

/// The breakpoints of the FF-DBF greater than `after`: for each job
/// `k`, the point `k·T + max(0, D - C/σ)` where it starts to be forced
/// and its deadline `k·T + D` where it is forced in full.
///
/// When one job's deadline coincides with the next job's starting
/// point, the value appears twice.
pub(super) fn ramp_points(
    task: &SporadicTask,
    speed: &Speedup,
    after: &Duration,
) -> impl Iterator<Item = Duration> {
    let (cost, period, deadline) = (task.cost(), task.period(), task.deadline());
    // a job needs at least C/σ time units on this processor
    let lag = deadline.saturating_sub(&(cost / speed.factor()));
    // skip the jobs that are fully forced before `after`
    let first = (after.saturating_sub(deadline) / period).floor() * period;
    let starts = progression(&first + &lag, period.clone());
    let ends = progression(first + deadline, period.clone());
    let after = after.clone();
    merge(vec![starts, ends]).skip_while(move |t| *t <= after)
}

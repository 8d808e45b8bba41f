/*! Models of processor demand (classical and forced-forward demand-bound functions)

This module provides the trait [DemandBound], which bounds the processor
demand of a task (or of a whole task system) in an interval of a given
length and exposes the points at which that demand changes, together
with its two shapes for sporadic tasks:

- [Dbf], the classical demand-bound function: the cumulative cost of
  all jobs with both release and deadline inside the interval.
- [ForcedForward], the *forced-forward* demand-bound function: the
  minimum amount of execution that any job sequence of the task must
  have received by the end of the interval at a given processor
  [Speedup], which also credits jobs whose deadline has not passed
  yet.

Demand-change points of individual tasks are infinite ascending
sequences; [Aggregate] and the system-level functions [testing_set] and
[deadline_set] combine them lazily with [crate::merge]. */

use std::iter;

use auto_impl::auto_impl;

use crate::merge::{merge, uniq};
use crate::task::{SporadicTask, TaskSystem};
use crate::time::{Duration, Instant, Service, Time};

/// The general interface for processor demand of a single task or of
/// a collection of tasks.
#[auto_impl(&, Box, Rc)]
pub trait DemandBound {
    /// Bound the demand in any interval of length `delta`.
    fn demand(&self, delta: &Duration) -> Service;

    /// Yield, in non-decreasing order, the interval lengths strictly
    /// greater than `after` at which [DemandBound::demand] changes.
    ///
    /// The demand is linear between any two consecutive points, so
    /// checking a linear condition at these points suffices.
    fn steps_after<'a>(&'a self, after: &Duration) -> Box<dyn Iterator<Item = Duration> + 'a>;
}

mod aggregate;
mod classical;
mod forced;

pub use aggregate::Aggregate;
pub use classical::{rbf, Dbf};
pub use forced::{ForcedForward, Speedup};

/// The forced-forward demand of `task` in an interval of length
/// `delta` on a processor of speed `speed`.
pub fn ffdbf(task: &SporadicTask, delta: &Duration, speed: &Speedup) -> Service {
    ForcedForward::new(task, speed.clone()).demand(delta)
}

/// The interval lengths greater than `offset` at which
/// [ffdbf]`(task, ·, speed)` changes slope.
///
/// The sequence is infinite; each call starts afresh.
pub fn test_points<'a>(
    task: &'a SporadicTask,
    speed: &Speedup,
    offset: &Duration,
) -> Box<dyn Iterator<Item = Duration> + 'a> {
    Box::new(forced::ramp_points(task, speed, offset))
}

/// The merged, duplicate-free [test_points] of all tasks in `ts`,
/// i.e., every interval length greater than `offset` at which the
/// forced-forward demand of *some* task changes.
pub fn testing_set<'a>(
    ts: &'a TaskSystem,
    speed: &Speedup,
    offset: &Duration,
) -> Box<dyn Iterator<Item = Duration> + 'a> {
    merged_steps(
        ts.iter()
            .map(|task| forced::ramp_points(task, speed, offset))
            .collect(),
    )
}

/// The classical demand bound of `task` in an interval of length `delta`.
pub fn dbf(task: &SporadicTask, delta: &Duration) -> Service {
    Dbf::new(task).demand(delta)
}

/// The absolute deadlines greater than `offset` of a synchronous
/// periodic release of `task`.
pub fn deadline_points<'a>(
    task: &'a SporadicTask,
    offset: &Duration,
) -> Box<dyn Iterator<Item = Duration> + 'a> {
    Box::new(classical::deadlines_after(task, offset))
}

/// The merged, duplicate-free [deadline_points] of all tasks in `ts`:
/// the points at which the classical system demand changes.
pub fn deadline_set<'a>(
    ts: &'a TaskSystem,
    offset: &Duration,
) -> Box<dyn Iterator<Item = Duration> + 'a> {
    merged_steps(
        ts.iter()
            .map(|task| classical::deadlines_after(task, offset))
            .collect(),
    )
}

/// The largest absolute deadline of any task in `ts` strictly before
/// `t`, if there is one.
pub fn last_deadline_before(ts: &TaskSystem, t: &Instant) -> Option<Instant> {
    ts.iter()
        .filter_map(|task| Dbf::new(task).last_deadline_before(t))
        .max()
}

/// Sum of the classical demand of all tasks in `ts`.
pub fn total_dbf(ts: &TaskSystem, delta: &Duration) -> Service {
    ts.iter().map(|task| dbf(task, delta)).sum()
}

/// Sum of the forced-forward demand of all tasks in `ts`.
pub fn total_ffdbf(ts: &TaskSystem, delta: &Duration, speed: &Speedup) -> Service {
    ts.iter().map(|task| ffdbf(task, delta, speed)).sum()
}

// Sources without any demand steps (e.g., an empty task system) merge
// into an empty sequence, which must not be handed to `uniq`.
fn merged_steps<'a, I>(per_task: Vec<I>) -> Box<dyn Iterator<Item = Duration> + 'a>
where
    I: Iterator<Item = Duration> + 'a,
{
    let mut merged = merge(per_task).peekable();
    if merged.peek().is_none() {
        Box::new(iter::empty())
    } else {
        Box::new(uniq(merged))
    }
}

// An infinite arithmetic progression.
fn progression(start: Time, step: Time) -> impl Iterator<Item = Time> {
    iter::successors(Some(start), move |x| Some(x + &step))
}

//! Response-time bounds for preemptive EDF on a dedicated uniprocessor
//!
//! Both analyses consider sporadic tasks with arbitrary deadlines,
//! scheduled by *earliest-deadline first* on one unit-speed processor.
//! On success, they store one bound per task in the [TaskSystem] and
//! then reorder it by (deadline, period), i.e., in EDF priority order.
//! On failure, the task system is left untouched.
//!
//! Only [exact_wcrt] solves a recurrence by fixed-point iteration.
//! [approx_wcrt] is a single forward scan over the deadlines up to a
//! closed-form horizon; its iteration budget counts scanned deadlines.

use thiserror::Error;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::demand::{self, dbf, rbf};
use crate::fixed_point::{self, SearchFailure};
use crate::merge::{merge, uniq};
use crate::supply::Dedicated;
use crate::task::{SporadicTask, TaskSystem};
use crate::time::{Duration, Time};

/// Error type returned when a response-time analysis cannot bound all
/// tasks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RtaError {
    /// The busy window is unbounded: there is no finite bound.
    #[error("no finite response-time bound exists")]
    Diverged,
    /// The configured iteration budget ran out; the result is
    /// inconclusive.
    #[error("analysis inconclusive after {iterations} iterations")]
    BudgetExhausted { iterations: usize },
}

impl From<SearchFailure> for RtaError {
    fn from(failure: SearchFailure) -> Self {
        match failure {
            SearchFailure::DivergenceLimitExceeded { .. } => RtaError::Diverged,
            SearchFailure::BudgetExhausted { iterations } => RtaError::BudgetExhausted { iterations },
        }
    }
}

/// Bound the response times of all tasks in `ts` with the slack-based
/// approximation. Returns `true` iff bounds were stored.
pub fn approx_wcrt(ts: &mut TaskSystem) -> bool {
    approx_wcrt_with(ts, &AnalysisConfig::default()).is_ok()
}

/// Bound the response times of all tasks in `ts` exactly. Returns
/// `true` iff bounds were stored.
pub fn exact_wcrt(ts: &mut TaskSystem) -> bool {
    exact_wcrt_with(ts, &AnalysisConfig::default()).is_ok()
}

/// Slack-based response-time bounds.
///
/// A job of task `i` released at time zero is due at `D_i`. At every
/// later deadline `t`, the processor has `t - dbf(t)` units of slack in
/// `[0, t)`; the job hence finishes at the latest at `D_i` minus the
/// smallest slack seen at any deadline `t ≥ D_i`.
///
/// This is not an iterative search. The horizon follows from the linear
/// demand bound `dbf(t) ≤ U·t + B`, where `B = Σ U_j · max(0, T_j - D_j)`
/// bounds the carry-in of arbitrary-deadline tasks: the slack is then at
/// least `(1 - U)·t - B`, which exceeds `s* = max_i (D_i - dbf(D_i))`
/// for all `t > (B + s*) / (1 - U)`. Deadlines beyond
/// `max(D_max, (B + s*) / (1 - U))` hence cannot lower any task's
/// minimum, and the scan stops there.
///
/// The bound is never below the exact one of [exact_wcrt_with] and
/// coincides with it in many cases.
pub fn approx_wcrt_with(ts: &mut TaskSystem, config: &AnalysisConfig) -> Result<(), RtaError> {
    let utilization = ts.utilization();
    if utilization >= Time::one() {
        debug!(%utilization, "approx_wcrt: processor overloaded");
        return Err(RtaError::Diverged);
    }
    let bounds = slack_bounds(ts, &utilization, config.iteration_budget)?;
    debug!(tasks = ts.len(), "approx_wcrt: all tasks bounded");
    ts.store_response_times(bounds);
    ts.sort_by_deadline();
    Ok(())
}

fn slack_bounds(
    ts: &TaskSystem,
    utilization: &Time,
    budget: Option<usize>,
) -> Result<Vec<Duration>, RtaError> {
    let max_deadline = match ts.max_deadline() {
        Some(d) => d,
        None => return Ok(Vec::new()),
    };
    let carry_in: Time = ts
        .iter()
        .map(|tsk| tsk.utilization() * tsk.period().saturating_sub(tsk.deadline()))
        .sum();
    let initial_slack = ts
        .iter()
        .map(|tsk| tsk.deadline() - &demand::total_dbf(ts, tsk.deadline()))
        .max()
        .unwrap_or_else(Time::zero);
    let horizon = std::cmp::max(
        max_deadline.clone(),
        (carry_in + initial_slack) / (Time::one() - utilization),
    );

    // slack at every deadline up to the horizon
    let mut checkpoints: Vec<(Duration, Time)> = Vec::new();
    for t in demand::deadline_set(ts, &Time::zero()).take_while(|t| *t <= horizon) {
        if budget.map_or(false, |max| checkpoints.len() >= max) {
            return Err(RtaError::BudgetExhausted {
                iterations: checkpoints.len(),
            });
        }
        let slack = &t - &demand::total_dbf(ts, &t);
        checkpoints.push((t, slack));
    }
    // minimum slack at or after each checkpoint
    let mut min_slack_after: Vec<Time> = Vec::with_capacity(checkpoints.len());
    for (_, slack) in checkpoints.iter().rev() {
        let min = match min_slack_after.last() {
            Some(m) if m <= slack => m.clone(),
            _ => slack.clone(),
        };
        min_slack_after.push(min);
    }
    min_slack_after.reverse();

    let bounds = ts
        .iter()
        .map(|tsk| {
            // every deadline is a checkpoint, so this is in range
            let first = checkpoints.partition_point(|(t, _)| t < tsk.deadline());
            tsk.deadline() - &min_slack_after[first]
        })
        .collect();
    Ok(bounds)
}

/// Exact response-time bounds.
///
/// First, the maximum length `L` of a synchronous busy window is
/// bounded. Then, for each task `i`, every offset `A` in `[0, L)` at
/// which a job of `i` released at `A` has an absolute deadline that
/// coincides with a deadline of some task is considered. The job's
/// completion time `x` is the least fixed point of
///
/// `x = dbf_i(A + D_i) + Σ_{j ≠ i} min(rbf_j(x), dbf_j(A + D_i))`,
///
/// i.e., the job competes with all jobs of other tasks that are
/// released before `x` and due no later than itself. The response-time
/// bound of `i` is the maximum of `max(C_i, x - A)` over all offsets.
#[allow(non_snake_case)]
pub fn exact_wcrt_with(ts: &mut TaskSystem, config: &AnalysisConfig) -> Result<(), RtaError> {
    let utilization = ts.utilization();
    if utilization >= Time::one() {
        debug!(%utilization, "exact_wcrt: processor overloaded");
        return Err(RtaError::Diverged);
    }
    let budget = config.iteration_budget;
    let proc = Dedicated::new();
    let limit = ts.total_cost() / (Time::one() - &utilization);

    // First, bound the maximum possible busy-window length.
    let system: &TaskSystem = ts;
    let L = fixed_point::search(&proc, system.total_cost(), &limit, budget, |delta| {
        system.iter().map(|tsk| rbf(tsk, delta)).sum()
    })?;
    debug!(busy_window = %L, "exact_wcrt: busy window bounded");

    // Second, bound each task over its search space.
    let bounds = system
        .iter()
        .enumerate()
        .map(|(i, tua)| {
            let rta = |A: Duration| -> fixed_point::SearchResult {
                let due = &A + tua.deadline();
                let rhs = |x: &Duration| {
                    let interference: Time = system
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, ot)| std::cmp::min(rbf(ot, x), dbf(ot, &due)))
                        .sum();
                    dbf(tua, &due) + interference
                };
                let x = fixed_point::search(&proc, tua.cost().clone(), &L, budget, rhs)?;
                Ok(std::cmp::max(tua.cost().clone(), x - &A))
            };
            fixed_point::max_response_time(offsets(system, tua, &L).map(rta))
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(tasks = bounds.len(), "exact_wcrt: all tasks bounded");
    ts.store_response_times(bounds);
    ts.sort_by_deadline();
    Ok(())
}

/// The offsets `A ∈ [0, max_offset)` such that `A + D_i` is an absolute
/// deadline of some task (including `tua` itself), in increasing order.
fn offsets<'a>(
    ts: &'a TaskSystem,
    tua: &'a SporadicTask,
    max_offset: &Duration,
) -> impl Iterator<Item = Duration> + 'a {
    let per_task = ts.iter().map(move |ot| {
        demand::deadline_points(ot, &Time::zero())
            .skip_while(move |d| d < tua.deadline())
            .map(move |d| d - tua.deadline())
    });
    let max_offset = max_offset.clone();
    // A = 0 is always included, so the sequence is never empty
    uniq(merge(per_task.collect::<Vec<_>>()).take_while(move |offset| *offset < max_offset))
}

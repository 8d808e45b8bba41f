/*! The exact feasibility test QPA ("quick processor-demand analysis")

A task system is feasible under EDF on a speed-`m` resource iff
`dbf(t) ≤ m·t` for every interval length `t`. QPA checks this
condition without enumerating all deadlines: it starts from the last
deadline before a horizon `L` beyond which no violation can occur and
walks backwards, jumping directly from `t` to `dbf(t)/m` whenever
that is smaller, because no deadline in between can be a witness.

On `m` identical processors, the tasks are treated as a fluid workload
on a speed-`m` processor. The test is exact for `m = 1`; for `m > 1`
it decides the fluid condition, which every feasible system satisfies.

## Citation

- F. Zhang and A. Burns, “Schedulability Analysis for Real-Time
  Systems with EDF Scheduling”, *IEEE Transactions on Computers*,
  58(9):1250--1258, 2009.
*/

use auto_impl::auto_impl;
use tracing::{debug, trace};

use crate::demand::{self, rbf};
use crate::fixed_point::{self, SearchResult};
use crate::supply::{Identical, SupplyBound};
use crate::task::TaskSystem;
use crate::time::{Duration, Time};

pub mod native;

/// A yes/no schedulability test for a fixed platform.
#[auto_impl(&, Box, Rc)]
pub trait FeasibilityTest {
    /// Decide whether `ts` is schedulable.
    fn is_schedulable(&self, ts: &TaskSystem) -> bool;
}

/// QPA in exact rational arithmetic.
///
/// This is the reference implementation; [native::QpaTest] reaches the
/// same verdicts on integral task systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Qpa {
    platform: Identical,
}

impl Qpa {
    /// QPA for `processors > 0` identical unit-speed processors.
    pub fn new(processors: u32) -> Self {
        Qpa {
            platform: Identical::new(processors),
        }
    }

    pub fn processors(&self) -> u32 {
        self.platform.processors()
    }

    /// The interval length up to which the demand must be checked.
    ///
    /// This is `min(La, Lb)`, where `Lb` is the length of the
    /// synchronous busy window and
    /// `La = max(D_max, Σ (T_j - D_j)·U_j / (m - U))`. If `U = m`,
    /// only `Lb` is finite.
    pub fn horizon(&self, ts: &TaskSystem) -> SearchResult {
        let capacity = Time::from(self.processors());
        let utilization = ts.utilization();
        let max_deadline = ts.max_deadline().cloned().unwrap_or_else(Time::zero);
        if utilization < capacity {
            let spare = capacity - &utilization;
            let la = std::cmp::max(
                max_deadline,
                ts.iter()
                    .map(|tsk| (tsk.period() - tsk.deadline()) * tsk.utilization())
                    .sum::<Time>()
                    / spare.clone(),
            );
            let lb = self.busy_window(ts, &(ts.total_cost() / spare))?;
            Ok(std::cmp::min(la, lb))
        } else {
            // the busy window closes no later than at the hyperperiod
            let limit = ts.hyperperiod().unwrap_or_else(Time::zero);
            self.busy_window(ts, &limit)
        }
    }

    fn busy_window(&self, ts: &TaskSystem, limit: &Duration) -> SearchResult {
        let seed = self.platform.service_time(&ts.total_cost());
        fixed_point::search(&self.platform, seed, limit, None, |delta| {
            ts.iter().map(|tsk| rbf(tsk, delta)).sum()
        })
    }
}

impl FeasibilityTest for Qpa {
    fn is_schedulable(&self, ts: &TaskSystem) -> bool {
        let min_deadline = match ts.min_deadline() {
            Some(d) => d,
            None => return true,
        };
        let utilization = ts.utilization();
        if utilization > Time::from(self.processors()) {
            debug!(%utilization, processors = self.processors(), "QPA: overloaded");
            return false;
        }
        let horizon = match self.horizon(ts) {
            Ok(l) => l,
            Err(err) => {
                debug!(%err, "QPA: no horizon");
                return false;
            }
        };
        let mut t = match demand::last_deadline_before(ts, &horizon) {
            Some(t) => t,
            None => return true,
        };
        loop {
            let h = self.platform.service_time(&demand::total_dbf(ts, &t));
            trace!(%t, %h, "QPA step");
            if h > t {
                debug!(%t, "QPA: demand exceeds supply");
                return false;
            }
            if &h <= min_deadline {
                return true;
            }
            t = if h < t {
                h
            } else {
                match demand::last_deadline_before(ts, &t) {
                    Some(prev) => prev,
                    None => return true,
                }
            };
        }
    }
}

//! QPA on machine integers
//!
//! [QpaTest] runs the same decision procedure as [super::Qpa] on
//! integral task parameters in `u128` arithmetic. Because all
//! deadlines are integers, the demand only changes at integer points,
//! and jumping to `⌊dbf(t)/m⌋` instead of `dbf(t)/m` skips no
//! candidate deadline. Should an intermediate value not fit, the test
//! falls back to the rational implementation, so that both always
//! agree.

use thiserror::Error;
use tracing::debug;

use super::{FeasibilityTest, Qpa};
use crate::task::{ModelError, SporadicTask, TaskSystem};
use crate::time::Time;

/// Error type returned when a task system has no native representation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("parameter {value} of task {task} is not an integer")]
    NonIntegral { task: usize, value: Time },
    #[error("parameter {value} of task {task} does not fit into 64 bits")]
    OutOfRange { task: usize, value: Time },
    #[error("total utilization is not representable")]
    UtilizationOverflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NativeTask {
    cost: u64,
    period: u64,
    deadline: u64,
}

impl NativeTask {
    fn dbf(&self, t: u128) -> Option<u128> {
        let (period, deadline) = (u128::from(self.period), u128::from(self.deadline));
        if t < deadline {
            Some(0)
        } else {
            ((t - deadline) / period + 1).checked_mul(u128::from(self.cost))
        }
    }

    fn rbf(&self, delta: u128) -> Option<u128> {
        div_ceil(delta, u128::from(self.period)).checked_mul(u128::from(self.cost))
    }

    fn last_deadline_before(&self, t: u128) -> Option<u128> {
        let (period, deadline) = (u128::from(self.period), u128::from(self.deadline));
        if t > deadline {
            Some((t - deadline - 1) / period * period + deadline)
        } else {
            None
        }
    }
}

/// A losslessly converted copy of a [TaskSystem] with integral
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTaskSet {
    tasks: Vec<NativeTask>,
    // total utilization as a reduced fraction
    utilization: (u128, u128),
}

impl NativeTaskSet {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn to_task_system(&self) -> Result<TaskSystem, ModelError> {
        self.tasks
            .iter()
            .map(|t| SporadicTask::new_with_deadline(t.cost, t.period, t.deadline))
            .collect()
    }

    fn total_dbf(&self, t: u128) -> Option<u128> {
        self.tasks
            .iter()
            .try_fold(0u128, |sum, task| sum.checked_add(task.dbf(t)?))
    }

    fn total_rbf(&self, delta: u128) -> Option<u128> {
        self.tasks
            .iter()
            .try_fold(0u128, |sum, task| sum.checked_add(task.rbf(delta)?))
    }

    fn last_deadline_before(&self, t: u128) -> Option<u128> {
        self.tasks
            .iter()
            .filter_map(|task| task.last_deadline_before(t))
            .max()
    }
}

fn native_param(task: usize, value: &Time) -> Result<u64, ConversionError> {
    if !value.is_integral() {
        return Err(ConversionError::NonIntegral {
            task,
            value: value.clone(),
        });
    }
    value.to_u64().ok_or_else(|| ConversionError::OutOfRange {
        task,
        value: value.clone(),
    })
}

impl TryFrom<&TaskSystem> for NativeTaskSet {
    type Error = ConversionError;

    fn try_from(ts: &TaskSystem) -> Result<Self, Self::Error> {
        let tasks = ts
            .iter()
            .enumerate()
            .map(|(i, task)| -> Result<NativeTask, ConversionError> {
                Ok(NativeTask {
                    cost: native_param(i, task.cost())?,
                    period: native_param(i, task.period())?,
                    deadline: native_param(i, task.deadline())?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let utilization = tasks
            .iter()
            .try_fold((0u128, 1u128), |(num, den), task| {
                add_fraction(num, den, u128::from(task.cost), u128::from(task.period))
            })
            .ok_or(ConversionError::UtilizationOverflow)?;
        Ok(NativeTaskSet { tasks, utilization })
    }
}

/// QPA for `m` identical processors on [NativeTaskSet]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QpaTest {
    processors: u32,
}

impl QpaTest {
    /// The test for `processors > 0` identical unit-speed processors.
    pub fn new(processors: u32) -> Self {
        assert!(processors > 0, "a platform needs at least one processor");
        QpaTest { processors }
    }

    pub fn processors(&self) -> u32 {
        self.processors
    }

    /// Decide whether `ts` is feasible.
    pub fn is_schedulable(&self, ts: &NativeTaskSet) -> bool {
        match self.decide(ts) {
            Some(verdict) => verdict,
            None => {
                debug!("native QPA: arithmetic overflow, using rational QPA");
                ts.to_task_system()
                    .map_or(false, |ts| Qpa::new(self.processors).is_schedulable(&ts))
            }
        }
    }

    // `None` signals an overflow.
    fn decide(&self, ts: &NativeTaskSet) -> Option<bool> {
        let m = u128::from(self.processors);
        let min_deadline = match ts.tasks.iter().map(|task| task.deadline).min() {
            Some(d) => u128::from(d),
            None => return Some(true),
        };
        let (num, den) = ts.utilization;
        if num > m.checked_mul(den)? {
            return Some(false);
        }
        let horizon = self.busy_window(ts)?;
        let mut t = match ts.last_deadline_before(horizon) {
            Some(t) => t,
            None => return Some(true),
        };
        loop {
            let demand = ts.total_dbf(t)?;
            let supply = m.checked_mul(t)?;
            if demand > supply {
                return Some(false);
            }
            if demand <= m.checked_mul(min_deadline)? {
                return Some(true);
            }
            t = if demand < supply {
                demand / m
            } else {
                match ts.last_deadline_before(t) {
                    Some(prev) => prev,
                    None => return Some(true),
                }
            };
        }
    }

    // The least integer `w` with `⌈rbf(w)/m⌉ = w`, which is never below
    // the rational busy-window length. It exists whenever `U ≤ m`.
    fn busy_window(&self, ts: &NativeTaskSet) -> Option<u128> {
        let m = u128::from(self.processors);
        let total_cost = ts
            .tasks
            .iter()
            .try_fold(0u128, |sum, task| sum.checked_add(u128::from(task.cost)))?;
        let mut assumed = div_ceil(total_cost, m);
        loop {
            let bound = div_ceil(ts.total_rbf(assumed)?, m);
            if bound <= assumed {
                return Some(bound);
            }
            assumed = bound;
        }
    }
}

impl FeasibilityTest for QpaTest {
    /// Converts `ts` and runs the native test; task systems without a
    /// native representation are decided by [Qpa].
    fn is_schedulable(&self, ts: &TaskSystem) -> bool {
        match NativeTaskSet::try_from(ts) {
            Ok(native) => QpaTest::is_schedulable(self, &native),
            Err(err) => {
                debug!(%err, "native QPA: using rational QPA");
                Qpa::new(self.processors).is_schedulable(ts)
            }
        }
    }
}

fn div_ceil(a: u128, b: u128) -> u128 {
    a / b + u128::from(a % b != 0)
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let rem = a % b;
        a = b;
        b = rem;
    }
    a
}

// `num/den + c/p`, reduced.
fn add_fraction(num: u128, den: u128, c: u128, p: u128) -> Option<(u128, u128)> {
    let g = gcd(den, p);
    let lcm = (den / g).checked_mul(p)?;
    let sum = num
        .checked_mul(lcm / den)?
        .checked_add(c.checked_mul(lcm / p)?)?;
    let common = gcd(sum, lcm);
    Some((sum / common, lcm / common))
}

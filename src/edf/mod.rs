/*! Analyses for *earliest-deadline first* (**EDF**) scheduling

This module collects the EDF analyses of sporadic task systems:

- [rta]: response-time bounds on a dedicated uniprocessor,
- [qpa]: the exact demand-based feasibility test,
- [ffdbf]: a sufficient test for global EDF on multiprocessors.

Use [is_schedulable] to decide schedulability: on a uniprocessor with
the fastest available QPA implementation, and on multiprocessors with
the sufficient FF-DBF test.
*/

pub mod ffdbf;
pub mod qpa;
pub mod rta;

pub use qpa::FeasibilityTest;

use tracing::debug;

use crate::task::TaskSystem;

/// Decide whether `ts` is guaranteed to meet all deadlines under EDF
/// on `processors` identical processors.
///
/// A single processor is decided exactly by QPA: integral task systems
/// natively, all others with exact rational arithmetic. With more
/// processors, `true` means the system passes the sufficient
/// [ffdbf] test for global EDF. A platform without processors can
/// schedule nothing, and no platform finishes a job whose cost exceeds
/// its relative deadline.
pub fn is_schedulable(processors: u32, ts: &TaskSystem) -> bool {
    if processors == 0 {
        return false;
    }
    if let Some(i) = ts.iter().position(|tsk| tsk.cost() > tsk.deadline()) {
        debug!(task = i, "EDF: cost exceeds deadline");
        return false;
    }
    if processors == 1 {
        FeasibilityTest::is_schedulable(&qpa::native::QpaTest::new(1), ts)
    } else {
        ffdbf::is_schedulable(processors, ts)
    }
}

#[cfg(test)]
mod tests;

/*! Exact schedulability analysis of sporadic task systems under EDF

This crate provides the demand-computation and fixed-point machinery
behind the exact analyses of *earliest-deadline first* (**EDF**)
scheduling of sporadic tasks:

- [demand]: the classical and the forced-forward demand-bound
  functions, plus the lazily merged sequences of points at which they
  change,
- [edf::rta]: worst-case response-time bounds (an approximate and an
  exact variant),
- [edf::qpa]: the exact pseudo-polynomial feasibility test (QPA), with
  an interchangeable integer backend,
- [edf::ffdbf]: the FF-DBF sufficient test for global EDF on
  multiprocessors.

All computations use exact rational arithmetic (see [time]).

```
use edf_analysis::edf;
use edf_analysis::task::{SporadicTask, TaskSystem};

let mut ts = TaskSystem::from(vec![
    SporadicTask::new(3u64, 12u64).unwrap(),
    SporadicTask::new(2u64, 4u64).unwrap(),
]);
assert!(edf::is_schedulable(1, &ts));
assert!(edf::rta::exact_wcrt(&mut ts));
assert_eq!(ts.response_time(1).unwrap().to_u64(), Some(7));
```
*/

pub mod config;
pub mod demand;
pub mod edf;
pub mod fixed_point;
pub mod merge;
pub mod supply;
pub mod task;
pub mod time;

use crate::config::AnalysisConfig;
use crate::demand;
use crate::edf::qpa::native::{ConversionError, NativeTaskSet, QpaTest};
use crate::edf::qpa::{FeasibilityTest, Qpa};
use crate::edf::rta::{self, RtaError};
use crate::edf::{self, ffdbf};
use crate::task::{SporadicTask, TaskSystem};
use crate::tests::{implicit_system, init_logging, integral_response_times, system, t, task, task_d};
use crate::time::Time;

fn qpa_set() -> TaskSystem {
    system(&[
        (6000, 31000, 18000),
        (2000, 9800, 9000),
        (1000, 17000, 12000),
        (90, 4200, 3000),
        (8, 96, 78),
        (2, 12, 16),
        (10, 280, 120),
        (26, 660, 160),
    ])
}

fn known_unschedulable() -> Vec<TaskSystem> {
    vec![
        system(&[(331, 15000, 2688), (3654, 77000, 3849)]),
        system(&[
            (331, 15000, 2688),
            (413, 34000, 1061),
            (3654, 77000, 3849),
            (349, 70000, 20189),
            (1113, 83000, 10683),
        ]),
    ]
}

fn some(vals: &[u64]) -> Vec<Option<u64>> {
    vals.iter().map(|v| Some(*v)).collect()
}

// Deterministic pseudo-random task systems for cross-checks.
struct XorShift(u64);

impl XorShift {
    fn below(&mut self, n: u64) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0 % n
    }

    fn task_system(&mut self, periods: &[u64], max_tasks: u64) -> TaskSystem {
        let n = 1 + self.below(max_tasks);
        (0..n)
            .map(|_| {
                let period = periods[self.below(periods.len() as u64) as usize];
                let cost = 1 + self.below(period);
                let deadline = 1 + self.below(2 * period);
                task_d(cost, period, deadline)
            })
            .collect()
    }
}

#[test]
fn qpa_verdicts() {
    init_logging();
    let mut ts = qpa_set();
    assert!(edf::is_schedulable(1, &ts));
    ts.push(task_d(10, 100, 15));
    assert!(!edf::is_schedulable(1, &ts));
    for ts in known_unschedulable() {
        assert!(!edf::is_schedulable(1, &ts));
    }
}

#[test]
fn qpa_trivial_cases() {
    let empty = TaskSystem::new();
    assert!(edf::is_schedulable(1, &empty));
    assert!(!edf::is_schedulable(0, &empty));
    assert!(!edf::is_schedulable(0, &qpa_set()));
    // overloaded
    assert!(!edf::is_schedulable(1, &implicit_system(&[(3, 4), (2, 4)])));
    // infeasible in isolation
    assert!(!edf::is_schedulable(1, &system(&[(5, 10, 4)])));
}

#[test]
fn qpa_full_utilization() {
    assert!(edf::is_schedulable(1, &implicit_system(&[(1, 2), (1, 2)])));
    assert!(edf::is_schedulable(1, &system(&[(1, 2, 2), (1, 2, 1)])));
    assert!(edf::is_schedulable(1, &system(&[(2, 4, 3), (1, 2, 2)])));
    assert!(edf::is_schedulable(1, &implicit_system(&[(1, 2), (1, 3), (1, 6)])));
    assert!(!edf::is_schedulable(1, &system(&[(1, 2, 2), (1, 2, 1), (1, 100, 100)])));
}

#[test]
fn qpa_on_multiprocessors() {
    // QPA on m processors checks the fluid demand condition only
    let qpa = Qpa::new(2);
    assert!(qpa.is_schedulable(&implicit_system(&[(3, 4), (3, 4), (1, 2)])));
    assert!(!qpa.is_schedulable(&implicit_system(&[(3, 4), (3, 4), (2, 2)])));
    assert!(!qpa.is_schedulable(&implicit_system(&[(2, 2), (2, 2), (1, 10)])));
    assert!(!qpa.is_schedulable(&system(&[(3, 4, 2), (3, 4, 2)])));
    for ts in known_unschedulable() {
        assert!(qpa.is_schedulable(&ts));
        assert!(QpaTest::new(2).is_schedulable(&NativeTaskSet::try_from(&ts).unwrap()));
    }
}

#[test]
fn edf_rejects_cost_above_deadline() {
    let ts = system(&[(2, 4, 1)]);
    for m in 1..=4 {
        assert!(!edf::is_schedulable(m, &ts), "{} processors", m);
    }
    // the fluid condition alone would accept it
    assert!(Qpa::new(2).is_schedulable(&ts));
    let mixed = system(&[(1, 10, 10), (3, 8, 2)]);
    assert!(!edf::is_schedulable(8, &mixed));
}

#[test]
fn edf_on_multiprocessors_is_sufficient() {
    // global EDF misses a deadline at t = 3
    let ts = implicit_system(&[(2, 3), (2, 3), (2, 3)]);
    assert!(Qpa::new(2).is_schedulable(&ts));
    assert!(!edf::is_schedulable(2, &ts));
    assert!(!edf::is_schedulable(2, &implicit_system(&[(3, 4), (3, 4), (1, 2)])));
    for ts in known_unschedulable() {
        assert!(!edf::is_schedulable(2, &ts));
    }
    assert!(edf::is_schedulable(2, &implicit_system(&[(1, 4), (1, 4), (1, 4)])));
    assert!(edf::is_schedulable(2, &implicit_system(&[(1, 2), (1, 3), (1, 4)])));
    assert!(edf::is_schedulable(2, &qpa_set()));
    assert!(edf::is_schedulable(3, &TaskSystem::new()));
}

#[test]
fn qpa_matches_exhaustive_demand_check() {
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
    for _ in 0..150 {
        let ts = rng.task_system(&[2, 3, 4, 6, 8, 12], 4);
        for m in 1..=2u32 {
            let capacity = Time::from(m);
            let expected = if ts.utilization() > capacity {
                false
            } else {
                // the demand pattern repeats after one hyperperiod
                let horizon = (ts.hyperperiod().unwrap() + ts.max_deadline().unwrap())
                    .to_u64()
                    .unwrap();
                (1..=horizon).all(|x| demand::total_dbf(&ts, &t(x)) <= &capacity * &t(x))
            };
            assert_eq!(Qpa::new(m).is_schedulable(&ts), expected, "{:?} on {}", ts, m);
            if m == 1 {
                assert_eq!(edf::is_schedulable(m, &ts), expected, "{:?}", ts);
            }
        }
    }
}

#[test]
fn native_and_reference_agree() {
    let mut rng = XorShift(12345);
    for _ in 0..300 {
        let ts = rng.task_system(&[1, 5, 7, 10, 16, 25, 32, 40], 5);
        let native = NativeTaskSet::try_from(&ts).unwrap();
        assert_eq!(native.len(), ts.len());
        for m in 1..=3 {
            assert_eq!(
                QpaTest::new(m).is_schedulable(&native),
                Qpa::new(m).is_schedulable(&ts),
                "{:?} on {}",
                ts,
                m
            );
        }
    }
    let mut ts = qpa_set();
    let native = NativeTaskSet::try_from(&ts).unwrap();
    assert!(QpaTest::new(1).is_schedulable(&native));
    assert!(Qpa::new(1).is_schedulable(&ts));
    ts.push(task_d(10, 100, 15));
    let native = NativeTaskSet::try_from(&ts).unwrap();
    assert!(!QpaTest::new(1).is_schedulable(&native));
    assert!(!Qpa::new(1).is_schedulable(&ts));
}

#[test]
fn feasibility_tests_are_interchangeable() {
    let tests: Vec<Box<dyn FeasibilityTest>> = vec![Box::new(Qpa::new(1)), Box::new(QpaTest::new(1))];
    for test in &tests {
        assert!(test.is_schedulable(&qpa_set()));
        for ts in known_unschedulable() {
            assert!(!test.is_schedulable(&ts));
        }
    }
}

#[test]
fn native_conversion() {
    let fractional = TaskSystem::from(vec![
        task(1, 4),
        SporadicTask::new(Time::ratio(1, 2), Time::ratio(3, 2)).unwrap(),
    ]);
    assert_eq!(
        NativeTaskSet::try_from(&fractional),
        Err(ConversionError::NonIntegral {
            task: 1,
            value: Time::ratio(1, 2)
        })
    );
    let huge = t(u64::MAX) + t(1);
    let too_long = TaskSystem::from(vec![SporadicTask::new(1u64, huge.clone()).unwrap()]);
    assert_eq!(
        NativeTaskSet::try_from(&too_long),
        Err(ConversionError::OutOfRange { task: 0, value: huge })
    );
    // three nearly coprime periods close to 2^64
    let odd = implicit_system(&[(1, u64::MAX), (1, u64::MAX - 1), (1, u64::MAX - 2)]);
    assert_eq!(
        NativeTaskSet::try_from(&odd),
        Err(ConversionError::UtilizationOverflow)
    );
    // systems without a native representation are still decided
    assert!(FeasibilityTest::is_schedulable(&QpaTest::new(1), &odd));
    assert!(edf::is_schedulable(1, &odd));
}

#[test]
fn qpa_with_fractional_parameters() {
    let ts = TaskSystem::from(vec![
        SporadicTask::new(Time::ratio(1, 2), Time::ratio(3, 2)).unwrap(),
        SporadicTask::new_with_deadline(Time::ratio(1, 4), 1u64, Time::ratio(1, 2)).unwrap(),
    ]);
    assert!(edf::is_schedulable(1, &ts));
    let tight = TaskSystem::from(vec![
        SporadicTask::new_with_deadline(Time::ratio(1, 2), 1u64, Time::ratio(1, 2)).unwrap(),
        SporadicTask::new_with_deadline(Time::ratio(1, 4), 1u64, Time::ratio(1, 2)).unwrap(),
    ]);
    assert!(!edf::is_schedulable(1, &tight));
}

#[test]
fn qpa_horizon() {
    // U < 1: the busy window (7) is shorter than La
    let ts = implicit_system(&[(3, 12), (2, 4)]);
    assert_eq!(Qpa::new(1).horizon(&ts), Ok(t(7)));
    // U = 1: the busy window is the only bound
    let ts = implicit_system(&[(1, 2), (1, 2)]);
    assert_eq!(Qpa::new(1).horizon(&ts), Ok(t(2)));
    assert_eq!(Qpa::new(1).horizon(&qpa_set()), Ok(t(16984)));
}

#[test]
fn wcrt_two_tasks() {
    let mut ts = implicit_system(&[(3, 12), (2, 4)]);
    assert!(rta::approx_wcrt(&mut ts));
    assert_eq!(ts[0], task(2, 4));
    assert_eq!(ts[1], task(3, 12));
    assert_eq!(integral_response_times(&ts), some(&[2, 9]));

    let mut ts = implicit_system(&[(3, 12), (2, 4)]);
    assert!(rta::exact_wcrt(&mut ts));
    assert_eq!(integral_response_times(&ts), some(&[2, 7]));
}

#[test]
fn wcrt_literal_vectors() {
    let cases: Vec<(TaskSystem, Vec<u64>, Vec<u64>)> = vec![
        (implicit_system(&[(2, 9), (3, 12), (2, 4)]), vec![3, 8, 11], vec![3, 8, 11]),
        (implicit_system(&[(1, 4), (1, 12), (3, 16)]), vec![1, 4, 8], vec![1, 2, 6]),
        (implicit_system(&[(1, 4), (2, 4)]), vec![3, 3], vec![3, 3]),
        (system(&[(2, 5, 4), (3, 6, 5)]), vec![4, 5], vec![4, 5]),
        (system(&[(2, 4, 3), (3, 12, 10), (2, 9, 7)]), vec![3, 7, 10], vec![3, 7, 10]),
        (system(&[(2, 5, 8), (3, 7, 9)]), vec![4, 5], vec![4, 5]),
    ];
    for (ts, approx, exact) in cases {
        let mut ts1 = ts.clone();
        assert!(rta::approx_wcrt(&mut ts1));
        assert_eq!(integral_response_times(&ts1), some(&approx), "approx {:?}", ts);
        let mut ts2 = ts.clone();
        assert!(rta::exact_wcrt(&mut ts2));
        assert_eq!(integral_response_times(&ts2), some(&exact), "exact {:?}", ts);
    }
}

#[test]
fn wcrt_qpa_set() {
    init_logging();
    let mut ts = qpa_set();
    assert!(rta::approx_wcrt(&mut ts));
    assert_eq!(
        integral_response_times(&ts),
        some(&[2, 20, 36, 70, 1684, 7684, 10684, 16684])
    );
    let mut ts = qpa_set();
    assert!(rta::exact_wcrt(&mut ts));
    assert_eq!(ts[0], task_d(2, 12, 16));
    assert_eq!(ts[7], task_d(6000, 31000, 18000));
    assert_eq!(
        integral_response_times(&ts),
        some(&[2, 10, 22, 54, 1066, 7066, 10066, 16066])
    );
}

#[test]
fn wcrt_overload_leaves_system_untouched() {
    let ts = implicit_system(&[(3, 12), (2, 3), (2, 4)]);
    let mut ts1 = ts.clone();
    assert!(!rta::approx_wcrt(&mut ts1));
    assert!(!rta::exact_wcrt(&mut ts1));
    assert_eq!(ts1.tasks(), ts.tasks());
    assert!(ts1.response_times().iter().all(Option::is_none));
    assert_eq!(
        rta::exact_wcrt_with(&mut ts1, &AnalysisConfig::default()),
        Err(RtaError::Diverged)
    );
    // full utilization has no finite bound either
    let mut full = implicit_system(&[(1, 2), (1, 2)]);
    assert_eq!(
        rta::approx_wcrt_with(&mut full, &AnalysisConfig::default()),
        Err(RtaError::Diverged)
    );
}

#[test]
fn failed_analysis_stores_nothing() {
    let mut ts = implicit_system(&[(3, 12), (2, 4)]);
    assert!(rta::exact_wcrt(&mut ts));
    let cfg = AnalysisConfig::default().with_iteration_budget(1);
    ts.push(task(2, 9));
    assert!(ts.response_times().iter().all(Option::is_none));
    let before = ts.clone();
    assert_eq!(
        rta::exact_wcrt_with(&mut ts, &cfg),
        Err(RtaError::BudgetExhausted { iterations: 1 })
    );
    assert_eq!(ts.tasks(), before.tasks());
    assert!(ts.response_times().iter().all(Option::is_none));
}

#[test]
fn wcrt_iteration_budget() {
    let tight = AnalysisConfig::default().with_iteration_budget(1);
    let mut ts = qpa_set();
    assert_eq!(
        rta::exact_wcrt_with(&mut ts, &tight),
        Err(RtaError::BudgetExhausted { iterations: 1 })
    );
    assert_eq!(ts[0], task_d(6000, 31000, 18000));
    assert_eq!(
        rta::approx_wcrt_with(&mut ts, &AnalysisConfig::default().with_iteration_budget(2)),
        Err(RtaError::BudgetExhausted { iterations: 2 })
    );
    assert!(ts.response_times().iter().all(Option::is_none));

    let generous = AnalysisConfig::default().with_iteration_budget(10_000);
    assert_eq!(rta::exact_wcrt_with(&mut ts, &generous), Ok(()));
    assert_eq!(
        integral_response_times(&ts),
        some(&[2, 10, 22, 54, 1066, 7066, 10066, 16066])
    );
}

#[test]
fn wcrt_is_idempotent() {
    let mut ts = system(&[(2, 4, 3), (3, 12, 10), (2, 9, 7)]);
    assert!(rta::exact_wcrt(&mut ts));
    let first = ts.clone();
    assert!(rta::exact_wcrt(&mut ts));
    assert_eq!(ts.tasks(), first.tasks());
    assert_eq!(ts.response_times(), first.response_times());
}

#[test]
fn wcrt_with_fractional_parameters() {
    let ts = TaskSystem::from(vec![
        SporadicTask::new(Time::ratio(1, 2), Time::ratio(3, 2)).unwrap(),
        SporadicTask::new_with_deadline(Time::ratio(1, 4), 1u64, Time::ratio(1, 2)).unwrap(),
    ]);
    let mut ts1 = ts.clone();
    assert!(rta::approx_wcrt(&mut ts1));
    assert_eq!(ts1.response_time(0), Some(&Time::ratio(1, 4)));
    assert_eq!(ts1.response_time(1), Some(&t(1)));
    let mut ts2 = ts;
    assert!(rta::exact_wcrt(&mut ts2));
    assert_eq!(ts2.response_time(0), Some(&Time::ratio(1, 4)));
    assert_eq!(ts2.response_time(1), Some(&Time::ratio(3, 4)));
}

#[test]
fn wcrt_of_empty_system() {
    let mut ts = TaskSystem::new();
    assert!(rta::approx_wcrt(&mut ts));
    assert!(rta::exact_wcrt(&mut ts));
    assert!(ts.response_times().is_empty());
}

#[test]
fn exact_bounds_are_tighter_and_within_deadlines() {
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
    let mut analyzed = 0;
    for _ in 0..100 {
        let ts = rng.task_system(&[2, 3, 4, 6, 8, 12], 4);
        let mut approx = ts.clone();
        let mut exact = ts.clone();
        let ok = rta::approx_wcrt(&mut approx);
        assert_eq!(ok, rta::exact_wcrt(&mut exact));
        if !ok {
            continue;
        }
        analyzed += 1;
        assert_eq!(approx.tasks(), exact.tasks());
        let feasible = edf::is_schedulable(1, &ts);
        for (i, tsk) in exact.iter().enumerate() {
            let (a, e) = (approx.response_time(i).unwrap(), exact.response_time(i).unwrap());
            assert!(e <= a, "{:?}", ts);
            assert!(e >= tsk.cost());
            if feasible {
                assert!(e <= tsk.deadline(), "{:?}", ts);
            }
        }
    }
    assert!(analyzed > 0);
}

#[test]
fn ffdbf_test_uniprocessor() {
    let mut ts = qpa_set();
    assert!(ffdbf::is_schedulable(1, &ts));
    ts.push(task_d(10, 100, 15));
    assert!(!ffdbf::is_schedulable(1, &ts));
    let three = implicit_system(&[(1, 2), (1, 3), (1, 4)]);
    assert!(!ffdbf::is_schedulable(1, &three));
}

#[test]
fn ffdbf_test_multiprocessor() {
    init_logging();
    assert!(ffdbf::is_schedulable(2, &implicit_system(&[(1, 4), (1, 4), (1, 4)])));
    assert!(!ffdbf::is_schedulable(2, &implicit_system(&[(2, 2), (2, 2), (1, 10)])));
    assert!(ffdbf::is_schedulable(2, &implicit_system(&[(1, 2), (1, 3), (1, 4)])));
    // density above one
    assert!(!ffdbf::is_schedulable(4, &system(&[(3, 10, 2)])));
    assert!(!ffdbf::is_schedulable(0, &implicit_system(&[(1, 4)])));
    assert!(ffdbf::is_schedulable(2, &TaskSystem::new()));
}

#[test]
fn ffdbf_test_is_sufficient() {
    let mut rng = XorShift(7);
    let cfg = AnalysisConfig::default().with_speed_granularity(5);
    for _ in 0..100 {
        let ts = rng.task_system(&[2, 3, 4, 6, 8, 12], 4);
        if ffdbf::is_schedulable(1, &ts) {
            assert!(edf::is_schedulable(1, &ts), "{:?}", ts);
        }
        if ffdbf::is_schedulable_with(2, &ts, &cfg) {
            assert!(Qpa::new(2).is_schedulable(&ts), "{:?}", ts);
            assert!(edf::is_schedulable(2, &ts), "{:?}", ts);
        }
    }
}

//! The FF-DBF test for global EDF on identical multiprocessors
//!
//! A sufficient test: a task system passes if, for some processor
//! speed `σ` with `max density ≤ σ ≤ 1`, the total forced-forward
//! demand never exceeds `(m - (m - 1)·σ)·t` in any interval of length
//! `t`. On a uniprocessor (`σ = 1`) this is the classical demand
//! condition and thus exact.
//!
//! ## Citation
//!
//! - S. Baruah, V. Bonifaci, A. Marchetti-Spaccamela, and S. Stiller,
//!   “Improved Multiprocessor Global Schedulability Analysis”,
//!   *Real-Time Systems*, 46(1):3--24, 2010.

use tracing::{debug, trace};

use crate::config::AnalysisConfig;
use crate::demand::{self, Speedup};
use crate::task::TaskSystem;
use crate::time::Time;

/// Run the FF-DBF test on `processors` processors with the default
/// configuration.
pub fn is_schedulable(processors: u32, ts: &TaskSystem) -> bool {
    is_schedulable_with(processors, ts, &AnalysisConfig::default())
}

/// Run the FF-DBF test, trying `config.speed_granularity + 1` evenly
/// spaced candidate speeds.
pub fn is_schedulable_with(processors: u32, ts: &TaskSystem, config: &AnalysisConfig) -> bool {
    if processors == 0 {
        return false;
    }
    if ts.is_empty() {
        return true;
    }
    let m = Time::from(processors);
    let utilization = ts.utilization();
    let max_density = ts.max_density();
    if utilization >= m || max_density > Time::one() {
        debug!(%utilization, %max_density, "FF-DBF: trivially overloaded");
        return false;
    }
    let speeds = candidate_speeds(processors, &utilization, &max_density, config.speed_granularity);
    let verdict = speeds
        .iter()
        .any(|speed| passes_at_speed(&m, ts, &utilization, speed));
    debug!(processors, verdict, candidates = speeds.len(), "FF-DBF test done");
    verdict
}

fn candidate_speeds(
    processors: u32,
    utilization: &Time,
    max_density: &Time,
    granularity: usize,
) -> Vec<Speedup> {
    if processors == 1 {
        return vec![Speedup::unit()];
    }
    let m = Time::from(processors);
    let highest = std::cmp::min(
        Time::one(),
        (&m - utilization) / (m - Time::one()),
    );
    if max_density > &highest {
        return Vec::new();
    }
    if granularity == 0 || max_density == &highest {
        return Speedup::new(max_density.clone()).into_iter().collect();
    }
    let step = (highest - max_density) / Time::from(granularity as u64);
    (0..=granularity as u64)
        .filter_map(|k| Speedup::new(max_density + &(Time::from(k) * &step)).ok())
        .collect()
}

fn passes_at_speed(m: &Time, ts: &TaskSystem, utilization: &Time, speed: &Speedup) -> bool {
    let sigma = speed.factor();
    let capacity = m - &((m - &Time::one()) * sigma);
    if &capacity <= utilization {
        return false;
    }
    // beyond this point the demand stays below the capacity
    let horizon = ts.total_cost() / (capacity.clone() - utilization);
    let ok = demand::testing_set(ts, speed, &Time::zero())
        .take_while(|t| *t <= horizon)
        .all(|t| demand::total_ffdbf(ts, &t, speed) <= &capacity * &t);
    trace!(%sigma, ok, "FF-DBF speed checked");
    ok
}

use crate::supply::SupplyBound;
use crate::time::{Duration, Service, Time};

use itertools::Itertools;
use thiserror::Error;
use tracing::trace;

/// Error type returned when a fixed point search fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchFailure {
    /// No fixed point found below the given divergence threshold.
    #[error("no fixed point less than {limit} found")]
    DivergenceLimitExceeded { limit: Duration },
    /// The iteration budget ran out before the search either converged
    /// or crossed the divergence threshold.
    #[error("fixed point search gave up after {iterations} iterations")]
    BudgetExhausted { iterations: usize },
}

pub type SearchResult = Result<Duration, SearchFailure>;

/// Iterative search for the least fixed point of
/// `x = supply.service_time(workload(x))`, starting from `seed`.
///
/// The `workload` must be monotone and `seed` must not exceed the least
/// fixed point; the iteration then increases until it converges. The
/// search is aborted once the assumed value exceeds `divergence_limit`,
/// or after `budget` iterations (if given).
pub fn search<SBF, RHS>(
    supply: &SBF,
    seed: Duration,
    divergence_limit: &Duration,
    budget: Option<usize>,
    workload: RHS,
) -> SearchResult
where
    SBF: SupplyBound + ?Sized,
    RHS: Fn(&Duration) -> Service,
{
    let mut assumed = seed;
    let mut iterations = 0;
    while &assumed <= divergence_limit {
        if budget.map_or(false, |max| iterations >= max) {
            return Err(SearchFailure::BudgetExhausted { iterations });
        }
        iterations += 1;
        let demand = workload(&assumed);
        let bound = supply.service_time(&demand);
        trace!(%assumed, %demand, %bound, "fixed point iteration");
        if bound <= assumed {
            // we have converged
            return Ok(bound);
        } else {
            // continue iterating
            assumed = bound;
        }
    }
    // if we get here, we failed to converge => no solution
    Err(SearchFailure::DivergenceLimitExceeded {
        limit: divergence_limit.clone(),
    })
}

/// Given a sequence of [SearchResult]s, either return the maximum
/// finite result (if no errors occurred) or propagate the first error
/// encountered.
///
/// An empty sequence yields zero.
pub fn max_response_time(mut rta_per_offset: impl Iterator<Item = SearchResult>) -> SearchResult {
    rta_per_offset.fold_ok(Time::zero(), std::cmp::max)
}

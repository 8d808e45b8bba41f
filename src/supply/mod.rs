/*! Models of resource supply (dedicated processors and identical multiprocessors)

This module provides the trait [SupplyBound], which models the notion of
a *supply-bound function* (SBF), together with the two platforms the
EDF analyses are stated for. */

use auto_impl::auto_impl;

use crate::time::{Duration, Service};

/// Generic interface for models of processor supply.
#[auto_impl(&, Box, Rc)]
pub trait SupplyBound {
    /// Bound the minimum amount of service provided during an
    /// interval of length `delta`.
    fn provided_service(&self, delta: &Duration) -> Service;

    /// The length of the shortest interval in which the supply provides
    /// at least `demand` amount of service, i.e., the inverse of
    /// [SupplyBound::provided_service].
    fn service_time(&self, demand: &Service) -> Duration;
}

mod dedicated;
mod identical;

pub use dedicated::Dedicated;
pub use identical::Identical;

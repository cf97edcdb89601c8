//! `posefuse-math` – numeric building blocks for per-cycle state estimation.
//!
//! # Modules
//!
//! - [`clock`] – [`Clock`][clock::Clock]: stopwatch over a pluggable
//!   [`TimeSource`][clock::TimeSource], plus the [`Clocked`][clock::Clocked]
//!   wrapper that drives any `dt`-taking primitive from its own clock.
//! - [`rate`] – [`RateEstimator`][rate::RateEstimator]: backward-difference
//!   rate of change of a scalar.
//! - [`integrator`] – the [`Integrator`][integrator::Integrator] trait with
//!   [`RiemannIntegrator`][integrator::RiemannIntegrator] and
//!   [`TrapezoidalIntegrator`][integrator::TrapezoidalIntegrator], and the
//!   stateless area helpers they share.
//! - [`fusion`] – [`WeightedFuser`][fusion::WeightedFuser]: inverse-variance
//!   weighted mean of scalar measurements, and
//!   [`ParametricFuser`][fusion::ParametricFuser], one fuser per independent
//!   parameter.
//!
//! Every time-dependent primitive takes `dt` explicitly.  A host loop reads
//! its clock once per cycle and passes the same `dt` to every component.

pub mod clock;
pub mod fusion;
pub mod integrator;
pub mod rate;

pub use clock::{Clock, Clocked, ManualTime, MonotonicTime, TimeSource};
pub use fusion::{ParametricFuser, WeightedFuser, weighted_mean};
pub use integrator::{
    Integrator, RiemannIntegrator, TrapezoidalIntegrator, riemann_area, trapezoid_area,
};
pub use rate::RateEstimator;

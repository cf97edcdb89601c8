//! Scalar time integration.
//!
//! Two quadrature rules implement the shared [`Integrator`] contract:
//!
//! | Type | Area added per update |
//! |---|---|
//! | [`RiemannIntegrator`] | `v · dt` |
//! | [`TrapezoidalIntegrator`] | `v_prev · dt + (v − v_prev) · dt / 2` |
//!
//! The trapezoidal rule tracks smoothly varying inputs more closely at the
//! cost of one stored sample.  Its first update treats the previous sample as
//! `0`.  The rules are also available as the stateless [`riemann_area`] and
//! [`trapezoid_area`] helpers for callers that keep their own state.
//!
//! # Example
//!
//! ```rust
//! use posefuse_math::integrator::{Integrator, TrapezoidalIntegrator};
//!
//! let mut distance = TrapezoidalIntegrator::new(0.0);
//! distance.update(2.0, 1.0); // ramp 0 → 2 m/s over 1 s
//! assert_eq!(distance.get(), 1.0);
//! ```

use std::fmt;

use crate::clock::{Clocked, TimeSource};

/// Area of a rectangle of height `v` and width `dt`.
pub fn riemann_area(v: f64, dt: f64) -> f64 {
    v * dt
}

/// Area of the trapezoid between samples `v1` and `v2` over `dt`.
pub fn trapezoid_area(v1: f64, v2: f64, dt: f64) -> f64 {
    v1 * dt + (v2 - v1) * dt / 2.0
}

/// Accumulates a scalar over time.
pub trait Integrator {
    /// Add the area contributed by sample `v` over the last `dt` seconds.
    fn update(&mut self, v: f64, dt: f64);

    /// The accumulated total, including the initial offset.
    fn get(&self) -> f64;
}

// ────────────────────────────────────────────────────────────────────────────
// Riemann
// ────────────────────────────────────────────────────────────────────────────

/// Rectangular (left Riemann) integration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RiemannIntegrator {
    total: f64,
}

impl RiemannIntegrator {
    /// Start integrating from the constant `c`.
    pub fn new(c: f64) -> Self {
        Self { total: c }
    }
}

impl Integrator for RiemannIntegrator {
    fn update(&mut self, v: f64, dt: f64) {
        self.total += riemann_area(v, dt);
    }

    fn get(&self) -> f64 {
        self.total
    }
}

impl fmt::Display for RiemannIntegrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.total)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trapezoidal
// ────────────────────────────────────────────────────────────────────────────

/// Trapezoidal (linear) integration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrapezoidalIntegrator {
    total: f64,
    last_value: f64,
}

impl TrapezoidalIntegrator {
    /// Start integrating from the constant `c`.
    pub fn new(c: f64) -> Self {
        Self {
            total: c,
            last_value: 0.0,
        }
    }
}

impl Integrator for TrapezoidalIntegrator {
    fn update(&mut self, v: f64, dt: f64) {
        self.total += trapezoid_area(self.last_value, v, dt);
        self.last_value = v;
    }

    fn get(&self) -> f64 {
        self.total
    }
}

impl fmt::Display for TrapezoidalIntegrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.total)
    }
}

impl<I: Integrator, S: TimeSource> Clocked<I, S> {
    /// Integrate `v` over the time since the previous call, timed by the
    /// owned clock.
    pub fn update(&mut self, v: f64) {
        let dt = self.clock.elapsed();
        self.inner.update(v, dt);
    }

    pub fn get(&self) -> f64 {
        self.inner.get()
    }
}

//! `posefuse-runtime` – periodic-loop glue.
//!
//! The estimators in `posefuse-estimation` are plain state machines.  This
//! crate wires them to the sensor traits of `posefuse-hal` so a host loop
//! only has to call one `periodic` method per cycle.
//!
//! # Modules
//!
//! - [`pipeline`] – [`EstimatorPipeline`][pipeline::EstimatorPipeline]
//!   (rotation then pose fusion with one shared `dt`) and
//!   [`OdometryPipeline`][pipeline::OdometryPipeline] (dead reckoning only).
//! - [`velocity`] – [`VelocityFusion`][velocity::VelocityFusion]: IMU
//!   acceleration fused with drivetrain speeds.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console logs
//!   plus optional OTLP span export.

pub mod pipeline;
pub mod telemetry;
pub mod velocity;

use posefuse_hal::SensorError;
use posefuse_types::FusionError;
use thiserror::Error;

pub use pipeline::{EstimatorPipeline, OdometryPipeline};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use velocity::VelocityFusion;

/// Failure of one pipeline cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Sensor read failed: {0}")]
    Sensor(#[from] SensorError),

    #[error("Fusion failed: {0}")]
    Fusion(#[from] FusionError),
}

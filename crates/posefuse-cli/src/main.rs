//! `posefuse` – runs the estimation pipelines against a simulated robot.
//!
//! 1. Initialises logging (`RUST_LOG`, `POSEFUSE_LOG_FORMAT`,
//!    `OTEL_EXPORTER_OTLP_ENDPOINT`).
//! 2. Loads `~/.posefuse/config.toml`, or the path given as the first
//!    argument, writing the defaults there on first run.
//! 3. Drives the fused estimator, plain odometry and velocity fusion side by
//!    side at `loop_hz` for `cycles` cycles.  Ctrl-C stops early.
//! 4. Prints how far each estimate ended up from the simulated truth.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use posefuse_hal::sim::SimWorld;
use posefuse_runtime::{EstimatorPipeline, OdometryPipeline, PipelineError, VelocityFusion};
use posefuse_types::{ChassisSpeeds, Pose3, Vec3};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use config::Config;

fn main() -> ExitCode {
    let _guard = posefuse_runtime::init_tracing("posefuse");

    print_banner();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::config_path);

    let cfg = match config::resolve(&path) {
        Ok((cfg, true)) => {
            println!("  Config loaded from {}", path.display().to_string().bold());
            cfg
        }
        Ok((cfg, false)) => {
            match config::save_to(&cfg, &path) {
                Ok(()) => println!("  Wrote default config to {}", path.display().to_string().bold()),
                Err(e) => println!("  {}: {e}", "Could not write default config".yellow()),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {e}", "Config error".red());
            return ExitCode::FAILURE;
        }
    };

    let Some(period) = cfg.period() else {
        println!("{}: loop_hz {} has no usable cycle period", "Config error".red(), cfg.loop_hz);
        return ExitCode::FAILURE;
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping after this cycle".yellow().bold());
        shutdown_flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the run can only end after all cycles");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&cfg, period, &shutdown)) {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}: {e}", "Run aborted".red().bold());
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Control loop
// ─────────────────────────────────────────────────────────────────────────────

struct Summary {
    cycles: u32,
    elapsed: f64,
    truth: Pose3,
    fused: Pose3,
    odometry: Pose3,
    true_speeds: ChassisSpeeds,
    velocity: Vec3,
}

/// Run `cfg.cycles` cycles, one per `period` tick.  The simulation and every
/// estimator advance by `cfg.dt()` per cycle regardless of timer jitter.
async fn run(cfg: &Config, period: Duration, shutdown: &AtomicBool) -> Result<Summary, PipelineError> {
    let dt = cfg.dt();
    let sim = &cfg.sim;

    let world = SimWorld::new(Pose3::origin());
    world.command(ChassisSpeeds::new(sim.vx, sim.vy), sim.yaw_rate)?;
    let mut drive = world.drivetrain(sim.seed, sim.drive_noise)?;
    let mut imu = world.imu(sim.seed.wrapping_add(1), sim.imu_noise)?;
    let mut camera = world.vision(sim.seed.wrapping_add(2), sim.vision_every, sim.vision_std_devs)?;

    let mut estimator = EstimatorPipeline::with_std_devs(cfg.imu_std_dev, cfg.drive_std_dev, Pose3::origin());
    let mut odometry = OdometryPipeline::new(Pose3::origin());
    let mut velocity = VelocityFusion::new();

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(loop_hz = cfg.loop_hz, cycles = cfg.cycles, "control loop started");
    let report_every = (cfg.loop_hz.round() as u32).max(1);
    let mut completed = 0;

    while completed < cfg.cycles && !shutdown.load(Ordering::SeqCst) {
        ticker.tick().await;

        // One dt per cycle, shared by the world and every pipeline.
        world.step(dt)?;
        let fused = estimator.periodic_over(dt, &mut drive, &mut imu, &mut camera)?;
        odometry.periodic_over(dt, &mut drive)?;
        velocity.periodic_over(dt, &mut drive, &mut imu)?;
        completed += 1;

        if completed % report_every == 0 {
            info!(
                cycle = completed,
                x = fused.translation.x,
                y = fused.translation.y,
                yaw = fused.rotation.yaw,
                "fused pose"
            );
        }
    }

    let truth = world.truth()?;
    info!(cycles = completed, "control loop finished");
    Ok(Summary {
        cycles: completed,
        elapsed: truth.time,
        truth: truth.pose,
        fused: estimator.last_estimate(),
        odometry: odometry.pose(),
        true_speeds: truth.speeds,
        velocity: velocity.last_velocity(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("  {} {}", "posefuse".bold().cyan(), format!("v{}", env!("CARGO_PKG_VERSION")).dimmed());
    println!("  Weighted sensor fusion for robot pose estimation");
    println!();
}

fn print_summary(s: &Summary) {
    let position_error = |p: &Pose3| p.translation.sub(s.truth.translation).norm();
    let yaw_error = |p: &Pose3| (p.rotation.yaw - s.truth.rotation.yaw).abs();

    println!();
    println!("  {} cycles, {:.2} s simulated", s.cycles.to_string().bold(), s.elapsed);
    println!(
        "  {:<10} x={:>8.3}  y={:>8.3}  yaw={:>7.3}",
        "truth".bold(),
        s.truth.translation.x,
        s.truth.translation.y,
        s.truth.rotation.yaw
    );
    for (label, pose) in [("fused", &s.fused), ("odometry", &s.odometry)] {
        println!(
            "  {:<10} x={:>8.3}  y={:>8.3}  yaw={:>7.3}  {} {}",
            label.bold(),
            pose.translation.x,
            pose.translation.y,
            pose.rotation.yaw,
            "error".dimmed(),
            format!("{:.3} m / {:.3} rad", position_error(pose), yaw_error(pose)).green()
        );
    }
    println!(
        "  {:<10} vx={:>7.3}  vy={:>7.3}  {} vx={:.3} vy={:.3}",
        "velocity".bold(),
        s.velocity.x,
        s.velocity.y,
        "commanded".dimmed(),
        s.true_speeds.vx,
        s.true_speeds.vy
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config(imu_noise: f64) -> Config {
        let mut cfg = Config::default();
        cfg.loop_hz = 1000.0;
        cfg.cycles = 20;
        cfg.sim.vision_every = 1000;
        cfg.sim.imu_noise = imu_noise;
        cfg
    }

    async fn run_quick(cfg: &Config) -> Summary {
        let period = cfg.period().expect("1 kHz has a period");
        run(cfg, period, &AtomicBool::new(false)).await.expect("run ok")
    }

    #[tokio::test]
    async fn run_completes_every_cycle() {
        let cfg = quick_config(0.005);
        let summary = run_quick(&cfg).await;
        assert_eq!(summary.cycles, 20);
        assert!((summary.elapsed - 20.0 * cfg.dt()).abs() < 1e-9);
    }

    #[tokio::test]
    async fn imu_noise_setting_changes_the_fused_heading() {
        let quiet = run_quick(&quick_config(0.0)).await;
        let loud = run_quick(&quick_config(0.5)).await;

        assert!((quiet.fused.rotation.yaw - quiet.truth.rotation.yaw).abs() < 1e-9);
        assert!((loud.fused.rotation.yaw - quiet.fused.rotation.yaw).abs() > 1e-6);
        // Odometry never reads the IMU.
        assert_eq!(loud.odometry, quiet.odometry);
    }

    #[tokio::test]
    async fn shutdown_flag_stops_before_the_first_cycle() {
        let cfg = quick_config(0.005);
        let period = cfg.period().expect("1 kHz has a period");
        let summary = run(&cfg, period, &AtomicBool::new(true)).await.expect("run ok");
        assert_eq!(summary.cycles, 0);
        assert_eq!(summary.elapsed, 0.0);
    }
}

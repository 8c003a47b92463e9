//! `pilot` – interactive navigation supervisor on a simulated robot.
//!
//! The binary:
//!
//! 1. Initialises tracing (console, optional OTLP export).
//! 2. Loads `~/.pilot/config.toml`, writing the defaults on first run.
//! 3. Builds a [`SimRobot`], a [`Navigator`] with the go-to-goal follower and
//!    a [`NavDriver`] stepping it, plus a physics task advancing the sim.
//! 4. Intercepts **Ctrl-C** to cancel navigation (the robot stops at once).
//! 5. Drops the user into an interactive REPL.

mod config;
mod repl;

use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use pilot_hal::SimRobot;
use pilot_kernel::Navigator;
use pilot_runtime::{GoToGoalFollower, NavDriver};

fn main() {
    // Tracing first: the OTLP exporter must exist before the tokio runtime.
    let _telemetry = pilot_runtime::init_tracing("pilot");

    print_banner();

    let cfg = load_config();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start tokio runtime".red(), e);
            std::process::exit(1);
        }
    };
    runtime.block_on(run(cfg));
}

async fn run(cfg: config::Config) {
    let robot = Arc::new(
        SimRobot::new()
            .with_pose(cfg.sim.start_pose())
            .with_speed_limits(cfg.sim.max_linear, cfg.sim.max_angular)
            .with_call_log_capacity(cfg.sim.call_log_capacity),
    );
    let follower = GoToGoalFollower::new(cfg.follower.clone(), cfg.control_period());
    let navigator = Arc::new(Navigator::new(
        robot.clone(),
        Box::new(follower),
        cfg.navigator.clone(),
    ));

    let driver = NavDriver::new(navigator.clone(), cfg.control_period());
    let repl_driver = driver.clone();
    let handle = driver.spawn();
    let physics = tokio::spawn(sim_physics(
        robot.clone(),
        cfg.sim.physics_period(),
        handle.subscribe(),
    ));

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let ctrlc_nav = navigator.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – cancelling navigation …".yellow().bold());
        ctrlc_nav.cancel();
        println!("  {} Robot stopped. Type {} to exit.", "✓".green(), "/quit".bold());
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; Ctrl-C will not stop the robot");
    }

    println!(
        "  Control loop every {} ms.  Type {} for a list of commands.\n",
        cfg.control_period_ms,
        "/help".bold().cyan()
    );

    // ── Interactive REPL ──────────────────────────────────────────────────
    let repl_robot = robot.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || repl::run(repl_driver, repl_robot)).await
    {
        warn!(error = %e, "REPL task ended abnormally");
    }

    handle.shutdown().await;
    if let Err(e) = physics.await {
        warn!(error = %e, "physics task ended abnormally");
    }
    info!(pose = ?robot.pose(), "pilot exited");
}

/// Integrate the simulated robot until the driver shuts down.
async fn sim_physics(robot: Arc<SimRobot>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = interval.tick() => robot.advance(period),
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

fn load_config() -> config::Config {
    match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            config::apply_env_overrides(&mut cfg);
            validated_or_default(cfg)
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    }
}

fn validated_or_default(cfg: config::Config) -> config::Config {
    match cfg.validate() {
        Ok(()) => cfg,
        Err(e) => {
            println!("{}: {} – using defaults", "Config error".red(), e);
            config::Config::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"    ___  _ __     __ "#.bold().cyan());
    println!("{}", r#"   / _ \(_) /__  / /_"#.bold().cyan());
    println!("{}", r#"  / ___/ / / _ \/ __/"#.bold().cyan());
    println!("{}", r#" /_/  /_/_/\___/\__/ "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Pilot".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Reactive navigation supervisor (simulated robot)");
    println!();
}

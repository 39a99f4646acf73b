//! `tickwork-cli` – operator console for a Tickwork robot
//!
//! This binary:
//!
//! 1. Loads `~/.tickwork/config.toml`, writing a default one when absent.
//! 2. Builds the robot against simulated hardware, acquiring every device
//!    through its transport candidates, and reports which ones connected.
//! 3. Drops the operator into an **interactive REPL** to press inputs,
//!    step or run the tick loop, and inspect the scheduler.
//! 4. Intercepts **Ctrl-C** to stop the loop and cancel every running
//!    command before exiting.

mod config;
mod repl;

use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use tickwork_hal::SimConnector;
use tickwork_runtime::{ButtonBoard, Robot, TickLoop};

fn main() {
    let _tracing = tickwork_runtime::init_tracing("tickwork");

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            match config::save(&config::Config::default()) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    // ── Robot ─────────────────────────────────────────────────────────────
    let mut connector = SimConnector::new(cfg.sim_available.clone());
    let robot = match Robot::new(cfg.robot_config(), &mut connector, ButtonBoard::new()) {
        Ok(robot) => robot,
        Err(e) => {
            eprintln!("{}: {}", "Failed to build robot".red().bold(), e);
            std::process::exit(1);
        }
    };
    print_devices(&robot);
    info!(tick_period_ms = cfg.tick_period_ms, "robot ready");

    let robot = Arc::new(Mutex::new(robot));
    let tick_loop = TickLoop::new(cfg.tick_period());
    let shutdown = Arc::new(AtomicBool::new(false));

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    // The REPL may be blocked on stdin, so the handler finishes the shutdown
    // itself: stop the loop, wait for the tick in progress, cancel, exit.
    let stop_loop = tick_loop.stop_flag();
    let robot_for_ctrlc = Arc::clone(&robot);
    let shutdown_for_ctrlc = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – cancelling all commands …".yellow().bold());
        stop_loop.store(true, Ordering::SeqCst);
        shutdown_for_ctrlc.store(true, Ordering::SeqCst);

        let mut robot = robot_for_ctrlc.lock().unwrap_or_else(|e| e.into_inner());
        robot.cancel_all();

        println!("{}", "  ✓ All commands ended.".green());
        println!("{}", "  ✓ Exiting Tickwork.".green());
        std::process::exit(130);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; running commands will not be cancelled on Ctrl-C");
    }

    println!();
    println!(
        "  Type {} for a list of commands.\n",
        "/help".bold().cyan()
    );

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(repl::Session::new(Arc::clone(&robot), tick_loop), shutdown);

    robot.lock().unwrap_or_else(|e| e.into_inner()).cancel_all();
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"  _   _      _                      _    "#.bold().cyan());
    println!("{}", r#" | |_(_) ___| | ____      _____  _ __| | __"#.bold().cyan());
    println!("{}", r#" | __| |/ __| |/ /\ \ /\ / / _ \| '__| |/ /"#.bold().cyan());
    println!("{}", r#" | |_| | (__|   <  \ V  V / (_) | |  |   < "#.bold().cyan());
    println!("{}", r#"  \__|_|\___|_|\_\  \_/\_/ \___/|_|  |_|\_\"#.bold().cyan());
    println!();
    println!("  {} {}",
        "Tickwork".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Tick-driven command scheduler for robots");
    println!();
}

fn print_devices(robot: &Robot) {
    println!();
    println!("{}", "  Devices".bold().underline());
    for resource in robot.snapshot().resources {
        for device in resource.devices {
            let (marker, detail) = match &device.active_transport {
                Some(transport) if device.connected => ("🟢".green(), transport.to_string().green()),
                _ => ("🔴".red(), "not connected".red()),
            };
            println!(
                "  {} {:<12} {:<22} {}",
                marker,
                resource.id.as_str(),
                device.name.bold(),
                detail
            );
        }
    }
}

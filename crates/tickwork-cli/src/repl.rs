//! REPL – operator console for a simulated robot.
//!
//! Supported slash-commands:
//!   /help              – show this list
//!   /press <input>     – press a button or pull an axis fully
//!   /release <input>   – release a button or axis
//!   /inputs            – list operator inputs and their state
//!   /tick [n]          – single-step n ticks (default 1) without waiting
//!   /run <n>           – run n ticks in real time at the loop period
//!   /status            – print the scheduler snapshot as JSON
//!   /auto              – schedule the autonomous command
//!   /cancel-all        – interrupt every running command
//!   /quit | /exit      – cancel everything and exit

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tickwork_runtime::{Robot, TickLoop};

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Press(String),
    Release(String),
    Inputs,
    Tick(u64),
    Run(u64),
    Status,
    Auto,
    CancelAll,
    Quit,
}

/// Parse a console line.  The error is a message for the operator.
pub fn parse(line: &str) -> Result<ReplCommand, String> {
    let mut words = line.split_whitespace();
    let head = words.next().ok_or_else(|| "empty command".to_string())?;
    let arg = words.next();
    if words.next().is_some() {
        return Err(format!("too many arguments for {head}"));
    }

    let count = |arg: Option<&str>, default: Option<u64>| -> Result<u64, String> {
        match (arg, default) {
            (Some(raw), _) => raw
                .parse::<u64>()
                .map_err(|_| format!("'{raw}' is not a tick count")),
            (None, Some(n)) => Ok(n),
            (None, None) => Err(format!("{head} needs a tick count")),
        }
    };
    let input = |arg: Option<&str>| -> Result<String, String> {
        arg.map(str::to_string)
            .ok_or_else(|| format!("{head} needs an input name (see /inputs)"))
    };

    match head {
        "/help" => Ok(ReplCommand::Help),
        "/press" => input(arg).map(ReplCommand::Press),
        "/release" => input(arg).map(ReplCommand::Release),
        "/inputs" => Ok(ReplCommand::Inputs),
        "/tick" => count(arg, Some(1)).map(ReplCommand::Tick),
        "/run" => count(arg, None).map(ReplCommand::Run),
        "/status" => Ok(ReplCommand::Status),
        "/auto" => Ok(ReplCommand::Auto),
        "/cancel-all" => Ok(ReplCommand::CancelAll),
        "/quit" | "/exit" => Ok(ReplCommand::Quit),
        other => Err(format!("Unknown command: '{other}'")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The robot under operator control plus the loop that drives it.
pub struct Session {
    robot: Arc<Mutex<Robot>>,
    tick_loop: TickLoop,
}

impl Session {
    pub fn new(robot: Arc<Mutex<Robot>>, tick_loop: TickLoop) -> Self {
        Self { robot, tick_loop }
    }

    fn robot(&self) -> MutexGuard<'_, Robot> {
        self.robot.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn execute(&mut self, command: ReplCommand) -> Flow {
        match command {
            ReplCommand::Help => cmd_help(),
            ReplCommand::Press(name) => self.cmd_set_input(&name, true),
            ReplCommand::Release(name) => self.cmd_set_input(&name, false),
            ReplCommand::Inputs => self.cmd_inputs(),
            ReplCommand::Tick(n) => self.cmd_tick(n),
            ReplCommand::Run(n) => self.cmd_run(n),
            ReplCommand::Status => self.cmd_status(),
            ReplCommand::Auto => self.cmd_auto(),
            ReplCommand::CancelAll => {
                self.robot().cancel_all();
                println!("{}", "✓ All commands cancelled.".green());
            }
            ReplCommand::Quit => {
                self.robot().cancel_all();
                println!("{}", "Goodbye.".green());
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    fn cmd_set_input(&self, name: &str, active: bool) {
        let robot = self.robot();
        if robot.board().set_active(name, active) {
            let verb = if active { "pressed" } else { "released" };
            println!("  {} {} (takes effect on the next tick)", name.bold(), verb);
        } else {
            println!(
                "{} '{}'. Type {} to list inputs.",
                "Unknown input:".red(),
                name.yellow(),
                "/inputs".bold()
            );
        }
    }

    fn cmd_inputs(&self) {
        let robot = self.robot();
        let board = robot.board();
        println!("{}", "Operator Inputs".bold().underline());
        for name in board.names() {
            let state = match board.is_active(&name) {
                Some(true) => "active".green(),
                _ => "idle".dimmed(),
            };
            println!("  {:<16} {}", name, state);
        }
    }

    /// Locks the robot per step so a Ctrl-C handler is never starved.
    fn cmd_tick(&mut self, n: u64) {
        for _ in 0..n {
            if self.tick_loop.stop_requested() {
                println!("{}", "  stop requested; ticking halted".yellow());
                break;
            }
            let mut robot = self.robot.lock().unwrap_or_else(|e| e.into_inner());
            self.tick_loop.step(robot.scheduler_mut());
        }
        println!("  tick {}", self.robot().scheduler().tick_count().to_string().bold());
    }

    fn cmd_run(&mut self, n: u64) {
        let mut robot = self.robot.lock().unwrap_or_else(|e| e.into_inner());
        self.tick_loop.rearm();
        let done = self.tick_loop.run_for(robot.scheduler_mut(), n);
        println!(
            "  ran {} tick(s) at {:?}; {} overrun(s) so far",
            done.to_string().bold(),
            self.tick_loop.period(),
            self.tick_loop.monitor().overruns()
        );
    }

    fn cmd_status(&self) {
        let snapshot = self.robot().snapshot();
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{json}"),
            Err(e) => println!("{}: {}", "Failed to render status".red(), e),
        }
        let monitor = self.tick_loop.monitor();
        println!(
            "  loop: {} tick(s) timed, {} overrun(s), worst {:?}",
            monitor.ticks(),
            monitor.overruns(),
            monitor.worst()
        );
    }

    fn cmd_auto(&self) {
        match self.robot().start_autonomous() {
            Ok(()) => println!("  autonomous command scheduled"),
            Err(e) => println!("{}: {}", "Failed to schedule autonomous".red(), e),
        }
    }
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(mut session: Session, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "tickwork>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse(line) {
            Ok(command) => {
                if session.execute(command) == Flow::Quit {
                    shutdown.store(true, Ordering::SeqCst);
                    break;
                }
            }
            Err(message) => {
                println!(
                    "{}. Type {} for available commands.",
                    message.red(),
                    "/help".bold()
                );
            }
        }
    }
}

fn cmd_help() {
    println!();
    println!("{}", "Tickwork Commands".bold().underline());
    println!("  {}   – press a button or pull an axis", "/press <input>".bold().cyan());
    println!("  {} – release a button or axis", "/release <input>".bold().cyan());
    println!("  {}          – list operator inputs", "/inputs".bold().cyan());
    println!("  {}        – single-step n ticks", "/tick [n]".bold().cyan());
    println!("  {}         – run n ticks in real time", "/run <n>".bold().cyan());
    println!("  {}          – scheduler snapshot (JSON)", "/status".bold().cyan());
    println!("  {}            – schedule the autonomous command", "/auto".bold().cyan());
    println!("  {}      – interrupt every running command", "/cancel-all".bold().cyan());
    println!("  {}    – exit", "/quit  /exit".bold().cyan());
    println!();
}

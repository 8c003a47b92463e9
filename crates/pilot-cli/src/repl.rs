//! REPL – Read-Eval-Print Loop for the pilot interactive shell.
//!
//! Supported slash-commands:
//!   /goto x y [deg]          – navigate to an absolute pose or position
//!   /rel dx dy [deg]         – navigate relative to the current pose
//!   /waypoints x,y x,y ...   – visit points without stopping in between
//!   /cancel /suspend /resume /reset
//!   /status /params /help
//!   /quit | /exit

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use pilot_hal::SimRobot;
use pilot_runtime::{NavDriver, WaypointMission};
use pilot_types::params::DEFAULT_ALLOWED_DISTANCE;
use pilot_types::{NavState, NavigationParams, Point2D};

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Goto { x: f64, y: f64, heading_deg: Option<f64> },
    Rel { dx: f64, dy: f64, heading_deg: Option<f64> },
    Waypoints(Vec<Point2D>),
    Cancel,
    Suspend,
    Resume,
    Reset,
    Status,
    Params,
    Help,
    Quit,
}

/// Parse one input line.
pub fn parse(line: &str) -> Result<ReplCommand, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err("empty command".to_string());
    };
    let args: Vec<&str> = words.collect();
    let no_args = |cmd: ReplCommand| {
        if args.is_empty() {
            Ok(cmd)
        } else {
            Err(format!("{head} takes no arguments"))
        }
    };
    match head {
        "/goto" => {
            let (x, y, heading_deg) = parse_target(head, &args)?;
            Ok(ReplCommand::Goto { x, y, heading_deg })
        }
        "/rel" => {
            let (dx, dy, heading_deg) = parse_target(head, &args)?;
            Ok(ReplCommand::Rel { dx, dy, heading_deg })
        }
        "/waypoints" => {
            if args.is_empty() {
                return Err("usage: /waypoints x,y [x,y ...]".to_string());
            }
            args.iter()
                .map(|a| parse_point(a))
                .collect::<Result<Vec<_>, _>>()
                .map(ReplCommand::Waypoints)
        }
        "/cancel" => no_args(ReplCommand::Cancel),
        "/suspend" => no_args(ReplCommand::Suspend),
        "/resume" => no_args(ReplCommand::Resume),
        "/reset" => no_args(ReplCommand::Reset),
        "/status" => no_args(ReplCommand::Status),
        "/params" => no_args(ReplCommand::Params),
        "/help" => no_args(ReplCommand::Help),
        "/quit" | "/exit" => no_args(ReplCommand::Quit),
        other => Err(format!("unknown command '{other}'")),
    }
}

fn parse_number(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("'{s}' is not a number")),
    }
}

fn parse_target(head: &str, args: &[&str]) -> Result<(f64, f64, Option<f64>), String> {
    match args {
        [x, y] => Ok((parse_number(x)?, parse_number(y)?, None)),
        [x, y, deg] => Ok((parse_number(x)?, parse_number(y)?, Some(parse_number(deg)?))),
        _ => Err(format!("usage: {head} x y [heading_deg]")),
    }
}

fn parse_point(s: &str) -> Result<Point2D, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("'{s}' is not a point; expected x,y"))?;
    Ok(Point2D::new(parse_number(x.trim())?, parse_number(y.trim())?))
}

fn goal(x: f64, y: f64, heading_deg: Option<f64>) -> NavigationParams {
    match heading_deg {
        Some(deg) => NavigationParams::to_pose(x, y, deg.to_radians()),
        None => NavigationParams::to_position(x, y),
    }
}

/// Entry point for the interactive REPL.  Returns on `/quit` or end of input.
pub fn run(driver: NavDriver, robot: Arc<SimRobot>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", prompt(&driver).bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
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
            Ok(ReplCommand::Quit) => {
                println!("{}", "Goodbye.".green());
                break;
            }
            Ok(cmd) => execute(&driver, &robot, cmd),
            Err(e) => println!(
                "{} {}. Type {} for available commands.",
                "Error:".red(),
                e.yellow(),
                "/help".bold()
            ),
        }
    }
}

fn prompt(driver: &NavDriver) -> String {
    match driver.navigator().state() {
        NavState::Idle => "pilot>".to_string(),
        state => format!("pilot[{state}]>"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn execute(driver: &NavDriver, robot: &SimRobot, cmd: ReplCommand) {
    let nav = driver.navigator();
    match cmd {
        ReplCommand::Goto { x, y, heading_deg } => report(nav.navigate(goal(x, y, heading_deg))),
        ReplCommand::Rel { dx, dy, heading_deg } => {
            report(nav.navigate(goal(dx, dy, heading_deg).relative()))
        }
        ReplCommand::Waypoints(points) => {
            let count = points.len();
            let result = WaypointMission::new(points, DEFAULT_ALLOWED_DISTANCE)
                .and_then(|m| driver.start_mission(m));
            match result {
                Ok(()) => println!("{} mission with {} waypoint(s)", "✓".green(), count),
                Err(e) => println!("{}: {}", "Rejected".red(), e),
            }
        }
        ReplCommand::Cancel => nav.cancel(),
        ReplCommand::Suspend => nav.suspend(),
        ReplCommand::Resume => nav.resume(),
        ReplCommand::Reset => nav.reset_error(),
        ReplCommand::Status => cmd_status(driver, robot),
        ReplCommand::Params => match nav.params_as_text() {
            Some(text) => println!("{text}"),
            None => println!("  {}", "(no active goal)".dimmed()),
        },
        ReplCommand::Help => cmd_help(),
        ReplCommand::Quit => {}
    }
}

fn report(result: Result<u64, pilot_types::PilotError>) {
    match result {
        Ok(episode) => println!("{} goal accepted (episode {})", "✓".green(), episode),
        Err(e) => println!("{}: {}", "Rejected".red(), e),
    }
}

fn cmd_status(driver: &NavDriver, robot: &SimRobot) {
    let snap = driver.navigator().snapshot();
    let pose = robot.pose();
    let state = match snap.state {
        NavState::Idle => snap.state.to_string().normal(),
        NavState::Navigating => snap.state.to_string().green(),
        NavState::Suspended => snap.state.to_string().yellow(),
        NavState::NavError => snap.state.to_string().red(),
    };

    println!("{}", "Navigator Status".bold().underline());
    println!("  State     : {}", state.bold());
    println!(
        "  Pose      : ({:.3}, {:.3}, {:.1} deg)",
        pose.x,
        pose.y,
        pose.heading.to_degrees()
    );
    let outcome = match snap.outcome {
        Some(o) => format!("{o:?}"),
        None if snap.episode == 0 => "none".to_string(),
        None => "in progress".to_string(),
    };
    println!("  Episode   : {} ({})", snap.episode, outcome);
    if snap.best_distance.is_finite() {
        println!("  Best dist : {:.3} m", snap.best_distance);
    }
    println!("  Follower  : {}", snap.follower);
    if let Some(status) = driver.mission_status() {
        println!("  Mission   : {status:?}");
    }
    if let Some(fault) = snap.last_fault {
        println!(
            "  Last fault: {} {:?}: {}",
            fault.at.format("%H:%M:%S").to_string().dimmed(),
            fault.kind,
            fault.message.yellow()
        );
    }
}

fn cmd_help() {
    println!();
    println!("{}", "Pilot Commands".bold().underline());
    println!("  {}  – go to an absolute point (optional final heading)", "/goto x y [deg]".bold().cyan());
    println!("  {}  – go relative to the current pose", "/rel dx dy [deg]".bold().cyan());
    println!("  {}  – visit points without stopping", "/waypoints x,y ...".bold().cyan());
    println!("  {}  – stop and go idle", "/cancel".bold().cyan());
    println!("  {}  – pause / continue navigation", "/suspend  /resume".bold().cyan());
    println!("  {}  – clear a navigation error", "/reset".bold().cyan());
    println!("  {}  – show supervisor state / active goal", "/status  /params".bold().cyan());
    println!("  {}  – exit", "/quit  /exit".bold().cyan());
    println!();
}

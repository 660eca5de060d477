//! Command implementations for the CLI interface.
//!
//! This module contains all the command handlers that implement the various
//! subcommands, from task CRUD to ledger writes, gated status moves, and the
//! burndown table. Every mutation goes through the core in `ledger`/`gates`
//! and is persisted only if the core accepts it.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use std::path::Path;

use chrono::{TimeZone, Utc};

use crate::burndown::burndown;
use crate::db::{format_hours, print_table, Board};
use crate::error::Reject;
use crate::fields::{format_status, Status};
use crate::gates::{apply_transition, validate_and_complete};
use crate::ledger::{completion_day, daily_value, is_burned_down_by_day, set_daily_value};
use crate::task::{Task, SPRINT_SLOTS};

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task to the backlog.
    Add {
        /// Short title for the task.
        title: String,
        /// Baseline estimate in hours (the day-1 commitment).
        #[arg(long)]
        estimate: f64,
        /// Sprint the task belongs to.
        #[arg(long, default_value = "default")]
        sprint: String,
    },

    /// List tasks with optional filters.
    List {
        /// Include completed tasks.
        #[arg(long)]
        all: bool,
        /// Filter by status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Filter by sprint.
        #[arg(long)]
        sprint: Option<String>,
        /// Sprint day (1-10) to read remaining hours at. Defaults to today.
        #[arg(long)]
        day: Option<usize>,
    },

    /// View a single task, its ledger, and its movement log.
    View {
        /// Task ID to view.
        id: u64,
    },

    /// Record a day's re-estimate. The value replicates forward; 0 marks the
    /// task burned down from that day on.
    Estimate {
        /// Task ID.
        id: u64,
        /// Sprint day, 1-10. Day 1 rewrites the baseline itself.
        day: usize,
        /// Remaining hours. Negative input is clamped to 0.
        value: f64,
    },

    /// Move a task to another status, subject to WIP limits.
    Move {
        /// Task ID.
        id: u64,
        /// Target status. Omit to use --forward / --back.
        #[arg(value_enum)]
        status: Option<Status>,
        /// Move one step forward in board order.
        #[arg(long, conflicts_with_all = ["status", "back"])]
        forward: bool,
        /// Move one step backward in board order.
        #[arg(long, conflicts_with = "status")]
        back: bool,
        /// Who is making the move. Defaults to $USER.
        #[arg(long)]
        actor: Option<String>,
    },

    /// Record time spent and complete a task (move it to Done).
    Complete {
        /// Task ID.
        id: u64,
        /// Actual hours spent.
        #[arg(long)]
        time_spent: f64,
        /// Reason for the estimation error; required past a 20% overrun.
        #[arg(long)]
        reason: Option<String>,
        /// Who is completing the task. Defaults to $USER.
        #[arg(long)]
        actor: Option<String>,
    },

    /// Move a Done task back to Doing, clearing its validated completion.
    Reopen {
        /// Task ID.
        id: u64,
        /// Who is reopening the task. Defaults to $USER.
        #[arg(long)]
        actor: Option<String>,
    },

    /// Print the ideal / actual / velocity burndown table for a sprint.
    Burndown {
        /// Sprint to report on. Defaults to the only sprint on the board.
        #[arg(long)]
        sprint: Option<String>,
        /// Elapsed sprint day (1-10) used for the velocity line. Defaults to
        /// days since the sprint's oldest task was created.
        #[arg(long)]
        day: Option<usize>,
    },

    /// Show or edit WIP limits.
    Wip {
        #[command(subcommand)]
        action: WipAction,
    },

    /// Show or edit team capacity (developers, hours/day, sprint days).
    Capacity {
        #[arg(long)]
        developers: Option<u32>,
        #[arg(long)]
        hours_per_day: Option<u32>,
        #[arg(long)]
        sprint_days: Option<u32>,
    },

    /// Delete a task by ID.
    Delete {
        /// Task ID to delete.
        id: u64,
    },

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum WipAction {
    /// Show the current limits and whether they are enforced.
    Show,
    /// Set a limit for a status (prioritized or doing).
    Set {
        #[arg(value_enum)]
        status: Status,
        limit: u32,
    },
    /// Remove the limit for a status.
    Clear {
        #[arg(value_enum)]
        status: Status,
    },
    /// Turn enforcement on or off. Limits are advisory when off.
    Enforce {
        #[arg(value_enum)]
        mode: EnforceMode,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum EnforceMode {
    On,
    Off,
}

/// Resolve the acting user for movement log entries.
fn resolve_actor(actor: Option<String>) -> String {
    actor
        .or_else(|| std::env::var("USER").ok())
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Convert a 1-based CLI day to the 0-based ledger index.
fn day_to_index(day: usize) -> Result<usize, Reject> {
    if day == 0 || day > SPRINT_SLOTS {
        return Err(Reject::InvalidInput(format!("day must be 1..={SPRINT_SLOTS}")));
    }
    Ok(day - 1)
}

/// Elapsed sprint days since the oldest task in scope was created, capped to
/// the sprint length. Day 0 means the sprint just started.
fn elapsed_day(tasks: &[&Task], now_utc: i64, sprint_days: u32) -> usize {
    let Some(oldest) = tasks.iter().map(|t| t.created_at_utc).min() else {
        return 0;
    };
    let days = ((now_utc - oldest).max(0) / 86_400) as usize;
    days.min(sprint_days as usize)
}

fn format_ts(ts: i64) -> String {
    match Utc.timestamp_opt(ts, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        _ => format!("@{ts}"),
    }
}

fn save_or_die(board: &Board, path: &Path) {
    if let Err(e) = board.save(path) {
        eprintln!("Failed to save board: {e}");
        std::process::exit(1);
    }
}

fn reject_and_die(e: Reject) -> ! {
    eprintln!("{} - {}", e.code(), e);
    std::process::exit(1);
}

fn require_position(board: &Board, id: u64) -> usize {
    match board.position_of(id) {
        Some(i) => i,
        None => {
            eprintln!("Task with ID {id} not found");
            std::process::exit(1);
        }
    }
}

/// Create a task in Backlog with its ledger padded to the baseline.
pub fn cmd_add(board: &mut Board, path: &Path, title: String, estimate: f64, sprint: String) {
    if estimate < 0.0 {
        reject_and_die(Reject::InvalidInput("estimate must be non-negative".into()));
    }
    let now_utc = Utc::now().timestamp();
    let id = board.next_id();
    board.tasks.push(Task::new(id, title, sprint, estimate, now_utc));
    save_or_die(board, path);
    println!("Added task {id}");
}

/// List tasks with optional filtering.
pub fn cmd_list(
    board: &Board,
    all: bool,
    status: Option<Status>,
    sprint: Option<String>,
    day: Option<usize>,
) {
    let day_index = match day.map(day_to_index).transpose() {
        Ok(d) => d,
        Err(e) => reject_and_die(e),
    };

    let filtered: Vec<&Task> = board
        .tasks
        .iter()
        .filter(|t| {
            if !all && t.status == Status::Done {
                return false;
            }
            if let Some(s) = status {
                if t.status != s {
                    return false;
                }
            }
            if let Some(ref sp) = sprint {
                if &t.sprint != sp {
                    return false;
                }
            }
            true
        })
        .collect();

    let day_index = day_index.unwrap_or_else(|| {
        elapsed_day(&filtered, Utc::now().timestamp(), board.capacity.sprint_days)
    });
    print_table(&filtered, day_index);
}

/// View a single task in full detail.
pub fn cmd_view(board: &Board, id: u64) {
    let Some(t) = board.get(id) else {
        eprintln!("Task with ID {id} not found");
        std::process::exit(1);
    };

    println!("ID:        {}", t.id);
    println!("Title:     {}", t.title);
    println!("Sprint:    {}", t.sprint);
    println!("Status:    {}", format_status(t.status));
    println!("Baseline:  {}h", format_hours(t.baseline_estimate));
    match (t.time_spent, t.error_rate) {
        (Some(spent), Some(rate)) => {
            println!("Spent:     {}h (error {rate:.0}%)", format_hours(spent));
            if let Some(reason) = &t.error_reason {
                println!("Reason:    {reason}");
            }
        }
        _ => println!("Spent:     -"),
    }
    println!("Created:   {}", format_ts(t.created_at_utc));
    println!("Updated:   {}", format_ts(t.updated_at_utc));

    print!("Ledger:   ");
    for day in 0..SPRINT_SLOTS {
        print!(" d{}={}", day + 1, format_hours(daily_value(t, day)));
    }
    println!();
    match completion_day(t) {
        Some(d) => println!("Burndown:  reached zero on day {}", d + 1),
        None => println!("Burndown:  not yet at zero"),
    }

    if !t.movements.is_empty() {
        println!("Movements:");
        for m in &t.movements {
            println!(
                "  {}  {} → {}  ({})",
                format_ts(m.at_utc),
                format_status(m.from),
                format_status(m.to),
                m.actor
            );
        }
    }
}

/// Record a daily re-estimate through the ledger.
pub fn cmd_estimate(board: &mut Board, path: &Path, id: u64, day: usize, value: f64) {
    let index = require_position(board, id);
    let day_index = match day_to_index(day) {
        Ok(d) => d,
        Err(e) => reject_and_die(e),
    };
    let now_utc = Utc::now().timestamp();
    if let Err(e) = set_daily_value(&mut board.tasks[index], day_index, value, now_utc) {
        reject_and_die(e);
    }
    save_or_die(board, path);
    let t = &board.tasks[index];
    println!(
        "Task {} day {} set to {}h",
        id,
        day,
        format_hours(daily_value(t, day_index))
    );
}

/// Move a task through the gated transition path.
pub fn cmd_move(
    board: &mut Board,
    path: &Path,
    id: u64,
    status: Option<Status>,
    forward: bool,
    back: bool,
    actor: Option<String>,
) {
    let index = require_position(board, id);
    let current = board.tasks[index].status;
    let status = match (status, forward, back) {
        (Some(s), _, _) => s,
        (None, true, _) => match current.forward() {
            Some(s) => s,
            None => reject_and_die(Reject::InvalidInput("task is already in Done".into())),
        },
        (None, _, true) => match current.backward() {
            Some(s) => s,
            None => reject_and_die(Reject::InvalidInput("task is already in Backlog".into())),
        },
        (None, false, false) => {
            reject_and_die(Reject::InvalidInput("pass a status, --forward, or --back".into()))
        }
    };
    let actor = resolve_actor(actor);
    let now_utc = Utc::now().timestamp();
    let wip = board.wip.clone();
    match apply_transition(&mut board.tasks, index, status, &wip, &actor, now_utc) {
        Ok(()) => {
            save_or_die(board, path);
            println!("Task {} moved to {}", id, format_status(status));
        }
        Err(Reject::TimeValidationRequired) => {
            eprintln!(
                "{} - record time spent first: sl complete {} --time-spent <hours>",
                Reject::TimeValidationRequired.code(),
                id
            );
            std::process::exit(1);
        }
        Err(e) => reject_and_die(e),
    }
}

/// Validate time spent and complete a task.
pub fn cmd_complete(
    board: &mut Board,
    path: &Path,
    id: u64,
    time_spent: f64,
    reason: Option<String>,
    actor: Option<String>,
) {
    let index = require_position(board, id);
    if board.tasks[index].status == Status::Done {
        reject_and_die(Reject::InvalidInput("task is already in Done".into()));
    }
    let actor = resolve_actor(actor);
    let now_utc = Utc::now().timestamp();
    if let Err(e) =
        validate_and_complete(&mut board.tasks[index], time_spent, reason.as_deref(), &actor, now_utc)
    {
        reject_and_die(e);
    }
    save_or_die(board, path);
    let t = &board.tasks[index];
    println!(
        "Task {} done: {}h spent, error {:.0}%",
        id,
        format_hours(time_spent),
        t.error_rate.unwrap_or(0.0)
    );
}

/// Reopen a Done task back into Doing.
pub fn cmd_reopen(board: &mut Board, path: &Path, id: u64, actor: Option<String>) {
    let index = require_position(board, id);
    if board.tasks[index].status != Status::Done {
        reject_and_die(Reject::InvalidInput("only Done tasks can be reopened".into()));
    }
    let actor = resolve_actor(actor);
    let now_utc = Utc::now().timestamp();
    let wip = board.wip.clone();
    match apply_transition(&mut board.tasks, index, Status::Doing, &wip, &actor, now_utc) {
        Ok(()) => {
            save_or_die(board, path);
            println!("Task {id} reopened into Doing");
        }
        Err(e) => reject_and_die(e),
    }
}

/// Print the burndown table for one sprint.
pub fn cmd_burndown(board: &Board, sprint: Option<String>, day: Option<usize>) {
    let sprint = match sprint {
        Some(s) => s,
        None => {
            let sprints = board.sprints();
            match sprints.len() {
                0 => {
                    println!("Board is empty.");
                    return;
                }
                1 => sprints.into_iter().next().unwrap(),
                _ => {
                    eprintln!("Multiple sprints on the board, pass --sprint: {}", sprints.join(", "));
                    std::process::exit(1);
                }
            }
        }
    };

    let tasks = board.sprint_tasks(&sprint);
    if tasks.is_empty() {
        println!("No tasks in sprint '{sprint}'.");
        return;
    }

    let current_day = match day.map(day_to_index).transpose() {
        Ok(d) => d,
        Err(e) => reject_and_die(e),
    }
    .unwrap_or_else(|| elapsed_day(&tasks, Utc::now().timestamp(), board.capacity.sprint_days));

    let report = burndown(&tasks, &board.capacity, current_day);
    let burned = tasks.iter().filter(|t| is_burned_down_by_day(t, current_day)).count();

    println!(
        "Sprint '{}': {} tasks ({} burned down by day {}), {}h committed",
        sprint,
        tasks.len(),
        burned,
        current_day + 1,
        format_hours(report.total_baseline_hours)
    );
    println!(
        "Capacity: {} dev × {}h/day over {} days",
        board.capacity.developers, board.capacity.hours_per_day, board.capacity.sprint_days
    );
    if report.days_needed > 0 {
        if report.will_overflow {
            println!(
                "Needs {} days, OVERFLOWS the {}-day sprint",
                report.days_needed, board.capacity.sprint_days
            );
        } else {
            println!("Needs {} days, fits the sprint", report.days_needed);
        }
    }
    println!();
    println!("{:<5} {:>9} {:>9} {:>9}", "Day", "Ideal", "Actual", "Velocity");
    for d in 0..report.horizon() {
        println!(
            "{:<5} {:>9} {:>9} {:>9}",
            d + 1,
            format_hours(report.ideal[d]),
            format_hours(report.actual[d]),
            format_hours(report.velocity[d])
        );
    }
}

/// Show or edit WIP limits.
pub fn cmd_wip(board: &mut Board, path: &Path, action: WipAction) {
    match action {
        WipAction::Show => {
            println!(
                "Enforcement: {}",
                if board.wip.enforced { "on" } else { "off (advisory)" }
            );
            if board.wip.limits.is_empty() {
                println!("No limits configured.");
            }
            for (status, limit) in &board.wip.limits {
                println!("{:<12} {}", format_status(*status), limit);
            }
        }
        WipAction::Set { status, limit } => {
            if !status.wip_limitable() {
                reject_and_die(Reject::InvalidInput(format!(
                    "{} cannot be WIP-limited",
                    format_status(status)
                )));
            }
            board.wip.limits.insert(status, limit);
            save_or_die(board, path);
            println!("WIP limit for {} set to {}", format_status(status), limit);
        }
        WipAction::Clear { status } => {
            board.wip.limits.remove(&status);
            save_or_die(board, path);
            println!("WIP limit for {} cleared", format_status(status));
        }
        WipAction::Enforce { mode } => {
            board.wip.enforced = matches!(mode, EnforceMode::On);
            save_or_die(board, path);
            println!(
                "WIP enforcement {}",
                if board.wip.enforced { "on" } else { "off" }
            );
        }
    }
}

/// Show or edit team capacity.
pub fn cmd_capacity(
    board: &mut Board,
    path: &Path,
    developers: Option<u32>,
    hours_per_day: Option<u32>,
    sprint_days: Option<u32>,
) {
    let mut changed = false;
    if let Some(d) = developers {
        if d == 0 {
            reject_and_die(Reject::InvalidInput("developers must be at least 1".into()));
        }
        board.capacity.developers = d;
        changed = true;
    }
    if let Some(h) = hours_per_day {
        if h == 0 {
            reject_and_die(Reject::InvalidInput("hours-per-day must be at least 1".into()));
        }
        board.capacity.hours_per_day = h;
        changed = true;
    }
    if let Some(s) = sprint_days {
        if s == 0 {
            reject_and_die(Reject::InvalidInput("sprint-days must be at least 1".into()));
        }
        board.capacity.sprint_days = s;
        changed = true;
    }
    if changed {
        save_or_die(board, path);
    }
    let c = &board.capacity;
    println!(
        "{} developers × {}h/day, {}-day sprint ({}h/day team capacity)",
        c.developers,
        c.hours_per_day,
        c.sprint_days,
        format_hours(c.hours_per_sprint_day())
    );
}

/// Delete a task by ID.
pub fn cmd_delete(board: &mut Board, path: &Path, id: u64) {
    if !board.remove(id) {
        eprintln!("Task with ID {id} not found");
        std::process::exit(1);
    }
    save_or_die(board, path);
    println!("Deleted task {id}");
}

/// Generate shell completions for the given shell.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;

    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

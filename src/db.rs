//! Board persistence and display utility functions.
//!
//! This module provides the `Board` struct that holds the task set together
//! with the stored WIP and capacity configuration, plus the table-printing
//! helpers the CLI commands share. The board lives in a single JSON file;
//! writes go through a temp file + rename.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::burndown::TeamCapacity;
use crate::fields::format_status;
use crate::gates::WipConfig;
use crate::ledger::{completion_day, daily_value};
use crate::task::Task;

/// In-memory board: the active task set plus stored configuration. The
/// configuration is stored here but always passed by value into the
/// validators, which never read it from anywhere else.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Board {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub wip: WipConfig,
    #[serde(default)]
    pub capacity: TeamCapacity,
}

impl Board {
    /// Load board from JSON file, creating a new empty board if file doesn't exist.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Board::default();
        }
        let mut buf = String::new();
        match File::open(path).and_then(|mut f| f.read_to_string(&mut buf)) {
            Ok(_) => match serde_json::from_str(&buf) {
                Ok(board) => board,
                Err(e) => {
                    eprintln!("Error parsing board, starting fresh: {e}");
                    Board::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading board, starting fresh: {e}");
                Board::default()
            }
        }
    }

    /// Save board to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        // Atomic-ish write via temp + rename.
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        let data = serde_json::to_string_pretty(self).unwrap();
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Generate the next available task ID.
    pub fn next_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Position of a task in the tasks vector.
    pub fn position_of(&self, id: u64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Remove a task by ID. Returns true if something was removed.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Tasks belonging to one sprint, in board order.
    pub fn sprint_tasks(&self, sprint: &str) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.sprint == sprint).collect()
    }

    /// Distinct sprint names, sorted.
    pub fn sprints(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tasks.iter().map(|t| t.sprint.clone()).collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Format an hours figure compactly ("8", "6.5").
pub fn format_hours(h: f64) -> String {
    if h.fract() == 0.0 {
        format!("{}", h as i64)
    } else {
        format!("{h:.1}")
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Print tasks in a formatted table, with the ledger read for `day`.
pub fn print_table(tasks: &[&Task], day: usize) {
    // Header.
    println!(
        "{:<5} {:<12} {:<12} {:>9} {:>9} {:>6} {:>7} {}",
        "ID", "Status", "Sprint", "Baseline", "Remaining", "Done@", "Err%", "Title"
    );
    for t in tasks {
        let remaining = format_hours(daily_value(t, day));
        let done_at = completion_day(t)
            .map(|d| format!("d{}", d + 1))
            .unwrap_or_else(|| "-".into());
        let err = t
            .error_rate
            .map(|r| format!("{r:.0}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<5} {:<12} {:<12} {:>9} {:>9} {:>6} {:>7} {}",
            t.id,
            format_status(t.status),
            truncate(&t.sprint, 12),
            format_hours(t.baseline_estimate),
            remaining,
            done_at,
            err,
            t.title
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_roundtrips_through_json() {
        let mut board = Board::default();
        let mut t = Task::new(1, "spike".into(), "s1".into(), 8.0, 42);
        crate::ledger::set_daily_value(&mut t, 3, 6.0, 43).unwrap();
        board.tasks.push(t);
        board.wip.enforced = true;
        board.wip.limits.insert(crate::fields::Status::Doing, 2);

        let json = serde_json::to_string(&board).unwrap();
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tasks.len(), 1);
        assert_eq!(back.tasks[0].daily_reestimates[3], 6.0);
        assert_eq!(back.wip.limit_for(crate::fields::Status::Doing), Some(2));
        assert_eq!(back.capacity, TeamCapacity::default());
    }

    #[test]
    fn next_id_skips_existing() {
        let mut board = Board::default();
        assert_eq!(board.next_id(), 1);
        board.tasks.push(Task::new(7, "t".into(), "s1".into(), 1.0, 0));
        assert_eq!(board.next_id(), 8);
    }

    #[test]
    fn sprint_filter_and_names() {
        let mut board = Board::default();
        board.tasks.push(Task::new(1, "a".into(), "s2".into(), 1.0, 0));
        board.tasks.push(Task::new(2, "b".into(), "s1".into(), 1.0, 0));
        board.tasks.push(Task::new(3, "c".into(), "s1".into(), 1.0, 0));
        assert_eq!(board.sprint_tasks("s1").len(), 2);
        assert_eq!(board.sprints(), vec!["s1".to_string(), "s2".to_string()]);
    }
}

//! Burndown projection over a sprint's tasks.
//!
//! Pure read-side aggregation: given the tasks of one sprint, the team
//! capacity, and how many sprint days have elapsed, derive the ideal, actual,
//! and velocity-projected remaining-work series. Every consumer (list badge,
//! burndown table) goes through [`burndown`] so the math exists exactly once.

use serde::{Deserialize, Serialize};

use crate::ledger::{completion_day, daily_value};
use crate::task::Task;

/// Team capacity configuration, supplied per call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamCapacity {
    pub developers: u32,
    pub hours_per_day: u32,
    pub sprint_days: u32,
}

impl Default for TeamCapacity {
    fn default() -> Self {
        TeamCapacity { developers: 1, hours_per_day: 8, sprint_days: 10 }
    }
}

impl TeamCapacity {
    /// Burnable hours per day across the whole team.
    pub fn hours_per_sprint_day(&self) -> f64 {
        (self.developers * self.hours_per_day) as f64
    }
}

/// The three aligned series plus the scalars sprint badges depend on.
/// All series run over days `0..=max(sprint_days, days_needed)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BurndownReport {
    pub total_baseline_hours: f64,
    pub days_needed: usize,
    pub will_overflow: bool,
    pub ideal: Vec<f64>,
    pub actual: Vec<f64>,
    pub velocity: Vec<f64>,
}

impl BurndownReport {
    /// Number of day points in each series.
    pub fn horizon(&self) -> usize {
        self.ideal.len()
    }
}

/// Compute the burndown report for one sprint's tasks.
///
/// `current_day` is the number of elapsed sprint days; it only feeds the
/// observed completion rate behind the velocity line. With zero team
/// capacity the ideal line degrades to a flat line at the total rather than
/// dividing by zero, and `days_needed` is reported as 0.
pub fn burndown(tasks: &[&Task], capacity: &TeamCapacity, current_day: usize) -> BurndownReport {
    if tasks.is_empty() {
        return BurndownReport {
            total_baseline_hours: 0.0,
            days_needed: 0,
            will_overflow: false,
            ideal: Vec::new(),
            actual: Vec::new(),
            velocity: Vec::new(),
        };
    }

    let total: f64 = tasks.iter().map(|t| t.baseline_estimate).sum();
    let per_day = capacity.hours_per_sprint_day();

    let days_needed = if per_day > 0.0 { (total / per_day).ceil() as usize } else { 0 };
    let will_overflow = days_needed > capacity.sprint_days as usize;
    let horizon = (capacity.sprint_days as usize).max(days_needed);

    let observed_rate = if current_day > 0 {
        let completed: f64 = tasks
            .iter()
            .filter(|t| completion_day(t).is_some_and(|d| d <= current_day))
            .map(|t| t.baseline_estimate)
            .sum();
        completed / current_day as f64
    } else {
        0.0
    };

    let mut ideal = Vec::with_capacity(horizon + 1);
    let mut actual = Vec::with_capacity(horizon + 1);
    let mut velocity = Vec::with_capacity(horizon + 1);
    for day in 0..=horizon {
        ideal.push(if per_day > 0.0 {
            (total - per_day * day as f64).max(0.0)
        } else {
            total
        });
        actual.push(if day == 0 {
            total
        } else {
            tasks.iter().map(|t| daily_value(t, day)).sum()
        });
        velocity.push((total - observed_rate * day as f64).max(0.0));
    }

    BurndownReport { total_baseline_hours: total, days_needed, will_overflow, ideal, actual, velocity }
}

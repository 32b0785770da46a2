//! Read-side helpers: list filtering and completion progress.

use crate::entities::{Priority, Task};

/// Search and priority filter for the task list.
///
/// Filtering never reorders: matches come back in list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Case-insensitive substring of the title; empty matches everything
    pub search: String,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        let matches_search = task.title.to_lowercase().contains(&self.search.to_lowercase());
        let matches_priority = self.priority.map_or(true, |p| task.priority == p);
        matches_search && matches_priority
    }
}

pub fn filter_tasks<'a>(tasks: &'a [Task], filter: &TaskFilter) -> Vec<&'a Task> {
    tasks.iter().filter(|task| filter.matches(task)).collect()
}

/// Completed-versus-total counts over the whole list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn of(tasks: &[Task]) -> Self {
        Self {
            completed: tasks.iter().filter(|t| t.completed).count(),
            total: tasks.len(),
        }
    }

    /// Whole percentage, rounded half up; 0 for an empty list
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) as f64 / self.total as f64).round() as u8
    }
}

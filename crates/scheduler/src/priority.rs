//! The four priority levels shared by the task queue and worker pool.

/// Task urgency. Declaration order is comparison order: `Critical` is the
/// highest priority. Within one level, tasks are served FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

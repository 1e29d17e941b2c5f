use core::fmt;

/// Which pool a task belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Producer,
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => write!(f, "Producer"),
            Role::Consumer => write!(f, "Consumer"),
        }
    }
}

/// Identity of a single producer or consumer task within one run.
///
/// Indices are zero-based and unique per role, so `(role, index)` identifies a
/// task for the lifetime of a run. Routines receive their `TaskId` through
/// their context instead of deriving it from the executing thread or task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    role: Role,
    index: usize,
}

impl TaskId {
    pub const fn producer(index: usize) -> Self {
        Self {
            role: Role::Producer,
            index,
        }
    }

    pub const fn consumer(index: usize) -> Self {
        Self {
            role: Role::Consumer,
            index,
        }
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    pub const fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.role, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_reads_like_a_log_subject() {
        assert_eq!(TaskId::producer(0).to_string(), "Producer 0");
        assert_eq!(TaskId::consumer(12).to_string(), "Consumer 12");
    }

    #[test]
    fn ids_order_by_role_then_index() {
        let mut ids = vec![
            TaskId::consumer(1),
            TaskId::producer(2),
            TaskId::consumer(0),
            TaskId::producer(0),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                TaskId::producer(0),
                TaskId::producer(2),
                TaskId::consumer(0),
                TaskId::consumer(1),
            ]
        );
    }
}

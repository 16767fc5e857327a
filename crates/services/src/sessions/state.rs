use std::fmt;

/// Where a question view is in its generate → answer → explain cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing requested yet, or the previous question was advanced past.
    Idle,
    /// A question (or the review queue) is being fetched.
    Loading,
    /// Question visible, no option chosen.
    Presented,
    /// Option chosen, not yet graded.
    Selected,
    /// Grading result and explanation visible.
    Graded,
    /// Review flow only: nothing left to review. Terminal.
    ReviewComplete,
}

impl LifecycleState {
    /// True while a request is outstanding and input should be disabled.
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ReviewComplete)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Presented => "presented",
            Self::Selected => "selected",
            Self::Graded => "graded",
            Self::ReviewComplete => "review complete",
        };
        f.write_str(label)
    }
}

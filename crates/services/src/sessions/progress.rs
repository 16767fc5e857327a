/// Position within a review queue, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewProgress {
    pub total: usize,
    /// One-based position of the question on screen; `total` once complete.
    pub position: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

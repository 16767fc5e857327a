mod content;
mod lifecycle;
mod practice;
mod progress;
mod review;
mod state;

#[cfg(test)]
mod tests;

// Public API of the question lifecycle subsystem.
pub use crate::error::SessionError;
pub use content::ContentApi;
pub use lifecycle::QuestionLifecycle;
pub use practice::PracticeFlow;
pub use progress::ReviewProgress;
pub use review::ReviewFlow;
pub use state::LifecycleState;

//! The search loop: explicit state, build-retry policy, and the controller.

pub mod controller;
pub mod retry;
pub mod state;

pub use controller::{IterationSummary, RunSummary, SearchController, SearchSettings};
pub use retry::BuildRetryPolicy;
pub use state::{Feedback, LoopState, PreviousCandidate};

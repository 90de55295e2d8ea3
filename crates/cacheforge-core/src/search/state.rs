//! Explicit loop state for the search controller.
//!
//! [`LoopState`] is threaded through every iteration by value. The only
//! transition that changes it is [`LoopState::decide`], a pure function of
//! the old state, the candidate that was just evaluated, and its aggregate
//! hit rate.

use std::fmt;

use cacheforge_types::policy::PolicyCandidate;
use cacheforge_types::trial::format_percent;
use serde::Serialize;

/// Outcome of comparing a candidate's aggregate against the best-known score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    /// Strictly better than the previous best; the best moved to `current`.
    Improved { previous_best: f64, current: f64 },
    /// Equal to or worse than `best`; the best did not move.
    NotImproved { current: f64, best: f64 },
}

impl Feedback {
    pub fn improved(&self) -> bool {
        matches!(self, Feedback::Improved { .. })
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Improved { previous_best, current } => write!(
                f,
                "Great! Policy improved from {} to {}. Please refine further.",
                format_percent(*previous_best),
                format_percent(*current)
            ),
            Feedback::NotImproved { current, best } => write!(
                f,
                "Policy hit rate was {}, not better than {}. Try a different approach.",
                format_percent(*current),
                format_percent(*best)
            ),
        }
    }
}

/// The most recently recorded candidate and the feedback it earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviousCandidate {
    pub candidate: PolicyCandidate,
    pub aggregate: f64,
    pub feedback: Feedback,
}

/// Search state carried between iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopState {
    /// Index of the next iteration to run. Only advanced by [`Self::decide`].
    pub iteration: u32,
    pub max_iterations: u32,
    /// Best aggregate hit rate seen so far (seeded from history).
    pub best_score: f64,
    /// `None` until the first candidate has been recorded.
    pub previous: Option<PreviousCandidate>,
}

impl LoopState {
    pub fn new(max_iterations: u32, initial_best: f64) -> Self {
        Self {
            iteration: 0,
            max_iterations,
            best_score: initial_best,
            previous: None,
        }
    }

    /// True once the iteration budget is spent.
    pub fn is_done(&self) -> bool {
        self.iteration >= self.max_iterations
    }

    /// True when the next prompt should be a cold-start prompt.
    pub fn is_cold_start(&self) -> bool {
        self.previous.is_none()
    }

    /// Fold an evaluated candidate into the state.
    ///
    /// The best score only moves on strict improvement. The iteration index
    /// always advances by one.
    pub fn decide(self, candidate: PolicyCandidate, aggregate: f64) -> LoopState {
        let (feedback, best_score) = if aggregate > self.best_score {
            (
                Feedback::Improved {
                    previous_best: self.best_score,
                    current: aggregate,
                },
                aggregate,
            )
        } else {
            (
                Feedback::NotImproved {
                    current: aggregate,
                    best: self.best_score,
                },
                self.best_score,
            )
        };

        LoopState {
            iteration: self.iteration + 1,
            max_iterations: self.max_iterations,
            best_score,
            previous: Some(PreviousCandidate {
                candidate,
                aggregate,
                feedback,
            }),
        }
    }
}

//! The terminal status of a node's computation.

use crate::errors::SchedulerError;
use crate::node::Output;

/// Per-node terminal status: either the results it produced, or the
/// reason it did not.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    Success(Vec<Output<T>>),
    Failure(SchedulerError),
}

impl<T: Clone> Outcome<T> {
    /// Flatten to a per-result outcome sequence: `Success([r1,r2])` becomes
    /// `[Success(r1), Success(r2)]`; `Failure(e)` becomes the single-element
    /// `[Failure(e)]`.
    pub fn flatten(self) -> Vec<Outcome<T>> {
        match self {
            Outcome::Success(results) => results
                .into_iter()
                .map(|r| Outcome::Success(vec![r]))
                .collect(),
            Outcome::Failure(e) => vec![Outcome::Failure(e)],
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn as_failure(&self) -> Option<&SchedulerError> {
        match self {
            Outcome::Failure(e) => Some(e),
            Outcome::Success(_) => None,
        }
    }
}

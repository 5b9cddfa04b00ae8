//! Result type of searches and scans that can come back empty or be cancelled.

use serde::{Deserialize, Serialize};

/// Outcome of a long-running search.
///
/// `Cancelled` is distinct from both `Found` and `NotFound` and keeps whatever
/// was collected before the stop request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome<T> {
    Found(T),
    NotFound,
    Cancelled { partial: T },
}

impl<T> Outcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled { .. })
    }

    /// The collected data, complete or partial.
    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Found(data) | Outcome::Cancelled { partial: data } => Some(data),
            Outcome::NotFound => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Outcome::Found(data) | Outcome::Cancelled { partial: data } => Some(data),
            Outcome::NotFound => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Found(data) => Outcome::Found(f(data)),
            Outcome::NotFound => Outcome::NotFound,
            Outcome::Cancelled { partial } => Outcome::Cancelled { partial: f(partial) },
        }
    }
}

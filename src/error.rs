//! Errors raised by the route search.
//!
//! Apart from worker failures, every variant is an invariant violation: the
//! search logic itself is broken when one of them surfaces. Running out of
//! feasible moves is not an error and is reported through
//! [`crate::distance_index::Nearest::Exhausted`] instead.

use std::error::Error;
use std::fmt;

/// Invariant violations detected while building routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// A point was reserved while another vehicle (or this one) already holds it.
    PointAlreadyUsed(usize),
    /// A point was released without being reserved.
    PointNotUsed(usize),
    /// A route was popped past its first point.
    UnloadPastStart,
    /// An explicit rollback asked to keep at least as many points as the route has.
    InvalidUnloadTarget { keep: usize, len: usize },
    /// A replayed hint points at a location that is already occupied.
    HintPointUsed(usize),
    /// Visiting a point would push the cargo outside `[0, capacity]`.
    CargoOutOfRange { point: usize, cargo: u32 },
    /// A point id outside `0..=N+M`.
    UnknownPoint(usize),
    /// A vehicle index outside the fleet.
    UnknownVehicle(usize),
    /// A worker thread panicked while running an attempt.
    WorkerFailed(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::PointAlreadyUsed(point) => write!(f, "point {} already used", point),
            SearchError::PointNotUsed(point) => write!(f, "point {} is not used", point),
            SearchError::UnloadPastStart => write!(f, "unloaded until start position"),
            SearchError::InvalidUnloadTarget { keep, len } => write!(
                f,
                "wrong unload target: keep {} points of a route with {}",
                keep, len
            ),
            SearchError::HintPointUsed(point) => write!(f, "hint point {} already used", point),
            SearchError::CargoOutOfRange { point, cargo } => {
                write!(f, "visiting point {} with cargo {} leaves the cargo range", point, cargo)
            }
            SearchError::UnknownPoint(point) => write!(f, "unknown point {}", point),
            SearchError::UnknownVehicle(vehicle) => write!(f, "unknown vehicle {}", vehicle),
            SearchError::WorkerFailed(message) => write!(f, "worker failed: {}", message),
        }
    }
}

impl Error for SearchError {}

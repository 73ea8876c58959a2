//! Greedy route construction for a single vehicle.
//!
//! A [`RouteBuilder`] extends its route with the nearest free point the
//! vehicle may visit, reserving every point in the shared [`DistanceIndex`].
//! When no feasible move remains while cargo is still on board, it unloads:
//! points are popped from the tail and released until one load's worth has
//! been shed, and the search continues from the shorter route.
//!
//! The route doubles as the undo log of the reservations. Each [`Leg`] stores
//! the point and the exact distance that was charged for it, so popping a leg
//! restores occupancy, fuel and cargo to what they were before it was added.

use crate::config::{Config, LoadPolicy};
use crate::distance_index::{Allowed, DistanceIndex, Nearest};
use crate::error::SearchError;
use crate::problem::Vehicle;
use log::debug;

/// One committed move of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    pub point: usize,
    /// Distance charged when the point was added
    pub distance: u64,
}

/// Result of a single extension attempt.
enum Advance {
    Moved,
    Stuck,
}

/// Route state machine for one vehicle against a live distance index.
pub struct RouteBuilder<'a> {
    index: &'a mut DistanceIndex,
    vehicle: Vehicle,
    capacity: u32,
    load_policy: LoadPolicy,
    alternative_fuel_ratio: f64,
    legs: Vec<Leg>,
    distance_used: u64,
    cargo: u32,
    unloading: bool,
    /// Position of the last unload step, used to stop a stuck unload cycle
    safepoint: usize,
    done: bool,
    hint: Vec<usize>,
    hint_used: bool,
    forced_distance: Option<u64>,
    alternatives: Vec<Vec<usize>>,
}

impl<'a> RouteBuilder<'a> {
    /// Create an empty route for `vehicle`.
    pub fn new(index: &'a mut DistanceIndex, vehicle: Vehicle, config: &Config) -> Self {
        RouteBuilder {
            index,
            vehicle,
            capacity: config.capacity,
            load_policy: config.load_policy,
            alternative_fuel_ratio: config.alternative_fuel_ratio,
            legs: Vec::new(),
            distance_used: 0,
            cargo: 0,
            unloading: false,
            safepoint: 0,
            done: false,
            hint: Vec::new(),
            hint_used: false,
            forced_distance: None,
            alternatives: Vec::new(),
        }
    }

    /// Replay `hint` point by point before falling back to queries.
    pub fn with_hint(mut self, hint: Vec<usize>) -> Self {
        self.hint = hint;
        self
    }

    /// Force the first hop from the depot to this exact distance.
    pub fn with_forced_distance(mut self, distance: Option<u64>) -> Self {
        self.forced_distance = distance;
        self
    }

    /// Extend the route until no further move is possible.
    pub fn calculate(&mut self) -> Result<(), SearchError> {
        while !self.done {
            match self.advance()? {
                Advance::Moved => {}
                Advance::Stuck => {
                    if self.cargo == 0 {
                        self.done = true;
                    } else {
                        self.unloading = true;
                        self.unload_one()?;
                    }
                }
            }
        }

        Ok(())
    }

    fn advance(&mut self) -> Result<Advance, SearchError> {
        if self.cargo == 0 {
            if !self.index.has_free_n_points() {
                return Ok(Advance::Stuck);
            }

            if self.unloading {
                let position = self.position();
                if self.safepoint == position {
                    return Ok(Advance::Stuck);
                }
                self.safepoint = position;
                self.unloading = false;
            }
        }

        let step = self.legs.len();
        let (point, distance) = match self.hint.get(step).copied() {
            Some(point) if !self.hint_used => {
                if point == 0 || point >= self.index.point_count() {
                    return Err(SearchError::UnknownPoint(point));
                }
                if self.index.is_used(point) {
                    return Err(SearchError::HintPointUsed(point));
                }
                (point, self.index.distance(self.position(), point))
            }
            _ => {
                self.hint_used = true;
                let forced = if step == 0 { self.forced_distance } else { None };
                let remaining = self.vehicle.fuel.saturating_sub(self.distance_used);

                match self
                    .index
                    .nearest(self.position(), remaining, self.allowed(), forced)
                {
                    Nearest::Exhausted => return Ok(Advance::Stuck),
                    Nearest::Found {
                        targets,
                        distance,
                        closest,
                    } => {
                        if targets.len() > 2 && closest {
                            let prefix = self.route();
                            for &target in &targets[1..] {
                                let mut alternative = prefix.clone();
                                alternative.push(target);
                                self.alternatives.push(alternative);
                            }
                        }
                        (targets[0], distance)
                    }
                }
            }
        };

        self.add_point(point, distance)?;
        self.unloading = false;

        Ok(Advance::Moved)
    }

    fn allowed(&self) -> Allowed {
        if self.unloading {
            return Allowed::Demand;
        }
        if self.cargo == 0 {
            return Allowed::Supply;
        }

        match self.load_policy {
            LoadPolicy::Single => Allowed::Demand,
            LoadPolicy::Mixed if self.cargo >= self.capacity => Allowed::Demand,
            LoadPolicy::Mixed => Allowed::Any,
        }
    }

    fn add_point(&mut self, point: usize, distance: u64) -> Result<(), SearchError> {
        let cargo = match self.index.is_supply(point) {
            true if self.cargo < self.capacity => self.cargo + 1,
            false if self.cargo > 0 => self.cargo - 1,
            _ => {
                return Err(SearchError::CargoOutOfRange {
                    point,
                    cargo: self.cargo,
                })
            }
        };

        self.index.use_point(point)?;
        self.legs.push(Leg { point, distance });
        self.distance_used += distance;
        self.cargo = cargo;

        debug!(
            "Vehicle {} used {:?} point {}. Cargo {}, distance {}/{}",
            self.vehicle.index,
            self.index.kind(point),
            point,
            self.cargo,
            self.distance_used,
            self.vehicle.fuel
        );

        Ok(())
    }

    fn pop_point(&mut self) -> Result<usize, SearchError> {
        let leg = self.legs.pop().ok_or(SearchError::UnloadPastStart)?;

        self.index.free_point(leg.point)?;
        self.distance_used -= leg.distance;
        if self.index.is_supply(leg.point) {
            self.cargo -= 1;
        } else {
            self.cargo += 1;
        }

        debug!(
            "Vehicle {} freed {:?} point {}. Cargo {}, distance {}/{}",
            self.vehicle.index,
            self.index.kind(leg.point),
            leg.point,
            self.cargo,
            self.distance_used,
            self.vehicle.fuel
        );

        Ok(leg.point)
    }

    /// Release every point of the route.
    pub fn unload(&mut self) -> Result<(), SearchError> {
        if self.legs.is_empty() {
            return Ok(());
        }
        self.unload_to(0)
    }

    /// Pop points until only the first `keep` remain.
    pub fn unload_to(&mut self, keep: usize) -> Result<(), SearchError> {
        if keep >= self.legs.len() {
            return Err(SearchError::InvalidUnloadTarget {
                keep,
                len: self.legs.len(),
            });
        }

        while self.legs.len() > keep {
            self.pop_point()?;
        }
        Ok(())
    }

    /// Pop points until a supply point has been released.
    fn unload_one(&mut self) -> Result<(), SearchError> {
        loop {
            let point = self.pop_point()?;
            if self.index.is_supply(point) {
                return Ok(());
            }
        }
    }

    /// Current location, the depot for an empty route.
    pub fn position(&self) -> usize {
        self.legs.last().map(|leg| leg.point).unwrap_or(0)
    }

    /// Visited points in order, depot excluded.
    pub fn route(&self) -> Vec<usize> {
        self.legs.iter().map(|leg| leg.point).collect()
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn distance_used(&self) -> u64 {
        self.distance_used
    }

    pub fn cargo(&self) -> u32 {
        self.cargo
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn vehicle(&self) -> Vehicle {
        self.vehicle
    }

    /// The shared index this route reserves points in.
    pub fn index(&self) -> &DistanceIndex {
        &*self.index
    }

    /// Recorded alternatives cheap enough to be worth exploring: their
    /// internal distance stays under the configured share of the fuel.
    pub fn alternatives(&self) -> Vec<Vec<usize>> {
        let budget = self.alternative_fuel_ratio * self.vehicle.fuel as f64;

        self.alternatives
            .iter()
            .filter(|alternative| {
                let internal: u64 = alternative
                    .windows(2)
                    .map(|pair| self.index.distance(pair[0], pair[1]))
                    .sum();
                (internal as f64) < budget
            })
            .cloned()
            .collect()
    }
}

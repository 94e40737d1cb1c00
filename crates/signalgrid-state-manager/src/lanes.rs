// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Lane identifiers and the fixed four-lane map
//!
//! Every junction has exactly four approaches. `LaneMap` stores one value per
//! lane as named fields, so a record can never be missing a lane or carry an
//! extra one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::StateError;

/// One approach of a junction, in cyclic signal order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    North,
    East,
    South,
    West,
}

impl Lane {
    /// All lanes in round-robin order
    pub const ALL: [Lane; 4] = [Lane::North, Lane::East, Lane::South, Lane::West];

    /// Lane that follows this one in the cycle (west wraps to north)
    pub fn next(self) -> Lane {
        match self {
            Lane::North => Lane::East,
            Lane::East => Lane::South,
            Lane::South => Lane::West,
            Lane::West => Lane::North,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lane::North => "north",
            Lane::East => "east",
            Lane::South => "south",
            Lane::West => "west",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lane {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "north" => Ok(Lane::North),
            "east" => Ok(Lane::East),
            "south" => Ok(Lane::South),
            "west" => Ok(Lane::West),
            other => Err(StateError::InvalidLane(other.to_string())),
        }
    }
}

/// One value per lane, serialised as `{"north": .., "east": .., "south": .., "west": ..}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LaneMap<T> {
    pub north: T,
    pub east: T,
    pub south: T,
    pub west: T,
}

impl<T> LaneMap<T> {
    /// Build a map by evaluating `f` for each lane
    pub fn from_fn(mut f: impl FnMut(Lane) -> T) -> Self {
        Self {
            north: f(Lane::North),
            east: f(Lane::East),
            south: f(Lane::South),
            west: f(Lane::West),
        }
    }

    pub fn get(&self, lane: Lane) -> &T {
        match lane {
            Lane::North => &self.north,
            Lane::East => &self.east,
            Lane::South => &self.south,
            Lane::West => &self.west,
        }
    }

    pub fn get_mut(&mut self, lane: Lane) -> &mut T {
        match lane {
            Lane::North => &mut self.north,
            Lane::East => &mut self.east,
            Lane::South => &mut self.south,
            Lane::West => &mut self.west,
        }
    }

    pub fn set(&mut self, lane: Lane, value: T) {
        *self.get_mut(lane) = value;
    }

    /// Iterate `(lane, value)` pairs in cyclic order
    pub fn iter(&self) -> impl Iterator<Item = (Lane, &T)> + '_ {
        Lane::ALL.into_iter().map(move |lane| (lane, self.get(lane)))
    }
}

impl<T: Clone> LaneMap<T> {
    /// Same value for every lane
    pub fn uniform(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

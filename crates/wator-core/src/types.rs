//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cell coordinate on the toroidal board.
///
/// `x` is the column and `y` the row; row-major order walks `x` fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Apply toroidal wrapping for a square board of side `size`
    pub fn wrap(x: i64, y: i64, size: u32) -> Self {
        let n = i64::from(size);
        Self {
            x: x.rem_euclid(n) as u32,
            y: y.rem_euclid(n) as u32,
        }
    }

    /// Row-major index on a board of side `size`
    pub fn index(&self, size: u32) -> usize {
        self.y as usize * size as usize + self.x as usize
    }

    pub fn from_index(index: usize, size: u32) -> Self {
        let size = size as usize;
        Self {
            x: (index % size) as u32,
            y: (index / size) as u32,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Fish,
    Shark,
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Species::Fish => write!(f, "fish"),
            Species::Shark => write!(f, "shark"),
        }
    }
}

/// A fish or shark. Each cell owns its entity by value; moving an entity
/// writes it to the destination and leaves the source behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub species: Species,
    /// Generations since the last breeding event
    pub breed: u16,
    /// Generations left before starving. Always 0 for fish.
    pub starve: u16,
}

impl Entity {
    pub fn fish() -> Self {
        Self {
            species: Species::Fish,
            breed: 0,
            starve: 0,
        }
    }

    pub fn shark(starve: u16) -> Self {
        Self {
            species: Species::Shark,
            breed: 0,
            starve,
        }
    }

    pub fn with_breed(mut self, breed: u16) -> Self {
        self.breed = breed;
        self
    }

    pub fn is_fish(&self) -> bool {
        self.species == Species::Fish
    }

    pub fn is_shark(&self) -> bool {
        self.species == Species::Shark
    }
}

/// What a renderer sees in a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Empty,
    Fish,
    Shark,
}

impl From<Option<Entity>> for CellState {
    fn from(cell: Option<Entity>) -> Self {
        match cell.map(|e| e.species) {
            None => CellState::Empty,
            Some(Species::Fish) => CellState::Fish,
            Some(Species::Shark) => CellState::Shark,
        }
    }
}

impl From<Option<&Entity>> for CellState {
    fn from(cell: Option<&Entity>) -> Self {
        CellState::from(cell.copied())
    }
}

//! Per-species movement, breeding and starvation policy.
//!
//! Rules never touch a buffer. They look at a read-only [`Neighbourhood`]
//! taken from the current generation and return an [`Outcome`] that the
//! step engine turns into claims on the next generation.

use rand::Rng;
use wator_core::{CellState, Entity, Position, Species, WatorConfig};

/// Breed and starve limits, narrowed from a validated [`WatorConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub fish_breed: u16,
    pub shark_breed: u16,
    pub shark_starve: u16,
}

impl Thresholds {
    pub fn from_config(config: &WatorConfig) -> Self {
        let narrow = |value: i32| value.clamp(0, i32::from(u16::MAX)) as u16;
        Self {
            fish_breed: narrow(config.fish_breed_threshold),
            shark_breed: narrow(config.shark_breed_threshold),
            shark_starve: narrow(config.shark_starve_threshold),
        }
    }

    /// A newborn or freshly seeded entity of `species`
    pub fn newborn(&self, species: Species) -> Entity {
        match species {
            Species::Fish => Entity::fish(),
            Species::Shark => Entity::shark(self.shark_starve),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from_config(&WatorConfig::default())
    }
}

/// The four neighbours of a cell together with their current-buffer state,
/// in resolver order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbourhood {
    cells: [(Position, CellState); 4],
}

impl Neighbourhood {
    pub fn new(cells: [(Position, CellState); 4]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[(Position, CellState); 4] {
        &self.cells
    }

    /// Neighbours currently in `state`, keeping resolver order
    pub fn matching(&self, state: CellState) -> Candidates {
        let mut candidates = Candidates::default();
        for &(pos, cell) in &self.cells {
            if cell == state {
                candidates.push(pos);
            }
        }
        candidates
    }
}

/// Up to four candidate destinations, stored inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidates {
    cells: [Position; 4],
    len: usize,
}

impl Default for Candidates {
    fn default() -> Self {
        Self {
            cells: [Position::new(0, 0); 4],
            len: 0,
        }
    }
}

impl Candidates {
    fn push(&mut self, pos: Position) {
        self.cells[self.len] = pos;
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[Position] {
        &self.cells[..self.len]
    }

    /// Uniform pick. Consumes no randomness when there is nothing to pick.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        match self.len {
            0 => None,
            len => Some(self.cells[rng.gen_range(0..len)]),
        }
    }
}

/// What happens to the entity itself this generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    /// Carried into the next generation at the outcome's destination
    Survives(Entity),
    /// Removed before it is written anywhere
    Starved,
}

/// The single decision for one entity in one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub source: Position,
    pub destination: Position,
    pub fate: Fate,
    /// The destination held a fish that this shark is eating
    pub predation: bool,
    /// Offspring requested at the vacated source cell
    pub spawn: Option<Entity>,
}

impl Outcome {
    pub fn moved(&self) -> bool {
        self.source != self.destination
    }

    pub fn survivor(&self) -> Option<Entity> {
        match self.fate {
            Fate::Survives(entity) => Some(entity),
            Fate::Starved => None,
        }
    }
}

/// Fish and shark policy. Pure given its inputs and the injected generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityRules {
    thresholds: Thresholds,
}

impl EntityRules {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn decide<R: Rng + ?Sized>(
        &self,
        entity: Entity,
        source: Position,
        neighbourhood: &Neighbourhood,
        rng: &mut R,
    ) -> Outcome {
        match entity.species {
            Species::Fish => self.fish(entity, source, neighbourhood, rng),
            Species::Shark => self.shark(entity, source, neighbourhood, rng),
        }
    }

    pub fn fish<R: Rng + ?Sized>(
        &self,
        mut fish: Entity,
        source: Position,
        neighbourhood: &Neighbourhood,
        rng: &mut R,
    ) -> Outcome {
        fish.breed = fish.breed.saturating_add(1);

        let destination = neighbourhood
            .matching(CellState::Empty)
            .choose(rng)
            .unwrap_or(source);

        let mut spawn = None;
        if fish.breed >= self.thresholds.fish_breed {
            fish.breed = 0;
            // A fish that stayed put has no free cell to leave its offspring in
            if destination != source {
                spawn = Some(self.thresholds.newborn(Species::Fish));
            }
        }

        Outcome {
            source,
            destination,
            fate: Fate::Survives(fish),
            predation: false,
            spawn,
        }
    }

    pub fn shark<R: Rng + ?Sized>(
        &self,
        mut shark: Entity,
        source: Position,
        neighbourhood: &Neighbourhood,
        rng: &mut R,
    ) -> Outcome {
        shark.breed = shark.breed.saturating_add(1);
        shark.starve = shark.starve.saturating_sub(1);

        let mut predation = false;
        let destination = if let Some(prey) = neighbourhood.matching(CellState::Fish).choose(rng) {
            shark.starve = self.thresholds.shark_starve;
            predation = true;
            prey
        } else {
            neighbourhood
                .matching(CellState::Empty)
                .choose(rng)
                .unwrap_or(source)
        };

        if shark.starve == 0 {
            return Outcome {
                source,
                destination,
                fate: Fate::Starved,
                predation,
                spawn: None,
            };
        }

        let mut spawn = None;
        if shark.breed >= self.thresholds.shark_breed {
            shark.breed = 0;
            if destination != source {
                spawn = Some(self.thresholds.newborn(Species::Shark));
            }
        }

        Outcome {
            source,
            destination,
            fate: Fate::Survives(shark),
            predation,
            spawn,
        }
    }
}

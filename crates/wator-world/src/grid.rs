//! Double-buffered toroidal grid.
//!
//! The current generation is a plain `Vec<Option<Entity>>` that is only read
//! while a step is running. The next generation is a vector of atomic claim
//! words, one per cell. Each word packs an arbitration key in its high half
//! and the claiming entity in its low half, so `fetch_min` both arbitrates
//! and stores the winner in one operation:
//!
//! ```text
//!  63..62          61..32              31..17     16..2     1..0
//! ┌──────┬─────────────────────┬──────────┬─────────┬─────────┐
//! │ tier │ source row-major idx│  starve  │  breed  │ species │
//! └──────┴─────────────────────┴──────────┴─────────┴─────────┘
//!  └──────── arbitration key ──┘└────────── entity ──────────┘
//! ```
//!
//! An unclaimed cell holds `u64::MAX`, which every real claim undercuts.
//!
//! A second per-cell word records which shark hunts the fish in that cell,
//! so an eaten fish never makes a claim of its own.

use crate::neighbours::NeighbourResolver;
use crate::rules::{Neighbourhood, Thresholds};
use rand::Rng;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use wator_core::{
    CellState, Entity, Error, Population, Position, Result, Species, WatorConfig, MAX_THRESHOLD,
};

const UNCLAIMED: u64 = u64::MAX;
const UNHUNTED: u32 = u32::MAX;
const INDEX_BITS: u32 = 30;
const COUNTER_BITS: u32 = 15;
const COUNTER_MASK: u32 = (1 << COUNTER_BITS) - 1;

/// Priority class of a claim. Lower classes win before source order is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ClaimTier {
    /// A shark entering the cell of the fish it eats
    Predation = 0,
    /// An entity moving or staying put
    Movement = 1,
    /// Offspring left behind in a vacated cell
    Spawn = 2,
}

/// Global arbitration order for claims on the same cell: lowest key wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClaimKey(u32);

impl ClaimKey {
    /// `source` is the row-major index of the claimant's source cell.
    pub fn new(tier: ClaimTier, source: usize) -> Self {
        debug_assert!(source < 1 << INDEX_BITS);
        Self(((tier as u32) << INDEX_BITS) | source as u32)
    }

    pub fn tier(&self) -> ClaimTier {
        match self.0 >> INDEX_BITS {
            0 => ClaimTier::Predation,
            1 => ClaimTier::Movement,
            _ => ClaimTier::Spawn,
        }
    }

    pub fn source(&self) -> usize {
        (self.0 & ((1 << INDEX_BITS) - 1)) as usize
    }
}

/// Result of a single claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// Nobody had claimed the cell yet this generation
    Vacant,
    /// An earlier claim with a higher key was displaced
    Superseded,
    /// A claim with a lower key already holds the cell
    Rejected,
}

impl Claim {
    /// Whether this claim held the cell at the moment it was made. A later
    /// claim with a lower key can still displace it before the swap.
    pub fn is_held(&self) -> bool {
        !matches!(self, Claim::Rejected)
    }
}

/// What a swap promoted into the current buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Promotion {
    pub occupied: usize,
    pub predations: usize,
    pub births: usize,
}

/// A square toroidal grid with a current and a next generation buffer
#[derive(Debug)]
pub struct Grid {
    size: u32,
    resolver: NeighbourResolver,
    current: Vec<Option<Entity>>,
    next: Vec<AtomicU64>,
    hunters: Vec<AtomicU32>,
    generation: u64,
}

impl Grid {
    pub fn new(size: u32) -> Self {
        let cells = size as usize * size as usize;
        Self {
            size,
            resolver: NeighbourResolver::new(size),
            current: vec![None; cells],
            next: (0..cells).map(|_| AtomicU64::new(UNCLAIMED)).collect(),
            hunters: (0..cells).map(|_| AtomicU32::new(UNHUNTED)).collect(),
            generation: 0,
        }
    }

    /// Create a grid from configuration, placing the initial population on
    /// distinct random cells
    pub fn seeded<R: Rng + ?Sized>(config: &WatorConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let mut grid = Self::new(config.side());
        let thresholds = Thresholds::from_config(config);
        let population = config.initial_fish + config.initial_sharks;
        let cells = rand::seq::index::sample(rng, grid.current.len(), population);

        for (placed, index) in cells.iter().enumerate() {
            let species = if placed < config.initial_fish {
                Species::Fish
            } else {
                Species::Shark
            };
            grid.current[index] = Some(thresholds.newborn(species));
        }

        Ok(grid)
    }

    /// Rebuild a grid from previously captured cells
    pub fn from_cells(size: u32, generation: u64, cells: Vec<Option<Entity>>) -> Result<Self> {
        let expected = size as usize * size as usize;
        if cells.len() != expected {
            return Err(Error::configuration(format!(
                "expected {} cells for a {}x{} grid, got {}",
                expected,
                size,
                size,
                cells.len()
            )));
        }

        let mut grid = Self::new(size);
        grid.current = cells;
        grid.generation = generation;
        Ok(grid)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn resolver(&self) -> &NeighbourResolver {
        &self.resolver
    }

    /// State of a cell in the current buffer (with toroidal wrapping)
    pub fn read(&self, pos: Position) -> CellState {
        CellState::from(self.get(pos))
    }

    pub fn get(&self, pos: Position) -> Option<&Entity> {
        self.current[self.index_of(pos)].as_ref()
    }

    /// Put an entity into the current buffer. Only valid between steps.
    pub fn place(&mut self, pos: Position, entity: Entity) -> Option<Entity> {
        let index = self.index_of(pos);
        self.current[index].replace(entity)
    }

    pub fn clear(&mut self, pos: Position) -> Option<Entity> {
        let index = self.index_of(pos);
        self.current[index].take()
    }

    pub fn neighbourhood(&self, pos: Position) -> Neighbourhood {
        let around = self.resolver.neighbours(pos);
        Neighbourhood::new(around.map(|p| (p, self.read(p))))
    }

    /// Atomically offer `entity` for cell `pos` of the next generation.
    ///
    /// Safe to call from many workers at once. Whatever the arrival order,
    /// the claim with the lowest key is the one left standing at swap time.
    pub fn claim(&self, pos: Position, key: ClaimKey, entity: Entity) -> Result<Claim> {
        let word = (u64::from(key.0) << 32) | u64::from(self.encode(entity, pos)?);
        let previous = self.next[self.index_of(pos)].fetch_min(word, Ordering::AcqRel);

        Ok(if previous == UNCLAIMED {
            Claim::Vacant
        } else if word < previous {
            Claim::Superseded
        } else {
            Claim::Rejected
        })
    }

    /// Mark the fish at `prey` as eaten this generation. When several sharks
    /// hunt the same fish the lowest source index is kept, matching the
    /// predation claim that takes the cell.
    pub fn mark_prey(&self, prey: Position, hunter: usize) {
        debug_assert!(hunter < 1 << INDEX_BITS);
        self.hunters[self.index_of(prey)].fetch_min(hunter as u32, Ordering::AcqRel);
    }

    /// Source index of the shark eating the fish at `pos`, if any
    pub fn hunter(&self, pos: Position) -> Option<usize> {
        match self.hunters[self.index_of(pos)].load(Ordering::Acquire) {
            UNHUNTED => None,
            source => Some(source as usize),
        }
    }

    /// Number of next-generation cells that currently hold a claim
    pub fn claimed(&self) -> usize {
        self.next
            .iter()
            .filter(|slot| slot.load(Ordering::Acquire) != UNCLAIMED)
            .count()
    }

    /// Promote the next buffer to current, start a fresh next buffer, and
    /// advance the generation. Must only run once every worker has finished.
    ///
    /// On a malformed claim word the next buffer is discarded and the current
    /// generation is left untouched.
    pub fn swap(&mut self) -> Result<Promotion> {
        let mut promoted = Vec::with_capacity(self.current.len());
        let mut promotion = Promotion::default();
        let mut malformed = None;

        for (index, slot) in self.next.iter_mut().enumerate() {
            let word = *slot.get_mut();
            if word == UNCLAIMED {
                promoted.push(None);
                continue;
            }

            let key = ClaimKey((word >> 32) as u32);
            let Some(entity) = decode(word as u32) else {
                malformed = Some((index, word));
                break;
            };

            promotion.occupied += 1;
            match key.tier() {
                ClaimTier::Predation => promotion.predations += 1,
                ClaimTier::Spawn => promotion.births += 1,
                ClaimTier::Movement => {}
            }
            promoted.push(Some(entity));
        }

        if let Some((index, word)) = malformed {
            self.discard_next();
            return Err(Error::FatalStep {
                generation: self.generation + 1,
                reason: format!(
                    "malformed claim word {:#018x} at {}",
                    word,
                    Position::from_index(index, self.size)
                ),
            });
        }

        self.current = promoted;
        self.discard_next();
        self.generation += 1;
        Ok(promotion)
    }

    /// Drop every pending claim and prey mark on the next buffer
    pub fn discard_next(&mut self) {
        for slot in self.next.iter_mut() {
            *slot.get_mut() = UNCLAIMED;
        }
        for hunter in self.hunters.iter_mut() {
            *hunter.get_mut() = UNHUNTED;
        }
    }

    pub fn census(&self) -> Population {
        self.current.iter().flatten().collect()
    }

    pub fn cells(&self) -> &[Option<Entity>] {
        &self.current
    }

    /// Iterator over all occupied cells with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Entity)> + '_ {
        self.current
            .iter()
            .enumerate()
            .filter_map(move |(i, cell)| cell.as_ref().map(|e| (Position::from_index(i, self.size), e)))
    }

    fn index_of(&self, pos: Position) -> usize {
        Position::wrap(i64::from(pos.x), i64::from(pos.y), self.size).index(self.size)
    }

    fn encode(&self, entity: Entity, pos: Position) -> Result<u32> {
        let limit = MAX_THRESHOLD as u16;
        if entity.breed > limit || entity.starve > limit {
            return Err(Error::FatalStep {
                generation: self.generation + 1,
                reason: format!(
                    "{} bound for {} has counters out of range (breed {}, starve {})",
                    entity.species, pos, entity.breed, entity.starve
                ),
            });
        }

        let species = match entity.species {
            Species::Fish => 1,
            Species::Shark => 2,
        };
        Ok(species
            | (u32::from(entity.breed) << 2)
            | (u32::from(entity.starve) << (2 + COUNTER_BITS)))
    }
}

fn decode(payload: u32) -> Option<Entity> {
    let species = match payload & 0b11 {
        1 => Species::Fish,
        2 => Species::Shark,
        _ => return None,
    };
    Some(Entity {
        species,
        breed: ((payload >> 2) & COUNTER_MASK) as u16,
        starve: ((payload >> (2 + COUNTER_BITS)) & COUNTER_MASK) as u16,
    })
}

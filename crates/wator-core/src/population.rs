//! Population census for a generation.

use crate::types::{Entity, Species};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Number of living fish and sharks in one buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    pub fish: usize,
    pub sharks: usize,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.fish + self.sharks
    }

    pub fn record(&mut self, entity: &Entity) {
        match entity.species {
            Species::Fish => self.fish += 1,
            Species::Shark => self.sharks += 1,
        }
    }

    pub fn is_extinct(&self) -> bool {
        self.total() == 0
    }
}

impl AddAssign for Population {
    fn add_assign(&mut self, other: Self) {
        self.fish += other.fish;
        self.sharks += other.sharks;
    }
}

impl<'a> FromIterator<&'a Entity> for Population {
    fn from_iter<I: IntoIterator<Item = &'a Entity>>(iter: I) -> Self {
        let mut population = Population::new();
        for entity in iter {
            population.record(entity);
        }
        population
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_census() {
        let entities = [Entity::fish(), Entity::shark(3), Entity::fish()];
        let population: Population = entities.iter().collect();
        assert_eq!(population.fish, 2);
        assert_eq!(population.sharks, 1);
        assert_eq!(population.total(), 3);
        assert!(!population.is_extinct());
    }

    #[test]
    fn test_add_assign() {
        let mut a = Population { fish: 1, sharks: 2 };
        a += Population { fish: 3, sharks: 0 };
        assert_eq!(a, Population { fish: 4, sharks: 2 });
    }
}

//! Immutable views of a completed generation.

use crate::grid::Grid;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wator_core::{CellState, Entity, Error, Population, Position, Result, MAX_GRID_SIZE};

/// Species and counters of every cell after a generation completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generation: u64,
    pub size: u32,
    cells: Vec<Option<Entity>>,
}

impl Snapshot {
    pub fn capture(grid: &Grid) -> Self {
        Self {
            generation: grid.generation(),
            size: grid.size(),
            cells: grid.cells().to_vec(),
        }
    }

    pub fn get(&self, pos: Position) -> Option<&Entity> {
        let wrapped = Position::wrap(i64::from(pos.x), i64::from(pos.y), self.size);
        self.cells[wrapped.index(self.size)].as_ref()
    }

    pub fn state(&self, pos: Position) -> CellState {
        CellState::from(self.get(pos))
    }

    pub fn cells(&self) -> &[Option<Entity>] {
        &self.cells
    }

    pub fn population(&self) -> Population {
        self.cells.iter().flatten().collect()
    }

    /// Iterator over occupied cells, row-major
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Entity)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, cell)| cell.as_ref().map(|e| (Position::from_index(i, self.size), e)))
    }

    /// Rebuild a grid positioned at this snapshot's generation
    pub fn to_grid(&self) -> Result<Grid> {
        Grid::from_cells(self.size, self.generation, self.cells.clone())
    }

    /// Serialize the snapshot to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize a snapshot from bytes, rejecting boards whose side and
    /// cell count disagree
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self = bincode::deserialize(bytes)?;
        let expected = snapshot.size as usize * snapshot.size as usize;
        if snapshot.size == 0 || i64::from(snapshot.size) > i64::from(MAX_GRID_SIZE) {
            return Err(Error::Serialization(format!(
                "snapshot side {} is out of range",
                snapshot.size
            )));
        }
        if snapshot.cells.len() != expected {
            return Err(Error::Serialization(format!(
                "snapshot of side {} holds {} cells, expected {}",
                snapshot.size,
                snapshot.cells.len(),
                expected
            )));
        }
        Ok(snapshot)
    }
}

/// Shared handle through which other threads (a renderer, an exporter)
/// follow the latest completed generation.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    latest: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotReader {
    pub(crate) fn new(initial: Arc<Snapshot>) -> Self {
        Self {
            latest: Arc::new(RwLock::new(initial)),
        }
    }

    pub(crate) fn publish(&self, snapshot: Arc<Snapshot>) {
        *self.latest.write() = snapshot;
    }

    pub fn latest(&self) -> Arc<Snapshot> {
        Arc::clone(&self.latest.read())
    }

    pub fn generation(&self) -> u64 {
        self.latest.read().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> Grid {
        let mut grid = Grid::new(3);
        grid.place(Position::new(0, 0), Entity::fish().with_breed(2));
        grid.place(Position::new(2, 1), Entity::shark(4));
        grid
    }

    #[test]
    fn test_capture_reflects_current_buffer() {
        let snapshot = Snapshot::capture(&sample_grid());
        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.state(Position::new(0, 0)), CellState::Fish);
        assert_eq!(snapshot.state(Position::new(2, 1)), CellState::Shark);
        assert_eq!(snapshot.get(Position::new(0, 0)).map(|e| e.breed), Some(2));
        assert_eq!(snapshot.population(), Population { fish: 1, sharks: 1 });

        let occupied: Vec<Position> = snapshot.iter().map(|(pos, _)| pos).collect();
        assert_eq!(occupied, vec![Position::new(0, 0), Position::new(2, 1)]);
    }

    #[test]
    fn test_snapshot_bytes() {
        let snapshot = Snapshot::capture(&sample_grid());
        let bytes = snapshot.to_bytes().unwrap();
        let restored = Snapshot::from_bytes(&bytes).unwrap();
        assert_eq!(restored, snapshot);
        assert!(Snapshot::from_bytes(&bytes[..3]).is_err());
    }

    #[test]
    fn test_from_bytes_rejects_bad_shape() {
        let empty_side = Snapshot {
            generation: 1,
            size: 0,
            cells: vec![],
        };
        let bytes = bincode::serialize(&empty_side).unwrap();
        assert!(matches!(Snapshot::from_bytes(&bytes), Err(Error::Serialization(_))));

        let short = Snapshot {
            generation: 1,
            size: 3,
            cells: vec![None; 8],
        };
        let bytes = bincode::serialize(&short).unwrap();
        assert!(matches!(Snapshot::from_bytes(&bytes), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_to_grid_restores_cells() {
        let snapshot = Snapshot::capture(&sample_grid());
        let grid = snapshot.to_grid().unwrap();
        assert_eq!(grid.cells(), snapshot.cells());
    }

    #[test]
    fn test_reader_sees_published_snapshot() {
        let reader = SnapshotReader::new(Arc::new(Snapshot::capture(&Grid::new(3))));
        let follower = reader.clone();
        assert_eq!(follower.latest().population().total(), 0);

        reader.publish(Arc::new(Snapshot::capture(&sample_grid())));
        assert_eq!(follower.latest().population().total(), 2);
    }
}

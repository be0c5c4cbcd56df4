//! Orthogonal neighbour lookup on the toroidal board.

use wator_core::Position;

/// Maps a cell to its four orthogonal neighbours with wraparound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighbourResolver {
    size: u32,
}

impl NeighbourResolver {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Neighbours of `pos` in fixed order: `(x, y-1)`, `(x, y+1)`, `(x-1, y)`,
    /// `(x+1, y)`, all taken modulo the board side.
    ///
    /// Rules pick "the first candidate" against this order, so it must not change.
    pub fn neighbours(&self, pos: Position) -> [Position; 4] {
        neighbours(pos.x, pos.y, self.size)
    }
}

pub fn neighbours(x: u32, y: u32, size: u32) -> [Position; 4] {
    let (x, y) = (i64::from(x), i64::from(y));
    [
        Position::wrap(x, y - 1, size),
        Position::wrap(x, y + 1, size),
        Position::wrap(x - 1, y, size),
        Position::wrap(x + 1, y, size),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interior_neighbours() {
        let resolver = NeighbourResolver::new(10);
        assert_eq!(
            resolver.neighbours(Position::new(5, 5)),
            [
                Position::new(5, 4),
                Position::new(5, 6),
                Position::new(4, 5),
                Position::new(6, 5),
            ]
        );
    }

    #[test]
    fn test_toroidal_wrap_at_origin() {
        let n = 4;
        let around = neighbours(0, 0, n);
        assert!(around.contains(&Position::new(0, n - 1)));
        assert!(around.contains(&Position::new(n - 1, 0)));
        assert_eq!(around[0], Position::new(0, 3));
        assert_eq!(around[1], Position::new(0, 1));
    }

    #[test]
    fn test_toroidal_wrap_at_far_corner() {
        let n = 4;
        let around = neighbours(n - 1, n - 1, n);
        assert!(around.contains(&Position::new(n - 1, 0)));
        assert!(around.contains(&Position::new(0, n - 1)));
    }

    #[test]
    fn test_single_cell_board() {
        // Every neighbour of the only cell is itself
        let around = neighbours(0, 0, 1);
        assert!(around.iter().all(|p| *p == Position::new(0, 0)));
    }
}

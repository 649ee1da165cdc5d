use serde::{Deserialize, Serialize};
use std::fmt;

/// A position on the hex grid.
///
/// Uses the two-axis layout where the six neighbours of `(x, y)` are
/// `(x±1, y)`, `(x, y±1)`, `(x+1, y+1)` and `(x-1, y-1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct HexCoord {
    pub x: i32,
    pub y: i32,
}

impl HexCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        HexCoord { x, y }
    }

    /// Number of steps between two positions, ignoring terrain.
    pub fn aerial_distance_to(&self, other: &HexCoord) -> i32 {
        let relative_x = self.x - other.x;
        let relative_y = self.y - other.y;
        if relative_x * relative_y >= 0 {
            relative_x.abs().max(relative_y.abs())
        } else {
            relative_x.abs() + relative_y.abs()
        }
    }

    pub fn neighbors(&self) -> [HexCoord; 6] {
        [
            HexCoord::new(self.x + 1, self.y),
            HexCoord::new(self.x - 1, self.y),
            HexCoord::new(self.x, self.y + 1),
            HexCoord::new(self.x, self.y - 1),
            HexCoord::new(self.x + 1, self.y + 1),
            HexCoord::new(self.x - 1, self.y - 1),
        ]
    }

    /// All positions within `distance` steps, including this one.
    pub fn positions_in_distance(&self, distance: i32) -> Vec<HexCoord> {
        let mut result = Vec::new();
        for dx in -distance..=distance {
            for dy in -distance..=distance {
                let candidate = HexCoord::new(self.x + dx, self.y + dy);
                if self.aerial_distance_to(&candidate) <= distance {
                    result.push(candidate);
                }
            }
        }
        result
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_are_at_distance_one() {
        let origin = HexCoord::new(3, -2);
        for neighbor in origin.neighbors() {
            assert_eq!(origin.aerial_distance_to(&neighbor), 1);
        }
    }

    #[test]
    fn test_distance_mixed_signs() {
        let a = HexCoord::new(0, 0);
        assert_eq!(a.aerial_distance_to(&HexCoord::new(2, 2)), 2);
        assert_eq!(a.aerial_distance_to(&HexCoord::new(2, -2)), 4);
        assert_eq!(HexCoord::new(2, -2).aerial_distance_to(&a), 4);
    }

    #[test]
    fn test_positions_in_distance_counts() {
        let origin = HexCoord::default();
        assert_eq!(origin.positions_in_distance(0).len(), 1);
        assert_eq!(origin.positions_in_distance(1).len(), 7);
        assert_eq!(origin.positions_in_distance(2).len(), 19);
    }
}
